mod view;

pub use view::{ChatView, ViewAction};

use crate::api::{ChatClient, ChatTransport};
use crate::config::Config;
use crate::runtime::ChatWorker;
use crate::state::{ConversationSnapshot, ConversationStore};
use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyEventKind};
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const TUI_TICK_INTERVAL: Duration = Duration::from_millis(50);

pub struct App {
    worker: ChatWorker,
    snapshot_rx: mpsc::UnboundedReceiver<ConversationSnapshot>,
    view: ChatView,
    terminal: Option<crate::terminal::TerminalType>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = ChatClient::new(&config)?;
        let mut app = Self::with_transport(Arc::new(client));
        if io::stdin().is_terminal() && io::stdout().is_terminal() {
            app.terminal = Some(crate::terminal::setup()?);
        }
        Ok(app)
    }

    /// Builds an app without a terminal; `run` then uses line mode.
    pub fn with_transport(transport: Arc<dyn ChatTransport>) -> Self {
        let mut store = ConversationStore::new();
        let snapshot_rx = store.subscribe();
        Self {
            worker: ChatWorker::spawn(store, transport),
            snapshot_rx,
            view: ChatView::new(),
            terminal: None,
            should_quit: false,
        }
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.terminal.is_some() {
            return self.run_tui().await;
        }
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_line_mode(stdin, &mut io::stdout()).await
    }

    async fn run_tui(&mut self) -> Result<()> {
        let mut tick = tokio::time::interval(TUI_TICK_INTERVAL);
        while !self.should_quit {
            self.draw_frame()?;
            self.process_terminal_events()?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                _ = tick.tick() => {}
                snapshot = self.snapshot_rx.recv() => match snapshot {
                    Some(snapshot) => {
                        self.view.apply_snapshot(snapshot);
                        self.drain_snapshots();
                    }
                    None => self.should_quit = true,
                },
            }
        }

        self.terminal = None;
        crate::terminal::restore()
    }

    /// Reads one submission per line and streams each reply to `out` as it
    /// grows. Turns run to completion before the next line is read.
    pub async fn run_line_mode<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            self.drain_snapshots();
            let turn_start = self.view.snapshot().messages.len();
            self.worker.submit(line)?;

            let mut printer = ReplyPrinter::default();
            loop {
                let Some(snapshot) = self.snapshot_rx.recv().await else {
                    bail!("chat worker stopped before the reply finished");
                };
                if let Some(reply) = snapshot.messages.get(turn_start + 1) {
                    if let Some(text) = printer.advance(&reply.text) {
                        write!(out, "{text}")?;
                        out.flush()?;
                    }
                }
                let finished = !snapshot.loading && snapshot.messages.len() > turn_start;
                self.view.apply_snapshot(snapshot);
                if finished {
                    writeln!(out)?;
                    break;
                }
            }
        }
        Ok(())
    }

    fn drain_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            self.view.apply_snapshot(snapshot);
        }
    }

    fn draw_frame(&mut self) -> Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        let view = &mut self.view;
        terminal.draw(|frame| view.draw(frame))?;
        Ok(())
    }

    fn process_terminal_events(&mut self) -> Result<()> {
        while event::poll(Duration::from_millis(0))? {
            let action = match event::read()? {
                Event::Key(key)
                    if key.kind == KeyEventKind::Press || key.kind == KeyEventKind::Repeat =>
                {
                    self.view.handle_key(key)
                }
                Event::Mouse(mouse) => self.view.handle_mouse(mouse),
                Event::Paste(text) => {
                    self.view.paste(&text);
                    ViewAction::None
                }
                _ => ViewAction::None,
            };

            match action {
                ViewAction::None => {}
                ViewAction::Submit(text) => self.worker.submit(text)?,
                ViewAction::Quit => {
                    self.should_quit = true;
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.terminal.is_some() {
            let _ = crate::terminal::restore();
        }
    }
}

/// Turns successive full-text snapshots of one reply into printable deltas.
#[derive(Default)]
struct ReplyPrinter {
    printed: String,
}

impl ReplyPrinter {
    fn advance(&mut self, current: &str) -> Option<String> {
        if let Some(suffix) = current.strip_prefix(self.printed.as_str()) {
            if suffix.is_empty() {
                return None;
            }
            let suffix = suffix.to_string();
            self.printed.push_str(&suffix);
            return Some(suffix);
        }

        // The reply was replaced (e.g. by the connection error); restart the line.
        self.printed = current.to_string();
        Some(format!("\n{current}"))
    }
}
