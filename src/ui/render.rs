use crate::state::ConversationSnapshot;
use crate::types::Role;
use crate::ui::input_metrics::{
    char_display_width, cursor_row_col, truncate_to_display_width, wrap_input_lines,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const INPUT_PLACEHOLDER: &str = "Ask me anything...";
const TYPING_INDICATOR: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    User,
    Assistant,
    Error,
    Typing,
    Spacer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryLine {
    pub kind: LineKind,
    pub text: String,
}

/// Pre-wraps the conversation to `width` columns so scroll math matches what
/// is drawn.
pub fn history_lines(snapshot: &ConversationSnapshot, width: usize) -> Vec<HistoryLine> {
    let mut out = Vec::new();
    for message in &snapshot.messages {
        let (kind, label) = match message.role {
            Role::User => (LineKind::User, "you: "),
            Role::Assistant if message.failed => (LineKind::Error, "assistant: "),
            Role::Assistant => (LineKind::Assistant, "assistant: "),
        };
        for text in wrap_input_lines(&format!("{label}{}", message.text), width) {
            out.push(HistoryLine { kind, text });
        }
        out.push(HistoryLine {
            kind: LineKind::Spacer,
            text: String::new(),
        });
    }
    if snapshot.loading {
        out.push(HistoryLine {
            kind: LineKind::Typing,
            text: TYPING_INDICATOR.to_string(),
        });
    }
    out
}

/// Top row to draw. `None` follows the newest output.
pub fn history_scroll_top(total: usize, height: usize, scroll: Option<usize>) -> usize {
    let max_top = total.saturating_sub(height);
    scroll.map_or(max_top, |top| top.min(max_top))
}

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_input_lines(input, width).len().max(1)
}

pub fn render_history(frame: &mut Frame<'_>, area: Rect, lines: &[HistoryLine], top: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let visible: Vec<Line> = lines
        .iter()
        .skip(top)
        .take(area.height as usize)
        .map(|line| Line::styled(line.text.clone(), line_style(line.kind)))
        .collect();
    frame.render_widget(Paragraph::new(visible), area);
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::User => Style::default().fg(Color::Cyan),
        LineKind::Assistant => Style::default().fg(Color::White),
        LineKind::Error => Style::default().fg(Color::Red),
        LineKind::Typing => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        LineKind::Spacer => Style::default(),
    }
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input: &str,
    cursor_byte: usize,
    enabled: bool,
) {
    if area.height < 3 || area.width < 3 {
        return;
    }
    let border_color = if enabled { Color::Gray } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if input.is_empty() {
        frame.render_widget(
            Paragraph::new(INPUT_PLACEHOLDER).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ),
            inner,
        );
    } else {
        let width = inner.width.max(1) as usize;
        let lines = wrap_input_lines(input, width);
        let (cursor_row, _) = cursor_row_col(input, cursor_byte, width);
        let window_start = cursor_row
            .saturating_add(1)
            .saturating_sub(inner.height as usize);
        let visible: Vec<Line> = lines
            .into_iter()
            .skip(window_start)
            .take(inner.height as usize)
            .map(Line::from)
            .collect();
        let style = if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(Paragraph::new(visible).style(style), inner);
    }

    if enabled {
        let width = inner.width.max(1) as usize;
        let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, width);
        let window_start = cursor_row
            .saturating_add(1)
            .saturating_sub(inner.height as usize);
        let cursor_y = inner
            .y
            .saturating_add(cursor_row.saturating_sub(window_start) as u16);
        let cursor_x = inner
            .x
            .saturating_add(cursor_col as u16)
            .min(inner.x.saturating_add(inner.width.saturating_sub(1)));
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

pub fn render_send_button(frame: &mut Frame<'_>, area: Rect, enabled: bool) {
    if area.height < 3 || area.width < 3 {
        return;
    }
    let style = if enabled {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new("Send")
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    let mut used = 0usize;
    let mut truncated = false;

    for ch in input.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > width {
            truncated = true;
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    if truncated && width >= 4 {
        out = truncate_to_display_width(&out, width - 3);
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Message, CONNECTION_ERROR_MESSAGE};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_history_lines_label_and_wrap_messages() {
        let snapshot = ConversationSnapshot {
            messages: vec![Message::user("hi"), Message::assistant("Hello there")],
            loading: false,
        };

        let lines = history_lines(&snapshot, 12);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["you: hi", "", "assistant: H", "ello there", ""]
        );
        assert_eq!(lines[2].kind, LineKind::Assistant);
    }

    #[test]
    fn test_history_lines_show_typing_indicator_while_loading() {
        let snapshot = ConversationSnapshot {
            messages: vec![Message::user("hi")],
            loading: true,
        };

        let lines = history_lines(&snapshot, 40);
        let last = lines.last().expect("indicator line");
        assert_eq!(last.kind, LineKind::Typing);
        assert_eq!(last.text, "...");
    }

    #[test]
    fn test_failed_reply_is_marked() {
        let snapshot = ConversationSnapshot {
            messages: vec![Message::failure(CONNECTION_ERROR_MESSAGE)],
            loading: false,
        };
        assert_eq!(history_lines(&snapshot, 80)[0].kind, LineKind::Error);
    }

    #[test]
    fn test_reply_matching_error_text_is_not_marked() {
        let snapshot = ConversationSnapshot {
            messages: vec![Message::assistant(CONNECTION_ERROR_MESSAGE)],
            loading: false,
        };
        assert_eq!(history_lines(&snapshot, 80)[0].kind, LineKind::Assistant);
    }

    #[test]
    fn test_history_scroll_top_follows_or_clamps() {
        assert_eq!(history_scroll_top(30, 10, None), 20);
        assert_eq!(history_scroll_top(30, 10, Some(5)), 5);
        assert_eq!(history_scroll_top(30, 10, Some(50)), 20);
        assert_eq!(history_scroll_top(4, 10, None), 0);
    }

    #[test]
    fn test_truncate_line_adds_ellipsis() {
        assert_eq!(truncate_line("abcdefghij", 6), "abc...");
        assert_eq!(truncate_line("abc", 6), "abc");
    }

    #[test]
    fn test_input_shows_placeholder_and_send_button() {
        let mut terminal = Terminal::new(TestBackend::new(40, 3)).expect("terminal");
        terminal
            .draw(|frame| {
                render_input(frame, Rect::new(0, 0, 30, 3), "", 0, true);
                render_send_button(frame, Rect::new(30, 0, 10, 3), true);
            })
            .expect("draw");

        let text = buffer_text(&terminal);
        assert!(text.contains(INPUT_PLACEHOLDER));
        assert!(text.contains("Send"));
    }
}
