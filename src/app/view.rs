use crate::state::ConversationSnapshot;
use crate::ui::editor::{EditorAction, InputEditor};
use crate::ui::layout::{rect_contains, split_chat_layout, ChatLayout, SEND_BUTTON_WIDTH};
use crate::ui::render::{
    history_lines, history_scroll_top, input_visual_rows, render_history, render_input,
    render_send_button, render_status_line,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::Frame;

const MOUSE_SCROLL_LINES: usize = 3;

#[derive(Debug, PartialEq, Eq)]
pub enum ViewAction {
    None,
    Submit(String),
    Quit,
}

/// Terminal-side state: the latest conversation snapshot plus everything the
/// user is doing with the input field and scrollback.
#[derive(Default)]
pub struct ChatView {
    snapshot: ConversationSnapshot,
    editor: InputEditor,
    scroll: Option<usize>,
    layout: ChatLayout,
    history_total: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &ConversationSnapshot {
        &self.snapshot
    }

    pub fn apply_snapshot(&mut self, snapshot: ConversationSnapshot) {
        self.snapshot = snapshot;
        self.refresh_history_total();
    }

    pub fn input(&self) -> &str {
        self.editor.buffer()
    }

    pub fn is_input_enabled(&self) -> bool {
        !self.snapshot.loading
    }

    pub fn is_following(&self) -> bool {
        self.scroll.is_none()
    }

    pub fn layout(&self) -> ChatLayout {
        self.layout
    }

    /// Recomputes pane geometry for a frame of `area`.
    pub fn set_area(&mut self, area: Rect) {
        let input_width = area
            .width
            .saturating_sub(SEND_BUTTON_WIDTH)
            .saturating_sub(2)
            .max(1) as usize;
        let input_rows = input_visual_rows(self.editor.buffer(), input_width);
        self.layout = split_chat_layout(area, input_rows.min(u16::MAX as usize) as u16);
        self.refresh_history_total();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        match key.code {
            KeyCode::PageUp => {
                self.scroll_up(self.page_size());
                return ViewAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_down(self.page_size());
                return ViewAction::None;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ViewAction::Quit;
            }
            _ => {}
        }

        if !self.is_input_enabled() {
            return ViewAction::None;
        }
        match self.editor.apply_key(key) {
            EditorAction::None => ViewAction::None,
            EditorAction::Submit(text) => self.submitted(text),
            EditorAction::Quit => ViewAction::Quit,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewAction {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left)
                if rect_contains(self.layout.send_button, mouse.column, mouse.row) =>
            {
                self.press_send()
            }
            MouseEventKind::ScrollUp => {
                self.scroll_up(MOUSE_SCROLL_LINES);
                ViewAction::None
            }
            MouseEventKind::ScrollDown => {
                self.scroll_down(MOUSE_SCROLL_LINES);
                ViewAction::None
            }
            _ => ViewAction::None,
        }
    }

    /// Pointer activation of the Send button; same path as Enter.
    pub fn press_send(&mut self) -> ViewAction {
        if !self.is_input_enabled() {
            return ViewAction::None;
        }
        match self.editor.submit() {
            Some(text) => self.submitted(text),
            None => ViewAction::None,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if self.is_input_enabled() {
            self.editor.insert_str(text);
        }
    }

    pub fn status_text(&self) -> String {
        let state = if self.snapshot.loading {
            "waiting for reply"
        } else {
            "ready"
        };
        let view = if self.is_following() {
            "following"
        } else {
            "scrolled"
        };
        format!(
            "{state} | {view} | Enter send · Shift+Enter newline · PgUp/PgDn scroll · Esc quit"
        )
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        self.set_area(frame.area());
        let layout = self.layout;
        let lines = history_lines(&self.snapshot, layout.history.width.max(1) as usize);
        let top = history_scroll_top(lines.len(), layout.history.height as usize, self.scroll);
        let enabled = self.is_input_enabled();

        render_history(frame, layout.history, &lines, top);
        render_status_line(frame, layout.status, &self.status_text());
        render_input(
            frame,
            layout.input,
            self.editor.buffer(),
            self.editor.cursor(),
            enabled,
        );
        render_send_button(frame, layout.send_button, enabled);
    }

    fn submitted(&mut self, text: String) -> ViewAction {
        self.scroll = None;
        ViewAction::Submit(text)
    }

    fn refresh_history_total(&mut self) {
        let width = self.layout.history.width.max(1) as usize;
        self.history_total = history_lines(&self.snapshot, width).len();
    }

    fn page_size(&self) -> usize {
        (self.layout.history.height as usize).saturating_sub(1).max(1)
    }

    fn scroll_up(&mut self, lines: usize) {
        let height = self.layout.history.height as usize;
        let top = history_scroll_top(self.history_total, height, self.scroll);
        self.scroll = Some(top.saturating_sub(lines));
    }

    fn scroll_down(&mut self, lines: usize) {
        let height = self.layout.history.height as usize;
        let max_top = self.history_total.saturating_sub(height);
        let top = history_scroll_top(self.history_total, height, self.scroll) + lines;
        self.scroll = if top >= max_top { None } else { Some(top) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Message;
    use crossterm::event::KeyEventKind;

    fn view_with_area() -> ChatView {
        let mut view = ChatView::new();
        view.set_area(Rect::new(0, 0, 80, 12));
        view
    }

    fn type_text(view: &mut ChatView, text: &str) {
        for ch in text.chars() {
            view.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn loading_snapshot() -> ConversationSnapshot {
        ConversationSnapshot {
            messages: vec![Message::user("q")],
            loading: true,
        }
    }

    #[test]
    fn test_enter_and_send_click_submit_the_same_text() {
        let mut view = view_with_area();
        type_text(&mut view, "Test message");
        let by_key = view.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        type_text(&mut view, "Test message");
        let button = view.layout().send_button;
        let by_click = view.handle_mouse(click(button.x + 1, button.y + 1));

        assert_eq!(by_key, ViewAction::Submit("Test message".to_string()));
        assert_eq!(by_click, by_key);
        assert_eq!(view.input(), "");
    }

    #[test]
    fn test_click_outside_button_does_not_submit() {
        let mut view = view_with_area();
        type_text(&mut view, "hello");
        let input = view.layout().input;
        assert_eq!(view.handle_mouse(click(input.x + 1, input.y + 1)), ViewAction::None);
        assert_eq!(view.input(), "hello");
    }

    #[test]
    fn test_send_click_on_blank_input_is_ignored() {
        let mut view = view_with_area();
        assert_eq!(view.press_send(), ViewAction::None);
    }

    #[test]
    fn test_input_is_locked_while_loading() {
        let mut view = view_with_area();
        type_text(&mut view, "draft");
        view.apply_snapshot(loading_snapshot());

        type_text(&mut view, "more");
        view.paste("pasted");
        assert_eq!(view.input(), "draft");
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            ViewAction::None
        );
        assert_eq!(view.press_send(), ViewAction::None);
        assert!(view.status_text().starts_with("waiting for reply"));
    }

    #[test]
    fn test_ctrl_c_quits_even_while_loading() {
        let mut view = view_with_area();
        view.apply_snapshot(loading_snapshot());
        let key = KeyEvent::new_with_kind(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
            KeyEventKind::Press,
        );
        assert_eq!(view.handle_key(key), ViewAction::Quit);
    }

    #[test]
    fn test_scrolling_up_leaves_follow_mode_and_page_down_returns() {
        let mut view = view_with_area();
        let messages = (0..20).map(|i| Message::user(format!("line {i}"))).collect();
        view.apply_snapshot(ConversationSnapshot {
            messages,
            loading: false,
        });

        view.handle_key(KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE));
        assert!(!view.is_following());
        view.handle_key(KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE));
        assert!(view.is_following());
    }

    #[test]
    fn test_submit_resumes_following() {
        let mut view = view_with_area();
        let messages = (0..20).map(|i| Message::user(format!("line {i}"))).collect();
        view.apply_snapshot(ConversationSnapshot {
            messages,
            loading: false,
        });
        view.handle_key(KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE));

        type_text(&mut view, "next");
        view.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(view.is_following());
    }
}
