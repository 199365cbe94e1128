use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const SEND_BUTTON_WIDTH: u16 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatLayout {
    pub history: Rect,
    pub status: Rect,
    pub input: Rect,
    pub send_button: Rect,
}

/// History on top, a one-row status line, then the input field with the
/// Send button to its right. `input_rows` excludes the field's border.
pub fn split_chat_layout(area: Rect, input_rows: u16) -> ChatLayout {
    let max_input_rows = area.height.saturating_sub(4).max(1);
    let input_height = input_rows.clamp(1, max_input_rows) + 2;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(area);

    let input_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(SEND_BUTTON_WIDTH)])
        .split(rows[2]);

    ChatLayout {
        history: rows[0],
        status: rows[1],
        input: input_row[0],
        send_button: input_row[1],
    }
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && row >= rect.y
        && column < rect.x.saturating_add(rect.width)
        && row < rect.y.saturating_add(rect.height)
}
