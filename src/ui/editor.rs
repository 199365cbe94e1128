use crate::ui::input_metrics::clamp_to_char_boundary_left;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub buffer: String,
    pub cursor: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Submit(String),
    Quit,
}

/// Single input field with submit history and undo/redo.
#[derive(Default, Debug)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    history_stash: Option<EditorSnapshot>,
    undo_stack: Vec<EditorSnapshot>,
    redo_stack: Vec<EditorSnapshot>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        if i == 0 {
            return 0;
        }
        clamp_to_char_boundary_left(&self.buffer, i - 1)
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            buffer: self.buffer.clone(),
            cursor: self.cursor,
        }
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
    }

    fn restore(&mut self, snap: EditorSnapshot) {
        self.buffer = snap.buffer;
        self.cursor = clamp_to_char_boundary_left(&self.buffer, snap.cursor);
    }

    fn leave_history(&mut self) {
        self.history_index = None;
        self.history_stash = None;
    }

    pub fn insert_str(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.leave_history();
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.push_undo();
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        self.leave_history();
        let start = self.prev_char_boundary(end);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        self.leave_history();
        let end = self.next_char_boundary(start);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn clear(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.leave_history();
        self.push_undo();
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Takes the field's text for sending and empties the field.
    ///
    /// Blank text is left in place and yields `None`. The returned text is
    /// exactly what was typed, surrounding whitespace included.
    pub fn submit(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        let value = self.buffer.clone();
        self.history.push(value.clone());
        self.leave_history();
        self.push_undo();
        self.buffer.clear();
        self.cursor = 0;
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        if self.history_index.is_none() {
            self.history_stash = Some(self.snapshot());
        }
        let next_index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(next_index);
        self.buffer = self.history[next_index].clone();
        self.cursor = self.buffer.len();
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if idx + 1 >= self.history.len() {
            self.history_index = None;
            match self.history_stash.take() {
                Some(stash) => self.restore(stash),
                None => {
                    self.buffer.clear();
                    self.cursor = 0;
                }
            }
        } else {
            let next = idx + 1;
            self.history_index = Some(next);
            self.buffer = self.history[next].clone();
            self.cursor = self.buffer.len();
        }
    }

    pub fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            self.redo_stack.push(self.snapshot());
            self.restore(previous);
        }
    }

    pub fn redo(&mut self) {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(self.snapshot());
            self.restore(next);
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return EditorAction::Quit,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return EditorAction::Quit;
                }
                self.delete();
            }
            KeyCode::Char('j') if ctrl => self.insert_str("\n"),
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('y') if ctrl => self.redo(),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_str("\n");
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return EditorAction::Submit(value);
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Esc => {
                if self.buffer.is_empty() {
                    return EditorAction::Quit;
                }
                self.clear();
            }
            KeyCode::Char(ch) if !ctrl => self.insert_str(ch.encode_utf8(&mut [0u8; 4])),
            _ => {}
        }

        EditorAction::None
    }
}
