use crate::types::{ChatRequest, HistoryEntry, Role};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Set when the reply was replaced by a transport failure notice.
    pub failed: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            failed: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            failed: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::assistant(text)
        }
    }
}

/// Owned copy of the conversation published after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub loading: bool,
}

impl ConversationSnapshot {
    pub fn last_text(&self) -> Option<&str> {
        self.messages.last().map(|message| message.text.as_str())
    }
}

/// Single source of truth for rendering.
///
/// Only the last message can be open for streaming, and only while a reply is
/// in flight. Subscribers receive a snapshot after each mutation, in order.
#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    loading: bool,
    reply_open: bool,
    subscribers: Vec<mpsc::UnboundedSender<ConversationSnapshot>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The receiver gets the current state first, then every later mutation.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConversationSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.snapshot());
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.messages.clone(),
            loading: self.loading,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_open_reply(&self) -> bool {
        self.reply_open
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .map(|message| HistoryEntry::text(message.role, message.text.clone()))
            .collect()
    }

    /// Starts a turn. Blank input is ignored and yields no request.
    ///
    /// The returned request carries the history as it stood before `text` was
    /// appended.
    pub fn append_user(&mut self, text: &str) -> Option<ChatRequest> {
        if text.trim().is_empty() {
            return None;
        }

        let request = ChatRequest {
            message: text.to_string(),
            history: self.history(),
        };
        self.reply_open = false;
        self.messages.push(Message::user(text));
        self.loading = true;
        self.publish();
        Some(request)
    }

    /// Appends the empty assistant placeholder that chunks stream into.
    pub fn open_reply(&mut self) {
        if self.reply_open {
            return;
        }
        self.messages.push(Message::assistant(String::new()));
        self.reply_open = true;
        self.publish();
    }

    /// Replaces the open reply's text with the full accumulated text so far.
    pub fn apply_chunk(&mut self, accumulated_text: &str) -> bool {
        if !self.reply_open {
            tracing::warn!("dropping chunk: no assistant reply is open");
            return false;
        }
        let Some(last) = self.messages.last_mut() else {
            return false;
        };
        if last.text == accumulated_text {
            return false;
        }

        last.text.clear();
        last.text.push_str(accumulated_text);
        self.publish();
        true
    }

    pub fn finish(&mut self) {
        self.loading = false;
        self.reply_open = false;
        self.publish();
    }

    pub fn fail(&mut self, message: &str) {
        let open_reply = if self.reply_open {
            self.messages.last_mut()
        } else {
            None
        };
        match open_reply {
            Some(last) => *last = Message::failure(message),
            None => self.messages.push(Message::failure(message)),
        }
        self.loading = false;
        self.reply_open = false;
        self.publish();
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationSnapshot>) -> Vec<ConversationSnapshot> {
        let mut out = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            out.push(snapshot);
        }
        out
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut store = ConversationStore::new();
        let mut rx = store.subscribe();
        drain(&mut rx);

        assert!(store.append_user("").is_none());
        assert!(store.append_user("  \n\t ").is_none());
        assert!(store.messages().is_empty());
        assert!(!store.is_loading());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_append_user_keeps_exact_text_and_sets_loading() {
        let mut store = ConversationStore::new();
        let request = store.append_user("  hi there ").expect("request");

        assert_eq!(request.message, "  hi there ");
        assert!(request.history.is_empty());
        assert_eq!(store.messages(), &[Message::user("  hi there ")]);
        assert!(store.is_loading());
        assert!(!store.has_open_reply());
    }

    #[test]
    fn test_request_history_excludes_the_new_message() {
        let mut store = ConversationStore::new();
        store.append_user("first");
        store.open_reply();
        store.apply_chunk("reply");
        store.finish();

        let request = store.append_user("second").expect("request");
        assert_eq!(
            request.history,
            vec![
                HistoryEntry::text(Role::User, "first"),
                HistoryEntry::text(Role::Assistant, "reply"),
            ]
        );
        assert_eq!(request.message, "second");
    }

    #[test]
    fn test_apply_chunk_replaces_and_is_idempotent() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        store.open_reply();
        let mut rx = store.subscribe();
        drain(&mut rx);

        assert!(store.apply_chunk("Hel"));
        assert!(store.apply_chunk("Hello"));
        assert!(!store.apply_chunk("Hello"));

        let texts: Vec<_> = drain(&mut rx)
            .iter()
            .map(|s| s.last_text().unwrap_or_default().to_string())
            .collect();
        assert_eq!(texts, vec!["Hel", "Hello"]);
        assert_eq!(store.messages().len(), 2);
    }

    #[test]
    fn test_apply_chunk_without_open_reply_is_dropped() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        assert!(!store.apply_chunk("stray"));
        assert_eq!(store.messages(), &[Message::user("q")]);
    }

    #[test]
    fn test_open_reply_only_once() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        store.open_reply();
        store.open_reply();
        assert_eq!(store.messages().len(), 2);
        assert!(store.has_open_reply());
    }

    #[test]
    fn test_fail_replaces_open_reply() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        store.open_reply();
        store.apply_chunk("partial");
        store.fail("broken");

        assert_eq!(
            store.messages(),
            &[Message::user("q"), Message::failure("broken")]
        );
        assert!(!store.is_loading());
        assert!(!store.has_open_reply());
    }

    #[test]
    fn test_fail_without_open_reply_appends_assistant_message() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        store.fail("broken");

        assert_eq!(
            store.messages(),
            &[Message::user("q"), Message::failure("broken")]
        );
        assert!(!store.is_loading());
    }

    #[test]
    fn test_finish_closes_reply_and_clears_loading() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        store.open_reply();
        store.finish();

        assert!(!store.is_loading());
        assert!(!store.has_open_reply());
        assert!(!store.apply_chunk("late"));
    }

    #[test]
    fn test_subscribe_sends_current_state_then_mutations() {
        let mut store = ConversationStore::new();
        store.append_user("q");
        let mut rx = store.subscribe();
        store.finish();

        let snapshots = drain(&mut rx);
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].loading);
        assert!(!snapshots[1].loading);
    }

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let mut store = ConversationStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.append_user("q");
        assert!(store.subscribers.is_empty());
    }
}
