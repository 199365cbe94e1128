pub mod conversation;
pub mod reducer;

pub use conversation::{ConversationSnapshot, ConversationStore, Message};
pub use reducer::{stream_reply, CONNECTION_ERROR_MESSAGE};
