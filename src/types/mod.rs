mod api;

pub use api::{ChatRequest, HistoryEntry, Part, Role};
