pub mod client;
pub mod decoder;
pub mod mock_client;

pub use client::{ByteStream, ChatClient, ChatTransport};
pub use decoder::Utf8StreamDecoder;
