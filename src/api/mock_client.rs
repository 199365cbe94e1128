use crate::api::client::{ByteStream, ChatTransport};
use crate::types::ChatRequest;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Scripted outcome for one call to [`MockChatClient::open_stream`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Chunks(Vec<Vec<u8>>),
    NoBody,
    ConnectError(String),
    BreakAfter { chunks: Vec<Vec<u8>>, error: String },
}

impl MockReply {
    pub fn text(chunks: &[&str]) -> Self {
        Self::Chunks(chunks.iter().map(|chunk| chunk.as_bytes().to_vec()).collect())
    }
}

/// In-memory transport that replays scripted replies and records every request.
#[derive(Clone, Default)]
pub struct MockChatClient {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChatClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self, request: ChatRequest) -> Result<Option<ByteStream>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| anyhow!("MockChatClient: No more replies configured"))?;

        match reply {
            MockReply::Chunks(chunks) => {
                let items: Vec<Result<Bytes>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                Ok(Some(Box::pin(stream::iter(items))))
            }
            MockReply::NoBody => Ok(None),
            MockReply::ConnectError(message) => Err(anyhow!(message)),
            MockReply::BreakAfter { chunks, error } => {
                let mut items: Vec<Result<Bytes>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                items.push(Err(anyhow!(error)));
                Ok(Some(Box::pin(stream::iter(items))))
            }
        }
    }
}

impl ChatTransport for MockChatClient {
    fn open_stream(&self, request: ChatRequest) -> BoxFuture<'_, Result<Option<ByteStream>>> {
        let outcome = self.next_reply(request);
        Box::pin(async move { outcome })
    }
}
