use crate::api::ChatTransport;
use crate::state::{stream_reply, ConversationStore};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};

/// Owns the conversation store and runs submitted turns one at a time.
///
/// Submissions queue in FIFO order; a turn always streams to completion before
/// the next one starts, so overlapping requests never interleave in the store.
pub struct ChatWorker {
    submit_tx: mpsc::UnboundedSender<String>,
    handle: JoinHandle<ConversationStore>,
}

impl ChatWorker {
    pub fn spawn(store: ConversationStore, transport: Arc<dyn ChatTransport>) -> Self {
        let (submit_tx, mut submit_rx) = mpsc::unbounded_channel::<String>();
        let handle = task::spawn(async move {
            let mut store = store;
            while let Some(text) = submit_rx.recv().await {
                let Some(request) = store.append_user(&text) else {
                    tracing::debug!("ignoring blank submission");
                    continue;
                };
                tracing::info!(history = request.history.len(), "starting chat turn");
                stream_reply(&mut store, transport.as_ref(), request).await;
            }
            store
        });

        Self { submit_tx, handle }
    }

    pub fn submit(&self, text: String) -> Result<()> {
        self.submit_tx
            .send(text)
            .map_err(|_| anyhow!("chat worker has stopped"))
    }

    /// Stops accepting input, waits for queued turns and returns the store.
    pub async fn shutdown(self) -> Result<ConversationStore> {
        drop(self.submit_tx);
        self.handle.await.context("chat worker panicked")
    }
}
