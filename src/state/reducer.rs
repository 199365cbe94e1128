use super::conversation::ConversationStore;
use crate::api::{ChatTransport, Utf8StreamDecoder};
use crate::types::ChatRequest;
use anyhow::Result;
use futures::StreamExt;

/// Reply text shown for every transport failure.
pub const CONNECTION_ERROR_MESSAGE: &str = "Error: Could not connect to the server.";

/// Runs one turn: sends `request` and folds the streamed reply into `store`.
///
/// Always leaves the store with loading cleared. Failures before or during the
/// stream collapse into [`CONNECTION_ERROR_MESSAGE`].
pub async fn stream_reply(
    store: &mut ConversationStore,
    transport: &dyn ChatTransport,
    request: ChatRequest,
) {
    match fold_reply(store, transport, request).await {
        Ok(chunks) => {
            tracing::debug!(chunks, "reply stream finished");
            store.finish();
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "chat request failed");
            store.fail(CONNECTION_ERROR_MESSAGE);
        }
    }
}

async fn fold_reply(
    store: &mut ConversationStore,
    transport: &dyn ChatTransport,
    request: ChatRequest,
) -> Result<usize> {
    let Some(mut body) = transport.open_stream(request).await? else {
        tracing::debug!("response has no readable body");
        return Ok(0);
    };
    store.open_reply();

    let mut decoder = Utf8StreamDecoder::new();
    let mut accumulated = String::new();
    let mut chunks = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        chunks += 1;
        accumulated.push_str(&decoder.decode(&chunk));
        store.apply_chunk(&accumulated);
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        accumulated.push_str(&tail);
        store.apply_chunk(&accumulated);
    }
    Ok(chunks)
}
