use crate::config::Config;
use crate::types::ChatRequest;
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Seam between the reply reducer and the network.
pub trait ChatTransport: Send + Sync {
    /// Sends `request` and resolves once response headers arrive.
    ///
    /// `Ok(None)` means the response carried no readable body. Error statuses
    /// still resolve to their body.
    fn open_stream(&self, request: ChatRequest) -> BoxFuture<'_, Result<Option<ByteStream>>>;
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    chat_url: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            chat_url: config.chat_url(),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub async fn create_stream(&self, request: &ChatRequest) -> Result<Option<ByteStream>> {
        let request_url = self.chat_url.clone();
        tracing::debug!(
            target: "chat::payload",
            url = %request_url,
            payload = %payload_for_log(request),
            "sending chat request"
        );

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %request_url, %status, "chat endpoint returned an error status");
        }
        if !has_readable_body(status) {
            tracing::debug!(url = %request_url, %status, "chat response has no body");
            return Ok(None);
        }

        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_request_error(error, &request_url))
        });
        Ok(Some(Box::pin(stream)))
    }
}

impl ChatTransport for ChatClient {
    fn open_stream(&self, request: ChatRequest) -> BoxFuture<'_, Result<Option<ByteStream>>> {
        Box::pin(async move { self.create_stream(&request).await })
    }
}

/// Null-body statuses. Any other response streams, even when empty.
fn has_readable_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

fn payload_for_log(request: &ChatRequest) -> String {
    serde_json::to_string(request).unwrap_or_else(|_| "<payload serialization error>".to_string())
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local chat endpoint '{}': {}. Start your local server or update CHAT_API_BASE_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach chat endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("chat request to '{}' timed out: {}", request_url, error);
    }
    anyhow!("chat request to '{}' failed: {}", request_url, error)
}
