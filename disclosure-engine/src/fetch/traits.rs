//! Core trait for outbound GET requests.

use async_trait::async_trait;

/// Error types for fetch operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request did not complete
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body could not be read
    #[error("Body error: {0}")]
    Body(String),
}

/// A completed response. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Asynchronous GET-only HTTP client.
///
/// No timeout is imposed here; a hung request resolves when the transport
/// itself gives up.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}
