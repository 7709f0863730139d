//! Mock HTTP client for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::Instant;

use super::traits::*;

#[derive(Debug, Clone)]
enum Route {
    Respond(HttpResponse),
    Fail(String),
}

/// One observed request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    /// Tokio instant, so paused-clock tests can assert on spacing.
    pub at: Instant,
}

/// Scripted client. Unknown URLs answer 404 with an empty body.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body`.
    pub fn with_response(self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.set_response(url, status, body);
        self
    }

    /// Fail every request to `url` with a transport error.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes
            .lock()
            .insert(url.into(), Route::Fail(message.into()));
        self
    }

    pub fn set_response(&self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .insert(url.into(), Route::Respond(HttpResponse::new(status, body)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of requests made to exactly `url`.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.url == url).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.calls.lock().push(RecordedCall {
            url: url.to_string(),
            at: Instant::now(),
        });

        let route = self.routes.lock().get(url).cloned();
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(message)) => Err(FetchError::Transport(message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}
