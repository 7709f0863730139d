//! reqwest-backed client.

use async_trait::async_trait;
use reqwest::Client;

use super::traits::*;

pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("disclosure-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxies, cookies, custom TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::InvalidRequest(e.to_string())
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
