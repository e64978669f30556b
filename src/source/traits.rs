use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Raw answer from the BCI server: status code plus the undecoded body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| anyhow!("malformed body (HTTP {}): {}", self.status, e))
    }
}

/// Request/response channel to the BCI server. Paths are relative to the
/// server origin and start with `/`.
#[async_trait]
pub trait BciTransport: Send + Sync {
    async fn get(&self, path: &str) -> Result<TransportResponse>;
    async fn post(&self, path: &str) -> Result<TransportResponse>;

    /// Point subsequent requests at a different server origin.
    fn set_base_url(&self, _url: &str) -> Result<()> {
        Err(anyhow!("transport does not support changing the server address"))
    }
}
