use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Url};
use tracing::{debug, info, warn};

use super::traits::{BciTransport, TransportResponse};

/// reqwest-backed transport talking JSON to the BCI bridge server.
pub struct HttpTransport {
    client: Client,
    base_url: RwLock<Url>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: RwLock::new(parse_base_url(base_url)?),
        })
    }

    /// Point the transport at a different server (e.g. after the user edits the address).
    pub fn update_base_url(&self, new_url: &str) -> Result<()> {
        let parsed = parse_base_url(new_url)?;
        info!("bci server origin changed to {}", parsed);
        *self.base_url.write() = parsed;
        Ok(())
    }

    pub fn base_url(&self) -> String {
        self.base_url.read().to_string()
    }

    fn build_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .read()
            .join(path.trim_start_matches('/'))
            .map_err(|e| anyhow!("invalid endpoint path {}: {}", path, e))?;
        Ok(self
            .client
            .request(method, url)
            .header("Accept", "application/json"))
    }

    async fn send(&self, method: Method, path: &str) -> Result<TransportResponse> {
        let resp = self.build_request(method.clone(), path)?.send().await?;

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            debug!("bci {} {} status={}", method, path, status);
        } else {
            warn!("bci {} {} failed status={}", method, path, status);
        }

        let body = resp.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Parse an origin and make sure it ends with `/` so relative joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("bci server url is empty"));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|e| anyhow!("invalid bci server url: {}", e))?;
    if url.host_str().is_none() {
        return Err(anyhow!("bci server url has no host"));
    }
    Ok(url)
}

#[async_trait]
impl BciTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse> {
        self.send(Method::GET, path).await
    }

    async fn post(&self, path: &str) -> Result<TransportResponse> {
        self.send(Method::POST, path).await
    }

    fn set_base_url(&self, url: &str) -> Result<()> {
        self.update_base_url(url)
    }
}
