// src/ingest/transport.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Raw GET seam between the fetcher and the network. Non-2xx responses are errors.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed transport with a hard per-request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "http client builder failed; using defaults");
                Client::new()
            });
        Self { client }
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {url}: bad status"))?;
        resp.text()
            .await
            .with_context(|| format!("GET {url}: reading body"))
    }
}
