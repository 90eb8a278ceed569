use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrapebench_common::{ContentFormat, EngineConfig, ScrapeOutput};
use tracing::{info, warn};

use crate::error::Result;
use crate::{EngineAdapter, SuspendingFetcher};

const ENGINE_NAME: &str = "http";

/// Plain HTTP GET with no rendering. The floor every other engine is
/// measured against: whatever the server sends on the wire, unmodified.
pub struct HttpFetcher {
    client: reqwest::Client,
}

pub fn build(_config: &EngineConfig) -> anyhow::Result<EngineAdapter> {
    Ok(EngineAdapter::Suspending(Arc::new(HttpFetcher::new())))
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<(u16, String)> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuspendingFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        info!(url, scraper = ENGINE_NAME, "Fetching URL");
        match self.get(url).await {
            Ok((status, body)) => {
                // Error statuses still carry whatever body the server sent.
                let error = (status >= 400).then(|| format!("HTTP {status}"));
                ScrapeOutput::completed(
                    ENGINE_NAME,
                    url,
                    Some(status),
                    error,
                    ContentFormat::Html,
                    Some(body),
                )
            }
            Err(e) => {
                warn!(url, scraper = ENGINE_NAME, error = %e, "Fetch failed");
                ScrapeOutput::failed(
                    ENGINE_NAME,
                    url,
                    ContentFormat::Html,
                    e.status_code(),
                    e.to_string(),
                )
            }
        }
    }

    fn name(&self) -> &str {
        ENGINE_NAME
    }
}
