use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrapebench_common::{ContentFormat, EngineConfig, ScrapeOutput};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::{EngineAdapter, SuspendingFetcher};

const ENGINE_NAME: &str = "firecrawl";
const SCRAPE_ENDPOINT: &str = "https://api.firecrawl.dev/v2/scrape";

/// Firecrawl scrape API. Markdown output, caching disabled (`maxAge: 0`) so
/// every run measures a live fetch.
pub struct FirecrawlFetcher {
    client: reqwest::Client,
    api_key: String,
}

pub fn build(config: &EngineConfig) -> anyhow::Result<EngineAdapter> {
    let api_key = config
        .firecrawl_api_key
        .as_deref()
        .ok_or(EngineError::MissingConfig("FIRECRAWL_API_KEY"))?;
    Ok(EngineAdapter::Suspending(Arc::new(FirecrawlFetcher::new(
        api_key,
    ))))
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
    #[serde(rename = "maxAge")]
    max_age: u32,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    #[serde(rename = "statusCode", default)]
    status_code: Option<u16>,
    #[serde(default)]
    error: Option<String>,
}

impl FirecrawlFetcher {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    async fn scrape(&self, url: &str) -> Result<ScrapeResponse> {
        let resp = self
            .client
            .post(SCRAPE_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
                max_age: 0,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                message,
            });
        }
        resp.json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SuspendingFetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        info!(url, scraper = ENGINE_NAME, "Fetching URL");
        match self.scrape(url).await {
            Ok(resp) => {
                let data = resp.data.unwrap_or(ScrapeData {
                    markdown: None,
                    metadata: None,
                });
                // Upstream page status lives in the response metadata; a
                // missing value means the scrape itself succeeded.
                let status_code = data
                    .metadata
                    .as_ref()
                    .and_then(|m| m.status_code)
                    .unwrap_or(200);
                let error = data
                    .metadata
                    .as_ref()
                    .and_then(|m| m.error.clone())
                    .or(resp.error);
                ScrapeOutput::completed(
                    ENGINE_NAME,
                    url,
                    Some(status_code),
                    error,
                    ContentFormat::Markdown,
                    data.markdown,
                )
            }
            Err(e) => {
                warn!(url, scraper = ENGINE_NAME, error = %e, "Fetch failed");
                ScrapeOutput::failed(
                    ENGINE_NAME,
                    url,
                    ContentFormat::Markdown,
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
