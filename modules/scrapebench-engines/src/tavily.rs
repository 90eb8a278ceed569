use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrapebench_common::{ContentFormat, EngineConfig, ScrapeOutput};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::{EngineAdapter, SuspendingFetcher};

const ENGINE_NAME: &str = "tavily";
const EXTRACT_ENDPOINT: &str = "https://api.tavily.com/extract";

/// Tavily extract API. Returns the extractor's raw text for the page.
pub struct TavilyFetcher {
    client: reqwest::Client,
    api_key: String,
}

pub fn build(config: &EngineConfig) -> anyhow::Result<EngineAdapter> {
    let api_key = config
        .tavily_api_key
        .as_deref()
        .ok_or(EngineError::MissingConfig("TAVILY_API_KEY"))?;
    Ok(EngineAdapter::Suspending(Arc::new(TavilyFetcher::new(
        api_key,
    ))))
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractResult>,
    #[serde(default)]
    failed_results: Vec<FailedResult>,
}

#[derive(Debug, Deserialize)]
struct ExtractResult {
    #[serde(default)]
    raw_content: String,
}

#[derive(Debug, Deserialize)]
struct FailedResult {
    #[serde(default)]
    error: Option<String>,
}

impl TavilyFetcher {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    async fn extract(&self, url: &str) -> Result<ExtractResponse> {
        let body = serde_json::json!({ "urls": [url] });
        let resp = self
            .client
            .post(EXTRACT_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
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
impl SuspendingFetcher for TavilyFetcher {
    async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        info!(url, scraper = ENGINE_NAME, "Fetching URL");
        match self.extract(url).await {
            Ok(resp) => {
                if let Some(result) = resp.results.into_iter().next() {
                    ScrapeOutput::completed(
                        ENGINE_NAME,
                        url,
                        Some(200),
                        None,
                        ContentFormat::Text,
                        Some(result.raw_content),
                    )
                } else {
                    // The API reports per-URL failures in a separate list.
                    let error = resp
                        .failed_results
                        .into_iter()
                        .next()
                        .and_then(|f| f.error)
                        .unwrap_or_else(|| "Extraction returned no results".to_string());
                    ScrapeOutput::failed(ENGINE_NAME, url, ContentFormat::Text, 500, error)
                }
            }
            Err(e) => {
                warn!(url, scraper = ENGINE_NAME, error = %e, "Fetch failed");
                ScrapeOutput::failed(
                    ENGINE_NAME,
                    url,
                    ContentFormat::Text,
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
