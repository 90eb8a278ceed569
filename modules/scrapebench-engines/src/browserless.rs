use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrapebench_common::{ContentFormat, EngineConfig, ScrapeOutput};
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::{EngineAdapter, SuspendingFetcher};

const ENGINE_NAME: &str = "browserless";

/// Remote headless browser via the Browserless `/content` endpoint.
///
/// Returns the fully rendered DOM, reduced to main-content markdown with
/// readability extraction so the score reflects what a reader would see, not
/// the page chrome.
pub struct BrowserlessFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

pub fn build(config: &EngineConfig) -> anyhow::Result<EngineAdapter> {
    let base_url = config
        .browserless_url
        .as_deref()
        .ok_or(EngineError::MissingConfig("BROWSERLESS_URL"))?;
    Ok(EngineAdapter::Suspending(Arc::new(BrowserlessFetcher::new(
        base_url,
        config.browserless_token.as_deref(),
    ))))
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Fetch fully-rendered HTML for a URL via the `/content` endpoint.
    async fn content(&self, url: &str) -> Result<(u16, String)> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({ "url": url });
        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
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
        Ok((status.as_u16(), resp.text().await?))
    }

    /// Readability extraction: rendered HTML down to main-content markdown.
    fn to_markdown(url: &str, html: &str) -> String {
        let parsed_url = url::Url::parse(url).ok();
        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };
        transform_content_input(input, &config)
    }
}

#[async_trait]
impl SuspendingFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        info!(url, scraper = ENGINE_NAME, "Fetching URL");
        match self.content(url).await {
            Ok((status, html)) => {
                let markdown = Self::to_markdown(url, &html);
                if markdown.trim().is_empty() {
                    warn!(
                        url,
                        scraper = ENGINE_NAME,
                        "Empty content after readability extraction"
                    );
                }
                ScrapeOutput::completed(
                    ENGINE_NAME,
                    url,
                    Some(status),
                    None,
                    ContentFormat::Markdown,
                    Some(markdown),
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
