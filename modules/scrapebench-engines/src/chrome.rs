use std::process::Command;
use std::sync::Arc;

use scrapebench_common::{ContentFormat, EngineConfig, ScrapeOutput};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::{BlockingFetcher, EngineAdapter};

const ENGINE_NAME: &str = "chrome";

/// Page-load budget handed to Chromium itself (milliseconds).
const PAGE_TIMEOUT_MS: u32 = 30_000;

/// Local headless Chromium via `--dump-dom`: full JS rendering without a
/// remote service. The browser process is driven synchronously, so this
/// engine exercises the sequential (blocking) dispatch path.
pub struct ChromeFetcher {
    chrome_bin: String,
}

pub fn build(config: &EngineConfig) -> anyhow::Result<EngineAdapter> {
    let chrome_bin = config
        .chrome_bin
        .clone()
        .unwrap_or_else(|| "chromium".to_string());
    Ok(EngineAdapter::Blocking(Arc::new(ChromeFetcher {
        chrome_bin,
    })))
}

impl ChromeFetcher {
    /// Launch Chromium `--dump-dom` and return the serialized DOM.
    fn dump_dom(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).map_err(|e| EngineError::Parse(format!("Invalid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EngineError::Parse(format!(
                "Only http/https URLs are allowed, got: {}",
                parsed.scheme()
            )));
        }

        // Fresh profile per fetch: no cache or cookie reuse between tasks.
        let tmp_dir = tempfile::tempdir()
            .map_err(|e| EngineError::Process(format!("Failed to create temp profile dir: {e}")))?;

        let output = Command::new(&self.chrome_bin)
            .args([
                "--headless",
                "--no-sandbox",
                "--disable-gpu",
                "--disable-dev-shm-usage",
                &format!("--user-data-dir={}", tmp_dir.path().display()),
                &format!("--timeout={PAGE_TIMEOUT_MS}"),
                "--dump-dom",
                url,
            ])
            .output()
            .map_err(|e| EngineError::Process(format!("Failed to run Chrome: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Process(format!(
                "Chrome exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl BlockingFetcher for ChromeFetcher {
    fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        info!(url, scraper = ENGINE_NAME, "Fetching URL");
        match self.dump_dom(url) {
            Ok(html) if html.trim().is_empty() => {
                warn!(url, scraper = ENGINE_NAME, "Empty DOM output");
                ScrapeOutput::failed(
                    ENGINE_NAME,
                    url,
                    ContentFormat::Html,
                    500,
                    "Empty DOM output".to_string(),
                )
            }
            // --dump-dom carries no HTTP status; a rendered DOM means the
            // navigation completed.
            Ok(html) => ScrapeOutput::completed(
                ENGINE_NAME,
                url,
                Some(200),
                None,
                ContentFormat::Html,
                Some(html),
            ),
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
