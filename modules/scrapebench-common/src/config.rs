use std::env;

use tracing::info;

/// Engine credentials and endpoints, loaded from environment variables.
///
/// All fields are optional on purpose: a missing key only disables the
/// engines that need it. The registry fails constructing those engines; the
/// rest of the roster still runs.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub firecrawl_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub chrome_bin: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            firecrawl_api_key: optional_env("FIRECRAWL_API_KEY"),
            tavily_api_key: optional_env("TAVILY_API_KEY"),
            browserless_url: optional_env("BROWSERLESS_URL"),
            browserless_token: optional_env("BROWSERLESS_TOKEN"),
            chrome_bin: optional_env("CHROME_BIN"),
        }
    }

    /// Log which credentials are present without leaking their values.
    pub fn log_redacted(&self) {
        info!(
            firecrawl = self.firecrawl_api_key.is_some(),
            tavily = self.tavily_api_key.is_some(),
            browserless = self.browserless_url.is_some(),
            chrome_bin = self.chrome_bin.as_deref().unwrap_or("chromium"),
            "Engine configuration loaded"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
