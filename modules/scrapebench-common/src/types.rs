use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One benchmark case: a URL plus expected ("truth") and decoy ("lie")
/// reference text. Immutable once loaded from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub url: String,
    pub truth_text: String,
    pub lie_text: String,
}

/// Format an engine reports for its content. Markdown gets normalized before
/// scoring; HTML and text are scored as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Html,
    Markdown,
    Text,
}

/// Raw output of one engine fetch.
///
/// Written exactly once per (engine, suite, task) and never mutated; the
/// presence of its artifact file on disk is the sole resume marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub scraper: String,
    pub url: String,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub created_at: Option<String>,
    pub format: Option<ContentFormat>,
    pub content_size: Option<u64>,
    pub content: Option<String>,
}

impl ScrapeOutput {
    /// Build the output for a completed fetch. Empty content collapses to
    /// `None`, and `content_size` always tracks the UTF-8 byte length of
    /// `content` (0 when absent).
    pub fn completed(
        scraper: &str,
        url: &str,
        status_code: Option<u16>,
        error: Option<String>,
        format: ContentFormat,
        content: Option<String>,
    ) -> Self {
        let content = content.filter(|c| !c.is_empty());
        let content_size = content.as_ref().map(|c| c.len() as u64).unwrap_or(0);
        Self {
            scraper: scraper.to_string(),
            url: url.to_string(),
            status_code,
            error,
            created_at: Some(Utc::now().to_rfc3339()),
            format: Some(format),
            content_size: Some(content_size),
            content,
        }
    }

    /// Build the output for a fetch that failed inside the adapter. Adapters
    /// encode their own errors this way rather than propagating them.
    pub fn failed(
        scraper: &str,
        url: &str,
        format: ContentFormat,
        status_code: u16,
        error: String,
    ) -> Self {
        Self::completed(scraper, url, Some(status_code), Some(error), format, None)
    }
}

/// Deterministic score for one (task, scrape output) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub success: bool,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
}

/// The unit returned by a completed suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: Task,
    pub scrape_output: ScrapeOutput,
    pub analyzer_result: AnalyzerResult,
}

/// Aggregate metrics over all analyzed tasks for one engine+suite. An empty
/// result set summarizes to all zeros, not an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub success_rate: f64,
    pub avg_recall: f64,
    pub avg_precision: f64,
    pub avg_f1: f64,
}
