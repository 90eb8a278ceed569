use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Task;

#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(default)]
    id: String,
    url: String,
    #[serde(default)]
    truth_text: String,
    #[serde(default)]
    lie_text: String,
}

/// Load benchmark tasks from a CSV dataset with columns
/// `id,url,truth_text,lie_text`.
///
/// A blank `id` falls back to the row's ordinal position. URL and reference
/// text are trimmed of surrounding whitespace. `limit` truncates the dataset
/// to a prefix (dry-run mode).
pub fn load_tasks(path: &Path, limit: Option<usize>) -> Result<Vec<Task>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;

    let mut tasks = Vec::new();
    for (i, row) in reader.deserialize::<DatasetRow>().enumerate() {
        if let Some(limit) = limit {
            if i >= limit {
                break;
            }
        }
        let row = row.with_context(|| format!("Malformed dataset row {i}"))?;
        let id = row.id.trim();
        tasks.push(Task {
            id: if id.is_empty() {
                i.to_string()
            } else {
                id.to_string()
            },
            url: row.url.trim().to_string(),
            truth_text: row.truth_text.trim().to_string(),
            lie_text: row.lie_text.trim().to_string(),
        });
    }
    Ok(tasks)
}
