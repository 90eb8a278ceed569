//! Filesystem artifact store.
//!
//! Layout per (engine, suite): `<base>/<engine>_<suite>/<task_id>/` holding
//! `task.json`, `scrape_output.json`, and `grader_output.json`, plus a
//! `<base>/results/<engine>_<suite>.json` summary. Every file is written
//! exactly once per run; `scrape_output.json` presence doubles as the resume
//! marker.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const TASK_FILE: &str = "task.json";
pub const SCRAPE_OUTPUT_FILE: &str = "scrape_output.json";
pub const GRADER_OUTPUT_FILE: &str = "grader_output.json";

/// Directory holding all artifacts for one engine+suite.
pub fn engine_dir(base: &Path, engine: &str, suite: &str) -> PathBuf {
    base.join(format!("{engine}_{suite}"))
}

/// Directory holding one task's artifacts.
pub fn task_dir(base: &Path, engine: &str, suite: &str, task_id: &str) -> PathBuf {
    engine_dir(base, engine, suite).join(task_id)
}

/// Path of the persisted summary for one engine+suite.
pub fn summary_path(base: &Path, engine: &str, suite: &str) -> PathBuf {
    base.join("results").join(format!("{engine}_{suite}.json"))
}

/// Serialize `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_vec_pretty(value).context("Failed to serialize artifact")?;
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("Malformed artifact {}", path.display()))
}

/// Prepare an output directory according to the rerun/resume flags.
///
/// A non-empty directory without either flag is a configuration error:
/// silently mixing two runs' artifacts would corrupt resume detection.
pub fn ensure_output_dir(dir: &Path, rerun: bool, resume: bool) -> Result<()> {
    if dir.exists() && dir.read_dir()?.next().is_some() {
        if rerun {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        } else if !resume {
            bail!(
                "Output directory '{}' is not empty. Use --rerun to recreate or --resume to continue.",
                dir.display()
            );
        }
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}
