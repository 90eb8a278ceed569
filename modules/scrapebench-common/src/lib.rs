//! Shared data model, dataset loading, artifact store, and engine
//! configuration for the scrapebench workspace.

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod types;

pub use config::EngineConfig;
pub use types::{AnalyzerResult, ContentFormat, ScrapeOutput, Summary, Task, TaskResult};
