//! Engine adapters: the pluggable web-content-retrieval backends under
//! benchmark, plus the registry that names them.
//!
//! An adapter's calling convention (blocking vs cooperatively suspending) is
//! fixed at registration time through the two trait variants below; nothing
//! probes it at runtime. Adapters own their error handling: a fetch always
//! returns a `ScrapeOutput`, with internal failures encoded into its `error`
//! and `status_code` fields.

pub mod browserless;
pub mod chrome;
pub mod error;
pub mod firecrawl;
pub mod http;
pub mod registry;
pub mod tavily;

pub use error::{EngineError, Result};
pub use registry::EngineRegistry;

use std::sync::Arc;

use async_trait::async_trait;
use scrapebench_common::ScrapeOutput;

/// An adapter whose fetch suspends cooperatively (async I/O).
#[async_trait]
pub trait SuspendingFetcher: Send + Sync {
    async fn fetch(&self, url: &str, run_id: &str) -> ScrapeOutput;
    fn name(&self) -> &str;
}

/// An adapter whose fetch blocks the calling thread (subprocess drivers,
/// synchronous SDKs).
pub trait BlockingFetcher: Send + Sync {
    fn fetch(&self, url: &str, run_id: &str) -> ScrapeOutput;
    fn name(&self) -> &str;
}

/// One registered engine. The variant decides how the dispatcher schedules
/// its fetches: suspending adapters fan out under a concurrency gate,
/// blocking adapters run strictly sequentially.
#[derive(Clone)]
pub enum EngineAdapter {
    Suspending(Arc<dyn SuspendingFetcher>),
    Blocking(Arc<dyn BlockingFetcher>),
}

impl std::fmt::Debug for EngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineAdapter::Suspending(fetcher) => {
                f.debug_tuple("Suspending").field(&fetcher.name()).finish()
            }
            EngineAdapter::Blocking(fetcher) => {
                f.debug_tuple("Blocking").field(&fetcher.name()).finish()
            }
        }
    }
}

impl EngineAdapter {
    pub fn name(&self) -> &str {
        match self {
            EngineAdapter::Suspending(fetcher) => fetcher.name(),
            EngineAdapter::Blocking(fetcher) => fetcher.name(),
        }
    }
}
