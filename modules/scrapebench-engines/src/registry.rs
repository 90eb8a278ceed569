use std::collections::BTreeMap;

use anyhow::{bail, Result};
use scrapebench_common::EngineConfig;

use crate::{browserless, chrome, firecrawl, http, tavily, EngineAdapter};

type Constructor = fn(&EngineConfig) -> Result<EngineAdapter>;

/// Explicit map from engine name to constructor, populated at startup.
///
/// This is the listing capability the run coordinator fans out over.
/// Construction fails fast when an engine's configuration is missing, so one
/// unconfigured engine never stalls a batch mid-run.
pub struct EngineRegistry {
    engines: BTreeMap<&'static str, Constructor>,
}

impl EngineRegistry {
    /// The standard roster.
    pub fn standard() -> Self {
        let mut engines: BTreeMap<&'static str, Constructor> = BTreeMap::new();
        engines.insert("browserless", browserless::build);
        engines.insert("chrome", chrome::build);
        engines.insert("firecrawl", firecrawl::build);
        engines.insert("http", http::build);
        engines.insert("tavily", tavily::build);
        Self { engines }
    }

    /// Registered engine names in stable (sorted) order.
    pub fn names(&self) -> Vec<&'static str> {
        self.engines.keys().copied().collect()
    }

    /// Construct the named engine.
    pub fn build(&self, name: &str, config: &EngineConfig) -> Result<EngineAdapter> {
        match self.engines.get(name) {
            Some(constructor) => constructor(config),
            None => bail!("Unknown engine: {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sorted_and_stable() {
        let registry = EngineRegistry::standard();
        assert_eq!(
            registry.names(),
            vec!["browserless", "chrome", "firecrawl", "http", "tavily"]
        );
    }

    #[test]
    fn unknown_engine_is_an_error() {
        let registry = EngineRegistry::standard();
        let err = registry
            .build("teleporter", &EngineConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Unknown engine"));
    }

    #[test]
    fn keyless_engines_build_from_empty_config() {
        let registry = EngineRegistry::standard();
        let config = EngineConfig::default();
        assert!(registry.build("http", &config).is_ok());
        assert!(registry.build("chrome", &config).is_ok());
    }

    #[test]
    fn keyed_engines_fail_without_credentials() {
        let registry = EngineRegistry::standard();
        let config = EngineConfig::default();
        assert!(registry.build("firecrawl", &config).is_err());
        assert!(registry.build("tavily", &config).is_err());
        assert!(registry.build("browserless", &config).is_err());
    }
}
