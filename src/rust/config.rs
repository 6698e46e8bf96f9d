// SPDX-License-Identifier: PMPL-1.0-or-later

//! TOML configuration for every component
//!
//! ```toml
//! [router]
//! enable_lean = false
//! default_strategy = "sequential"
//!
//! [hybrid]
//! strategy = "parallel"
//! neural_weight = 0.3
//! symbolic_weight = 0.7
//!
//! [cache]
//! maxsize = 500
//! ttl_secs = 3600
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::InMemoryProofCache;
use crate::error::{Error, Result};
use crate::hybrid::{normalize_weights, HybridConfig};
use crate::integration::IntegrationConfig;
use crate::provers::NeuralConfig;
use crate::router::RouterConfig;

/// Proof cache sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub maxsize: usize,
    /// Entry lifetime; absent means entries never expire
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            maxsize: InMemoryProofCache::DEFAULT_MAXSIZE,
            ttl_secs: None,
        }
    }
}

impl CacheConfig {
    pub fn build(&self) -> Arc<InMemoryProofCache> {
        Arc::new(InMemoryProofCache::new(
            self.maxsize,
            self.ttl_secs.map(Duration::from_secs),
        ))
    }
}

/// Whole-crate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub router: RouterConfig,
    pub hybrid: HybridConfig,
    pub integration: IntegrationConfig,
    pub cache: CacheConfig,
    /// Neural prover service; absent disables the neural adapter
    pub neural: Option<NeuralConfig>,
}

impl CoreConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        normalize_weights(self.hybrid.neural_weight, self.hybrid.symbolic_weight)?;
        if self.cache.maxsize == 0 {
            return Err(Error::Config("cache.maxsize must be at least 1".to_string()));
        }
        if let Some(neural) = &self.neural {
            if neural.api_url.trim().is_empty() {
                return Err(Error::Config("neural.api_url must not be empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
