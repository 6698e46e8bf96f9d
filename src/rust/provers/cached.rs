// SPDX-License-Identifier: PMPL-1.0-or-later

//! Cache-consulting adapter decorator

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ProofResult, ProverAdapter, ProverKind};
use crate::cache::{CachedResult, ProofCache};
use crate::core::Formula;

/// Wraps an adapter so conclusive results are served from a shared cache.
///
/// Timeouts and errors are never stored; the next call retries the backend.
pub struct CachedProver<A: ?Sized> {
    inner: Arc<A>,
    cache: Arc<dyn ProofCache>,
}

impl<A: ProverAdapter + ?Sized> CachedProver<A> {
    pub fn new(inner: Arc<A>, cache: Arc<dyn ProofCache>) -> Self {
        CachedProver { inner, cache }
    }

    pub fn inner(&self) -> &Arc<A> {
        &self.inner
    }
}

#[async_trait]
impl<A: ProverAdapter + ?Sized> ProverAdapter for CachedProver<A> {
    fn kind(&self) -> ProverKind {
        self.inner.kind()
    }

    fn name(&self) -> String {
        self.inner.name()
    }

    fn config_items(&self) -> BTreeMap<String, String> {
        self.inner.config_items()
    }

    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<ProofResult> {
        let name = self.inner.name();
        let config = self.inner.config_items();

        if let Some(CachedResult::Proof(result)) = self.cache.get(formula, axioms, &name, &config) {
            debug!("Cache hit for {} on {}", name, formula);
            return Ok(result);
        }

        let result = self.inner.prove(formula, axioms, timeout).await?;
        if result.is_conclusive() {
            self.cache.set(
                formula,
                CachedResult::Proof(result.clone()),
                axioms,
                &name,
                &config,
            );
        }
        Ok(result)
    }
}
