// SPDX-License-Identifier: PMPL-1.0-or-later

//! Multi-prover verification with majority-vote aggregation
//!
//! Every configured prover checks the same statement once. Provers that
//! timed out, failed or are not installed do not vote; among the rest a
//! strict majority of "valid" votes decides.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CachedResult, ProofCache};
use crate::core::Formula;
use crate::provers::{ProofOutcome, ProofResult, ProverAdapter};

/// Per-prover verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    Timeout,
    Error,
    /// Configured but not installed
    Unavailable,
}

/// One prover's verdict on a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProverVerificationResult {
    pub prover: String,
    pub status: VerificationStatus,
    pub is_valid: bool,
    pub confidence: f64,
    pub proof_time: Duration,
    pub message: Option<String>,
}

impl ProverVerificationResult {
    pub fn from_proof(prover: impl Into<String>, result: &ProofResult) -> Self {
        let (status, message) = match &result.outcome {
            ProofOutcome::Proved { .. } => (VerificationStatus::Valid, None),
            ProofOutcome::Disproved { .. } => (VerificationStatus::Invalid, None),
            ProofOutcome::TimedOut => (VerificationStatus::Timeout, Some("timeout".to_string())),
            ProofOutcome::Errored { message } => (VerificationStatus::Error, Some(message.clone())),
        };
        ProverVerificationResult {
            prover: prover.into(),
            status,
            is_valid: result.is_proved(),
            confidence: result.confidence(),
            proof_time: result.proof_time,
            message,
        }
    }

    pub fn error(prover: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failed(prover, VerificationStatus::Error, message)
    }

    pub fn unavailable(prover: impl Into<String>) -> Self {
        Self::failed(prover, VerificationStatus::Unavailable, "prover not installed")
    }

    fn failed(
        prover: impl Into<String>,
        status: VerificationStatus,
        message: impl Into<String>,
    ) -> Self {
        ProverVerificationResult {
            prover: prover.into(),
            status,
            is_valid: false,
            confidence: 0.0,
            proof_time: Duration::ZERO,
            message: Some(message.into()),
        }
    }

    /// Whether this verdict takes part in the vote
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            VerificationStatus::Valid | VerificationStatus::Invalid
        )
    }
}

/// Majority-vote verdict over several provers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedProverResult {
    pub statement: String,
    pub overall_valid: bool,
    /// Mean confidence of the provers voting valid
    pub confidence: f64,
    /// Fraction of voting provers that voted valid
    pub agreement_rate: f64,
    pub verified_by: Vec<String>,
    pub results: Vec<ProverVerificationResult>,
}

impl AggregatedProverResult {
    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_successful()).count()
    }
}

/// Combine per-prover verdicts; a 50% tie is not a majority
pub fn aggregate(statement: &str, results: Vec<ProverVerificationResult>) -> AggregatedProverResult {
    let successful: Vec<&ProverVerificationResult> =
        results.iter().filter(|r| r.is_successful()).collect();
    let valid: Vec<&ProverVerificationResult> =
        successful.iter().copied().filter(|r| r.is_valid).collect();

    let (overall_valid, confidence, agreement_rate) = if successful.is_empty() {
        (false, 0.0, 0.0)
    } else {
        let rate = valid.len() as f64 / successful.len() as f64;
        let confidence = if valid.is_empty() {
            0.0
        } else {
            valid.iter().map(|r| r.confidence).sum::<f64>() / valid.len() as f64
        };
        (rate > 0.5, confidence, rate)
    };

    let verified_by = valid.iter().map(|r| r.prover.clone()).collect();
    AggregatedProverResult {
        statement: statement.to_string(),
        overall_valid,
        confidence,
        agreement_rate,
        verified_by,
        results,
    }
}

/// Integration adapter options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Prover names consulted for every statement
    pub provers: Vec<String>,
    /// Per-prover timeout when a call passes none
    pub timeout_secs: u64,
    pub use_cache: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        IntegrationConfig {
            provers: ["z3", "cvc5", "lean", "coq", "native", "symbolicai"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 30,
            use_cache: true,
        }
    }
}

/// Runs every configured prover on a statement and aggregates the votes
pub struct ProverIntegrationAdapter {
    config: IntegrationConfig,
    adapters: Vec<(String, Option<Arc<dyn ProverAdapter>>)>,
    cache: Option<Arc<dyn ProofCache>>,
}

impl ProverIntegrationAdapter {
    /// Match configured names against the available adapters.
    ///
    /// Names with no adapter are kept and reported as unavailable.
    pub fn new(
        config: IntegrationConfig,
        available: &[Arc<dyn ProverAdapter>],
        cache: Option<Arc<dyn ProofCache>>,
    ) -> Self {
        let adapters = config
            .provers
            .iter()
            .map(|name| {
                let adapter = available.iter().find(|a| a.name() == *name).cloned();
                (name.clone(), adapter)
            })
            .collect();
        let cache = if config.use_cache { cache } else { None };
        ProverIntegrationAdapter {
            config,
            adapters,
            cache,
        }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Names that have an adapter behind them
    pub fn available_provers(&self) -> Vec<String> {
        self.adapters
            .iter()
            .filter(|(_, adapter)| adapter.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn cache_key(statement: &Formula) -> CacheKey {
        CacheKey::derive(statement, &[], "aggregate", &BTreeMap::new())
    }

    /// Verify one statement with every configured prover
    pub async fn verify_statement(
        &self,
        statement: &Formula,
        timeout: Option<Duration>,
    ) -> AggregatedProverResult {
        let key = Self::cache_key(statement);
        if let Some(cache) = &self.cache {
            if let Some(CachedResult::Aggregate(result)) = cache.get_key(&key) {
                debug!("Aggregate cache hit for {}", statement);
                return result;
            }
        }

        let timeout = Some(timeout.unwrap_or(Duration::from_secs(self.config.timeout_secs)));
        let attempts = self.adapters.iter().map(|(name, adapter)| async move {
            let Some(adapter) = adapter else {
                return ProverVerificationResult::unavailable(name.clone());
            };
            match adapter.prove(statement, &[], timeout).await {
                Ok(result) => ProverVerificationResult::from_proof(name.clone(), &result),
                Err(e) => {
                    warn!("Prover {} failed on {}: {:#}", name, statement, e);
                    ProverVerificationResult::error(name.clone(), format!("{:#}", e))
                }
            }
        });
        let results = join_all(attempts).await;

        let aggregated = aggregate(&statement.canonical(), results);
        info!(
            "Verified {}: valid={}, confidence={:.2}, agreement={:.2}, verified_by={:?}",
            statement,
            aggregated.overall_valid,
            aggregated.confidence,
            aggregated.agreement_rate,
            aggregated.verified_by
        );

        if let Some(cache) = &self.cache {
            if aggregated.successful_count() > 0 {
                cache.set_key(key, CachedResult::Aggregate(aggregated.clone()));
            }
        }
        aggregated
    }

    /// Verify statements one after another
    pub async fn verify_statements(
        &self,
        statements: &[Formula],
        timeout: Option<Duration>,
    ) -> Vec<AggregatedProverResult> {
        let mut results = Vec::with_capacity(statements.len());
        for statement in statements {
            results.push(self.verify_statement(statement, timeout).await);
        }
        results
    }
}

/// Scores statements for optimisation loops from aggregated verdicts
pub struct LogicCritic {
    adapter: ProverIntegrationAdapter,
}

impl LogicCritic {
    pub fn new(adapter: ProverIntegrationAdapter) -> Self {
        LogicCritic { adapter }
    }

    /// `confidence × agreement_rate` for a valid verdict, else 0.0
    pub fn score(result: &AggregatedProverResult) -> f64 {
        if result.overall_valid {
            (result.confidence * result.agreement_rate).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Verify `statement` and score it
    pub async fn evaluate(
        &self,
        statement: &Formula,
        timeout: Option<Duration>,
    ) -> (f64, AggregatedProverResult) {
        let result = self.adapter.verify_statement(statement, timeout).await;
        (Self::score(&result), result)
    }
}
