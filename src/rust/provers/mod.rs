// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prover adapters
//!
//! Every backend, symbolic or neural, sits behind [`ProverAdapter`]: one
//! async `prove` call that takes a formula, optional axioms and an optional
//! time limit, and answers with a [`ProofResult`]. Timeouts are an outcome,
//! not an error; `Err` is reserved for the adapter itself failing (process
//! spawn errors, transport errors, malformed responses).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::Formula;

pub mod cached;
pub mod native;
pub mod neural;
pub mod smt;

pub use cached::CachedProver;
pub use native::NativeProver;
pub use neural::{NeuralConfig, NeuralProver};
pub use smt::{SmtDialect, SmtProver};

/// Enumeration of known prover backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProverKind {
    Z3,
    Cvc5,
    Lean,
    Coq,
    SymbolicAi,
    Native,
    /// Similarity lookup over previously verified formulas
    Embeddings,
}

impl std::str::FromStr for ProverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(ProverKind::Z3),
            "cvc5" => Ok(ProverKind::Cvc5),
            "lean" | "lean4" => Ok(ProverKind::Lean),
            "coq" => Ok(ProverKind::Coq),
            "symbolicai" | "symbolic_ai" | "llm" | "neural" => Ok(ProverKind::SymbolicAi),
            "native" | "tdfol" => Ok(ProverKind::Native),
            "embeddings" | "embedding" => Ok(ProverKind::Embeddings),
            _ => Err(anyhow::anyhow!("Unknown prover: {}", s)),
        }
    }
}

impl std::fmt::Display for ProverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProverKind::Z3 => "z3",
            ProverKind::Cvc5 => "cvc5",
            ProverKind::Lean => "lean",
            ProverKind::Coq => "coq",
            ProverKind::SymbolicAi => "symbolicai",
            ProverKind::Native => "native",
            ProverKind::Embeddings => "embeddings",
        };
        write!(f, "{}", name)
    }
}

impl ProverKind {
    /// The six backends carried in the analyzer's profile table
    pub fn profiled() -> Vec<ProverKind> {
        vec![
            ProverKind::Z3,
            ProverKind::Cvc5,
            ProverKind::Lean,
            ProverKind::Coq,
            ProverKind::SymbolicAi,
            ProverKind::Native,
        ]
    }
}

/// Outcome of a single proof attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProofOutcome {
    /// The formula follows from the axioms
    Proved {
        confidence: f64,
        artifact: Option<String>,
    },
    /// The formula does not follow
    Disproved {
        confidence: f64,
        counterexample: Option<String>,
    },
    /// The adapter gave up at its time limit
    TimedOut,
    /// The backend answered but could not decide (unknown, unsupported input)
    Errored { message: String },
}

/// Result of a single proof attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResult {
    /// Which prover produced this result
    pub prover: ProverKind,
    pub outcome: ProofOutcome,
    pub proof_time: Duration,
    /// Human-readable reason
    pub reason: String,
    /// Backend detail (solver version, LLM model)
    pub backend: Option<String>,
}

/// Clamp to [0, 1]; NaN counts as no confidence
fn unit_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

impl ProofResult {
    /// A proof. Zero (or NaN) confidence is contradictory and yields
    /// `Errored("inconsistent response")` instead.
    pub fn proved(prover: ProverKind, confidence: f64, proof_time: Duration) -> Self {
        let confidence = unit_confidence(confidence);
        if confidence == 0.0 {
            return Self::errored(prover, "inconsistent response", proof_time);
        }
        ProofResult {
            prover,
            outcome: ProofOutcome::Proved {
                confidence,
                artifact: None,
            },
            proof_time,
            reason: "Proved".to_string(),
            backend: None,
        }
    }

    pub fn disproved(prover: ProverKind, confidence: f64, proof_time: Duration) -> Self {
        ProofResult {
            prover,
            outcome: ProofOutcome::Disproved {
                confidence: unit_confidence(confidence),
                counterexample: None,
            },
            proof_time,
            reason: "Disproved".to_string(),
            backend: None,
        }
    }

    pub fn timed_out(prover: ProverKind, proof_time: Duration) -> Self {
        ProofResult {
            prover,
            outcome: ProofOutcome::TimedOut,
            proof_time,
            reason: "timeout".to_string(),
            backend: None,
        }
    }

    pub fn errored(prover: ProverKind, message: impl Into<String>, proof_time: Duration) -> Self {
        let message = message.into();
        ProofResult {
            prover,
            outcome: ProofOutcome::Errored {
                message: message.clone(),
            },
            proof_time,
            reason: message,
            backend: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Attach a proof script / model / counterexample to a decided outcome
    pub fn with_artifact(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        match &mut self.outcome {
            ProofOutcome::Proved { artifact, .. } => *artifact = Some(text),
            ProofOutcome::Disproved { counterexample, .. } => *counterexample = Some(text),
            ProofOutcome::TimedOut | ProofOutcome::Errored { .. } => {}
        }
        self
    }

    pub fn is_proved(&self) -> bool {
        matches!(self.outcome, ProofOutcome::Proved { .. })
    }

    /// Alias kept for callers that think in terms of validity
    pub fn is_valid(&self) -> bool {
        self.is_proved()
    }

    /// Whether the backend reached a verdict
    pub fn is_conclusive(&self) -> bool {
        matches!(
            self.outcome,
            ProofOutcome::Proved { .. } | ProofOutcome::Disproved { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.outcome, ProofOutcome::TimedOut)
    }

    /// Confidence in the verdict; 0.0 when there is none
    pub fn confidence(&self) -> f64 {
        match self.outcome {
            ProofOutcome::Proved { confidence, .. } | ProofOutcome::Disproved { confidence, .. } => {
                confidence
            }
            ProofOutcome::TimedOut | ProofOutcome::Errored { .. } => 0.0,
        }
    }
}

/// Configuration for a subprocess prover backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Path to prover executable
    pub executable: PathBuf,

    /// Additional arguments
    pub args: Vec<String>,

    /// Timeout in seconds, used when a call passes none
    pub timeout: u64,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            executable: PathBuf::new(),
            args: vec![],
            timeout: 30,
        }
    }
}

/// Uniform interface over theorem-proving backends
#[async_trait]
pub trait ProverAdapter: Send + Sync {
    /// Get prover kind
    fn kind(&self) -> ProverKind;

    /// Display name; defaults to the kind's identifier
    fn name(&self) -> String {
        self.kind().to_string()
    }

    /// Configuration items that influence results (part of cache keys)
    fn config_items(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Attempt to prove `formula` from `axioms` within `timeout`
    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> anyhow::Result<ProofResult>;
}

/// Factory for the built-in adapters
pub struct ProverFactory;

impl ProverFactory {
    /// Create the built-in adapter for `kind` if its backend is reachable.
    ///
    /// Returns `None` when there is no built-in adapter (Lean, Coq) or the
    /// solver binary is not installed; an absent backend is not an error.
    pub fn detect(
        kind: ProverKind,
        neural: Option<&NeuralConfig>,
    ) -> anyhow::Result<Option<Arc<dyn ProverAdapter>>> {
        let adapter: Option<Arc<dyn ProverAdapter>> = match kind {
            ProverKind::Z3 => SmtProver::detect(SmtDialect::Z3)
                .map(|p| Arc::new(p) as Arc<dyn ProverAdapter>),
            ProverKind::Cvc5 => SmtProver::detect(SmtDialect::Cvc5)
                .map(|p| Arc::new(p) as Arc<dyn ProverAdapter>),
            ProverKind::Native => Some(Arc::new(NativeProver::new())),
            ProverKind::SymbolicAi => match neural {
                Some(config) => Some(Arc::new(NeuralProver::with_config(config.clone())?)),
                None => None,
            },
            ProverKind::Lean | ProverKind::Coq | ProverKind::Embeddings => None,
        };

        match &adapter {
            Some(_) => info!("Prover {} available", kind),
            None => debug!("Prover {} not available", kind),
        }
        Ok(adapter)
    }

    /// Detect every profiled backend, in profile order
    pub fn detect_all(neural: Option<&NeuralConfig>) -> anyhow::Result<Vec<Arc<dyn ProverAdapter>>> {
        let mut adapters = Vec::new();
        for kind in ProverKind::profiled() {
            if let Some(adapter) = Self::detect(kind, neural)? {
                adapters.push(adapter);
            }
        }
        Ok(adapters)
    }
}
