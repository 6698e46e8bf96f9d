// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Neural-symbolic hybrid prover
//!
//! Runs one neural adapter and one or more symbolic adapters under a
//! combination strategy and produces a weighted, explained verdict.
//!
//! Adapter failures are folded into [`NeuralResult`] / [`SymbolicResult`]
//! records carrying an `error_message`; a side is *available* when its
//! record exists and carries no error. `agreement` is true exactly when both
//! records exist and their `is_valid` fields are equal.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::analysis::{ComplexityLevel, FormulaAnalyzer};
use crate::cache::CacheKey;
use crate::core::Formula;
use crate::embeddings::EmbeddingIndex;
use crate::error::{Error, Result};
use crate::provers::{ProofOutcome, ProofResult, ProverAdapter};

/// Neural confidence at which the neural verdict is trusted outright
pub const NEURAL_TRUST_THRESHOLD: f64 = 0.85;

/// Symbolic confidence at which the symbolic verdict is trusted outright
pub const SYMBOLIC_TRUST_THRESHOLD: f64 = 0.95;

/// Confidence multiplier when only the neural side answered
pub const NEURAL_ONLY_PENALTY: f64 = 0.7;

/// How neural and symbolic verdicts are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HybridStrategy {
    NeuralFirst,
    SymbolicFirst,
    Parallel,
    /// Same combination rule as `Parallel`
    Ensemble,
    /// `NeuralFirst` for quantified or complex formulas, else `SymbolicFirst`
    Adaptive,
}

impl HybridStrategy {
    pub const ALL: [HybridStrategy; 5] = [
        HybridStrategy::NeuralFirst,
        HybridStrategy::SymbolicFirst,
        HybridStrategy::Parallel,
        HybridStrategy::Ensemble,
        HybridStrategy::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HybridStrategy::NeuralFirst => "neural_first",
            HybridStrategy::SymbolicFirst => "symbolic_first",
            HybridStrategy::Parallel => "parallel",
            HybridStrategy::Ensemble => "ensemble",
            HybridStrategy::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for HybridStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HybridStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HybridStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

impl TryFrom<String> for HybridStrategy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HybridStrategy> for String {
    fn from(strategy: HybridStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Hybrid prover construction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub strategy: HybridStrategy,
    /// Adapter names eligible for the neural side, in preference order
    pub neural_provers: Vec<String>,
    /// Adapter names used on the symbolic side, in the order tried
    pub symbolic_provers: Vec<String>,
    pub neural_weight: f64,
    pub symbolic_weight: f64,
    /// Use the similarity index when no neural adapter is configured
    pub enable_embeddings: bool,
    pub cache_results: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            strategy: HybridStrategy::Adaptive,
            neural_provers: vec!["symbolicai".to_string()],
            symbolic_provers: ["z3", "cvc5", "lean", "coq", "native"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            neural_weight: 0.4,
            symbolic_weight: 0.6,
            enable_embeddings: false,
            cache_results: true,
        }
    }
}

/// Normalise a weight pair so it sums to 1.0
pub fn normalize_weights(neural: f64, symbolic: f64) -> Result<(f64, f64)> {
    let valid = |w: f64| w.is_finite() && w >= 0.0;
    let total = neural + symbolic;
    if !valid(neural) || !valid(symbolic) || total <= 0.0 || !total.is_finite() {
        return Err(Error::InvalidWeights { neural, symbolic });
    }
    Ok((neural / total, symbolic / total))
}

/// Optional proving context: axioms plus free-form metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridContext {
    pub axioms: Vec<Formula>,
    pub metadata: BTreeMap<String, String>,
}

/// Neural side of a hybrid call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralResult {
    /// Adapter name
    pub prover: String,
    pub is_valid: bool,
    pub confidence: f64,
    pub reasoning: String,
    /// Model that produced the verdict
    pub llm_used: String,
    pub proof_time: Duration,
    pub error_message: Option<String>,
}

impl NeuralResult {
    fn from_proof(prover: String, result: ProofResult) -> Self {
        let error_message = failure_message(&result.outcome);
        NeuralResult {
            llm_used: result.backend.clone().unwrap_or_else(|| prover.clone()),
            prover,
            is_valid: result.is_proved(),
            confidence: result.confidence(),
            reasoning: result.reason,
            proof_time: result.proof_time,
            error_message,
        }
    }

    fn failed(prover: String, message: String) -> Self {
        NeuralResult {
            llm_used: prover.clone(),
            prover,
            is_valid: false,
            confidence: 0.0,
            reasoning: String::new(),
            proof_time: Duration::ZERO,
            error_message: Some(message),
        }
    }

    pub fn is_available(&self) -> bool {
        self.error_message.is_none()
    }
}

/// Symbolic side of a hybrid call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicResult {
    pub is_valid: bool,
    pub confidence: f64,
    /// Adapter whose verdict this is (the last one tried on failure)
    pub prover_used: String,
    pub proof_time: Duration,
    /// Proof script, model or counterexample
    pub artifact: Option<String>,
    pub error_message: Option<String>,
}

impl SymbolicResult {
    fn from_proof(prover_used: String, result: ProofResult) -> Self {
        let error_message = failure_message(&result.outcome);
        let artifact = match &result.outcome {
            ProofOutcome::Proved { artifact, .. } => artifact.clone(),
            ProofOutcome::Disproved { counterexample, .. } => counterexample.clone(),
            ProofOutcome::TimedOut | ProofOutcome::Errored { .. } => None,
        };
        SymbolicResult {
            prover_used,
            is_valid: result.is_proved(),
            confidence: result.confidence(),
            proof_time: result.proof_time,
            artifact,
            error_message,
        }
    }

    fn failed(prover_used: String, message: String, proof_time: Duration) -> Self {
        SymbolicResult {
            prover_used,
            is_valid: false,
            confidence: 0.0,
            proof_time,
            artifact: None,
            error_message: Some(message),
        }
    }

    pub fn is_available(&self) -> bool {
        self.error_message.is_none()
    }
}

fn failure_message(outcome: &ProofOutcome) -> Option<String> {
    match outcome {
        ProofOutcome::Proved { .. } | ProofOutcome::Disproved { .. } => None,
        ProofOutcome::TimedOut => Some("timeout".to_string()),
        ProofOutcome::Errored { message } => Some(message.clone()),
    }
}

/// Final hybrid verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridProverResult {
    pub is_valid: bool,
    pub confidence: f64,
    pub neural_result: Option<NeuralResult>,
    pub symbolic_result: Option<SymbolicResult>,
    /// Configured strategy
    pub strategy_used: HybridStrategy,
    /// Strategy whose logic decided the call (differs only for `Adaptive`)
    pub resolved_strategy: HybridStrategy,
    pub agreement: bool,
    pub execution_time: Duration,
    pub explanation: String,
}

/// Both records present with equal validity
pub fn agreement_of(neural: Option<&NeuralResult>, symbolic: Option<&SymbolicResult>) -> bool {
    match (neural, symbolic) {
        (Some(n), Some(s)) => n.is_valid == s.is_valid,
        _ => false,
    }
}

/// Verdict (validity, confidence) before explanation and bookkeeping
struct Decision {
    is_valid: bool,
    confidence: f64,
    note: Option<&'static str>,
}

impl Decision {
    fn new(is_valid: bool, confidence: f64) -> Self {
        Decision {
            is_valid,
            confidence: confidence.clamp(0.0, 1.0),
            note: None,
        }
    }

    fn none() -> Self {
        Decision {
            is_valid: false,
            confidence: 0.0,
            note: Some("No provers available"),
        }
    }
}

/// Orchestrates neural and symbolic provers
pub struct NeuralSymbolicHybridProver {
    config: HybridConfig,
    neural_weight: f64,
    symbolic_weight: f64,
    neural: Option<Arc<dyn ProverAdapter>>,
    symbolic: Vec<Arc<dyn ProverAdapter>>,
    embeddings: Option<Arc<EmbeddingIndex>>,
    analyzer: FormulaAnalyzer,
    result_cache: Mutex<HashMap<CacheKey, Arc<HybridProverResult>>>,
}

impl NeuralSymbolicHybridProver {
    /// Build from the available adapters, selected by the configured names.
    ///
    /// Fails with [`Error::InvalidWeights`] when the weights cannot be
    /// normalised.
    pub fn new(config: HybridConfig, available: &[Arc<dyn ProverAdapter>]) -> Result<Self> {
        let (neural_weight, symbolic_weight) =
            normalize_weights(config.neural_weight, config.symbolic_weight)?;

        let by_name = |name: &String| available.iter().find(|a| a.name() == *name).cloned();
        let mut neural = config.neural_provers.iter().find_map(by_name);
        let symbolic: Vec<_> = config.symbolic_provers.iter().filter_map(by_name).collect();

        let embeddings = if config.enable_embeddings {
            let index = Arc::new(EmbeddingIndex::default());
            if neural.is_none() {
                debug!("No neural adapter configured; using embedding similarity");
                neural = Some(index.clone() as Arc<dyn ProverAdapter>);
            }
            Some(index)
        } else {
            None
        };

        info!(
            "Hybrid prover: strategy={}, neural={:?}, symbolic={:?}, weights=({:.2}, {:.2})",
            config.strategy,
            neural.as_ref().map(|n| n.name()),
            symbolic.iter().map(|s| s.name()).collect::<Vec<_>>(),
            neural_weight,
            symbolic_weight
        );

        Ok(NeuralSymbolicHybridProver {
            config,
            neural_weight,
            symbolic_weight,
            neural,
            symbolic,
            embeddings,
            analyzer: FormulaAnalyzer::new(),
            result_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    pub fn strategy(&self) -> HybridStrategy {
        self.config.strategy
    }

    /// Normalised neural weight
    pub fn neural_weight(&self) -> f64 {
        self.neural_weight
    }

    /// Normalised symbolic weight
    pub fn symbolic_weight(&self) -> f64 {
        self.symbolic_weight
    }

    pub fn embeddings(&self) -> Option<&Arc<EmbeddingIndex>> {
        self.embeddings.as_ref()
    }

    pub fn cached_results(&self) -> usize {
        self.result_cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.result_cache.lock().clear();
    }

    /// Prove `formula` in an optional context.
    ///
    /// Identical `(formula, context)` pairs are answered from the result
    /// cache without invoking any adapter while `cache_results` is set.
    /// The lookup and the insert take the lock separately, so identical calls
    /// running at the same time may each invoke the adapters; the last one
    /// to finish owns the cached entry.
    pub async fn prove(
        &self,
        formula: &Formula,
        context: Option<&HybridContext>,
        timeout: Option<Duration>,
    ) -> Arc<HybridProverResult> {
        let start = Instant::now();
        let empty = HybridContext::default();
        let context = context.unwrap_or(&empty);
        let key = CacheKey::derive(formula, &context.axioms, "hybrid", &context.metadata);

        if self.config.cache_results {
            if let Some(cached) = self.result_cache.lock().get(&key) {
                debug!("Hybrid cache hit for {}", formula);
                return Arc::clone(cached);
            }
        }

        let resolved = self.resolve_strategy(formula);
        let axioms = context.axioms.as_slice();
        let (neural, symbolic, decision) = match resolved {
            HybridStrategy::NeuralFirst => self.neural_first(formula, axioms, timeout).await,
            HybridStrategy::SymbolicFirst => self.symbolic_first(formula, axioms, timeout).await,
            HybridStrategy::Parallel | HybridStrategy::Ensemble | HybridStrategy::Adaptive => {
                self.parallel(formula, axioms, timeout).await
            }
        };

        if let (Some(index), Some(s)) = (&self.embeddings, &symbolic) {
            if s.is_available() {
                index.record(formula, axioms, s.is_valid, s.confidence);
            }
        }

        let agreement = agreement_of(neural.as_ref(), symbolic.as_ref());
        let explanation = explain(neural.as_ref(), symbolic.as_ref(), &decision);
        let result = Arc::new(HybridProverResult {
            is_valid: decision.is_valid,
            confidence: decision.confidence,
            neural_result: neural,
            symbolic_result: symbolic,
            strategy_used: self.config.strategy,
            resolved_strategy: resolved,
            agreement,
            execution_time: start.elapsed(),
            explanation,
        });

        info!(
            "Hybrid verdict for {}: valid={}, confidence={:.2}, agreement={}",
            formula, result.is_valid, result.confidence, result.agreement
        );

        if self.config.cache_results {
            self.result_cache.lock().insert(key, Arc::clone(&result));
        }
        result
    }

    /// Concrete strategy for this formula
    pub fn resolve_strategy(&self, formula: &Formula) -> HybridStrategy {
        match self.config.strategy {
            HybridStrategy::Adaptive => match self.analyzer.analyze(formula) {
                Ok(analysis)
                    if analysis.has_quantifiers
                        || analysis.complexity_level >= ComplexityLevel::Complex =>
                {
                    HybridStrategy::NeuralFirst
                }
                Ok(_) => HybridStrategy::SymbolicFirst,
                Err(e) => {
                    warn!("Analysis failed ({}), defaulting to symbolic_first", e);
                    HybridStrategy::SymbolicFirst
                }
            },
            other => other,
        }
    }

    async fn run_neural(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Option<NeuralResult> {
        let adapter = self.neural.as_ref()?;
        let name = adapter.name();
        debug!("Running neural prover {}", name);
        Some(match adapter.prove(formula, axioms, timeout).await {
            Ok(result) => NeuralResult::from_proof(name, result),
            Err(e) => {
                warn!("Neural prover {} failed: {:#}", name, e);
                NeuralResult::failed(name, format!("{:#}", e))
            }
        })
    }

    /// Try symbolic adapters in order until one reaches a verdict
    async fn run_symbolic(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Option<SymbolicResult> {
        let mut last: Option<SymbolicResult> = None;
        for adapter in &self.symbolic {
            let name = adapter.name();
            debug!("Running symbolic prover {}", name);
            let record = match adapter.prove(formula, axioms, timeout).await {
                Ok(result) => SymbolicResult::from_proof(name, result),
                Err(e) => {
                    warn!("Symbolic prover {} failed: {:#}", name, e);
                    SymbolicResult::failed(name, format!("{:#}", e), Duration::ZERO)
                }
            };
            if record.is_available() {
                return Some(record);
            }
            last = Some(record);
        }
        last
    }

    async fn neural_first(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> (Option<NeuralResult>, Option<SymbolicResult>, Decision) {
        let neural = self.run_neural(formula, axioms, timeout).await;
        let symbolic = self.run_symbolic(formula, axioms, timeout).await;

        let trusted = neural
            .as_ref()
            .filter(|n| n.is_available() && n.confidence >= NEURAL_TRUST_THRESHOLD);
        let decision = match (trusted, &symbolic, &neural) {
            (Some(n), _, _) => Decision::new(n.is_valid, n.confidence),
            (None, Some(s), _) if s.is_available() => Decision::new(s.is_valid, s.confidence),
            (None, _, Some(n)) if n.is_available() => Decision::new(n.is_valid, n.confidence),
            _ => Decision::none(),
        };
        (neural, symbolic, decision)
    }

    async fn symbolic_first(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> (Option<NeuralResult>, Option<SymbolicResult>, Decision) {
        let symbolic = self.run_symbolic(formula, axioms, timeout).await;
        let neural = self.run_neural(formula, axioms, timeout).await;

        let trusted = symbolic
            .as_ref()
            .filter(|s| s.is_available() && s.confidence >= SYMBOLIC_TRUST_THRESHOLD);
        let decision = match (trusted, &neural, &symbolic) {
            (Some(s), _, _) => Decision::new(s.is_valid, s.confidence),
            (None, Some(n), _) if n.is_available() => Decision::new(n.is_valid, n.confidence),
            (None, _, Some(s)) if s.is_available() => Decision::new(s.is_valid, s.confidence),
            _ => Decision::none(),
        };
        (neural, symbolic, decision)
    }

    async fn parallel(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> (Option<NeuralResult>, Option<SymbolicResult>, Decision) {
        let (neural, symbolic) = tokio::join!(
            self.run_neural(formula, axioms, timeout),
            self.run_symbolic(formula, axioms, timeout)
        );

        let n = neural.as_ref().filter(|n| n.is_available());
        let s = symbolic.as_ref().filter(|s| s.is_available());
        let decision = match (n, s) {
            (Some(n), Some(s)) => self.combine(n, s),
            (Some(n), None) => Decision::new(n.is_valid, n.confidence * NEURAL_ONLY_PENALTY),
            (None, Some(s)) => Decision::new(s.is_valid, s.confidence),
            (None, None) => Decision::none(),
        };
        (neural, symbolic, decision)
    }

    /// Weighted combination of two available verdicts
    fn combine(&self, n: &NeuralResult, s: &SymbolicResult) -> Decision {
        if n.is_valid == s.is_valid {
            return Decision::new(n.is_valid, n.confidence.max(s.confidence));
        }
        // An invalid vote contributes nothing to the combined score
        let vote = |is_valid: bool, confidence: f64| if is_valid { confidence } else { 0.0 };
        let confidence = self.neural_weight * vote(n.is_valid, n.confidence)
            + self.symbolic_weight * vote(s.is_valid, s.confidence);
        Decision::new(confidence >= 0.5, confidence)
    }
}

fn verdict(is_valid: bool) -> &'static str {
    if is_valid {
        "Valid"
    } else {
        "Invalid"
    }
}

fn explain(
    neural: Option<&NeuralResult>,
    symbolic: Option<&SymbolicResult>,
    decision: &Decision,
) -> String {
    let mut parts = Vec::new();
    if let Some(n) = neural {
        parts.push(match &n.error_message {
            None => format!(
                "Neural prover ({}): {} (confidence {:.2}).",
                n.llm_used,
                verdict(n.is_valid),
                n.confidence
            ),
            Some(message) => format!("Neural prover ({}): Error ({}).", n.llm_used, message),
        });
    }
    if let Some(s) = symbolic {
        parts.push(match &s.error_message {
            None => format!(
                "Symbolic prover ({}): {} (confidence {:.2}).",
                s.prover_used,
                verdict(s.is_valid),
                s.confidence
            ),
            Some(message) => format!("Symbolic prover ({}): Error ({}).", s.prover_used, message),
        });
    }
    if neural.is_some() && symbolic.is_some() {
        parts.push(if agreement_of(neural, symbolic) {
            "Neural and symbolic provers agree.".to_string()
        } else {
            "Neural and symbolic provers disagree.".to_string()
        });
    }
    if let Some(note) = decision.note {
        parts.push(note.to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provers::{NativeProver, ProverKind};

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "neural_first".parse::<HybridStrategy>().unwrap(),
            HybridStrategy::NeuralFirst
        );
        assert_eq!("Ensemble".parse::<HybridStrategy>().unwrap(), HybridStrategy::Ensemble);
        let err = "majority".parse::<HybridStrategy>().unwrap_err();
        assert!(err.to_string().contains("Unknown strategy"));
    }

    #[test]
    fn test_weights_are_normalised() {
        let (n, s) = normalize_weights(3.0, 1.0).unwrap();
        assert!((n - 0.75).abs() < 1e-12);
        assert!((s - 0.25).abs() < 1e-12);
        assert!((n + s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_weights_rejected() {
        assert!(matches!(
            normalize_weights(0.0, 0.0),
            Err(Error::InvalidWeights { .. })
        ));
        assert!(normalize_weights(-1.0, 2.0).is_err());
        assert!(normalize_weights(f64::NAN, 1.0).is_err());

        let config = HybridConfig {
            neural_weight: 0.0,
            symbolic_weight: 0.0,
            ..HybridConfig::default()
        };
        assert!(NeuralSymbolicHybridProver::new(config, &[]).is_err());
    }

    #[test]
    fn test_adaptive_resolution() {
        let prover = NeuralSymbolicHybridProver::new(HybridConfig::default(), &[]).unwrap();
        let quantified = Formula::forall("x", Formula::atom("P"));
        assert_eq!(prover.resolve_strategy(&quantified), HybridStrategy::NeuralFirst);
        let simple = Formula::implies(Formula::atom("P"), Formula::atom("P"));
        assert_eq!(prover.resolve_strategy(&simple), HybridStrategy::SymbolicFirst);
    }

    #[tokio::test]
    async fn test_no_provers_available() {
        let prover = NeuralSymbolicHybridProver::new(
            HybridConfig {
                strategy: HybridStrategy::Parallel,
                ..HybridConfig::default()
            },
            &[],
        )
        .unwrap();
        let result = prover.prove(&Formula::atom("P"), None, None).await;
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.agreement);
        assert_eq!(result.explanation, "No provers available");
    }

    #[tokio::test]
    async fn test_symbolic_only_parallel_has_no_penalty() {
        let native: Arc<dyn ProverAdapter> = Arc::new(NativeProver::new());
        let prover = NeuralSymbolicHybridProver::new(
            HybridConfig {
                strategy: HybridStrategy::Ensemble,
                ..HybridConfig::default()
            },
            &[native],
        )
        .unwrap();
        let result = prover
            .prove(&Formula::implies(Formula::atom("P"), Formula::atom("P")), None, None)
            .await;
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.95);
        assert!(result.neural_result.is_none());
        assert_eq!(
            result.symbolic_result.as_ref().map(|s| s.prover_used.as_str()),
            Some(ProverKind::Native.to_string().as_str())
        );
        assert!(result.explanation.starts_with("Symbolic prover (native): Valid (confidence 0.95)."));
    }

    #[tokio::test]
    async fn test_embeddings_learn_from_symbolic_results() {
        let native: Arc<dyn ProverAdapter> = Arc::new(NativeProver::new());
        let prover = NeuralSymbolicHybridProver::new(
            HybridConfig {
                strategy: HybridStrategy::Parallel,
                enable_embeddings: true,
                cache_results: false,
                ..HybridConfig::default()
            },
            &[native],
        )
        .unwrap();
        let formula = Formula::implies(Formula::atom("P"), Formula::atom("P"));

        let first = prover.prove(&formula, None, None).await;
        assert!(first.neural_result.as_ref().map_or(false, |n| !n.is_available()));

        let second = prover.prove(&formula, None, None).await;
        let neural = second.neural_result.as_ref().unwrap();
        assert!(neural.is_available());
        assert!(neural.is_valid);
        assert!(second.agreement);
    }
}
