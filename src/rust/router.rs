// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prover Router - drives one or more registered adapters per strategy
//!
//! Each call is independent. Adapter failures are recorded in
//! [`RouterProofResult::all_results`] and never escape `prove()`; the only
//! error is [`Error::NoProversAvailable`] from single-prover selection.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::analysis::FormulaAnalyzer;
use crate::core::Formula;
use crate::error::{Error, Result};
use crate::provers::{ProofResult, ProverAdapter, ProverKind};

/// How the router selects and combines adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoutingStrategy {
    /// One prover by fixed preference (z3, native, first registered)
    Auto,
    /// z3, falling back to `Auto` if it fails
    Fastest,
    /// First prover in `[lean, coq, cvc5, z3, native]` that does not fail
    MostCapable,
    /// All provers concurrently
    Parallel,
    /// Provers in order until one proves the formula
    Sequential,
}

impl RoutingStrategy {
    pub const ALL: [RoutingStrategy; 5] = [
        RoutingStrategy::Auto,
        RoutingStrategy::Fastest,
        RoutingStrategy::MostCapable,
        RoutingStrategy::Parallel,
        RoutingStrategy::Sequential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingStrategy::Auto => "auto",
            RoutingStrategy::Fastest => "fastest",
            RoutingStrategy::MostCapable => "most_capable",
            RoutingStrategy::Parallel => "parallel",
            RoutingStrategy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoutingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RoutingStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

impl TryFrom<String> for RoutingStrategy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RoutingStrategy> for String {
    fn from(strategy: RoutingStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Router construction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub enable_z3: bool,
    pub enable_cvc5: bool,
    pub enable_lean: bool,
    pub enable_coq: bool,
    pub enable_native: bool,
    /// Timeout handed to each adapter when a call passes none
    pub default_timeout_secs: u64,
    pub default_strategy: RoutingStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            enable_z3: true,
            enable_cvc5: true,
            enable_lean: true,
            enable_coq: true,
            enable_native: true,
            default_timeout_secs: 30,
            default_strategy: RoutingStrategy::Auto,
        }
    }
}

impl RouterConfig {
    /// Whether adapters of `kind` may be registered
    pub fn allows(&self, kind: ProverKind) -> bool {
        match kind {
            ProverKind::Z3 => self.enable_z3,
            ProverKind::Cvc5 => self.enable_cvc5,
            ProverKind::Lean => self.enable_lean,
            ProverKind::Coq => self.enable_coq,
            ProverKind::Native => self.enable_native,
            ProverKind::SymbolicAi | ProverKind::Embeddings => true,
        }
    }
}

/// One adapter's contribution to a routed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttemptResult {
    /// The adapter returned a result (which may still be unproved)
    Completed(ProofResult),
    /// The adapter failed; the message is recorded instead
    Failed(String),
}

impl AttemptResult {
    pub fn is_proved(&self) -> bool {
        matches!(self, AttemptResult::Completed(r) if r.is_proved())
    }
}

/// Routed decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterProofResult {
    pub is_proved: bool,
    /// Name of the adapter whose result decided the call
    pub prover_used: Option<String>,
    pub proof_time: Duration,
    /// Every attempt made, keyed by adapter name
    pub all_results: BTreeMap<String, AttemptResult>,
    pub strategy_used: RoutingStrategy,
    pub reason: String,
}

impl RouterProofResult {
    fn unsuccessful(
        strategy: RoutingStrategy,
        all_results: BTreeMap<String, AttemptResult>,
        reason: impl Into<String>,
        start: Instant,
    ) -> Self {
        RouterProofResult {
            is_proved: false,
            prover_used: None,
            proof_time: start.elapsed(),
            all_results,
            strategy_used: strategy,
            reason: reason.into(),
        }
    }

    fn decided(
        strategy: RoutingStrategy,
        prover: String,
        result: &ProofResult,
        all_results: BTreeMap<String, AttemptResult>,
        start: Instant,
    ) -> Self {
        RouterProofResult {
            is_proved: result.is_proved(),
            prover_used: Some(prover),
            proof_time: start.elapsed(),
            all_results,
            strategy_used: strategy,
            reason: result.reason.clone(),
        }
    }
}

/// Routes formulas to registered prover adapters
pub struct ProverRouter {
    config: RouterConfig,
    provers: Vec<Arc<dyn ProverAdapter>>,
    analyzer: FormulaAnalyzer,
}

impl ProverRouter {
    /// Create a router with nothing registered
    pub fn new(config: RouterConfig) -> Self {
        ProverRouter {
            config,
            provers: Vec::new(),
            analyzer: FormulaAnalyzer::new(),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register an adapter; returns `false` when its kind is disabled.
    ///
    /// An adapter whose name is already registered replaces the old one in place.
    pub fn register(&mut self, adapter: Arc<dyn ProverAdapter>) -> bool {
        if !self.config.allows(adapter.kind()) {
            debug!("Prover {} disabled by configuration", adapter.name());
            return false;
        }
        let name = adapter.name();
        match self.provers.iter().position(|p| p.name() == name) {
            Some(index) => self.provers[index] = adapter,
            None => self.provers.push(adapter),
        }
        info!("Registered prover {}", name);
        true
    }

    /// Registered adapter names in registration order
    pub fn available_provers(&self) -> Vec<String> {
        self.provers.iter().map(|p| p.name()).collect()
    }

    fn find_kind(&self, kind: ProverKind) -> Option<&Arc<dyn ProverAdapter>> {
        self.provers.iter().find(|p| p.kind() == kind)
    }

    /// Single-prover selection: z3, else native, else first registered
    fn select_prover_for_formula(
        &self,
        exclude: Option<ProverKind>,
    ) -> Result<&Arc<dyn ProverAdapter>> {
        let candidates = || {
            self.provers
                .iter()
                .filter(move |p| Some(p.kind()) != exclude)
        };
        candidates()
            .find(|p| p.kind() == ProverKind::Z3)
            .or_else(|| candidates().find(|p| p.kind() == ProverKind::Native))
            .or_else(|| candidates().next())
            .ok_or(Error::NoProversAvailable)
    }

    /// Prove `formula` from `axioms` using `strategy`.
    ///
    /// `timeout` is handed to every adapter invoked; the router does not
    /// enforce a deadline of its own.
    pub async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        strategy: RoutingStrategy,
        timeout: Option<Duration>,
    ) -> Result<RouterProofResult> {
        let timeout = Some(timeout.unwrap_or(Duration::from_secs(self.config.default_timeout_secs)));
        info!("Routing {} with strategy {}", formula, strategy);

        let result = match strategy {
            RoutingStrategy::Auto => self.prove_auto(formula, axioms, timeout, strategy, None).await?,
            RoutingStrategy::Fastest => self.prove_fastest(formula, axioms, timeout).await?,
            RoutingStrategy::MostCapable => self.prove_most_capable(formula, axioms, timeout).await,
            RoutingStrategy::Parallel => self.prove_parallel(formula, axioms, timeout).await,
            RoutingStrategy::Sequential => {
                self.prove_sequential(formula, axioms, timeout, &self.provers)
                    .await
            }
        };

        info!(
            "Routing result: proved={}, prover={:?}, time={:?}",
            result.is_proved, result.prover_used, result.proof_time
        );
        Ok(result)
    }

    /// `Sequential` routing with analyzer-recommended provers tried first
    pub async fn prove_with_analysis(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<RouterProofResult> {
        let timeout = Some(timeout.unwrap_or(Duration::from_secs(self.config.default_timeout_secs)));
        let analysis = self.analyzer.analyze(formula)?;

        let mut ordered: Vec<Arc<dyn ProverAdapter>> = Vec::with_capacity(self.provers.len());
        for kind in &analysis.recommended_provers {
            for prover in self.provers.iter().filter(|p| p.kind() == *kind) {
                ordered.push(Arc::clone(prover));
            }
        }
        for prover in &self.provers {
            if !analysis.recommended_provers.contains(&prover.kind()) {
                ordered.push(Arc::clone(prover));
            }
        }
        debug!(
            "Analysis-ordered provers: {:?}",
            ordered.iter().map(|p| p.name()).collect::<Vec<_>>()
        );

        Ok(self.prove_sequential(formula, axioms, timeout, &ordered).await)
    }

    async fn attempt(
        prover: &Arc<dyn ProverAdapter>,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> AttemptResult {
        debug!("Trying prover {}", prover.name());
        match prover.prove(formula, axioms, timeout).await {
            Ok(result) => AttemptResult::Completed(result),
            Err(e) => {
                warn!("Prover {} failed: {:#}", prover.name(), e);
                AttemptResult::Failed(format!("{:#}", e))
            }
        }
    }

    async fn prove_auto(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
        strategy: RoutingStrategy,
        exclude: Option<ProverKind>,
    ) -> Result<RouterProofResult> {
        let start = Instant::now();
        let prover = self.select_prover_for_formula(exclude)?;
        let name = prover.name();
        info!("Selected prover {}", name);

        let attempt = Self::attempt(prover, formula, axioms, timeout).await;
        let mut all_results = BTreeMap::new();
        all_results.insert(name.clone(), attempt.clone());

        Ok(match attempt {
            AttemptResult::Completed(result) => {
                RouterProofResult::decided(strategy, name, &result, all_results, start)
            }
            AttemptResult::Failed(message) => {
                RouterProofResult::unsuccessful(strategy, all_results, message, start)
            }
        })
    }

    async fn prove_fastest(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<RouterProofResult> {
        let start = Instant::now();
        let strategy = RoutingStrategy::Fastest;

        let Some(z3) = self.find_kind(ProverKind::Z3) else {
            return self.prove_auto(formula, axioms, timeout, strategy, None).await;
        };

        let name = z3.name();
        let attempt = Self::attempt(z3, formula, axioms, timeout).await;
        let mut all_results = BTreeMap::new();
        all_results.insert(name.clone(), attempt.clone());

        match attempt {
            AttemptResult::Completed(result) => Ok(RouterProofResult::decided(
                strategy,
                name,
                &result,
                all_results,
                start,
            )),
            AttemptResult::Failed(message) => {
                info!("z3 failed, falling back to automatic selection");
                match self
                    .prove_auto(formula, axioms, timeout, strategy, Some(ProverKind::Z3))
                    .await
                {
                    Ok(mut fallback) => {
                        all_results.extend(fallback.all_results);
                        fallback.all_results = all_results;
                        fallback.proof_time = start.elapsed();
                        Ok(fallback)
                    }
                    Err(Error::NoProversAvailable) => Ok(RouterProofResult::unsuccessful(
                        strategy,
                        all_results,
                        message,
                        start,
                    )),
                    Err(e) => Err(e),
                }
            }
        }
    }

    async fn prove_most_capable(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> RouterProofResult {
        const PRIORITY: [ProverKind; 5] = [
            ProverKind::Lean,
            ProverKind::Coq,
            ProverKind::Cvc5,
            ProverKind::Z3,
            ProverKind::Native,
        ];
        let start = Instant::now();
        let strategy = RoutingStrategy::MostCapable;
        let mut all_results = BTreeMap::new();

        for kind in PRIORITY {
            let Some(prover) = self.find_kind(kind) else {
                continue;
            };
            let name = prover.name();
            let attempt = Self::attempt(prover, formula, axioms, timeout).await;
            all_results.insert(name.clone(), attempt.clone());
            if let AttemptResult::Completed(result) = attempt {
                return RouterProofResult::decided(strategy, name, &result, all_results, start);
            }
        }

        RouterProofResult::unsuccessful(strategy, all_results, "No capable prover available", start)
    }

    async fn prove_parallel(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> RouterProofResult {
        let start = Instant::now();
        let strategy = RoutingStrategy::Parallel;
        let formula = Arc::new(formula.clone());
        let axioms: Arc<[Formula]> = axioms.into();

        let handles = self.provers.iter().map(|prover| {
            let prover = Arc::clone(prover);
            let formula = Arc::clone(&formula);
            let axioms = Arc::clone(&axioms);
            tokio::spawn(async move { Self::attempt(&prover, &formula, &axioms, timeout).await })
        });
        let outcomes = join_all(handles).await;

        // Selection runs over the completed set in registration order
        let mut all_results = BTreeMap::new();
        let mut winner: Option<(String, ProofResult)> = None;
        for (prover, outcome) in self.provers.iter().zip(outcomes) {
            let name = prover.name();
            let attempt = outcome.unwrap_or_else(|e| {
                warn!("Prover {} task failed: {}", name, e);
                AttemptResult::Failed(format!("task failed: {}", e))
            });
            if winner.is_none() {
                if let AttemptResult::Completed(result) = &attempt {
                    if result.is_proved() {
                        winner = Some((name.clone(), result.clone()));
                    }
                }
            }
            all_results.insert(name, attempt);
        }

        match winner {
            Some((name, result)) => {
                RouterProofResult::decided(strategy, name, &result, all_results, start)
            }
            None => RouterProofResult::unsuccessful(strategy, all_results, "No prover succeeded", start),
        }
    }

    async fn prove_sequential(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
        order: &[Arc<dyn ProverAdapter>],
    ) -> RouterProofResult {
        let start = Instant::now();
        let strategy = RoutingStrategy::Sequential;
        let mut all_results = BTreeMap::new();

        for prover in order {
            let name = prover.name();
            let attempt = Self::attempt(prover, formula, axioms, timeout).await;
            all_results.insert(name.clone(), attempt.clone());
            if let AttemptResult::Completed(result) = attempt {
                if result.is_proved() {
                    return RouterProofResult::decided(strategy, name, &result, all_results, start);
                }
            }
        }

        RouterProofResult::unsuccessful(strategy, all_results, "All provers failed", start)
    }
}
