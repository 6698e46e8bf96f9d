// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prover routing and neural-symbolic hybrid proving
//!
//! Formulas are analysed, routed to one or more theorem-proving backends
//! (SMT solvers, a built-in truth-table prover, an LLM-guided prover) and
//! their verdicts combined: by routing strategy in [`router`], by weighted
//! neural/symbolic combination in [`hybrid`], or by majority vote in
//! [`integration`]. Caches are injected by the caller; the library holds no
//! global state.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod core;
pub mod embeddings;
pub mod error;
pub mod hybrid;
pub mod integration;
pub mod parser;
pub mod provers;
pub mod router;

pub use analysis::{ComplexityLevel, FormulaAnalysis, FormulaAnalyzer, FormulaType};
pub use cache::{CacheKey, CacheStats, CachedResult, InMemoryProofCache, ProofCache};
pub use config::CoreConfig;
pub use core::{Connective, Formula, Quantifier, Term};
pub use error::{Error, Result};
pub use hybrid::{
    HybridConfig, HybridContext, HybridProverResult, HybridStrategy, NeuralSymbolicHybridProver,
};
pub use integration::{AggregatedProverResult, LogicCritic, ProverIntegrationAdapter};
pub use parser::parse_formula;
pub use provers::{ProofOutcome, ProofResult, ProverAdapter, ProverKind};
pub use router::{ProverRouter, RouterConfig, RouterProofResult, RoutingStrategy};
