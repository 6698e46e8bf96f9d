// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Common test utilities for the hybrid-prover test suite

#![allow(dead_code)]

use hybrid_prover::{parse_formula, Formula, ProverAdapter};
use std::sync::Arc;

pub mod assertions;
pub mod generators;
pub mod mock_prover;

pub use mock_prover::MockProver;

/// Parse formula text, panicking on malformed test input
pub fn formula(text: &str) -> Formula {
    parse_formula(text).unwrap_or_else(|e| panic!("bad test formula {:?}: {}", text, e))
}

/// `P → P`
pub fn tautology() -> Formula {
    formula("P -> P")
}

/// A quantified formula the analyzer rates as first-order
pub fn quantified_formula() -> Formula {
    formula("forall x. P(x) -> Q(x)")
}

/// Erase mock types for constructors taking `&[Arc<dyn ProverAdapter>]`
pub fn adapters(mocks: &[Arc<MockProver>]) -> Vec<Arc<dyn ProverAdapter>> {
    mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn ProverAdapter>)
        .collect()
}
