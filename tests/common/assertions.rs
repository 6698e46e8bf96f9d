// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Custom assertions for hybrid-prover tests

use hybrid_prover::router::AttemptResult;
use hybrid_prover::{HybridProverResult, RouterProofResult};

/// Assert two floats are equal within 1e-9
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be close to {}",
        actual,
        expected
    );
}

/// Assert the agreement flag matches the two recorded sides
pub fn assert_agreement_consistent(result: &HybridProverResult) {
    let expected = match (&result.neural_result, &result.symbolic_result) {
        (Some(n), Some(s)) => n.is_valid == s.is_valid,
        _ => false,
    };
    assert_eq!(
        result.agreement, expected,
        "agreement flag inconsistent with recorded results: {:#?}",
        result
    );
}

/// Assert a router result was decided by `prover` and is proved
pub fn assert_proved_by(result: &RouterProofResult, prover: &str) {
    assert!(result.is_proved, "expected a proof, got {:#?}", result);
    assert_eq!(result.prover_used.as_deref(), Some(prover));
    assert!(
        result.all_results.contains_key(prover),
        "deciding prover {} missing from all_results",
        prover
    );
}

/// Assert the attempt recorded for `prover` failed with a message containing `needle`
pub fn assert_failed_with(result: &RouterProofResult, prover: &str, needle: &str) {
    match result.all_results.get(prover) {
        Some(AttemptResult::Failed(message)) => assert!(
            message.contains(needle),
            "failure message {:?} does not contain {:?}",
            message,
            needle
        ),
        other => panic!("expected a failed attempt for {}, got {:?}", prover, other),
    }
}
