// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Property-based tests for analyzer, weighting, caching and agreement invariants

mod common;

use common::generators::{formula_with_depth, propositional_formula, weight_pair};
use common::{adapters, MockProver};
use hybrid_prover::hybrid::normalize_weights;
use hybrid_prover::provers::NativeProver;
use hybrid_prover::{
    CacheKey, Formula, FormulaAnalyzer, HybridConfig, HybridStrategy, NeuralSymbolicHybridProver,
    ProverAdapter, ProverKind,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Scripted verdict for one side of a hybrid call
#[derive(Debug, Clone, Copy)]
enum Script {
    Prove(f64),
    Disprove(f64),
    Timeout,
    Fail,
}

fn script() -> impl Strategy<Value = Script> {
    prop_oneof![
        (0.0f64..=1.0).prop_map(Script::Prove),
        (0.0f64..=1.0).prop_map(Script::Disprove),
        Just(Script::Timeout),
        Just(Script::Fail),
    ]
}

fn scripted(kind: ProverKind, script: Script) -> MockProver {
    let mock = MockProver::new(kind);
    match script {
        Script::Prove(c) => mock.proving(c),
        Script::Disprove(c) => mock.disproving(c),
        Script::Timeout => mock.timing_out(),
        Script::Fail => mock.failing("scripted failure"),
    }
}

fn hybrid_strategy() -> impl Strategy<Value = HybridStrategy> {
    prop::sample::select(HybridStrategy::ALL.to_vec())
}

proptest! {
    #[test]
    fn analysis_is_deterministic(formula in formula_with_depth(4)) {
        let analyzer = FormulaAnalyzer::new();
        let first = analyzer.analyze(&formula).unwrap();
        let second = analyzer.analyze(&formula).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn recommendations_are_nonempty_and_unique(formula in formula_with_depth(4)) {
        let analysis = FormulaAnalyzer::new().analyze(&formula).unwrap();
        prop_assert!(!analysis.recommended_provers.is_empty());
        let unique: BTreeSet<_> = analysis.recommended_provers.iter().collect();
        prop_assert_eq!(unique.len(), analysis.recommended_provers.len());
    }

    #[test]
    fn complexity_score_is_bounded(formula in formula_with_depth(5)) {
        let analysis = FormulaAnalyzer::new().analyze(&formula).unwrap();
        prop_assert!((0.0..=100.0).contains(&analysis.complexity_score));
    }

    #[test]
    fn normalized_weights_sum_to_one((neural, symbolic) in weight_pair()) {
        let (n, s) = normalize_weights(neural, symbolic).unwrap();
        prop_assert!((n + s - 1.0).abs() < 1e-6);
        prop_assert!(n >= 0.0 && s >= 0.0);
    }

    #[test]
    fn cache_key_ignores_axiom_order(
        goal in propositional_formula(3),
        axioms in prop::collection::vec(propositional_formula(2), 0..4),
    ) {
        let mut reversed = axioms.clone();
        reversed.reverse();
        let config = BTreeMap::new();
        prop_assert_eq!(
            CacheKey::derive(&goal, &axioms, "z3", &config),
            CacheKey::derive(&goal, &reversed, "z3", &config)
        );
    }

    #[test]
    fn excluded_middle_is_always_proved(formula in propositional_formula(3)) {
        let native = NativeProver::new();
        let goal = Formula::or(formula.clone(), Formula::not(formula.clone()));
        let contradiction = Formula::and(formula.clone(), Formula::not(formula));

        let (proved, refuted) = block_on(async {
            (
                native.prove(&goal, &[], None).await.unwrap(),
                native.prove(&contradiction, &[], None).await.unwrap(),
            )
        });
        prop_assert!(proved.is_proved());
        prop_assert!(!refuted.is_proved());
        prop_assert!(refuted.is_conclusive());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn agreement_matches_recorded_results(
        strategy in hybrid_strategy(),
        neural in prop::option::of(script()),
        symbolic in prop::option::of(script()),
        formula in formula_with_depth(3),
    ) {
        let mut mocks = Vec::new();
        if let Some(script) = neural {
            mocks.push(Arc::new(scripted(ProverKind::SymbolicAi, script)));
        }
        if let Some(script) = symbolic {
            mocks.push(Arc::new(scripted(ProverKind::Z3, script)));
        }
        let config = HybridConfig { strategy, ..HybridConfig::default() };
        let prover = NeuralSymbolicHybridProver::new(config, &adapters(&mocks)).unwrap();

        let result = block_on(prover.prove(&formula, None, None));

        let expected = match (&result.neural_result, &result.symbolic_result) {
            (Some(n), Some(s)) => n.is_valid == s.is_valid,
            _ => false,
        };
        prop_assert_eq!(result.agreement, expected);
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }
}
