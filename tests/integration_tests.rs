// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Multi-prover verification and majority-vote aggregation

mod common;

use common::assertions::assert_close;
use common::{adapters, formula, tautology, MockProver};
use hybrid_prover::integration::{IntegrationConfig, VerificationStatus};
use hybrid_prover::provers::NativeProver;
use hybrid_prover::{
    CacheKey, CachedResult, InMemoryProofCache, LogicCritic, ProofCache, ProverAdapter,
    ProverIntegrationAdapter, ProverKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn integration_config(provers: &[&str]) -> IntegrationConfig {
    IntegrationConfig {
        provers: provers.iter().map(|p| p.to_string()).collect(),
        ..IntegrationConfig::default()
    }
}

#[tokio::test]
async fn test_majority_vote_over_provers() {
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).proving(0.9));
    let cvc5 = Arc::new(MockProver::new(ProverKind::Cvc5).proving(0.8));
    let native = Arc::new(MockProver::new(ProverKind::Native).disproving(0.95));
    let adapter = ProverIntegrationAdapter::new(
        integration_config(&["z3", "cvc5", "native", "lean"]),
        &adapters(&[z3, cvc5, native]),
        None,
    );

    let result = adapter.verify_statement(&tautology(), None).await;

    assert!(result.overall_valid);
    assert_close(result.agreement_rate, 2.0 / 3.0);
    assert_close(result.confidence, 0.85);
    assert_eq!(result.verified_by, vec!["z3".to_string(), "cvc5".to_string()]);
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.results[3].status, VerificationStatus::Unavailable);
    assert_eq!(adapter.available_provers(), vec!["z3", "cvc5", "native"]);
}

#[tokio::test]
async fn test_adapter_errors_do_not_vote() {
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).failing("segfault"));
    let cvc5 = Arc::new(MockProver::new(ProverKind::Cvc5).timing_out());
    let native = Arc::new(MockProver::new(ProverKind::Native).proving(0.95));
    let adapter = ProverIntegrationAdapter::new(
        integration_config(&["z3", "cvc5", "native"]),
        &adapters(&[z3, cvc5, native]),
        None,
    );

    let result = adapter.verify_statement(&tautology(), None).await;

    assert!(result.overall_valid);
    assert_eq!(result.agreement_rate, 1.0);
    assert_eq!(result.successful_count(), 1);
    assert_eq!(result.results[0].status, VerificationStatus::Error);
    assert_eq!(result.results[0].message.as_deref(), Some("segfault"));
    assert_eq!(result.results[1].status, VerificationStatus::Timeout);
}

#[tokio::test]
async fn test_aggregate_is_cached_once_a_prover_succeeds() {
    let cache = Arc::new(InMemoryProofCache::default());
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).proving(0.95));
    let adapter = ProverIntegrationAdapter::new(
        integration_config(&["z3"]),
        &adapters(&[z3.clone()]),
        Some(cache.clone() as Arc<dyn ProofCache>),
    );
    let statement = formula("P | ~P");

    let first = adapter.verify_statement(&statement, None).await;
    let second = adapter.verify_statement(&statement, None).await;

    assert_eq!(first, second);
    assert_eq!(z3.calls(), 1);
    let key = CacheKey::derive(&statement, &[], "aggregate", &BTreeMap::new());
    assert!(matches!(cache.get_key(&key), Some(CachedResult::Aggregate(_))));
}

#[tokio::test]
async fn test_failed_aggregate_is_not_cached() {
    let cache = Arc::new(InMemoryProofCache::default());
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).failing("offline"));
    let adapter = ProverIntegrationAdapter::new(
        integration_config(&["z3"]),
        &adapters(&[z3.clone()]),
        Some(cache.clone() as Arc<dyn ProofCache>),
    );

    adapter.verify_statement(&tautology(), None).await;
    adapter.verify_statement(&tautology(), None).await;

    assert_eq!(z3.calls(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_use_cache_false_ignores_cache() {
    let cache = Arc::new(InMemoryProofCache::default());
    let z3 = Arc::new(MockProver::new(ProverKind::Z3));
    let adapter = ProverIntegrationAdapter::new(
        IntegrationConfig {
            use_cache: false,
            ..integration_config(&["z3"])
        },
        &adapters(&[z3.clone()]),
        Some(cache.clone() as Arc<dyn ProofCache>),
    );

    adapter.verify_statement(&tautology(), None).await;
    adapter.verify_statement(&tautology(), None).await;

    assert_eq!(z3.calls(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_verify_statements_keeps_order() {
    let native: Arc<dyn ProverAdapter> = Arc::new(NativeProver::new());
    let adapter =
        ProverIntegrationAdapter::new(integration_config(&["native"]), &[native], None);
    let statements = vec![formula("P -> P"), formula("P -> Q"), formula("(P & Q) -> P")];

    let results = adapter.verify_statements(&statements, None).await;

    let verdicts: Vec<bool> = results.iter().map(|r| r.overall_valid).collect();
    assert_eq!(verdicts, vec![true, false, true]);
    assert_eq!(results[1].statement, statements[1].canonical());
}

#[tokio::test]
async fn test_logic_critic_scores_statements() {
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).proving(0.9));
    let cvc5 = Arc::new(MockProver::new(ProverKind::Cvc5).proving(0.7));
    let adapter = ProverIntegrationAdapter::new(
        integration_config(&["z3", "cvc5"]),
        &adapters(&[z3, cvc5]),
        None,
    );
    let critic = LogicCritic::new(adapter);

    let (score, result) = critic.evaluate(&tautology(), None).await;

    assert!(result.overall_valid);
    assert_close(score, 0.8);
}

#[tokio::test]
async fn test_logic_critic_scores_rejected_statement_zero() {
    let z3 = Arc::new(MockProver::new(ProverKind::Z3).disproving(0.95));
    let adapter =
        ProverIntegrationAdapter::new(integration_config(&["z3"]), &adapters(&[z3]), None);
    let critic = LogicCritic::new(adapter);

    let (score, result) = critic.evaluate(&formula("P -> Q"), None).await;

    assert!(!result.overall_valid);
    assert_eq!(score, 0.0);
}
