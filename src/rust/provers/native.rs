// SPDX-License-Identifier: PMPL-1.0-or-later

//! Built-in propositional prover
//!
//! Decides quantifier-free, operator-free formulas by truth-table
//! enumeration. Ground predicate applications such as `Human(socrates)` are
//! treated as opaque atoms.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ProofResult, ProverAdapter, ProverKind};
use crate::core::{Connective, Formula};

/// Largest atom count enumerated (2^20 assignments)
pub const MAX_ATOMS: usize = 20;

const NATIVE_CONFIDENCE: f64 = 0.95;

/// How often the enumeration looks at the clock
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Truth-table prover, always available
#[derive(Debug, Clone)]
pub struct NativeProver {
    max_atoms: usize,
}

impl Default for NativeProver {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeProver {
    pub fn new() -> Self {
        NativeProver {
            max_atoms: MAX_ATOMS,
        }
    }

    /// Lower the atom limit (never above [`MAX_ATOMS`])
    pub fn with_max_atoms(max_atoms: usize) -> Self {
        NativeProver {
            max_atoms: max_atoms.min(MAX_ATOMS),
        }
    }
}

#[async_trait]
impl ProverAdapter for NativeProver {
    fn kind(&self) -> ProverKind {
        ProverKind::Native
    }

    fn config_items(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        items.insert("max_atoms".to_string(), self.max_atoms.to_string());
        items
    }

    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<ProofResult> {
        let start = Instant::now();
        let goal = formula.clone();
        let premises = axioms.to_vec();
        let max_atoms = self.max_atoms;

        let verdict = tokio::task::spawn_blocking(move || {
            decide(&goal, &premises, max_atoms, start, timeout)
        })
        .await
        .map_err(|e| anyhow!("native prover task failed: {}", e))?;

        let elapsed = start.elapsed();
        let result = match verdict {
            Verdict::Valid { atoms } => {
                debug!("native: {} valid over {} atoms", formula, atoms);
                ProofResult::proved(ProverKind::Native, NATIVE_CONFIDENCE, elapsed)
                    .with_reason(format!("valid under all {} assignments", 1u64 << atoms))
            }
            Verdict::Falsified(assignment) => {
                ProofResult::disproved(ProverKind::Native, NATIVE_CONFIDENCE, elapsed)
                    .with_reason("falsifying assignment found")
                    .with_artifact(assignment)
            }
            Verdict::TimedOut => ProofResult::timed_out(ProverKind::Native, elapsed),
            Verdict::Unsupported(message) => {
                ProofResult::errored(ProverKind::Native, message, elapsed)
            }
        };
        Ok(result)
    }
}

#[derive(Debug, PartialEq)]
enum Verdict {
    Valid { atoms: usize },
    Falsified(String),
    TimedOut,
    Unsupported(String),
}

fn decide(
    goal: &Formula,
    premises: &[Formula],
    max_atoms: usize,
    start: Instant,
    timeout: Option<Duration>,
) -> Verdict {
    let mut atoms = Vec::new();
    for f in premises.iter().chain(std::iter::once(goal)) {
        if let Err(message) = collect_atoms(f, &mut atoms) {
            return Verdict::Unsupported(message);
        }
    }
    if atoms.len() > max_atoms {
        return Verdict::Unsupported(format!(
            "too many atoms for truth-table enumeration ({} > {})",
            atoms.len(),
            max_atoms
        ));
    }

    let index: BTreeMap<&str, usize> = atoms
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for assignment in 0u64..(1u64 << atoms.len()) {
        if assignment % CLOCK_CHECK_INTERVAL == 0 {
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    return Verdict::TimedOut;
                }
            }
        }

        let holds = |f: &Formula| evaluate(f, &index, assignment);
        if premises.iter().all(holds) && !holds(goal) {
            let description = atoms
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{} = {}", name, assignment & (1 << i) != 0))
                .collect::<Vec<_>>()
                .join(", ");
            return Verdict::Falsified(description);
        }
    }
    Verdict::Valid { atoms: atoms.len() }
}

/// Collect distinct atoms in first-occurrence order
fn collect_atoms(formula: &Formula, atoms: &mut Vec<String>) -> std::result::Result<(), String> {
    match formula {
        Formula::True | Formula::False => Ok(()),
        Formula::Predicate { .. } => {
            let atom = formula.canonical();
            if !atoms.contains(&atom) {
                atoms.push(atom);
            }
            Ok(())
        }
        Formula::Not(inner) => collect_atoms(inner, atoms),
        Formula::Binary { left, right, .. } => {
            collect_atoms(left, atoms)?;
            collect_atoms(right, atoms)
        }
        Formula::Quantified { .. } => Err("quantifiers are not supported".to_string()),
        Formula::Operator { name, .. } => Err(format!("operator {} is not supported", name)),
    }
}

fn evaluate(formula: &Formula, index: &BTreeMap<&str, usize>, assignment: u64) -> bool {
    match formula {
        Formula::True => true,
        Formula::False => false,
        Formula::Predicate { .. } => index
            .get(formula.canonical().as_str())
            .map(|i| assignment & (1 << i) != 0)
            .unwrap_or(false),
        Formula::Not(inner) => !evaluate(inner, index, assignment),
        Formula::Binary { op, left, right } => {
            let l = evaluate(left, index, assignment);
            let r = evaluate(right, index, assignment);
            match op {
                Connective::And => l && r,
                Connective::Or => l || r,
                Connective::Implies => !l || r,
                Connective::Iff => l == r,
            }
        }
        // Rejected by collect_atoms before evaluation starts
        Formula::Quantified { .. } | Formula::Operator { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use crate::provers::ProofOutcome;

    async fn prove(text: &str, axioms: &[&str]) -> ProofResult {
        let axioms: Vec<Formula> = axioms.iter().map(|a| parse_formula(a).unwrap()).collect();
        NativeProver::new()
            .prove(&parse_formula(text).unwrap(), &axioms, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_tautologies() {
        for text in ["P -> P", "P | ~P", "(P -> Q) & P -> Q", "~(P & ~P)", "true"] {
            let result = prove(text, &[]).await;
            assert!(result.is_proved(), "{} should be valid", text);
            assert_eq!(result.confidence(), 0.95);
        }
    }

    #[tokio::test]
    async fn test_counterexample() {
        let result = prove("P -> Q", &[]).await;
        assert!(!result.is_proved());
        assert_eq!(
            result.outcome,
            ProofOutcome::Disproved {
                confidence: 0.95,
                counterexample: Some("P = true, Q = false".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_axioms_are_premises() {
        let result = prove("Q", &["P", "P -> Q"]).await;
        assert!(result.is_proved());
    }

    #[tokio::test]
    async fn test_ground_predicates_are_atoms() {
        let result = prove("Mortal(socrates)", &["Human(socrates) -> Mortal(socrates)", "Human(socrates)"]).await;
        assert!(result.is_proved());
    }

    #[tokio::test]
    async fn test_unsupported_constructs() {
        let result = prove("forall x. P(x) -> P(x)", &[]).await;
        assert!(matches!(result.outcome, ProofOutcome::Errored { .. }));

        let result = prove("Always(P)", &[]).await;
        assert!(matches!(result.outcome, ProofOutcome::Errored { .. }));
    }

    #[tokio::test]
    async fn test_atom_limit() {
        let prover = NativeProver::with_max_atoms(2);
        let result = prover
            .prove(&parse_formula("A | B | C").unwrap(), &[], None)
            .await
            .unwrap();
        assert!(result.reason.contains("too many atoms"));
    }

    #[tokio::test]
    async fn test_zero_timeout_times_out() {
        let result = NativeProver::new()
            .prove(&parse_formula("P -> P").unwrap(), &[], Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(result.is_timeout());
    }
}
