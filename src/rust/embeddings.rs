// SPDX-License-Identifier: PMPL-1.0-or-later

//! Similarity matching against previously verified formulas
//!
//! Every subformula and term is reduced to a shape string in which bound
//! variables are replaced by binder distance, so `forall x. P(x)` and
//! `forall y. P(y)` share a shape. A formula's embedding counts the shapes of
//! all its subtrees, which keeps argument order and nesting visible:
//! `P -> (Q -> P)` and `P -> (P -> Q)` share their atoms but not their
//! implications. Embeddings are compared by cosine similarity.
//!
//! Only a stored question with the same shape answers with a verdict. A near
//! match is reported but never answers, since one differing subformula can
//! flip validity.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::{Formula, Term};
use crate::provers::{ProofResult, ProverAdapter, ProverKind};

/// Minimum similarity for a near match to be reported
pub const DEFAULT_THRESHOLD: f64 = 0.92;

/// Sparse subtree-shape count vector
pub type Embedding = BTreeMap<String, f64>;

/// Best stored match for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarFormula {
    pub formula: String,
    pub similarity: f64,
    /// Same question up to renaming of bound variables
    pub exact: bool,
    pub is_valid: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    formula: String,
    shape: String,
    embedding: Embedding,
    norm: f64,
    is_valid: bool,
    confidence: f64,
}

/// Verified-formula index usable as a (weak) neural prover
pub struct EmbeddingIndex {
    threshold: f64,
    entries: RwLock<Vec<IndexEntry>>,
}

impl Default for EmbeddingIndex {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl EmbeddingIndex {
    pub fn new(threshold: f64) -> Self {
        EmbeddingIndex {
            threshold: threshold.clamp(0.0, 1.0),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a verdict; an existing entry with the same shape is replaced
    pub fn record(&self, formula: &Formula, axioms: &[Formula], is_valid: bool, confidence: f64) {
        let question = Question::new(formula, axioms);
        let entry = IndexEntry {
            formula: question_key(formula, axioms),
            norm: norm(&question.embedding),
            shape: question.shape,
            embedding: question.embedding,
            is_valid,
            confidence: confidence.clamp(0.0, 1.0),
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.shape == entry.shape) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Most similar stored formula, if any. An exact match always wins.
    pub fn similar(&self, formula: &Formula, axioms: &[Formula]) -> Option<SimilarFormula> {
        let query = Question::new(formula, axioms);
        let query_norm = norm(&query.embedding);
        if query_norm == 0.0 {
            return None;
        }

        let entries = self.entries.read();
        if let Some(e) = entries.iter().find(|e| e.shape == query.shape) {
            return Some(SimilarFormula {
                formula: e.formula.clone(),
                similarity: 1.0,
                exact: true,
                is_valid: e.is_valid,
                confidence: e.confidence,
            });
        }

        entries
            .iter()
            .filter(|e| e.norm > 0.0)
            .map(|e| (e, dot(&query.embedding, &e.embedding) / (query_norm * e.norm)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(e, similarity)| SimilarFormula {
                formula: e.formula.clone(),
                similarity: similarity.clamp(0.0, 1.0),
                exact: false,
                is_valid: e.is_valid,
                confidence: e.confidence,
            })
    }
}

fn question_key(formula: &Formula, axioms: &[Formula]) -> String {
    let mut axioms: Vec<String> = axioms.iter().map(Formula::canonical).collect();
    axioms.sort();
    if axioms.is_empty() {
        formula.canonical()
    } else {
        format!("{} ⊢ {}", axioms.join(", "), formula)
    }
}

/// Shape and embedding of a goal under axioms
struct Question {
    shape: String,
    embedding: Embedding,
}

impl Question {
    fn new(formula: &Formula, axioms: &[Formula]) -> Self {
        let mut embedding = Embedding::new();
        let goal = Shapes::new("", &mut embedding).formula(formula);
        let mut axiom_shapes: Vec<String> = axioms
            .iter()
            .map(|axiom| Shapes::new("ax:", &mut embedding).formula(axiom))
            .collect();
        axiom_shapes.sort();
        Question {
            shape: format!("{} ⊢ {}", axiom_shapes.join(", "), goal),
            embedding,
        }
    }
}

/// Subtree-shape counts for the goal, with axiom shapes kept in a separate namespace
pub fn embed(formula: &Formula, axioms: &[Formula]) -> Embedding {
    Question::new(formula, axioms).embedding
}

/// Bottom-up shape builder that counts every subtree it visits
struct Shapes<'e> {
    prefix: &'static str,
    scope: Vec<String>,
    embedding: &'e mut Embedding,
}

impl<'e> Shapes<'e> {
    fn new(prefix: &'static str, embedding: &'e mut Embedding) -> Self {
        Shapes {
            prefix,
            scope: Vec::new(),
            embedding,
        }
    }

    fn bump(&mut self, shape: &str) {
        *self
            .embedding
            .entry(format!("{}{}", self.prefix, shape))
            .or_insert(0.0) += 1.0;
    }

    fn formula(&mut self, formula: &Formula) -> String {
        let shape = match formula {
            Formula::True => "⊤".to_string(),
            Formula::False => "⊥".to_string(),
            Formula::Predicate { name, args } if args.is_empty() => name.clone(),
            Formula::Predicate { name, args } => {
                let args: Vec<String> = args.iter().map(|t| self.term(t)).collect();
                format!("{}({})", name, args.join(","))
            }
            Formula::Not(inner) => format!("¬{}", self.formula(inner)),
            Formula::Binary { op, left, right } => {
                let left = self.formula(left);
                let right = self.formula(right);
                format!("({}{}{})", left, op.symbol(), right)
            }
            Formula::Quantified {
                quantifier,
                variable,
                body,
            } => {
                self.scope.push(variable.clone());
                let body = self.formula(body);
                self.scope.pop();
                format!("{}.{}", quantifier.symbol(), body)
            }
            Formula::Operator { name, body } => format!("{}[{}]", name, self.formula(body)),
        };
        self.bump(&shape);
        shape
    }

    fn term(&mut self, term: &Term) -> String {
        let shape = match term {
            Term::Var(name) => match self.scope.iter().rev().position(|bound| bound == name) {
                Some(distance) => format!("#{}", distance),
                None => name.clone(),
            },
            Term::Const(name) => name.clone(),
            Term::App { func, args } => {
                let args: Vec<String> = args.iter().map(|t| self.term(t)).collect();
                format!("{}({})", func, args.join(","))
            }
        };
        self.bump(&shape);
        shape
    }
}

fn dot(a: &Embedding, b: &Embedding) -> f64 {
    a.iter()
        .filter_map(|(k, x)| b.get(k).map(|y| x * y))
        .sum()
}

fn norm(v: &Embedding) -> f64 {
    v.values().map(|x| x * x).sum::<f64>().sqrt()
}

#[async_trait]
impl ProverAdapter for EmbeddingIndex {
    fn kind(&self) -> ProverKind {
        ProverKind::Embeddings
    }

    fn config_items(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        items.insert("threshold".to_string(), self.threshold.to_string());
        items
    }

    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        _timeout: Option<Duration>,
    ) -> Result<ProofResult> {
        let start = Instant::now();
        let result = match self.similar(formula, axioms) {
            Some(m) if m.exact => {
                debug!("Embedding match for {}: {}", formula, m.formula);
                let confidence = m.similarity * m.confidence;
                if m.is_valid {
                    ProofResult::proved(ProverKind::Embeddings, confidence, start.elapsed())
                } else {
                    ProofResult::disproved(ProverKind::Embeddings, confidence, start.elapsed())
                }
                .with_reason(format!("same shape as {}", m.formula))
            }
            Some(m) if m.similarity >= self.threshold => {
                debug!(
                    "Near match for {}: {} (similarity {:.3}), not answering",
                    formula, m.formula, m.similarity
                );
                ProofResult::errored(
                    ProverKind::Embeddings,
                    format!(
                        "only a near match: {} (similarity {:.2})",
                        m.formula, m.similarity
                    ),
                    start.elapsed(),
                )
            }
            _ => ProofResult::errored(ProverKind::Embeddings, "no similar formula", start.elapsed()),
        };
        Ok(result.with_backend("embeddings"))
    }
}
