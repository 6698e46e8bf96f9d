// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Formula analysis and prover recommendation
//!
//! [`FormulaAnalyzer::analyze`] walks a formula once and summarises its
//! shape: which logic families it touches, how deeply quantifiers nest, how
//! many connectives it uses, and a 0-100 complexity score. The summary is a
//! pure function of the formula's structure, so two calls on equal formulas
//! always agree.
//!
//! Recommendations come from a static profile table. Provers whose declared
//! capabilities cover every detected feature are ranked fastest-first; if no
//! prover covers everything, partial matches are ranked by how many features
//! they do cover.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::core::{Formula, Term, MAX_DEPTH};
use crate::error::{Error, Result};
use crate::provers::ProverKind;

/// Coarse classification of a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaType {
    Propositional,
    Quantified,
    Modal,
    Temporal,
    Deontic,
    Mixed,
}

/// Complexity band derived from the complexity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Trivial,
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ComplexityLevel {
    /// Band for a score in [0, 100]
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            ComplexityLevel::Trivial
        } else if score < 35.0 {
            ComplexityLevel::Simple
        } else if score < 55.0 {
            ComplexityLevel::Moderate
        } else if score < 75.0 {
            ComplexityLevel::Complex
        } else {
            ComplexityLevel::VeryComplex
        }
    }
}

/// Families of non-classical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorFamily {
    Modal,
    Temporal,
    Deontic,
}

/// Operator and predicate names that mark modal, temporal and deontic content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub modal: BTreeSet<String>,
    pub temporal: BTreeSet<String>,
    pub deontic: BTreeSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn words(list: &[&str]) -> BTreeSet<String> {
            list.iter().map(|w| w.to_string()).collect()
        }

        Vocabulary {
            modal: words(&["Box", "Diamond", "Necessarily", "Possibly", "Knows", "Believes"]),
            temporal: words(&["Always", "Eventually", "Next", "Globally", "Finally", "Henceforth"]),
            deontic: words(&[
                "Obligatory",
                "Permitted",
                "Forbidden",
                "Obligation",
                "Permission",
                "Prohibition",
            ]),
        }
    }
}

impl Vocabulary {
    /// Family a name belongs to, if any. Temporal wins over modal, modal over deontic.
    pub fn family(&self, name: &str) -> Option<OperatorFamily> {
        if self.temporal.contains(name) {
            Some(OperatorFamily::Temporal)
        } else if self.modal.contains(name) {
            Some(OperatorFamily::Modal)
        } else if self.deontic.contains(name) {
            Some(OperatorFamily::Deontic)
        } else {
            None
        }
    }
}

/// Structural summary of a formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaAnalysis {
    pub formula_type: FormulaType,
    pub quantifier_depth: usize,
    pub nesting_level: usize,
    pub operator_count: usize,
    pub has_modal_operators: bool,
    pub has_temporal_operators: bool,
    pub has_deontic_operators: bool,
    pub has_quantifiers: bool,
    pub complexity_score: f64,
    pub complexity_level: ComplexityLevel,
    pub recommended_provers: Vec<ProverKind>,
}

/// Declared capabilities of a prover backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverProfile {
    pub prover: ProverKind,
    pub handles_quantifiers: bool,
    pub handles_modal: bool,
    pub handles_temporal: bool,
    pub handles_deontic: bool,
    /// Relative speed, lower is faster
    pub speed_rank: u8,
}

impl ProverProfile {
    fn new(prover: ProverKind, caps: [bool; 4], speed_rank: u8) -> Self {
        ProverProfile {
            prover,
            handles_quantifiers: caps[0],
            handles_modal: caps[1],
            handles_temporal: caps[2],
            handles_deontic: caps[3],
            speed_rank,
        }
    }

    /// Default table for the six profiled backends
    pub fn default_table() -> Vec<ProverProfile> {
        vec![
            ProverProfile::new(ProverKind::Native, [false, false, false, false], 0),
            ProverProfile::new(ProverKind::Z3, [true, false, false, false], 1),
            ProverProfile::new(ProverKind::Cvc5, [true, false, false, false], 2),
            ProverProfile::new(ProverKind::SymbolicAi, [true, true, true, true], 3),
            ProverProfile::new(ProverKind::Lean, [true, true, true, true], 4),
            ProverProfile::new(ProverKind::Coq, [true, true, true, true], 5),
        ]
    }

    /// (features covered, features required)
    fn coverage(&self, analysis: &FormulaAnalysis) -> (usize, usize) {
        let pairs = [
            (analysis.has_quantifiers, self.handles_quantifiers),
            (analysis.has_modal_operators, self.handles_modal),
            (analysis.has_temporal_operators, self.handles_temporal),
            (analysis.has_deontic_operators, self.handles_deontic),
        ];
        let required = pairs.iter().filter(|(needed, _)| *needed).count();
        let covered = pairs.iter().filter(|(needed, handled)| *needed && *handled).count();
        (covered, required)
    }
}

/// Stateless formula analyzer
#[derive(Debug, Clone)]
pub struct FormulaAnalyzer {
    vocabulary: Vocabulary,
    profiles: Vec<ProverProfile>,
}

impl Default for FormulaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Walk {
    max_depth: usize,
    max_quantifier_depth: usize,
    operator_count: usize,
    families: BTreeSet<FamilyMark>,
    has_quantifiers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FamilyMark {
    Modal,
    Temporal,
    Deontic,
}

impl From<OperatorFamily> for FamilyMark {
    fn from(family: OperatorFamily) -> Self {
        match family {
            OperatorFamily::Modal => FamilyMark::Modal,
            OperatorFamily::Temporal => FamilyMark::Temporal,
            OperatorFamily::Deontic => FamilyMark::Deontic,
        }
    }
}

impl FormulaAnalyzer {
    /// Analyzer with the default vocabulary and profile table
    pub fn new() -> Self {
        Self::with_profiles(Vocabulary::default(), ProverProfile::default_table())
    }

    pub fn with_profiles(vocabulary: Vocabulary, profiles: Vec<ProverProfile>) -> Self {
        FormulaAnalyzer {
            vocabulary,
            profiles,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn profiles(&self) -> &[ProverProfile] {
        &self.profiles
    }

    /// Analyze a formula.
    ///
    /// Fails with [`Error::InvalidFormula`] for structurally malformed values
    /// (empty predicate, operator or bound-variable names) and with
    /// [`Error::TooDeep`] past [`MAX_DEPTH`].
    pub fn analyze(&self, formula: &Formula) -> Result<FormulaAnalysis> {
        if formula.depth() > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let mut walk = Walk::default();
        self.walk(formula, 1, 0, &mut walk)?;

        let has_modal = walk.families.contains(&FamilyMark::Modal);
        let has_temporal = walk.families.contains(&FamilyMark::Temporal);
        let has_deontic = walk.families.contains(&FamilyMark::Deontic);

        let formula_type = match (walk.has_quantifiers, walk.families.len()) {
            (false, 0) => FormulaType::Propositional,
            (true, 0) => FormulaType::Quantified,
            (false, 1) if has_modal => FormulaType::Modal,
            (false, 1) if has_temporal => FormulaType::Temporal,
            (false, 1) => FormulaType::Deontic,
            _ => FormulaType::Mixed,
        };

        let complexity_score =
            complexity_score(walk.max_depth, walk.max_quantifier_depth, walk.operator_count);

        let mut analysis = FormulaAnalysis {
            formula_type,
            quantifier_depth: walk.max_quantifier_depth,
            nesting_level: walk.max_depth,
            operator_count: walk.operator_count,
            has_modal_operators: has_modal,
            has_temporal_operators: has_temporal,
            has_deontic_operators: has_deontic,
            has_quantifiers: walk.has_quantifiers,
            complexity_score,
            complexity_level: ComplexityLevel::from_score(complexity_score),
            recommended_provers: vec![],
        };
        analysis.recommended_provers = self.recommend(&analysis);

        debug!(
            "Analyzed formula: type={:?}, score={:.1}, recommended={:?}",
            analysis.formula_type, analysis.complexity_score, analysis.recommended_provers
        );

        Ok(analysis)
    }

    /// Rank profiled provers for an analysis, best first, without duplicates
    pub fn recommend(&self, analysis: &FormulaAnalysis) -> Vec<ProverKind> {
        let scored: Vec<(&ProverProfile, usize, usize)> = self
            .profiles
            .iter()
            .map(|p| {
                let (covered, required) = p.coverage(analysis);
                (p, covered, required)
            })
            .collect();

        let full: Vec<_> = scored
            .iter()
            .filter(|(_, covered, required)| covered == required)
            .cloned()
            .collect();
        let mut candidates = if full.is_empty() { scored } else { full };

        candidates.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(a.0.speed_rank.cmp(&b.0.speed_rank))
                .then(a.0.prover.cmp(&b.0.prover))
        });

        let mut ranked = Vec::with_capacity(candidates.len());
        for (profile, _, _) in candidates {
            if !ranked.contains(&profile.prover) {
                ranked.push(profile.prover);
            }
        }
        ranked
    }

    fn walk(
        &self,
        formula: &Formula,
        depth: usize,
        quantifier_depth: usize,
        walk: &mut Walk,
    ) -> Result<()> {
        walk.max_depth = walk.max_depth.max(depth);
        walk.max_quantifier_depth = walk.max_quantifier_depth.max(quantifier_depth);

        match formula {
            Formula::True | Formula::False => {}
            Formula::Predicate { name, args } => {
                if name.is_empty() {
                    return Err(Error::InvalidFormula("predicate with empty name".to_string()));
                }
                if let Some(family) = self.vocabulary.family(name) {
                    walk.families.insert(family.into());
                }
                for arg in args {
                    check_term(arg)?;
                }
            }
            Formula::Not(inner) => {
                walk.operator_count += 1;
                self.walk(inner, depth + 1, quantifier_depth, walk)?;
            }
            Formula::Binary { left, right, .. } => {
                walk.operator_count += 1;
                self.walk(left, depth + 1, quantifier_depth, walk)?;
                self.walk(right, depth + 1, quantifier_depth, walk)?;
            }
            Formula::Quantified { variable, body, .. } => {
                if variable.is_empty() {
                    return Err(Error::InvalidFormula("quantifier without a variable".to_string()));
                }
                walk.has_quantifiers = true;
                walk.max_quantifier_depth = walk.max_quantifier_depth.max(quantifier_depth + 1);
                self.walk(body, depth + 1, quantifier_depth + 1, walk)?;
            }
            Formula::Operator { name, body } => {
                if name.is_empty() {
                    return Err(Error::InvalidFormula("operator with empty name".to_string()));
                }
                if let Some(family) = self.vocabulary.family(name) {
                    walk.families.insert(family.into());
                }
                self.walk(body, depth + 1, quantifier_depth, walk)?;
            }
        }
        Ok(())
    }
}

fn check_term(term: &Term) -> Result<()> {
    if term.name().is_empty() {
        return Err(Error::InvalidFormula("term with empty name".to_string()));
    }
    if let Term::App { args, .. } = term {
        for arg in args {
            check_term(arg)?;
        }
    }
    Ok(())
}

/// Weighted sum of the structural measures, capped at 100
fn complexity_score(nesting_level: usize, quantifier_depth: usize, operator_count: usize) -> f64 {
    let raw = 5.0 * nesting_level as f64 + 12.0 * quantifier_depth as f64 + 3.0 * operator_count as f64;
    raw.min(100.0)
}
