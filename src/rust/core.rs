// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core formula types shared by every prover adapter
//!
//! A [`Formula`] is an immutable first-order expression tree extended with
//! named operator wrappers (`Always(...)`, `Obligatory(...)`, `Box(...)`)
//! for modal, temporal and deontic reasoning. The core never mutates a
//! formula; its canonical string form (the `Display` output) keys every
//! cache in the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Deepest formula (counting terms) the parser and analyzer accept.
///
/// Printing, analysis and translation recurse over the tree, so deeper
/// values built by hand are rejected by [`FormulaAnalyzer::analyze`] and
/// should not be passed to provers.
///
/// [`FormulaAnalyzer::analyze`]: crate::analysis::FormulaAnalyzer::analyze
pub const MAX_DEPTH: usize = 128;

/// A first-order term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Term {
    /// Variable bound by an enclosing quantifier
    Var(String),

    /// Constant/individual
    Const(String),

    /// Function application f(args...)
    App { func: String, args: Vec<Term> },
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// Name of the head symbol
    pub fn name(&self) -> &str {
        match self {
            Term::Var(name) | Term::Const(name) => name,
            Term::App { func, .. } => func,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) | Term::Const(name) => write!(f, "{}", name),
            Term::App { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary logical connectives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Implies,
    Iff,
}

impl Connective {
    pub fn symbol(&self) -> &'static str {
        match self {
            Connective::And => "∧",
            Connective::Or => "∨",
            Connective::Implies => "→",
            Connective::Iff => "↔",
        }
    }

    /// Binding strength (higher binds tighter)
    fn precedence(&self) -> u8 {
        match self {
            Connective::Iff => 1,
            Connective::Implies => 2,
            Connective::Or => 3,
            Connective::And => 4,
        }
    }
}

/// Quantifiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Forall,
    Exists,
}

impl Quantifier {
    pub fn symbol(&self) -> &'static str {
        match self {
            Quantifier::Forall => "∀",
            Quantifier::Exists => "∃",
        }
    }
}

/// A logical formula
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Formula {
    /// Verum
    True,

    /// Falsum
    False,

    /// Predicate application; a nullary predicate is a propositional atom
    Predicate { name: String, args: Vec<Term> },

    /// Negation ¬φ
    Not(Box<Formula>),

    /// Binary connective φ ∘ ψ
    Binary {
        op: Connective,
        left: Box<Formula>,
        right: Box<Formula>,
    },

    /// Quantified formula ∀x. φ / ∃x. φ
    Quantified {
        quantifier: Quantifier,
        variable: String,
        body: Box<Formula>,
    },

    /// Named operator applied to a subformula (modal, temporal, deontic)
    Operator { name: String, body: Box<Formula> },
}

impl Formula {
    /// Propositional atom
    pub fn atom(name: impl Into<String>) -> Self {
        Formula::Predicate {
            name: name.into(),
            args: vec![],
        }
    }

    pub fn predicate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Formula::Predicate {
            name: name.into(),
            args,
        }
    }

    pub fn not(operand: Formula) -> Self {
        Formula::Not(Box::new(operand))
    }

    pub fn binary(op: Connective, left: Formula, right: Formula) -> Self {
        Formula::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::And, left, right)
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Or, left, right)
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Implies, left, right)
    }

    pub fn iff(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Iff, left, right)
    }

    pub fn forall(variable: impl Into<String>, body: Formula) -> Self {
        Formula::Quantified {
            quantifier: Quantifier::Forall,
            variable: variable.into(),
            body: Box::new(body),
        }
    }

    pub fn exists(variable: impl Into<String>, body: Formula) -> Self {
        Formula::Quantified {
            quantifier: Quantifier::Exists,
            variable: variable.into(),
            body: Box::new(body),
        }
    }

    pub fn operator(name: impl Into<String>, body: Formula) -> Self {
        Formula::Operator {
            name: name.into(),
            body: Box::new(body),
        }
    }

    /// Immediate subformulas, left to right
    pub fn children(&self) -> Vec<&Formula> {
        match self {
            Formula::True | Formula::False | Formula::Predicate { .. } => vec![],
            Formula::Not(inner) => vec![inner],
            Formula::Binary { left, right, .. } => vec![left, right],
            Formula::Quantified { body, .. } | Formula::Operator { body, .. } => vec![body],
        }
    }

    /// Number of nodes on the longest root-to-leaf path, terms included.
    ///
    /// Walks with an explicit stack so arbitrarily deep values are safe.
    pub fn depth(&self) -> usize {
        enum Node<'a> {
            Formula(&'a Formula),
            Term(&'a Term),
        }

        let mut deepest = 0;
        let mut stack = vec![(Node::Formula(self), 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match node {
                Node::Formula(Formula::Predicate { args, .. }) => {
                    stack.extend(args.iter().map(|t| (Node::Term(t), depth + 1)));
                }
                Node::Formula(formula) => {
                    let children = formula.children().into_iter();
                    stack.extend(children.map(|c| (Node::Formula(c), depth + 1)));
                }
                Node::Term(Term::App { args, .. }) => {
                    stack.extend(args.iter().map(|t| (Node::Term(t), depth + 1)));
                }
                Node::Term(_) => {}
            }
        }
        deepest
    }

    /// Canonical string used for cache keys and logging
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Whether the formula is built only from atoms, constants and connectives
    pub fn is_propositional(&self) -> bool {
        match self {
            Formula::True | Formula::False => true,
            Formula::Predicate { args, .. } => args.is_empty(),
            Formula::Not(inner) => inner.is_propositional(),
            Formula::Binary { left, right, .. } => {
                left.is_propositional() && right.is_propositional()
            }
            Formula::Quantified { .. } | Formula::Operator { .. } => false,
        }
    }

    /// Distinct predicate names, sorted
    pub fn predicate_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_predicates(&mut names);
        names
    }

    fn collect_predicates(&self, names: &mut BTreeSet<String>) {
        if let Formula::Predicate { name, .. } = self {
            names.insert(name.clone());
        }
        for child in self.children() {
            child.collect_predicates(names);
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Formula::Binary { op, .. } => op.precedence(),
            Formula::Quantified { .. } => 0,
            _ => 5,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "⊤"),
            Formula::False => write!(f, "⊥"),
            Formula::Predicate { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Formula::Not(inner) => {
                write!(f, "¬")?;
                inner.fmt_child(f, 5)
            }
            Formula::Binary { op, left, right } => {
                // Same-precedence children are parenthesised so the printed
                // form never depends on associativity.
                let p = op.precedence() + 1;
                left.fmt_child(f, p)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_child(f, p)
            }
            Formula::Quantified {
                quantifier,
                variable,
                body,
            } => write!(f, "{}{}. {}", quantifier.symbol(), variable, body),
            Formula::Operator { name, body } => write!(f, "{}({})", name, body),
        }
    }
}
