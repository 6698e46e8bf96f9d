// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Property-based testing generators for formulas

use hybrid_prover::{Formula, Term};
use proptest::prelude::*;

/// Strategy for propositional atom names
pub fn atom_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["P", "Q", "R", "S"]).prop_map(str::to_string)
}

/// Strategy for bound variable names
pub fn var_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["x", "y", "z"]).prop_map(str::to_string)
}

/// Strategy for operator words the default vocabulary recognises
pub fn operator_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Always", "Eventually", "Box", "Diamond", "Obligatory", "Permitted"])
        .prop_map(str::to_string)
}

/// Strategy for simple terms (non-recursive)
pub fn simple_term() -> impl Strategy<Value = Term> {
    prop_oneof![
        var_name().prop_map(Term::Var),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(Term::constant),
    ]
}

/// Strategy for propositional formulas with bounded depth
pub fn propositional_formula(depth: u32) -> impl Strategy<Value = Formula> {
    let leaf = prop_oneof![
        8 => atom_name().prop_map(Formula::atom),
        1 => Just(Formula::True),
        1 => Just(Formula::False),
    ];
    leaf.prop_recursive(depth, 64, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::or(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::implies(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Formula::iff(l, r)),
        ]
    })
}

/// Strategy for formulas mixing quantifiers and operators
pub fn formula_with_depth(depth: u32) -> impl Strategy<Value = Formula> {
    let leaf = prop_oneof![
        atom_name().prop_map(Formula::atom),
        (atom_name(), prop::collection::vec(simple_term(), 1..3))
            .prop_map(|(name, args)| Formula::predicate(name, args)),
    ];
    leaf.prop_recursive(depth, 64, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::implies(l, r)),
            (var_name(), inner.clone()).prop_map(|(v, body)| Formula::forall(v, body)),
            (var_name(), inner.clone()).prop_map(|(v, body)| Formula::exists(v, body)),
            (operator_name(), inner).prop_map(|(op, body)| Formula::operator(op, body)),
        ]
    })
}

/// Strategy for a positive weight pair
pub fn weight_pair() -> impl Strategy<Value = (f64, f64)> {
    (0.001f64..100.0, 0.001f64..100.0)
}
