// SPDX-License-Identifier: PMPL-1.0-or-later
// Criterion benchmarks for formula analysis, parsing and cache keys

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hybrid_prover::provers::NativeProver;
use hybrid_prover::{parse_formula, CacheKey, FormulaAnalyzer, ProverAdapter};
use std::collections::BTreeMap;

const FORMULAS: [(&str, &str); 4] = [
    ("propositional", "(P -> Q) & (Q -> R) -> (P -> R)"),
    ("quantified", "forall x. exists y. R(x, y) -> R(y, x)"),
    ("temporal", "Always(P -> Eventually(Q))"),
    ("mixed", "forall x. Obligatory(P(x)) -> Permitted(P(x)) & Box(Q)"),
];

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, text) in FORMULAS {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| parse_formula(black_box(text)))
        });
    }
    group.finish();
}

fn bench_analyzer(c: &mut Criterion) {
    let analyzer = FormulaAnalyzer::new();
    let mut group = c.benchmark_group("analyze");
    for (name, text) in FORMULAS {
        let Ok(formula) = parse_formula(text) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &formula, |b, formula| {
            b.iter(|| analyzer.analyze(black_box(formula)))
        });
    }
    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let (Ok(goal), Ok(axiom)) = (parse_formula("P(a) -> Q(a)"), parse_formula("forall x. P(x)"))
    else {
        return;
    };
    let axioms = vec![axiom.clone(), axiom];
    let mut config = BTreeMap::new();
    config.insert("timeout".to_string(), "30".to_string());

    c.bench_function("cache_key_derive", |b| {
        b.iter(|| CacheKey::derive(black_box(&goal), black_box(&axioms), "z3", &config))
    });
}

fn bench_native_prover(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        return;
    };
    let prover = NativeProver::new();
    let mut group = c.benchmark_group("native_prove");
    for atoms in [4usize, 8, 12] {
        // A conjunction of excluded-middle clauses, valid for any atom count
        let text = (0..atoms)
            .map(|i| format!("P{i} | ~P{i}"))
            .collect::<Vec<_>>()
            .join(" & ");
        let Ok(formula) = parse_formula(&text) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(atoms), &formula, |b, formula| {
            b.iter(|| runtime.block_on(prover.prove(black_box(formula), &[], None)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parser,
    bench_analyzer,
    bench_cache_key,
    bench_native_prover
);
criterion_main!(benches);
