//! Criterion benchmarks for skip-rules mining agents.
//!
//! Uses synthetic change parts (two numeric columns, one string column,
//! a few records per ticket) to measure evaluation and search overhead.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skip_rules::blackboard::Blackboard;
use skip_rules::evaluation::{TargetFunction, ValuedResult};
use skip_rules::greedy::{GreedyConfig, GreedyRuleCreation};
use skip_rules::local_search::{LocalSearch, LocalSearchConfig};
use skip_rules::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
use skip_rules::rule::RuleSet;
use skip_rules::trigger::RemarkTriggerMap;

// ===========================================================================
// Synthetic data: large changes in "core" files tend to trigger remarks
// ===========================================================================

fn synthetic(records: usize) -> RecordSet {
    let scheme = RecordScheme::new(["added", "removed"], ["area"]).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let areas = ["core", "ui", "docs", "test"];
    let rows = (0..records)
        .map(|i| {
            let added = rng.random_range(0.0..200.0_f64).round();
            let removed = rng.random_range(0.0..100.0_f64).round();
            let area = areas[rng.random_range(0..areas.len())];
            let risky = added > 120.0 || (area == "core" && removed > 40.0);
            let class = if risky && rng.random_bool(0.6) {
                TriggerClassification::MustBe
            } else {
                TriggerClassification::NoTrigger
            };
            Record::new(
                ChangePartId::new(format!("T{}", i / 4), "c", format!("F{i}")),
                vec![added, removed],
                vec![Some(area.to_string())],
                class,
            )
        })
        .collect();
    RecordSet::new(scheme, rows)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    group.sample_size(10);

    for &n in &[200usize, 1000, 5000] {
        let data = synthetic(n);
        let map = RemarkTriggerMap::from_must_records(&data);
        let rule_set = RuleSet::parse(
            data.scheme(),
            "normally use review\nskip when one of\n(added<=80.0 and area != 'core')\n(removed<=5.0)\nunless one of\n(area == 'ui' and added>=150.0)",
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &(data, map), |b, (d, m)| {
            b.iter(|| {
                let result = ValuedResult::create(black_box(rule_set.clone()), d, m, Some(0));
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy");
    group.sample_size(10);

    for &n in &[200usize, 1000] {
        let board = Blackboard::new(synthetic(n), None, None, 42).unwrap();
        let config = GreedyConfig::default().with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(board, config), |b, (bb, cfg)| {
            b.iter(|| {
                let result = GreedyRuleCreation::run(black_box(bb), black_box(cfg)).unwrap();
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_local_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_search");
    group.sample_size(10);

    for &n in &[200usize, 1000] {
        let data = synthetic(n);
        let config = LocalSearchConfig::default().with_seed(42).with_max_iterations(50);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(data, config), |b, (d, cfg)| {
            b.iter_batched(
                || Blackboard::new(d.clone(), None, None, 42).unwrap(),
                |mut board| {
                    let greedy = GreedyRuleCreation::run(&board, &GreedyConfig::default().with_seed(7)).unwrap();
                    let initial = board.make_valid_and_evaluate(&greedy.rule_set);
                    let result = LocalSearch::run(&mut board, &initial, &TargetFunction::ratio(), cfg).unwrap();
                    black_box(result)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_greedy, bench_local_search);
criterion_main!(benches);
