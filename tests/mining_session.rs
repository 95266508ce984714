//! End-to-end mining session: greedy seed, local search, path relinking.

use skip_rules::blackboard::Blackboard;
use skip_rules::greedy::{GreedyConfig, GreedyRuleCreation};
use skip_rules::local_search::{LocalSearch, LocalSearchConfig};
use skip_rules::path_relinking::{PathRelinking, PathRelinkingConfig};
use skip_rules::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
use skip_rules::rule::RuleSet;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Small changes never trigger a remark, large ones always do.
fn separable_data() -> RecordSet {
    let scheme = RecordScheme::new(["size", "age"], ["area"]).unwrap();
    let records = (0..8)
        .map(|i| {
            let class = if i >= 4 {
                TriggerClassification::MustBe
            } else {
                TriggerClassification::NoTrigger
            };
            Record::new(
                ChangePartId::new(format!("T{i}"), "c1", format!("f{i}.rs")),
                vec![i as f64, ((i * 7) % 5) as f64],
                vec![Some(if i % 2 == 0 { "core" } else { "ui" }.to_string())],
                class,
            )
        })
        .collect();
    RecordSet::new(scheme, records)
}

#[test]
fn test_session_finds_lossless_skip_rule() {
    init_tracing();
    let mut board = Blackboard::new(separable_data(), None, None, 42).unwrap();

    let greedy = GreedyRuleCreation::run(
        &board,
        &GreedyConfig::default()
            .with_random_condition_probability(0.0)
            .with_seed(1),
    )
    .unwrap();
    let seeded = board.simplify_evaluate_and_add(&greedy.rule_set);
    assert_eq!(seeded.values.missed_remark_count, 0.0);
    assert_eq!(seeded.values.saved_hunk_count, -4.0);

    let target = board.current_target_function().clone();
    let local = LocalSearch::run(&mut board, &seeded, &target, &LocalSearchConfig::default().with_seed(2)).unwrap();
    assert!(!local.archive.is_empty());
    assert!(!local.cancelled);

    PathRelinking::perform_with(&mut board, &seeded, &PathRelinkingConfig::default().with_seed(3)).unwrap();

    let archive = board.nondominated_results_snapshot();
    let items = archive.items();
    assert!(items.iter().any(|r| r.values.missed_remark_count == 0.0 && r.values.saved_hunk_count == -4.0));
    for a in &items {
        assert!(items.iter().all(|b| !b.dominates(a)));
    }
}

#[test]
fn test_session_is_reproducible_from_seed() {
    init_tracing();
    let run = || {
        let board = Blackboard::new(separable_data(), None, None, 7).unwrap();
        GreedyRuleCreation::run(&board, &GreedyConfig::default()).unwrap().rule_set
    };
    let first: RuleSet = run();
    assert_eq!(first, run());
}
