//! Local search execution loop.

use super::config::LocalSearchConfig;
use super::moves::{add_neighborhood, change_neighborhood};
use crate::archive::NondominatedResults;
use crate::blackboard::Blackboard;
use crate::error::{MiningError, Result};
use crate::evaluation::{TargetFunction, ValuedResult};
use crate::restriction::{RestrictionClassification, RuleRestrictions};
use crate::rule::{And, RuleSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a local search walk.
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    /// Non-dominated rule sets touched by the walk.
    pub archive: NondominatedResults<RuleSet>,

    /// Number of accepted moves.
    pub steps: usize,

    /// How often the walk left a neighborhood because of a long plateau.
    pub plateau_aborts: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// Which neighborhood the walk is currently exploring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Neighborhood {
    Add,
    Change,
}

/// Rebuilds a rule set conjunction by conjunction.
///
/// The walk starts at the bare default of the initial rule set and adds
/// the initial conjunctions one at a time. After every addition it
/// first tries variations of the conjunction just added and only falls
/// back to further additions when no variation improves the target.
pub struct LocalSearch;

impl LocalSearch {
    /// Runs a walk from `initial` minimizing `target`.
    pub fn run(
        blackboard: &mut Blackboard,
        initial: &ValuedResult<RuleSet>,
        target: &TargetFunction,
        config: &LocalSearchConfig,
    ) -> Result<LocalSearchResult> {
        Self::run_with_cancel(blackboard, initial, target, config, None)
    }

    /// Runs a walk with an optional cancellation token.
    pub fn run_with_cancel(
        blackboard: &mut Blackboard,
        initial: &ValuedResult<RuleSet>,
        target: &TargetFunction,
        config: &LocalSearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<LocalSearchResult> {
        config.validate().map_err(MiningError::InvalidConfig)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => blackboard.create_rng(),
        };

        let mut archive = NondominatedResults::new();
        archive.add(blackboard.make_valid_and_evaluate(&initial.item));
        let stub = RuleSet::new(initial.item.default_verdict());
        let mut current = blackboard.make_valid_and_evaluate(&stub);
        archive.add(current.clone());

        let mut inclusion_pool = pool(
            initial.item.inclusions(),
            current.item.inclusions(),
            blackboard.inclusion_restrictions(),
        );
        let mut exclusion_pool = pool(
            initial.item.exclusions(),
            current.item.exclusions(),
            blackboard.exclusion_restrictions(),
        );

        let mut last_addition: Option<And> = None;
        let mut neighborhood = Neighborhood::Add;
        let mut steps_on_plateau = 0usize;
        let mut steps = 0usize;
        let mut plateau_aborts = 0usize;
        let mut cancelled = false;

        for _ in 0..config.max_iterations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    info!(steps, "local search cancelled");
                    break;
                }
            }

            let mut moves = match (neighborhood, &last_addition) {
                (Neighborhood::Change, Some(last)) => change_neighborhood(last, blackboard.records(), &mut rng),
                (Neighborhood::Change, None) => Vec::new(),
                (Neighborhood::Add, _) => add_neighborhood(&inclusion_pool, &exclusion_pool),
            };
            moves.shuffle(&mut rng);

            let mut best_move = None;
            let mut best = current.clone();
            let mut best_is_plateau = false;
            for candidate in moves {
                let evaluated = blackboard.make_valid_and_evaluate(&candidate.apply(&current.item));
                blackboard.simplify_evaluate_and_add(&evaluated.item);
                let is_new = archive.add(evaluated.clone()).is_new_item();
                let value = target.apply(&evaluated.values);
                let best_value = target.apply(&best.values);
                if value < best_value || (value == best_value && is_new) {
                    best_is_plateau = evaluated.has_same_values(&current);
                    best_move = Some(candidate);
                    best = evaluated;
                }
            }

            if best_is_plateau {
                steps_on_plateau += 1;
                if steps_on_plateau > config.plateau_step_limit {
                    warn!(
                        steps_on_plateau,
                        "leaving neighborhood after too many steps on a plateau"
                    );
                    plateau_aborts += 1;
                    best_move = None;
                }
            } else {
                steps_on_plateau = 0;
            }

            let Some(chosen) = best_move else {
                if neighborhood == Neighborhood::Change {
                    neighborhood = Neighborhood::Add;
                    continue;
                }
                break;
            };
            debug!(value = target.apply(&best.values), rule_set = %best.item, "local search step");
            current = best;
            chosen.adapt_pools(&mut inclusion_pool, &mut exclusion_pool);
            last_addition = Some(chosen.last_addition().clone());
            neighborhood = Neighborhood::Change;
            steps += 1;
        }

        info!(steps, plateau_aborts, found = archive.len(), "local search finished");
        Ok(LocalSearchResult {
            archive,
            steps,
            plateau_aborts,
            cancelled,
        })
    }
}

/// Initial conjunctions not yet in the current rule set and not rejected,
/// in their original order.
fn pool(initial: &[And], current: &[And], restrictions: &RuleRestrictions) -> Vec<And> {
    let mut pool: Vec<And> = Vec::new();
    for and in initial {
        if current.contains(and)
            || pool.contains(and)
            || restrictions.classify(and) == RestrictionClassification::Rejected
        {
            continue;
        }
        pool.push(and.clone());
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
    use crate::restriction::RestrictionKind;
    use crate::rule::{parse_and, Rule};
    use crate::testing::one_numeric_column;

    fn board() -> Blackboard {
        let data = one_numeric_column(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        Blackboard::new(data, None, None, 42).unwrap()
    }

    fn include(board: &Blackboard, text: &str) -> RuleSet {
        RuleSet::skip_none().include(parse_and(board.records().scheme(), text).unwrap())
    }

    fn contains(archive: &NondominatedResults<RuleSet>, rule_set: &RuleSet) -> bool {
        archive.items().iter().any(|r| &r.item == rule_set)
    }

    fn search(board: &mut Blackboard, initial: &RuleSet, seed: u64) -> LocalSearchResult {
        let start = board.make_valid_and_evaluate(initial);
        let config = LocalSearchConfig::default().with_seed(seed);
        LocalSearch::run(board, &start, &TargetFunction::ratio(), &config).unwrap()
    }

    // ---- Convergence ----

    #[test]
    fn test_drops_redundant_condition() {
        let mut b = board();
        let initial = include(&b, "(numCol<=3.5 and numCol<=4.5)");
        let result = search(&mut b, &initial, 42);
        assert!(contains(&result.archive, &include(&b, "(numCol<=3.5)")));
        assert!(result.steps >= 2);
    }

    #[test]
    fn test_finds_separating_threshold_for_any_seed() {
        for seed in [1, 2, 3, 42] {
            let mut b = board();
            let initial = include(&b, "(numCol<=2.5 and numCol<=4.5)");
            let result = search(&mut b, &initial, seed);
            assert!(
                contains(&result.archive, &include(&b, "(numCol<=3.5)")),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_single_condition_threshold_moves_up() {
        for seed in [1, 2, 3, 7, 42, 99] {
            let mut b = board();
            let initial = include(&b, "(numCol<=2.5)");
            let result = search(&mut b, &initial, seed);
            assert!(
                contains(&result.archive, &include(&b, "(numCol<=3.5)")),
                "seed {seed}"
            );
        }
    }

    /// One ticket with an all-zero record and, per column, a harmless
    /// change with value 1 and a triggering change with value 2.
    fn many_columns(count: usize) -> RecordSet {
        let names: Vec<String> = (0..count).map(|i| format!("c{i}")).collect();
        let scheme = RecordScheme::new(&names, Vec::<&str>::new()).unwrap();
        let mut records = vec![Record::new(
            ChangePartId::new("TIC-123", "zero", "cccc"),
            vec![0.0; count],
            vec![],
            TriggerClassification::NoTrigger,
        )];
        for i in 0..count {
            for (file, value, class) in [
                ("cccc", 1.0, TriggerClassification::NoTrigger),
                ("dddd", 2.0, TriggerClassification::MustBe),
            ] {
                let mut values = vec![0.0; count];
                values[i] = value;
                records.push(Record::new(
                    ChangePartId::new("TIC-123", format!("f{i}"), file),
                    values,
                    vec![],
                    class,
                ));
            }
        }
        RecordSet::new(scheme, records)
    }

    #[test]
    fn test_every_threshold_moves_in_many_dimensions() {
        let count = 30;
        let mut b = Blackboard::new(many_columns(count), None, None, 42).unwrap();
        let scheme = b.records().scheme().clone();
        let conjunction = |value: f64| {
            And::new((0..count).map(|i| Rule::leq(&scheme, &format!("c{i}"), value).unwrap()))
        };
        let initial = RuleSet::skip_none().include(conjunction(0.5));
        let expected = RuleSet::skip_none().include(conjunction(1.5));
        let result = search(&mut b, &initial, 42);
        assert!(contains(&result.archive, &expected));
        assert!(result.steps >= count);
    }

    #[test]
    fn test_rejected_conjunction_is_avoided() {
        let mut b = board();
        let rejected = parse_and(b.records().scheme(), "(numCol<=3.5)").unwrap();
        b.edit_restrictions(RestrictionKind::Inclusions, |r| r.reject([rejected]));
        let initial = include(&b, "(numCol<=2.5 and numCol<=4.5)");
        let result = search(&mut b, &initial, 42);
        assert!(contains(&result.archive, &include(&b, "(numCol<=2.5)")));
        assert!(!contains(&result.archive, &include(&b, "(numCol<=3.5)")));
    }

    // ---- Archive and bookkeeping ----

    #[test]
    fn test_archive_seeded_with_initial_and_stub() {
        let mut b = board();
        let initial = include(&b, "(numCol<=1.5)");
        let result = search(&mut b, &initial, 42);
        let items: Vec<RuleSet> = result.archive.items().into_iter().map(|r| r.item).collect();
        assert!(contains(&result.archive, &RuleSet::skip_none()), "got {items:?}");
        assert!(b.cache_size() >= 2);
    }

    #[test]
    fn test_moves_feed_blackboard_archive() {
        let mut b = board();
        let initial = include(&b, "(numCol<=2.5 and numCol<=4.5)");
        search(&mut b, &initial, 42);
        let shared = b.nondominated_results_snapshot();
        assert!(contains(&shared, &include(&b, "(numCol<=3.5)")));
    }

    #[test]
    fn test_rejected_pool_entries_are_dropped() {
        let b = board();
        let scheme = b.records().scheme();
        let a = parse_and(scheme, "(numCol<=1.5)").unwrap();
        let c = parse_and(scheme, "(numCol<=2.5)").unwrap();
        let mut restrictions = RuleRestrictions::new(RestrictionKind::Inclusions);
        restrictions.reject([c.clone()]);
        let pooled = pool(&[a.clone(), c, a.clone()], &[], &restrictions);
        assert_eq!(pooled, vec![a]);
    }

    #[test]
    fn test_cancelled_walk_returns_seeded_archive() {
        let mut b = board();
        let initial = include(&b, "(numCol<=2.5 and numCol<=4.5)");
        let start = b.make_valid_and_evaluate(&initial);
        let flag = Arc::new(AtomicBool::new(true));
        let config = LocalSearchConfig::default().with_seed(1);
        let result =
            LocalSearch::run_with_cancel(&mut b, &start, &TargetFunction::ratio(), &config, Some(flag)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.steps, 0);
        assert!(!result.archive.is_empty());
    }

    #[test]
    fn test_iteration_budget() {
        let mut b = board();
        let initial = include(&b, "(numCol<=2.5 and numCol<=4.5)");
        let start = b.make_valid_and_evaluate(&initial);
        let config = LocalSearchConfig::default().with_seed(1).with_max_iterations(1);
        let result = LocalSearch::run(&mut b, &start, &TargetFunction::ratio(), &config).unwrap();
        assert_eq!(result.steps, 1);
        assert!(!result.cancelled);
    }
}
