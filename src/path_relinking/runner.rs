//! Path relinking execution loop.

use super::config::PathRelinkingConfig;
use crate::blackboard::Blackboard;
use crate::error::{MiningError, Result};
use crate::evaluation::{TargetFunction, ValuedResult};
use crate::rule::{And, RuleSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one relinking walk.
#[derive(Debug, Clone)]
pub struct PathRelinkingResult {
    /// Position where the walk stopped. Equals the end of the path unless
    /// cancelled or out of steps.
    pub final_rule_set: RuleSet,

    /// Number of applied moves.
    pub steps: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// One step towards the end of the path.
#[derive(Debug, Clone, PartialEq)]
enum RelinkAction {
    RemoveInclusion(And),
    RemoveExclusion(And),
    Include(And),
    Exclude(And),
}

impl RelinkAction {
    fn apply(&self, rule_set: &RuleSet) -> RuleSet {
        match self {
            RelinkAction::RemoveInclusion(and) => rule_set.remove_inclusion(and),
            RelinkAction::RemoveExclusion(and) => rule_set.remove_exclusion(and),
            RelinkAction::Include(and) => rule_set.include(and.clone()),
            RelinkAction::Exclude(and) => rule_set.exclude(and.clone()),
        }
    }
}

/// Archive member a candidate is relinked with.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    BestInLimits,
    Random,
}

/// Walks from one rule set to another, one conjunction at a time.
///
/// The walk always starts at the better of the two rule sets. Every
/// intermediate position is offered to the blackboard archive, so rule
/// sets combining conjunctions of both ends are found along the way.
pub struct PathRelinking;

impl PathRelinking {
    /// Relinks `start` and `end` under `target`.
    pub fn run(
        blackboard: &mut Blackboard,
        start: &RuleSet,
        end: &RuleSet,
        target: &TargetFunction,
        config: &PathRelinkingConfig,
    ) -> Result<PathRelinkingResult> {
        Self::run_with_cancel(blackboard, start, end, target, config, None)
    }

    /// Relinks with an optional cancellation token.
    pub fn run_with_cancel(
        blackboard: &mut Blackboard,
        start: &RuleSet,
        end: &RuleSet,
        target: &TargetFunction,
        config: &PathRelinkingConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<PathRelinkingResult> {
        config.validate().map_err(MiningError::InvalidConfig)?;
        let mut rng = create_rng(blackboard, config);
        Ok(relink(blackboard, &mut rng, start, end, target, config, cancel.as_deref()))
    }

    /// Relinks `candidate` with the best archive member within the
    /// navigation limits and then with a random archive member, both under
    /// the blackboard's current target.
    pub fn perform_with(
        blackboard: &mut Blackboard,
        candidate: &ValuedResult<RuleSet>,
        config: &PathRelinkingConfig,
    ) -> Result<Vec<PathRelinkingResult>> {
        Self::perform_with_cancel(blackboard, candidate, config, None)
    }

    pub fn perform_with_cancel(
        blackboard: &mut Blackboard,
        candidate: &ValuedResult<RuleSet>,
        config: &PathRelinkingConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Vec<PathRelinkingResult>> {
        config.validate().map_err(MiningError::InvalidConfig)?;
        let mut rng = create_rng(blackboard, config);
        let target = blackboard.current_target_function().clone();

        let mut results = Vec::new();
        for anchor in [Anchor::BestInLimits, Anchor::Random] {
            let partner = match anchor {
                Anchor::BestInLimits => blackboard.best_result_in_limits(&mut rng),
                Anchor::Random => blackboard.random_result(&mut rng),
            };
            let Some(partner) = partner else {
                debug!(?anchor, "no archive member to relink with");
                continue;
            };
            let result = relink(
                blackboard,
                &mut rng,
                &partner.item,
                &candidate.item,
                &target,
                config,
                cancel.as_deref(),
            );
            let cancelled = result.cancelled;
            results.push(result);
            if cancelled {
                break;
            }
        }
        Ok(results)
    }
}

fn create_rng(blackboard: &Blackboard, config: &PathRelinkingConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => blackboard.create_rng(),
    }
}

fn value(blackboard: &mut Blackboard, rule_set: &RuleSet, target: &TargetFunction) -> f64 {
    target.apply(&blackboard.simplify_evaluate_and_add(rule_set).values)
}

fn relink<R: Rng>(
    blackboard: &mut Blackboard,
    rng: &mut R,
    start: &RuleSet,
    end: &RuleSet,
    target: &TargetFunction,
    config: &PathRelinkingConfig,
    cancel: Option<&AtomicBool>,
) -> PathRelinkingResult {
    let (start, end) = if value(blackboard, start, target) > value(blackboard, end, target) {
        (end, start)
    } else {
        (start, end)
    };

    let mut actions = relink_actions(start, end);
    actions.shuffle(rng);
    debug!(moves = actions.len(), "relinking");

    let mut current = start.clone();
    let mut steps = 0usize;
    let mut cancelled = false;
    while !actions.is_empty() && steps < config.max_steps {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            cancelled = true;
            info!(steps, "path relinking cancelled");
            break;
        }
        let Some(chosen) = choose_good_action(blackboard, &current, &actions, target) else {
            break;
        };
        let action = actions.remove(chosen);
        current = action.apply(&current);
        blackboard.simplify_evaluate_and_add(&current);
        steps += 1;
    }

    PathRelinkingResult {
        final_rule_set: current,
        steps,
        cancelled,
    }
}

/// Differences between both ends in the order removals of inclusions,
/// removals of exclusions, additions of inclusions, additions of
/// exclusions.
fn relink_actions(start: &RuleSet, end: &RuleSet) -> Vec<RelinkAction> {
    let mut actions = Vec::new();
    for and in start.inclusions() {
        if !end.inclusions().contains(and) {
            actions.push(RelinkAction::RemoveInclusion(and.clone()));
        }
    }
    for and in start.exclusions() {
        if !end.exclusions().contains(and) {
            actions.push(RelinkAction::RemoveExclusion(and.clone()));
        }
    }
    for and in end.inclusions() {
        if !start.inclusions().contains(and) {
            actions.push(RelinkAction::Include(and.clone()));
        }
    }
    for and in end.exclusions() {
        if !start.exclusions().contains(and) {
            actions.push(RelinkAction::Exclude(and.clone()));
        }
    }
    actions
}

/// The first action improving on `position`, otherwise the least bad one.
/// Among equally bad actions a later one wins only if it dominates.
fn choose_good_action(
    blackboard: &mut Blackboard,
    position: &RuleSet,
    actions: &[RelinkAction],
    target: &TargetFunction,
) -> Option<usize> {
    let position_value = value(blackboard, position, target);
    let mut best: Option<(usize, f64, ValuedResult<RuleSet>)> = None;
    for (i, action) in actions.iter().enumerate() {
        let result = blackboard.simplify_evaluate_and_add(&action.apply(position));
        let v = target.apply(&result.values);
        if v < position_value {
            return Some(i);
        }
        let better = match &best {
            None => true,
            Some((_, best_value, best_result)) => v < *best_value || (v == *best_value && result.dominates(best_result)),
        };
        if better {
            best = Some((i, v, result));
        }
    }
    best.map(|(i, _, _)| i)
}
