//! Moves between neighboring rule sets.

use crate::record::{Record, RecordSet};
use crate::rule::{And, Rule, RuleSet};
use rand::Rng;

/// A step from the current rule set to a neighbor.
#[derive(Debug, Clone, PartialEq)]
pub enum Move {
    /// Adds a pooled conjunction as inclusion.
    AddInclusion(And),
    /// Adds a pooled conjunction as exclusion.
    AddExclusion(And),
    /// Replaces a conjunction wherever it occurs.
    Change { old: And, new: And },
}

impl Move {
    pub fn apply(&self, current: &RuleSet) -> RuleSet {
        match self {
            Move::AddInclusion(and) => current.include(and.clone()),
            Move::AddExclusion(and) => current.exclude(and.clone()),
            Move::Change { old, new } => current
                .replace_exclusion(old, new.clone())
                .replace_inclusion(old, new.clone()),
        }
    }

    /// Removes a used conjunction from its pool. Changes leave the pools
    /// untouched.
    pub fn adapt_pools(&self, inclusion_pool: &mut Vec<And>, exclusion_pool: &mut Vec<And>) {
        match self {
            Move::AddInclusion(and) => inclusion_pool.retain(|a| a != and),
            Move::AddExclusion(and) => exclusion_pool.retain(|a| a != and),
            Move::Change { .. } => {}
        }
    }

    /// The conjunction the change neighborhood continues from.
    pub fn last_addition(&self) -> &And {
        match self {
            Move::AddInclusion(and) | Move::AddExclusion(and) => and,
            Move::Change { new, .. } => new,
        }
    }
}

/// One move per pooled conjunction, inclusions first.
pub(crate) fn add_neighborhood(inclusion_pool: &[And], exclusion_pool: &[And]) -> Vec<Move> {
    inclusion_pool
        .iter()
        .cloned()
        .map(Move::AddInclusion)
        .chain(exclusion_pool.iter().cloned().map(Move::AddExclusion))
        .collect()
}

/// Variations of `last`: dropping one child, adding a random condition and
/// moving each threshold to the nearest value that changes coverage.
pub(crate) fn change_neighborhood<R: Rng>(last: &And, data: &RecordSet, rng: &mut R) -> Vec<Move> {
    let mut variants = Vec::new();
    if last.len() > 1 {
        for child in last.children() {
            variants.push(last.copy_without_child(child));
        }
    }
    variants.push(last.and(data.create_random_simple_rule(rng)));
    for (i, child) in last.children().iter().enumerate().filter(|(_, c)| c.is_ordinal()) {
        let others = matching_other_children(last, i, data);
        variants.extend(shift_until_coverage_changes(last, child, &others, |r| r.next_larger(data)));
        variants.extend(shift_until_coverage_changes(last, child, &others, |r| r.next_smaller(data)));
    }
    variants
        .into_iter()
        .map(|new| Move::Change {
            old: last.clone(),
            new,
        })
        .collect()
}

/// Records satisfying every child of `and` except the one at `skipped`.
fn matching_other_children<'a>(and: &And, skipped: usize, data: &'a RecordSet) -> Vec<&'a Record> {
    data.iter()
        .filter(|r| {
            and.children()
                .iter()
                .enumerate()
                .all(|(i, c)| i == skipped || c.test(r))
        })
        .collect()
}

/// With several conditions the next threshold rarely changes the matched
/// records, so keep shifting until it does. `None` once the threshold runs
/// off the data.
///
/// `others` are the records matched by the remaining children, so only the
/// shifted child is tested.
fn shift_until_coverage_changes(
    and: &And,
    child: &Rule,
    others: &[&Record],
    shift: impl Fn(&Rule) -> Rule,
) -> Option<And> {
    let initial = matched_count(child, others);
    let mut current = child.clone();
    loop {
        current = shift(&current);
        if current.is_constant() {
            return None;
        }
        if matched_count(&current, others) != initial {
            return Some(and.copy_with_replaced_child(child, current));
        }
    }
}

fn matched_count(rule: &Rule, records: &[&Record]) -> usize {
    records.iter().filter(|r| rule.test(r)).count()
}
