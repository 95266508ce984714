//! Pareto archive of evaluated items.
//!
//! Keeps every non-dominated objective vector seen so far together with all
//! items that share it. No two retained vectors dominate each other.
//!
//! # References
//!
//! - Zitzler & Thiele (1999), "Multiobjective Evolutionary Algorithms: A Comparative
//!   Case Study and the Strength Pareto Approach"

mod limits;

pub use limits::NavigationLimits;

use crate::evaluation::{TargetFunction, ValuedResult};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Result of offering a candidate to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// An existing member dominates the candidate. Nothing changed.
    Dominated,
    /// The candidate's vector was new. Dominated members were evicted.
    NewVector,
    /// The vector was known and the item joined its tied set.
    NewTiedItem,
    /// The same item with the same vector was already present.
    AlreadyPresent,
}

impl AddOutcome {
    /// Whether the archive now holds an item it did not hold before.
    pub fn is_new_item(self) -> bool {
        matches!(self, AddOutcome::NewVector | AddOutcome::NewTiedItem)
    }

    pub fn is_new_vector(self) -> bool {
        self == AddOutcome::NewVector
    }
}

/// Non-dominated results, grouped by identical objective vectors.
#[derive(Debug, Clone)]
pub struct NondominatedResults<T> {
    groups: Vec<ValuedResult<Vec<T>>>,
}

impl<T> Default for NondominatedResults<T> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<T: Clone + PartialEq> NondominatedResults<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a candidate.
    ///
    /// Dominated candidates are ignored; a new vector evicts every member it
    /// dominates; a known vector collects the item into its tied set.
    pub fn add(&mut self, candidate: ValuedResult<T>) -> AddOutcome {
        let mut i = 0;
        while i < self.groups.len() {
            let group = &mut self.groups[i];
            if group.dominates(&candidate) {
                return AddOutcome::Dominated;
            }
            if group.has_same_values(&candidate) {
                if group.item.contains(&candidate.item) {
                    return AddOutcome::AlreadyPresent;
                }
                group.item.push(candidate.item);
                return AddOutcome::NewTiedItem;
            }
            if candidate.dominates(group) {
                self.groups.remove(i);
            } else {
                i += 1;
            }
        }
        let values = candidate.values;
        self.groups.push(ValuedResult::new(vec![candidate.item], values));
        AddOutcome::NewVector
    }

    /// Adds every item of `other`; true when at least one item was new.
    pub fn add_all(&mut self, other: &NondominatedResults<T>) -> bool {
        let mut improved = false;
        for item in other.items() {
            improved |= self.add(item).is_new_item();
        }
        improved
    }

    /// All items, one entry per item, in insertion order of their vectors.
    pub fn items(&self) -> Vec<ValuedResult<T>> {
        self.groups
            .iter()
            .flat_map(|g| g.item.iter().map(move |item| g.copy_with_new_item(item.clone())))
            .collect()
    }

    /// All items ordered lexicographically by their objective vectors.
    pub fn items_sorted(&self) -> Vec<ValuedResult<T>> {
        let mut items = self.items();
        items.sort_by(|a, b| a.values.lexicographic_cmp(&b.values));
        items
    }

    /// Number of distinct objective vectors.
    pub fn vector_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of items over all vectors.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.item.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, candidate: &ValuedResult<T>) -> bool {
        self.groups
            .iter()
            .any(|g| g.has_same_values(candidate) && g.item.contains(&candidate.item))
    }

    pub fn random_item<R: Rng>(&self, rng: &mut R) -> Option<ValuedResult<T>> {
        self.items().choose(rng).cloned()
    }

    /// An item with the minimal target value, uniformly chosen among ties.
    pub fn best_item<R: Rng>(&self, rng: &mut R, target: &TargetFunction) -> Option<ValuedResult<T>> {
        let mut best = Vec::new();
        let mut min_value = f64::INFINITY;
        for item in self.items() {
            let value = target.apply(&item.values);
            if value < min_value {
                best.clear();
                best.push(item);
                min_value = value;
            } else if value == min_value {
                best.push(item);
            }
        }
        best.choose(rng).cloned()
    }

    /// Keeps only the items accepted by `keep`; vectors left without items
    /// are dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        for group in &mut self.groups {
            group.item.retain(&mut keep);
        }
        self.groups.retain(|g| !g.item.is_empty());
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
