//! Upper bounds on target functions used while navigating the archive.

use super::NondominatedResults;
use crate::evaluation::{ObjectiveVector, TargetFunction, ValuedResult};

/// Per-target upper bounds. A target without a limit is unbounded.
#[derive(Debug, Clone, Default)]
pub struct NavigationLimits {
    limits: Vec<(TargetFunction, f64)>,
}

impl NavigationLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_limit(&mut self, target: TargetFunction, limit: f64) {
        match self.limits.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = limit,
            None => self.limits.push((target, limit)),
        }
    }

    pub fn remove_limit(&mut self, target: &TargetFunction) {
        self.limits.retain(|(t, _)| t != target);
    }

    pub fn limit(&self, target: &TargetFunction) -> f64 {
        self.limits
            .iter()
            .find(|(t, _)| t == target)
            .map_or(f64::INFINITY, |(_, l)| *l)
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn is_in_limits(&self, values: &ObjectiveVector) -> bool {
        self.limits.iter().all(|(t, l)| t.apply(values) <= *l)
    }

    /// The members of `archive` that satisfy every limit.
    pub fn filter<T: Clone + PartialEq>(&self, archive: &NondominatedResults<T>) -> NondominatedResults<T> {
        let mut filtered = NondominatedResults::new();
        for item in archive.items() {
            if self.is_in_limits(&item.values) {
                filtered.add(item);
            }
        }
        filtered
    }

    /// Convenience for [`is_in_limits`](Self::is_in_limits) on a result.
    pub fn contains<T>(&self, result: &ValuedResult<T>) -> bool {
        self.is_in_limits(&result.values)
    }
}
