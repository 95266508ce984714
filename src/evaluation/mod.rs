//! Multi-objective evaluation of rule sets.
//!
//! A rule set is scored on seven axes, all minimized. Axes that measure a
//! benefit (saved hunks, saved lines, per-ticket saved hunks) are stored
//! negated so that lower is always better.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//!   (Pareto dominance for minimization)

mod target;

pub use target::TargetFunction;

use crate::record::RecordSet;
use crate::rule::RuleSet;
use crate::trigger::{MissedTriggerCounter, RemarkTriggerMap};
use std::cmp::Ordering;

/// Number of objective axes.
pub const AXIS_COUNT: usize = 7;

/// Values of one evaluated rule set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveVector {
    /// Remarks that would not be found anymore.
    pub missed_remark_count: f64,
    /// Negated number of skipped change parts.
    pub saved_hunk_count: f64,
    /// Structural size of the rule set.
    pub rule_set_complexity: f64,
    /// Distinct columns used.
    pub feature_count: f64,
    /// Negated sum of the saved-line column over skipped change parts.
    pub saved_line_count: f64,
    /// Missed remarks weighted by `ln(total + 1) / total` per ticket.
    pub missed_remark_log: f64,
    /// Negated trimmed mean of skipped change parts per ticket.
    pub saved_hunk_trimmed_mean: f64,
}

impl ObjectiveVector {
    pub fn axes(&self) -> [f64; AXIS_COUNT] {
        [
            self.missed_remark_count,
            self.saved_hunk_count,
            self.rule_set_complexity,
            self.feature_count,
            self.saved_line_count,
            self.missed_remark_log,
            self.saved_hunk_trimmed_mean,
        ]
    }

    pub fn from_axes(axes: [f64; AXIS_COUNT]) -> Self {
        Self {
            missed_remark_count: axes[0],
            saved_hunk_count: axes[1],
            rule_set_complexity: axes[2],
            feature_count: axes[3],
            saved_line_count: axes[4],
            missed_remark_log: axes[5],
            saved_hunk_trimmed_mean: axes[6],
        }
    }

    /// Saved hunks per missed remark (plus one), negated like its source.
    pub fn ratio(&self) -> f64 {
        self.saved_hunk_count / (self.missed_remark_count + 1.0)
    }

    pub fn dominance(&self, other: &Self) -> Dominance {
        dominance_cmp(&self.axes(), &other.axes())
    }

    /// Lexicographic order over the axes in declaration order.
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.axes()
            .iter()
            .zip(other.axes().iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Outcome of a Pareto comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// Left dominates right.
    Left,
    /// Right dominates left.
    Right,
    /// Neither dominates the other.
    Neither,
}

/// Pareto comparison of two objective vectors (minimization).
pub fn dominance_cmp(a: &[f64], b: &[f64]) -> Dominance {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va < vb {
            a_better_in_some = true;
        } else if vb < va {
            b_better_in_some = true;
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    }
}

/// An item together with its objective values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuedResult<T> {
    pub item: T,
    pub values: ObjectiveVector,
}

impl<T> ValuedResult<T> {
    pub fn new(item: T, values: ObjectiveVector) -> Self {
        Self { item, values }
    }

    /// Better or equal on every axis and strictly better on at least one.
    pub fn dominates<U>(&self, other: &ValuedResult<U>) -> bool {
        self.values.dominance(&other.values) == Dominance::Left
    }

    /// Identical objective values, regardless of the items.
    pub fn has_same_values<U>(&self, other: &ValuedResult<U>) -> bool {
        self.values == other.values
    }

    pub fn copy_with_new_item<U>(&self, item: U) -> ValuedResult<U> {
        ValuedResult {
            item,
            values: self.values,
        }
    }

    /// Per-axis difference `other - self`.
    pub fn distance_vector_to<U>(&self, other: &ValuedResult<U>) -> [f64; AXIS_COUNT] {
        let (a, b) = (self.values.axes(), other.values.axes());
        std::array::from_fn(|i| b[i] - a[i])
    }

    pub fn ratio(&self) -> f64 {
        self.values.ratio()
    }
}

impl ValuedResult<RuleSet> {
    /// Evaluates a rule set on the data.
    ///
    /// `saved_line_column` is the numeric column index whose values are
    /// summed over skipped records; missing values count as zero.
    pub fn create(
        rule_set: RuleSet,
        data: &RecordSet,
        trigger_map: &RemarkTriggerMap,
        saved_line_column: Option<usize>,
    ) -> Self {
        let skipped = skip_decisions(&rule_set, data);
        let mut counter = MissedTriggerCounter::new(trigger_map);
        let mut saved_hunks = 0usize;
        let mut saved_lines = 0.0;
        for (record, &skip) in data.iter().zip(skipped.iter()) {
            if skip {
                counter.handle_inactive(record);
                saved_hunks += 1;
                if let Some(column) = saved_line_column {
                    let lines = record.numeric_value(column);
                    if !lines.is_nan() {
                        saved_lines += lines;
                    }
                }
            } else {
                counter.handle_active(record);
            }
        }
        let summary = counter.finish();
        let values = ObjectiveVector {
            missed_remark_count: summary.missed_remarks as f64,
            saved_hunk_count: -(saved_hunks as f64),
            rule_set_complexity: rule_set.complexity() as f64,
            feature_count: rule_set.feature_count() as f64,
            saved_line_count: -saved_lines,
            missed_remark_log: summary.missed_remark_log,
            saved_hunk_trimmed_mean: summary.saved_hunk_trimmed_mean,
        };
        Self::new(rule_set, values)
    }
}

#[cfg(feature = "parallel")]
fn skip_decisions(rule_set: &RuleSet, data: &RecordSet) -> Vec<bool> {
    use rayon::prelude::*;
    data.records().par_iter().map(|r| rule_set.skips(r)).collect()
}

#[cfg(not(feature = "parallel"))]
fn skip_decisions(rule_set: &RuleSet, data: &RecordSet) -> Vec<bool> {
    data.iter().map(|r| rule_set.skips(r)).collect()
}
