//! Scalar projections of objective vectors.

use super::ObjectiveVector;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

type Projection = Arc<dyn Fn(&ObjectiveVector) -> f64 + Send + Sync>;

/// A named function to minimize, used to steer single-axis searches and to
/// pick the best archive member.
///
/// Two target functions are equal when their ids are equal.
///
/// # Examples
///
/// ```
/// use skip_rules::evaluation::{ObjectiveVector, TargetFunction};
///
/// let values = ObjectiveVector::from_axes([1.0, -6.0, 2.0, 1.0, 0.0, 0.0, 0.0]);
/// assert_eq!(TargetFunction::ratio().apply(&values), -3.0);
/// assert_eq!(TargetFunction::missed_remarks().apply(&values), 1.0);
/// ```
#[derive(Clone)]
pub struct TargetFunction {
    id: String,
    tooltip: String,
    function: Projection,
}

impl TargetFunction {
    pub fn new<F>(id: impl Into<String>, tooltip: impl Into<String>, function: F) -> Self
    where
        F: Fn(&ObjectiveVector) -> f64 + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            tooltip: tooltip.into(),
            function: Arc::new(function),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    pub fn apply(&self, values: &ObjectiveVector) -> f64 {
        (self.function)(values)
    }

    /// Saved change parts per missed remark (plus one).
    pub fn ratio() -> Self {
        Self::new(
            "ratio",
            "ratio of saved records divided by missed remarks + 1",
            ObjectiveVector::ratio,
        )
    }

    pub fn missed_remarks() -> Self {
        Self::new(
            "missed remarks",
            "count of remarks that would probably not be found with the rule in effect",
            |v| v.missed_remark_count,
        )
    }

    pub fn missed_remark_log() -> Self {
        Self::new(
            "missed rem. log.",
            "missed remarks, each weighted by ln(count + 1) / count of its ticket",
            |v| v.missed_remark_log,
        )
    }

    pub fn saved_hunks() -> Self {
        Self::new(
            "saved record count",
            "count of records that could be left out from review",
            |v| v.saved_hunk_count,
        )
    }

    pub fn saved_lines() -> Self {
        Self::new(
            "saved lines",
            "sum of the saved-line column over records left out from review",
            |v| v.saved_line_count,
        )
    }

    pub fn trimmed_mean() -> Self {
        Self::new(
            "tmean saved rec.",
            "trimmed mean of saved records per ticket",
            |v| v.saved_hunk_trimmed_mean,
        )
    }

    pub fn complexity() -> Self {
        Self::new("complexity", "complexity of the rule set", |v| v.rule_set_complexity)
    }

    pub fn feature_count() -> Self {
        Self::new("feature count", "number of distinct columns used", |v| v.feature_count)
    }

    /// Cost per ticket when missing a remark is `factor` times as expensive
    /// as reviewing one change part. Only the variable part is counted, so
    /// skipping everything harmlessly yields a negative cost.
    pub fn cost(factor: f64, ticket_count: usize) -> Self {
        let tickets = ticket_count.max(1) as f64;
        Self::new(
            format!("cost (f={factor})"),
            format!("cost per ticket, assuming a missed remark costs {factor} reviewed records"),
            move |v| (factor * v.missed_remark_count + v.saved_hunk_count) / tickets,
        )
    }

    /// The predefined projections, in display order.
    pub fn standard(ticket_count: usize) -> Vec<Self> {
        vec![
            Self::ratio(),
            Self::missed_remarks(),
            Self::missed_remark_log(),
            Self::saved_hunks(),
            Self::saved_lines(),
            Self::trimmed_mean(),
            Self::complexity(),
            Self::feature_count(),
            Self::cost(100.0, ticket_count),
            Self::cost(1000.0, ticket_count),
        ]
    }
}

impl Default for TargetFunction {
    fn default() -> Self {
        Self::ratio()
    }
}

impl fmt::Debug for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFunction").field("id", &self.id).finish()
    }
}

impl fmt::Display for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl PartialEq for TargetFunction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TargetFunction {}

impl Hash for TargetFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
