//! Blackboard configuration.

use crate::evaluation::TargetFunction;
use crate::trigger::RemarkFeatures;

/// Session settings of a [`Blackboard`](super::Blackboard).
///
/// Once the evaluation cache holds more than `auto_purge_limit` rule sets
/// it is purged down to about `purge_count_to_keep` representatives of the
/// Pareto front.
///
/// # Examples
///
/// ```
/// use skip_rules::blackboard::BlackboardConfig;
/// use skip_rules::evaluation::TargetFunction;
///
/// let config = BlackboardConfig::default()
///     .with_saved_line_column("lines")
///     .with_target_function(TargetFunction::missed_remarks())
///     .with_auto_purge_limit(10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BlackboardConfig {
    /// Numeric column summed over skipped records for the saved-lines axis.
    /// Without it that axis is always zero.
    pub saved_line_column: Option<String>,

    /// Scalar projection that single-axis searches minimize.
    pub target_function: TargetFunction,

    /// Cache size above which the cache and the archive are purged.
    pub auto_purge_limit: usize,

    /// How many results a purge keeps.
    pub purge_count_to_keep: usize,

    /// Per-remark field values for condition-based remark removal.
    pub remark_features: RemarkFeatures,
}

impl Default for BlackboardConfig {
    fn default() -> Self {
        Self {
            saved_line_column: None,
            target_function: TargetFunction::default(),
            auto_purge_limit: 100_000,
            purge_count_to_keep: 100,
            remark_features: RemarkFeatures::default(),
        }
    }
}

impl BlackboardConfig {
    pub fn with_saved_line_column(mut self, column: impl Into<String>) -> Self {
        self.saved_line_column = Some(column.into());
        self
    }

    pub fn with_target_function(mut self, target: TargetFunction) -> Self {
        self.target_function = target;
        self
    }

    pub fn with_auto_purge_limit(mut self, limit: usize) -> Self {
        self.auto_purge_limit = limit;
        self
    }

    pub fn with_purge_count_to_keep(mut self, count: usize) -> Self {
        self.purge_count_to_keep = count;
        self
    }

    pub fn with_remark_features(mut self, features: RemarkFeatures) -> Self {
        self.remark_features = features;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.saved_line_column.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("saved_line_column must not be blank".into());
        }
        if self.target_function.id().is_empty() {
            return Err("target_function needs an id".into());
        }
        if self.purge_count_to_keep == 0 {
            return Err("purge_count_to_keep must be at least 1".into());
        }
        if self.auto_purge_limit <= self.purge_count_to_keep {
            return Err(format!(
                "auto_purge_limit ({}) must exceed purge_count_to_keep ({})",
                self.auto_purge_limit, self.purge_count_to_keep
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BlackboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_function, TargetFunction::ratio());
        assert!(config.saved_line_column.is_none());
        assert_eq!(config.auto_purge_limit, 100_000);
        assert_eq!(config.purge_count_to_keep, 100);
        assert!(config.remark_features.field_names().is_empty());
    }

    #[test]
    fn test_blank_column_is_invalid() {
        assert!(BlackboardConfig::default().with_saved_line_column(" ").validate().is_err());
        let anonymous = TargetFunction::new("", "", |_| 0.0);
        assert!(BlackboardConfig::default().with_target_function(anonymous).validate().is_err());
    }

    #[test]
    fn test_purge_settings_are_validated() {
        assert!(BlackboardConfig::default().with_purge_count_to_keep(0).validate().is_err());
        let tight = BlackboardConfig::default().with_auto_purge_limit(5).with_purge_count_to_keep(5);
        assert!(tight.validate().is_err());
        let small = BlackboardConfig::default().with_auto_purge_limit(6).with_purge_count_to_keep(2);
        assert!(small.validate().is_ok());
    }
}
