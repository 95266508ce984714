//! Greedy rule creation configuration.

use super::quality::QualitySelection;

/// Configuration for [`GreedyRuleCreation`](super::GreedyRuleCreation).
///
/// # Examples
///
/// ```
/// use skip_rules::greedy::{GreedyConfig, QualityFunction, QualitySelection};
///
/// let config = GreedyConfig::default()
///     .with_condition_budget(20)
///     .with_quality(QualitySelection::Fixed(QualityFunction::Precision))
///     .with_random_condition_probability(0.0)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GreedyConfig {
    /// Upper bound on the atomic conditions induced in one run.
    pub condition_budget: usize,

    /// Quality function used while growing conjunctions.
    pub quality: QualitySelection,

    /// Probability of taking a random condition instead of the best one.
    pub random_condition_probability: f64,

    /// Per-class sample size relative to the minority class.
    pub downsample_factor: f64,

    /// Minimum per-class sample size per selected feature.
    pub min_samples_per_feature: usize,

    /// Lower bound of the random feature subset size.
    pub min_feature_subset: usize,

    /// Random seed. `None` draws one from the blackboard.
    pub seed: Option<u64>,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            condition_budget: 50,
            quality: QualitySelection::default(),
            random_condition_probability: 0.05,
            downsample_factor: 0.5,
            min_samples_per_feature: 50,
            min_feature_subset: 5,
            seed: None,
        }
    }
}

impl GreedyConfig {
    pub fn with_condition_budget(mut self, budget: usize) -> Self {
        self.condition_budget = budget;
        self
    }

    pub fn with_quality(mut self, quality: QualitySelection) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_random_condition_probability(mut self, p: f64) -> Self {
        self.random_condition_probability = p;
        self
    }

    pub fn with_downsample_factor(mut self, factor: f64) -> Self {
        self.downsample_factor = factor;
        self
    }

    pub fn with_min_samples_per_feature(mut self, n: usize) -> Self {
        self.min_samples_per_feature = n;
        self
    }

    pub fn with_min_feature_subset(mut self, n: usize) -> Self {
        self.min_feature_subset = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.condition_budget == 0 {
            return Err("condition_budget must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.random_condition_probability) {
            return Err(format!(
                "random_condition_probability must be in [0, 1], got {}",
                self.random_condition_probability
            ));
        }
        if !(self.downsample_factor > 0.0 && self.downsample_factor.is_finite()) {
            return Err(format!(
                "downsample_factor must be positive, got {}",
                self.downsample_factor
            ));
        }
        if self.min_feature_subset == 0 {
            return Err("min_feature_subset must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::QualityFunction;

    #[test]
    fn test_defaults() {
        let config = GreedyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.condition_budget, 50);
        assert_eq!(config.quality, QualitySelection::Fixed(QualityFunction::Laplace));
        assert_eq!(config.min_samples_per_feature, 50);
    }

    #[test]
    fn test_invalid_values() {
        assert!(GreedyConfig::default().with_condition_budget(0).validate().is_err());
        assert!(GreedyConfig::default()
            .with_random_condition_probability(1.5)
            .validate()
            .is_err());
        assert!(GreedyConfig::default().with_downsample_factor(0.0).validate().is_err());
        assert!(GreedyConfig::default().with_min_feature_subset(0).validate().is_err());
    }
}
