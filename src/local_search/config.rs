//! Local search configuration.

/// Configuration for [`LocalSearch`](super::LocalSearch).
///
/// # Examples
///
/// ```
/// use skip_rules::local_search::LocalSearchConfig;
///
/// let config = LocalSearchConfig::default()
///     .with_plateau_step_limit(20)
///     .with_max_iterations(1_000)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    /// Consecutive steps between equally valued positions before the walk
    /// leaves the current neighborhood.
    pub plateau_step_limit: usize,

    /// Maximum number of neighborhood evaluations. `usize::MAX` = no limit.
    pub max_iterations: usize,

    /// Random seed. `None` draws one from the blackboard.
    pub seed: Option<u64>,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            plateau_step_limit: 100,
            max_iterations: usize::MAX,
            seed: None,
        }
    }
}

impl LocalSearchConfig {
    pub fn with_plateau_step_limit(mut self, limit: usize) -> Self {
        self.plateau_step_limit = limit;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LocalSearchConfig::default();
        assert_eq!(config.plateau_step_limit, 100);
        assert_eq!(config.max_iterations, usize::MAX);
        assert!(config.validate().is_ok());
        assert!(config.with_max_iterations(0).validate().is_err());
    }
}
