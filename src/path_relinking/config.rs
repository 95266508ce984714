//! Path relinking configuration.

/// Configuration for [`PathRelinking`](super::PathRelinking).
///
/// # Examples
///
/// ```
/// use skip_rules::path_relinking::PathRelinkingConfig;
///
/// let config = PathRelinkingConfig::default().with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PathRelinkingConfig {
    /// Maximum number of applied moves per relinking. `usize::MAX` = no limit.
    pub max_steps: usize,

    /// Random seed. `None` draws one from the blackboard.
    pub seed: Option<u64>,
}

impl Default for PathRelinkingConfig {
    fn default() -> Self {
        Self {
            max_steps: usize::MAX,
            seed: None,
        }
    }
}

impl PathRelinkingConfig {
    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".into());
        }
        Ok(())
    }
}
