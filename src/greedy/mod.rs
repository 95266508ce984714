//! Greedy rule set creation.
//!
//! A separate-and-conquer learner in the style of CN2 and RIPPER: each
//! conjunction is grown top-down by repeatedly adding the atomic
//! condition with the best heuristic quality, and the records it covers
//! are removed before the next conjunction is grown. Random feature
//! subsets, class downsampling and an occasional random condition make
//! repeated runs produce different rule sets.
//!
//! # References
//!
//! - Clark & Niblett (1989), "The CN2 Induction Algorithm"
//! - Cohen (1995), "Fast Effective Rule Induction"
//! - Fürnkranz & Flach (2005), "ROC 'n' Rule Learning: Towards a Better
//!   Understanding of Covering Algorithms"
//! - Ho (1998), "The Random Subspace Method for Constructing Decision Forests"

mod config;
mod quality;
mod runner;

pub use config::GreedyConfig;
pub use quality::{QualityFunction, QualitySelection, RuleQuality};
pub use runner::{ConditionResult, GreedyResult, GreedyRuleCreation};
