//! Path relinking between rule sets.
//!
//! Explores the rule sets lying between two good solutions by adding and
//! removing the conjunctions in which they differ, preferring the first
//! improving step and otherwise the least damaging one.
//!
//! # References
//!
//! - Glover, Laguna & Martí (2000), "Fundamentals of Scatter Search and Path Relinking"

mod config;
mod runner;

pub use config::PathRelinkingConfig;
pub use runner::{PathRelinking, PathRelinkingResult};
