//! Local search over rule sets.
//!
//! A first-choice hill climber with two neighborhoods: adding one of the
//! conjunctions of the initial rule set, and varying the conjunction that
//! was added last (dropping a condition, adding a random one, shifting a
//! threshold). Ties on the target value are broken in favor of rule sets
//! the walk has not seen yet, which lets it cross plateaus; a plateau
//! that lasts too long ends the current neighborhood.
//!
//! # References
//!
//! - Hoos & Stützle (2004), "Stochastic Local Search: Foundations and Applications"
//! - Selman, Kautz & Cohen (1994), "Noise Strategies for Improving Local Search"

mod config;
mod moves;
mod runner;

pub use config::LocalSearchConfig;
pub use moves::Move;
pub use runner::{LocalSearch, LocalSearchResult};
