//! Shared state of a mining session.
//!
//! The [`Blackboard`] owns the records, the trigger map, the user's
//! restrictions, the memoized evaluations and the Pareto archive. Greedy
//! creation, local search and path relinking all work against one
//! blackboard and feed every rule set they evaluate back into it.
//!
//! The evaluation cache is bounded: past a configurable size it is purged
//! down to a spread of Pareto front members. A session's decisions and
//! front can be written as text and restored on fresh data.
//!
//! # References
//!
//! - Hayes-Roth (1985), "A Blackboard Architecture for Control"

mod board;
mod cleaning;
mod config;
mod purge;
mod session;

pub use board::Blackboard;
pub use cleaning::DataCleaningAction;
pub use config::BlackboardConfig;
