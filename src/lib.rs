//! Multi-objective heuristic mining of skip-unless rule sets.
//!
//! Given change parts described by numeric and string features, each
//! labeled by whether it triggered a review remark, the crate searches for
//! small rule sets that decide which change parts can skip review:
//!
//! - **Record model**: [`record::RecordSet`] with a [`record::RecordScheme`]
//!   and per-record [`record::TriggerClassification`].
//! - **Rules**: atomic [`rule::Rule`]s, conjunctions ([`rule::And`]) and
//!   skip-unless [`rule::RuleSet`]s with a text syntax and data-driven
//!   simplification.
//! - **Evaluation**: seven minimized objectives per rule set
//!   ([`evaluation::ObjectiveVector`]) and scalar
//!   [`evaluation::TargetFunction`]s.
//! - **Archive**: a Pareto archive of non-dominated results
//!   ([`archive::NondominatedResults`]) with navigation limits.
//! - **Restrictions**: accepted, candidate and rejected conjunctions
//!   ([`restriction::RuleRestrictions`]) with wildcard patterns.
//! - **Blackboard**: the session state shared by all search agents
//!   ([`blackboard::Blackboard`]).
//! - **Search agents**: greedy induction ([`greedy`]), local search
//!   ([`local_search`]) and path relinking ([`path_relinking`]).
//!
//! # Architecture
//!
//! All mutable session state lives in the blackboard, which is passed
//! explicitly to every agent. Randomness comes from seeded generators
//! handed out by the blackboard, so a session is reproducible from its
//! seed. Long-running agents accept an optional cancellation flag and
//! return their partial result when it is raised.

pub mod archive;
pub mod blackboard;
pub mod error;
pub mod evaluation;
pub mod expr;
pub mod greedy;
pub mod local_search;
pub mod path_relinking;
pub mod record;
pub mod restriction;
pub mod rule;
pub mod trigger;
pub mod util;

#[cfg(test)]
mod testing;
