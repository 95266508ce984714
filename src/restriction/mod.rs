//! User restrictions on the shape of mined conjunctions.
//!
//! Inclusions and exclusions each have their own [`RuleRestrictions`]:
//! conjunctions the user accepted (always kept), conjunctions kept as
//! candidates (never removed by a rejection pattern) and rejected patterns.
//! During rule creation the rejections are projected into a
//! [`CreationRestriction`] that filters atomic conditions before they are
//! even scored.

mod pattern;

pub use pattern::{RulePattern, ValueWildcard};

use crate::rule::{And, Rule, RuleKind};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Which side of a rule set a restriction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionKind {
    Inclusions,
    Exclusions,
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RestrictionKind::Inclusions => "inclusions",
            RestrictionKind::Exclusions => "exclusions",
        })
    }
}

/// How the user judged a conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestrictionClassification {
    Accepted,
    Rejected,
    Candidate,
    Unknown,
}

/// Accepted, candidate and rejected conjunctions of one side.
#[derive(Debug, Clone)]
pub struct RuleRestrictions {
    kind: RestrictionKind,
    accepted: Vec<And>,
    candidates: Vec<And>,
    rejected: Vec<RulePattern>,
}

impl RuleRestrictions {
    pub fn new(kind: RestrictionKind) -> Self {
        Self {
            kind,
            accepted: Vec::new(),
            candidates: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn kind(&self) -> RestrictionKind {
        self.kind
    }

    pub fn accepted(&self) -> &[And] {
        &self.accepted
    }

    pub fn candidates(&self) -> &[And] {
        &self.candidates
    }

    pub fn rejected(&self) -> &[RulePattern] {
        &self.rejected
    }

    pub fn is_accepted(&self, and: &And) -> bool {
        self.accepted.contains(and)
    }

    pub fn is_candidate(&self, and: &And) -> bool {
        self.candidates.contains(and)
    }

    /// Marks conjunctions as accepted. An exact rejection of the same
    /// conjunction and its candidacy are withdrawn.
    pub fn accept<I: IntoIterator<Item = And>>(&mut self, ands: I) {
        for and in ands {
            info!(kind = %self.kind, conjunction = %and, "accepting");
            let exact = RulePattern::create_exact(&and);
            self.rejected.retain(|p| *p != exact);
            self.candidates.retain(|a| *a != and);
            push_unique(&mut self.accepted, and);
        }
    }

    /// Rejects exactly these conjunctions and withdraws acceptance and
    /// candidacy.
    pub fn reject<I: IntoIterator<Item = And>>(&mut self, ands: I) {
        for and in ands {
            info!(kind = %self.kind, conjunction = %and, "rejecting");
            self.accepted.retain(|a| *a != and);
            self.candidates.retain(|a| *a != and);
            push_unique(&mut self.rejected, RulePattern::create_exact(&and));
        }
    }

    pub fn reject_pattern(&mut self, pattern: RulePattern) {
        info!(kind = %self.kind, %pattern, "rejecting pattern");
        push_unique(&mut self.rejected, pattern);
    }

    pub fn keep_as_candidate<I: IntoIterator<Item = And>>(&mut self, ands: I) {
        for and in ands {
            info!(kind = %self.kind, conjunction = %and, "keeping as candidate");
            self.accepted.retain(|a| *a != and);
            push_unique(&mut self.candidates, and);
        }
    }

    /// Forgets acceptance and candidacy of the conjunctions.
    pub fn remove<I: IntoIterator<Item = And>>(&mut self, ands: I) {
        for and in ands {
            info!(kind = %self.kind, conjunction = %and, "removing restriction");
            self.accepted.retain(|a| *a != and);
            self.candidates.retain(|a| *a != and);
        }
    }

    pub fn remove_pattern(&mut self, pattern: &RulePattern) {
        info!(kind = %self.kind, %pattern, "removing rejection pattern");
        self.rejected.retain(|p| p != pattern);
    }

    /// Exact rejections beat acceptance, acceptance beats candidacy, and
    /// candidacy beats rejections by wildcard patterns.
    pub fn classify(&self, and: &And) -> RestrictionClassification {
        if self.rejected.iter().any(|p| p.is_exact() && p.matches(and)) {
            return RestrictionClassification::Rejected;
        }
        if self.is_accepted(and) {
            return RestrictionClassification::Accepted;
        }
        if self.is_candidate(and) {
            return RestrictionClassification::Candidate;
        }
        if self.rejected.iter().any(|p| p.matches(and)) {
            return RestrictionClassification::Rejected;
        }
        RestrictionClassification::Unknown
    }

    /// Whether some rejection pattern matches. Used by validation, where
    /// accepted and candidate conjunctions are exempted separately.
    pub fn matches_rejection(&self, and: &And) -> bool {
        self.rejected.iter().any(|p| p.matches(and))
    }

    /// Conditions that must not be added to `prior` because the extended
    /// conjunction would match a rejection pattern.
    pub fn to_creation_restrictions(&self, prior: &And) -> CreationRestriction {
        let mut rules = Vec::new();
        let mut wildcards = Vec::new();
        for pattern in &self.rejected {
            pattern.find_completion_to_invalid(prior, &mut rules, &mut wildcards);
        }
        let mut invalid_shapes: HashMap<Arc<str>, HashSet<RuleKind>> = HashMap::new();
        for wildcard in wildcards {
            invalid_shapes
                .entry(wildcard.column.name_arc().clone())
                .or_default()
                .insert(wildcard.kind);
        }
        CreationRestriction {
            invalid_rules: rules.into_iter().collect(),
            invalid_shapes,
        }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Fast filter over atomic conditions used while growing one conjunction.
#[derive(Debug, Clone, Default)]
pub struct CreationRestriction {
    invalid_rules: HashSet<Rule>,
    invalid_shapes: HashMap<Arc<str>, HashSet<RuleKind>>,
}

impl CreationRestriction {
    /// No restriction at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether some condition of this kind on the named column is allowed.
    pub fn can_be_valid_kind(&self, column: &str, kind: RuleKind) -> bool {
        self.invalid_shapes
            .get(column)
            .is_none_or(|kinds| !kinds.contains(&kind))
    }

    pub fn can_be_valid(&self, rule: &Rule) -> bool {
        if self.invalid_rules.contains(rule) {
            return false;
        }
        match (rule.column(), rule.kind()) {
            (Some(c), Some(k)) => self.can_be_valid_kind(c.name(), k),
            _ => true,
        }
    }
}
