//! Rule-shape patterns.

use crate::error::{MiningError, Result};
use crate::record::RecordScheme;
use crate::rule::{parse_term, split_conjunction, term_to_rule, And, Column, ConditionValue, Rule, RuleKind, Term};
use std::fmt;

/// A column and operator with an arbitrary value, written `col <= *`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueWildcard {
    pub column: Column,
    pub kind: RuleKind,
}

impl ValueWildcard {
    pub fn matches(&self, rule: &Rule) -> bool {
        rule.kind() == Some(self.kind) && rule.uses_column(self.column.name())
    }
}

impl fmt::Display for ValueWildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} *", self.column.name(), self.kind.symbol())
    }
}

/// Describes a family of conjunctions.
///
/// Every fully qualified rule must occur literally, every value wildcard
/// must be matched by a distinct further child, and unless the pattern ends
/// with a lone `*` no other children are allowed.
///
/// # Examples
///
/// ```
/// use skip_rules::record::RecordScheme;
/// use skip_rules::restriction::RulePattern;
/// use skip_rules::rule::parse_and;
///
/// let scheme = RecordScheme::new(["n1"], ["s1"]).unwrap();
/// let pattern = RulePattern::parse(&scheme, "s1 != * and *").unwrap();
/// assert!(pattern.matches(&parse_and(&scheme, "(s1 != 'a' and n1<=3.0)").unwrap()));
/// assert!(!pattern.matches(&parse_and(&scheme, "(n1<=3.0)").unwrap()));
/// assert_eq!(pattern.to_string(), "s1 != * and *");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RulePattern {
    fully_qualified: Vec<Rule>,
    value_wildcards: Vec<ValueWildcard>,
    other_condition_wildcard: bool,
}

impl RulePattern {
    pub fn new(fully_qualified: Vec<Rule>, value_wildcards: Vec<ValueWildcard>, other_condition_wildcard: bool) -> Self {
        Self {
            fully_qualified,
            value_wildcards,
            other_condition_wildcard,
        }
    }

    /// Pattern matching exactly `and`.
    pub fn create_exact(and: &And) -> Self {
        Self::new(and.children().to_vec(), Vec::new(), false)
    }

    pub fn parse(scheme: &RecordScheme, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(trimmed);
        if inner.trim().is_empty() {
            return Err(MiningError::syntax(text, "empty pattern"));
        }
        let mut fully_qualified = Vec::new();
        let mut value_wildcards = Vec::new();
        let mut other_condition_wildcard = false;
        for part in split_conjunction(inner) {
            match parse_term(part)? {
                Term::AnyOther => other_condition_wildcard = true,
                Term::Condition {
                    column,
                    kind,
                    value: ConditionValue::Wildcard,
                } => {
                    let column = if kind.is_ordinal() {
                        Column::numeric(scheme, column)?
                    } else {
                        Column::string(scheme, column)?
                    };
                    value_wildcards.push(ValueWildcard { column, kind });
                }
                term => fully_qualified.push(term_to_rule(scheme, part, term)?),
            }
        }
        Ok(Self::new(fully_qualified, value_wildcards, other_condition_wildcard))
    }

    /// Whether the pattern has no wildcard of either sort.
    pub fn is_exact(&self) -> bool {
        self.value_wildcards.is_empty() && !self.other_condition_wildcard
    }

    pub fn fully_qualified(&self) -> &[Rule] {
        &self.fully_qualified
    }

    pub fn value_wildcards(&self) -> &[ValueWildcard] {
        &self.value_wildcards
    }

    pub fn has_other_condition_wildcard(&self) -> bool {
        self.other_condition_wildcard
    }

    /// Whether the pattern mentions the column anywhere.
    pub fn uses_column(&self, name: &str) -> bool {
        self.fully_qualified.iter().any(|r| r.uses_column(name))
            || self.value_wildcards.iter().any(|w| w.column.name() == name)
    }

    pub fn matches(&self, and: &And) -> bool {
        let mut not_matched: Vec<&Rule> = and.children().iter().collect();
        for rule in &self.fully_qualified {
            match not_matched.iter().position(|r| *r == rule) {
                Some(i) => {
                    not_matched.swap_remove(i);
                }
                None => return false,
            }
        }
        for wildcard in &self.value_wildcards {
            match not_matched.iter().position(|r| wildcard.matches(r)) {
                Some(i) => {
                    not_matched.remove(i);
                }
                None => return false,
            }
        }
        self.other_condition_wildcard || not_matched.is_empty()
    }

    /// When `prior` lacks exactly one part of this open pattern, records the
    /// missing rule or wildcard: adding it would make `prior` match.
    ///
    /// Closed patterns never contribute because any match can be left again
    /// by adding a further condition.
    pub fn find_completion_to_invalid(
        &self,
        prior: &And,
        rule_buffer: &mut Vec<Rule>,
        pattern_buffer: &mut Vec<ValueWildcard>,
    ) {
        if !self.other_condition_wildcard {
            return;
        }
        let mut not_matched: Vec<&Rule> = prior.children().iter().collect();
        let mut missing_rule = None;
        let mut missing_wildcard = None;
        let mut missing_count = 0;
        for rule in &self.fully_qualified {
            match not_matched.iter().position(|r| *r == rule) {
                Some(i) => {
                    not_matched.swap_remove(i);
                }
                None => {
                    missing_count += 1;
                    if missing_count > 1 {
                        return;
                    }
                    missing_rule = Some(rule);
                }
            }
        }
        for wildcard in &self.value_wildcards {
            match not_matched.iter().position(|r| wildcard.matches(r)) {
                Some(i) => {
                    not_matched.remove(i);
                }
                None => {
                    missing_count += 1;
                    if missing_count > 1 {
                        return;
                    }
                    missing_wildcard = Some(wildcard);
                }
            }
        }
        if missing_count != 1 {
            return;
        }
        match (missing_wildcard, missing_rule) {
            (Some(w), _) => pattern_buffer.push(w.clone()),
            (None, Some(r)) => rule_buffer.push(r.clone()),
            (None, None) => {}
        }
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.fully_qualified.iter().map(Rule::to_string).collect();
        parts.extend(self.value_wildcards.iter().map(ValueWildcard::to_string));
        if self.other_condition_wildcard {
            parts.push("*".to_string());
        }
        f.write_str(&parts.join(" and "))
    }
}
