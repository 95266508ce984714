//! Predicate model.
//!
//! Atomic [`Rule`]s test one column of a record against a threshold or a
//! string value. An [`And`] is a conjunction of atomic rules, and a
//! [`RuleSet`] combines conjunctions into a "skip when ... unless ..." policy.
//!
//! All predicate types are immutable; every edit returns a new value.

mod and;
mod parser;
mod rule_set;
mod simplify;

pub use and::And;
pub use parser::{parse_and, parse_rule};
pub(crate) use parser::{parse_term, split_conjunction, term_to_rule, ConditionValue, Term};
pub use rule_set::{RuleSet, Verdict};

use crate::error::{MiningError, Result};
use crate::record::{Record, RecordScheme, RecordSet};
use crate::util::format_number;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A column reference resolved against a scheme.
///
/// Identity is the column name. Appending a computed numeric column shifts
/// the absolute index of string columns but never renames a column, so
/// rules created before the edit stay equal to rules created after it.
#[derive(Debug, Clone)]
pub struct Column {
    index: usize,
    name: Arc<str>,
}

impl Column {
    /// Column at absolute index `abs`.
    pub fn new(scheme: &RecordScheme, abs: usize) -> Self {
        let index = if scheme.is_numeric(abs) {
            scheme.to_numeric_index(abs)
        } else {
            scheme.to_string_index(abs)
        };
        Self {
            index,
            name: scheme.name_arc(abs).clone(),
        }
    }

    /// Numeric column by name.
    pub fn numeric(scheme: &RecordScheme, name: &str) -> Result<Self> {
        let abs = scheme.abs_index(name)?;
        if !scheme.is_numeric(abs) {
            return Err(MiningError::ColumnKind {
                name: name.to_string(),
                expected: "numeric",
            });
        }
        Ok(Self::new(scheme, abs))
    }

    /// String column by name.
    pub fn string(scheme: &RecordScheme, name: &str) -> Result<Self> {
        let abs = scheme.abs_index(name)?;
        if scheme.is_numeric(abs) {
            return Err(MiningError::ColumnKind {
                name: name.to_string(),
                expected: "string",
            });
        }
        Ok(Self::new(scheme, abs))
    }

    /// Index within the numeric or string columns.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Operator of an atomic, non-constant rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleKind {
    Leq,
    Geq,
    Equals,
    NotEquals,
}

impl RuleKind {
    pub fn symbol(self) -> &'static str {
        match self {
            RuleKind::Leq => "<=",
            RuleKind::Geq => ">=",
            RuleKind::Equals => "==",
            RuleKind::NotEquals => "!=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<=" => Some(RuleKind::Leq),
            ">=" => Some(RuleKind::Geq),
            "==" => Some(RuleKind::Equals),
            "!=" => Some(RuleKind::NotEquals),
            _ => None,
        }
    }

    pub fn is_ordinal(self) -> bool {
        matches!(self, RuleKind::Leq | RuleKind::Geq)
    }
}

/// An atomic condition on one record.
///
/// Missing values never satisfy a column condition: NaN fails `Leq` and
/// `Geq`, a missing string fails both `Equals` and `NotEquals`.
#[derive(Debug, Clone)]
pub enum Rule {
    True,
    False,
    Leq(Column, f64),
    Geq(Column, f64),
    Equals(Column, Arc<str>),
    NotEquals(Column, Arc<str>),
}

impl Rule {
    pub fn leq(scheme: &RecordScheme, column: &str, value: f64) -> Result<Self> {
        Ok(Rule::Leq(Column::numeric(scheme, column)?, value))
    }

    pub fn geq(scheme: &RecordScheme, column: &str, value: f64) -> Result<Self> {
        Ok(Rule::Geq(Column::numeric(scheme, column)?, value))
    }

    pub fn equals(scheme: &RecordScheme, column: &str, value: &str) -> Result<Self> {
        Ok(Rule::Equals(Column::string(scheme, column)?, Arc::from(value)))
    }

    pub fn not_equals(scheme: &RecordScheme, column: &str, value: &str) -> Result<Self> {
        Ok(Rule::NotEquals(Column::string(scheme, column)?, Arc::from(value)))
    }

    pub fn test(&self, record: &Record) -> bool {
        match self {
            Rule::True => true,
            Rule::False => false,
            Rule::Leq(c, t) => record.numeric_value(c.index) <= *t,
            Rule::Geq(c, t) => record.numeric_value(c.index) >= *t,
            Rule::Equals(c, v) => record.string_value(c.index) == Some(&**v),
            Rule::NotEquals(c, v) => matches!(record.string_value(c.index), Some(s) if s != &**v),
        }
    }

    /// Atomic rules carry no complexity of their own; a conjunction counts
    /// one unit per atomic child.
    pub fn complexity(&self) -> usize {
        0
    }

    /// Whether the rule tests the named column.
    pub fn uses_column(&self, name: &str) -> bool {
        self.column().is_some_and(|c| c.name() == name)
    }

    pub fn column(&self) -> Option<&Column> {
        match self {
            Rule::True | Rule::False => None,
            Rule::Leq(c, _) | Rule::Geq(c, _) | Rule::Equals(c, _) | Rule::NotEquals(c, _) => Some(c),
        }
    }

    pub fn kind(&self) -> Option<RuleKind> {
        match self {
            Rule::True | Rule::False => None,
            Rule::Leq(..) => Some(RuleKind::Leq),
            Rule::Geq(..) => Some(RuleKind::Geq),
            Rule::Equals(..) => Some(RuleKind::Equals),
            Rule::NotEquals(..) => Some(RuleKind::NotEquals),
        }
    }

    pub fn is_ordinal(&self) -> bool {
        self.kind().is_some_and(RuleKind::is_ordinal)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Rule::True | Rule::False)
    }

    /// Adds the used column to a feature multiset.
    pub fn add_used_features(&self, features: &mut BTreeMap<Arc<str>, usize>) {
        if let Some(c) = self.column() {
            *features.entry(c.name.clone()).or_insert(0) += 1;
        }
    }

    /// Moves the threshold to the next larger split point of `data`.
    ///
    /// At the upper edge `Leq` becomes `True` and `Geq` becomes `False`.
    /// Non-ordinal rules are returned unchanged.
    pub fn next_larger(&self, data: &RecordSet) -> Rule {
        match self {
            Rule::Leq(c, v) => {
                let next = data.split_point_above(c.index, *v);
                if next.total_cmp(v).is_eq() {
                    Rule::True
                } else {
                    Rule::Leq(c.clone(), next)
                }
            }
            Rule::Geq(c, v) => {
                let next = data.split_point_above(c.index, *v);
                if next.total_cmp(v).is_eq() {
                    Rule::False
                } else {
                    Rule::Geq(c.clone(), next)
                }
            }
            _ => self.clone(),
        }
    }

    /// Moves the threshold to the next smaller split point of `data`.
    ///
    /// At the lower edge `Leq` becomes `False` and `Geq` becomes `True`.
    pub fn next_smaller(&self, data: &RecordSet) -> Rule {
        match self {
            Rule::Leq(c, v) => {
                let next = data.split_point_below(c.index, *v);
                if next.total_cmp(v).is_eq() {
                    Rule::False
                } else {
                    Rule::Leq(c.clone(), next)
                }
            }
            Rule::Geq(c, v) => {
                let next = data.split_point_below(c.index, *v);
                if next.total_cmp(v).is_eq() {
                    Rule::True
                } else {
                    Rule::Geq(c.clone(), next)
                }
            }
            _ => self.clone(),
        }
    }

    fn sort_key(&self) -> Option<&str> {
        self.column().map(|c| &*c.name)
    }

    fn rank(&self) -> u8 {
        match self {
            Rule::True => 0,
            Rule::False => 1,
            Rule::Leq(..) => 2,
            Rule::Geq(..) => 3,
            Rule::Equals(..) => 4,
            Rule::NotEquals(..) => 5,
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Rule::True | Rule::False => {}
            Rule::Leq(c, v) | Rule::Geq(c, v) => {
                c.hash(state);
                v.to_bits().hash(state);
            }
            Rule::Equals(c, v) | Rule::NotEquals(c, v) => {
                c.hash(state);
                v.hash(state);
            }
        }
    }
}

impl PartialOrd for Rule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical order: by column name, then operator, then value.
impl Ord for Rule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (Rule::Leq(_, a), Rule::Leq(_, b)) | (Rule::Geq(_, a), Rule::Geq(_, b)) => a.total_cmp(b),
                (Rule::Equals(_, a), Rule::Equals(_, b)) | (Rule::NotEquals(_, a), Rule::NotEquals(_, b)) => {
                    a.cmp(b)
                }
                _ => Ordering::Equal,
            })
    }
}

pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::True => f.write_str("true"),
            Rule::False => f.write_str("false"),
            Rule::Leq(c, v) => write!(f, "{}<={}", c.name, format_number(*v)),
            Rule::Geq(c, v) => write!(f, "{}>={}", c.name, format_number(*v)),
            Rule::Equals(c, v) => write!(f, "{} == {}", c.name, quote(v)),
            Rule::NotEquals(c, v) => write!(f, "{} != {}", c.name, quote(v)),
        }
    }
}
