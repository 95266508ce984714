//! Data-aware simplification of rule sets.
//!
//! Simplification never changes the verdict for a record of the data it
//! was computed on.

use super::{And, Column, Rule, RuleSet};
use crate::record::RecordSet;
use std::collections::BTreeMap;
use std::sync::Arc;

impl And {
    /// Canonical form of the conjunction on `data`.
    ///
    /// Drops `true`, turns `!=` on a two-valued string column into `==` on
    /// the other value, keeps only the tightest bounds per numeric column and
    /// collapses contradictions to a conjunction that never matches.
    pub fn simplify(&self, data: &RecordSet) -> And {
        if self.is_never() {
            return And::never();
        }
        let mut per_column: BTreeMap<Arc<str>, Vec<Rule>> = BTreeMap::new();
        for child in self.children() {
            let rule = match child {
                Rule::True => continue,
                Rule::NotEquals(c, v) => binary_to_equality(data, c, v).unwrap_or_else(|| child.clone()),
                other => other.clone(),
            };
            if let Some(c) = rule.column() {
                per_column.entry(c.name_arc().clone()).or_default().push(rule);
            }
        }
        let mut result = Vec::new();
        for rules in per_column.into_values() {
            match combine(rules) {
                Some(combined) => result.extend(combined),
                None => return And::never(),
            }
        }
        And::new(result)
    }

    /// Whether `self` says everything `other` says, so `other ∪ self`
    /// simplifies back to `self`.
    fn is_more_specific_than(&self, other: &And, data: &RecordSet) -> bool {
        self.merged_with(other).simplify(data) == *self
    }
}

fn binary_to_equality(data: &RecordSet, column: &Column, value: &Arc<str>) -> Option<Rule> {
    match data.possible_string_values(column.index()) {
        [a, b] if a == value => Some(Rule::Equals(column.clone(), b.clone())),
        [a, b] if b == value => Some(Rule::Equals(column.clone(), a.clone())),
        _ => None,
    }
}

/// Combines the rules of one column; `None` when they contradict each other.
fn combine(rules: Vec<Rule>) -> Option<Vec<Rule>> {
    let mut lower: Option<(Column, f64)> = None;
    let mut upper: Option<(Column, f64)> = None;
    let mut equal: Option<Rule> = None;
    let mut not_equal = Vec::new();
    for rule in rules {
        match rule {
            Rule::Geq(c, v) => {
                if lower.as_ref().is_none_or(|(_, l)| v > *l) {
                    lower = Some((c, v));
                }
            }
            Rule::Leq(c, v) => {
                if upper.as_ref().is_none_or(|(_, u)| v < *u) {
                    upper = Some((c, v));
                }
            }
            Rule::Equals(..) => {
                if equal.as_ref().is_some_and(|existing| *existing != rule) {
                    return None;
                }
                equal = Some(rule);
            }
            Rule::NotEquals(..) => not_equal.push(rule),
            Rule::True | Rule::False => {}
        }
    }
    if let (Some((_, l)), Some((_, u))) = (&lower, &upper) {
        if l > u {
            return None;
        }
    }
    if let Some(Rule::Equals(c, v)) = &equal {
        let contradicted = not_equal
            .iter()
            .any(|r| matches!(r, Rule::NotEquals(_, other) if other == v));
        if contradicted {
            return None;
        }
        return Some(vec![Rule::Equals(c.clone(), v.clone())]);
    }
    let mut combined = not_equal;
    combined.extend(lower.map(|(c, v)| Rule::Geq(c, v)));
    combined.extend(upper.map(|(c, v)| Rule::Leq(c, v)));
    Some(combined)
}

fn simplify_list(list: &[And], data: &RecordSet) -> Vec<And> {
    let mut result: Vec<And> = Vec::with_capacity(list.len());
    for and in list {
        let simplified = and.simplify(data);
        if !simplified.is_never() && !result.contains(&simplified) {
            result.push(simplified);
        }
    }
    while let Some(implied) = (0..result.len()).find(|&i| {
        (0..result.len()).any(|j| i != j && result[i].is_more_specific_than(&result[j], data))
    }) {
        result.remove(implied);
    }
    result
}

impl RuleSet {
    /// Removes duplicate, contradictory and implied conjunctions.
    ///
    /// The result classifies every record of `data` exactly like `self`.
    /// Exclusions are dropped entirely when no inclusion remains.
    ///
    /// # Examples
    ///
    /// ```
    /// use skip_rules::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
    /// use skip_rules::rule::{parse_and, RuleSet};
    ///
    /// let scheme = RecordScheme::new(["nA"], Vec::<&str>::new()).unwrap();
    /// let record = Record::new(ChangePartId::new("T", "c", "f"), vec![1.0], vec![], TriggerClassification::NoTrigger);
    /// let data = RecordSet::new(scheme.clone(), vec![record]);
    ///
    /// let rs = RuleSet::skip_none()
    ///     .include(parse_and(&scheme, "(nA<=6.0)").unwrap())
    ///     .include(parse_and(&scheme, "(nA<=7.0)").unwrap());
    /// let simplified = rs.simplify(&data);
    /// assert_eq!(simplified, RuleSet::skip_none().include(parse_and(&scheme, "(nA<=7.0)").unwrap()));
    /// ```
    pub fn simplify(&self, data: &RecordSet) -> RuleSet {
        let inclusions = simplify_list(self.inclusions(), data);
        let exclusions = if inclusions.is_empty() {
            Vec::new()
        } else {
            simplify_list(self.exclusions(), data)
        };
        let mut result = RuleSet::new(self.default_verdict());
        for and in inclusions {
            result = result.include(and);
        }
        for and in exclusions {
            result = result.exclude(and);
        }
        result
    }
}
