//! Conjunctions of atomic rules.

use super::Rule;
use crate::record::Record;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An order-independent, duplicate-free conjunction.
///
/// Children are kept in canonical order, so equality, hashing and the text
/// form do not depend on the order in which rules were added. The empty
/// conjunction is always true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct And {
    children: Vec<Rule>,
}

impl And {
    pub fn new<I: IntoIterator<Item = Rule>>(rules: I) -> Self {
        let mut children: Vec<Rule> = rules.into_iter().collect();
        children.sort();
        children.dedup();
        Self { children }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A conjunction that never matches.
    pub fn never() -> Self {
        Self {
            children: vec![Rule::False],
        }
    }

    pub fn children(&self) -> &[Rule] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.children.binary_search(rule).is_ok()
    }

    pub fn is_never(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Rule::False))
    }

    pub fn test(&self, record: &Record) -> bool {
        self.children.iter().all(|c| c.test(record))
    }

    /// One unit per atomic child plus the children's own complexity.
    pub fn complexity(&self) -> usize {
        self.children.iter().map(|c| 1 + c.complexity()).sum()
    }

    /// Multiset of the columns used by the children.
    pub fn used_features(&self) -> BTreeMap<Arc<str>, usize> {
        let mut features = BTreeMap::new();
        for child in &self.children {
            child.add_used_features(&mut features);
        }
        features
    }

    pub fn uses_column(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.uses_column(name))
    }

    /// How many children use the column.
    pub fn column_usage(&self, name: &str) -> usize {
        self.children.iter().filter(|c| c.uses_column(name)).count()
    }

    pub fn and(&self, rule: Rule) -> Self {
        Self::new(self.children.iter().cloned().chain(std::iter::once(rule)))
    }

    /// Conjunction of both children lists.
    pub fn merged_with(&self, other: &And) -> Self {
        Self::new(self.children.iter().chain(other.children.iter()).cloned())
    }

    pub fn copy_without_child(&self, rule: &Rule) -> Self {
        Self::new(self.children.iter().filter(|c| *c != rule).cloned())
    }

    pub fn copy_with_replaced_child(&self, old: &Rule, new: Rule) -> Self {
        Self::new(
            self.children
                .iter()
                .filter(|c| *c != old)
                .cloned()
                .chain(std::iter::once(new)),
        )
    }
}

impl FromIterator<Rule> for And {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChangePartId, RecordScheme, TriggerClassification};

    fn scheme() -> RecordScheme {
        RecordScheme::new(["nA", "nB"], ["sA"]).unwrap()
    }

    #[test]
    fn test_order_independent_equality() {
        let s = scheme();
        let a = Rule::leq(&s, "nA", 1.0).unwrap();
        let b = Rule::equals(&s, "sA", "x").unwrap();
        let first = And::new([a.clone(), b.clone()]);
        let second = And::new([b.clone(), a.clone(), b]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.to_string(), "(nA<=1.0 and sA == 'x')");
    }

    #[test]
    fn test_empty_conjunction_matches_everything() {
        let r = Record::new(
            ChangePartId::new("T", "c", "f"),
            vec![f64::NAN, f64::NAN],
            vec![None],
            TriggerClassification::NoTrigger,
        );
        assert!(And::empty().test(&r));
        assert_eq!(And::empty().to_string(), "()");
        assert!(!And::never().test(&r));
    }

    #[test]
    fn test_child_edits_are_pure() {
        let s = scheme();
        let a = Rule::leq(&s, "nA", 1.0).unwrap();
        let b = Rule::geq(&s, "nB", 2.0).unwrap();
        let c = Rule::geq(&s, "nB", 3.0).unwrap();
        let and = And::new([a.clone(), b.clone()]);
        assert_eq!(and.copy_without_child(&a), And::new([b.clone()]));
        assert_eq!(and.copy_with_replaced_child(&b, c.clone()), And::new([a.clone(), c]));
        assert_eq!(and.len(), 2);
        assert!(and.contains(&a));
    }

    #[test]
    fn test_complexity_and_features() {
        let s = scheme();
        let and = And::new([
            Rule::leq(&s, "nA", 1.0).unwrap(),
            Rule::geq(&s, "nA", 0.0).unwrap(),
            Rule::equals(&s, "sA", "x").unwrap(),
        ]);
        assert_eq!(and.complexity(), 3);
        assert_eq!(And::empty().complexity(), 0);
        let features = and.used_features();
        assert_eq!(features.get("nA"), Some(&2));
        assert_eq!(features.get("sA"), Some(&1));
        assert_eq!(and.column_usage("nA"), 2);
        assert!(!and.uses_column("nB"));
    }
}
