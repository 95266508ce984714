//! Skip-unless rule sets.

use super::And;
use crate::record::Record;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Outcome of applying a rule set to a change part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    Review,
    Skip,
}

impl Verdict {
    pub fn opposite(self) -> Self {
        match self {
            Verdict::Review => Verdict::Skip,
            Verdict::Skip => Verdict::Review,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Review => "review",
            Verdict::Skip => "skip",
        })
    }
}

/// A default verdict, inclusion conjunctions that flip it, and exclusion
/// conjunctions that flip it back.
///
/// Exclusions only matter for records matched by an inclusion. Iteration
/// and display keep insertion order; equality and hashing treat both lists
/// as sets.
#[derive(Debug, Clone)]
pub struct RuleSet {
    default: Verdict,
    inclusions: Vec<And>,
    exclusions: Vec<And>,
}

impl RuleSet {
    pub fn new(default: Verdict) -> Self {
        Self {
            default,
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// Reviews everything.
    pub fn skip_none() -> Self {
        Self::new(Verdict::Review)
    }

    /// Skips everything.
    pub fn skip_all() -> Self {
        Self::skip_none().include(And::empty())
    }

    pub fn default_verdict(&self) -> Verdict {
        self.default
    }

    pub fn inclusions(&self) -> &[And] {
        &self.inclusions
    }

    pub fn exclusions(&self) -> &[And] {
        &self.exclusions
    }

    pub fn apply(&self, record: &Record) -> Verdict {
        if !self.inclusions.iter().any(|a| a.test(record)) {
            return self.default;
        }
        if self.exclusions.iter().any(|a| a.test(record)) {
            self.default
        } else {
            self.default.opposite()
        }
    }

    pub fn skips(&self, record: &Record) -> bool {
        self.apply(record) == Verdict::Skip
    }

    pub fn include(&self, and: And) -> Self {
        let mut copy = self.clone();
        if !copy.inclusions.contains(&and) {
            copy.inclusions.push(and);
        }
        copy
    }

    pub fn exclude(&self, and: And) -> Self {
        let mut copy = self.clone();
        if !copy.exclusions.contains(&and) {
            copy.exclusions.push(and);
        }
        copy
    }

    pub fn remove_inclusion(&self, and: &And) -> Self {
        let mut copy = self.clone();
        copy.inclusions.retain(|a| a != and);
        copy
    }

    pub fn remove_exclusion(&self, and: &And) -> Self {
        let mut copy = self.clone();
        copy.exclusions.retain(|a| a != and);
        copy
    }

    /// Replaces an inclusion in place. Unchanged when `old` is absent.
    pub fn replace_inclusion(&self, old: &And, new: And) -> Self {
        let mut copy = self.clone();
        replace_in(&mut copy.inclusions, old, new);
        copy
    }

    /// Replaces an exclusion in place. Unchanged when `old` is absent.
    pub fn replace_exclusion(&self, old: &And, new: And) -> Self {
        let mut copy = self.clone();
        replace_in(&mut copy.exclusions, old, new);
        copy
    }

    /// Keeps only the conjunctions accepted by `keep`, in both lists.
    pub fn retain_conjunctions(&self, keep: impl Fn(&And) -> bool) -> Self {
        let mut copy = self.clone();
        copy.inclusions.retain(&keep);
        copy.exclusions.retain(&keep);
        copy
    }

    /// Sum over all conjunctions of one unit plus the conjunction's
    /// complexity.
    pub fn complexity(&self) -> usize {
        self.conjunctions().map(|a| 1 + a.complexity()).sum()
    }

    /// Multiset of columns used anywhere in the rule set.
    pub fn used_features(&self) -> BTreeMap<Arc<str>, usize> {
        let mut features = BTreeMap::new();
        for and in self.conjunctions() {
            for (name, count) in and.used_features() {
                *features.entry(name).or_insert(0) += count;
            }
        }
        features
    }

    /// Number of distinct columns used.
    pub fn feature_count(&self) -> usize {
        self.used_features().len()
    }

    pub fn conjunctions(&self) -> impl Iterator<Item = &And> {
        self.inclusions.iter().chain(self.exclusions.iter())
    }

    fn sorted_inclusions(&self) -> Vec<&And> {
        let mut sorted: Vec<&And> = self.inclusions.iter().collect();
        sorted.sort();
        sorted
    }

    fn sorted_exclusions(&self) -> Vec<&And> {
        let mut sorted: Vec<&And> = self.exclusions.iter().collect();
        sorted.sort();
        sorted
    }
}

fn replace_in(list: &mut Vec<And>, old: &And, new: And) {
    let Some(position) = list.iter().position(|a| a == old) else {
        return;
    };
    if list.contains(&new) {
        list.remove(position);
    } else {
        list[position] = new;
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.default == other.default
            && self.inclusions.len() == other.inclusions.len()
            && self.exclusions.len() == other.exclusions.len()
            && self.sorted_inclusions() == other.sorted_inclusions()
            && self.sorted_exclusions() == other.sorted_exclusions()
    }
}

impl Eq for RuleSet {}

impl Hash for RuleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.default.hash(state);
        self.sorted_inclusions().hash(state);
        self.sorted_exclusions().hash(state);
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "normally use {}", self.default)?;
        if !self.inclusions.is_empty() {
            writeln!(f, "{} when one of", self.default.opposite())?;
            write_list(f, &self.inclusions)?;
        }
        if !self.exclusions.is_empty() {
            writeln!(f, "unless one of")?;
            write_list(f, &self.exclusions)?;
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &[And]) -> fmt::Result {
    for (i, and) in list.iter().enumerate() {
        if i == 0 {
            writeln!(f, "  {and}")?;
        } else {
            writeln!(f, "  or {and}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChangePartId, RecordScheme, TriggerClassification};
    use crate::rule::Rule;
    use std::collections::HashSet;

    fn scheme() -> RecordScheme {
        RecordScheme::new(["nA", "nB"], Vec::<&str>::new()).unwrap()
    }

    fn record(a: f64, b: f64) -> Record {
        Record::new(
            ChangePartId::new("T", "c", "f"),
            vec![a, b],
            vec![],
            TriggerClassification::NoTrigger,
        )
    }

    fn leq(column: &str, value: f64) -> And {
        And::new([Rule::leq(&scheme(), column, value).unwrap()])
    }

    // ---- Semantics ----

    #[test]
    fn test_skip_unless_semantics() {
        let rs = RuleSet::skip_none().include(leq("nA", 5.0)).exclude(leq("nB", 1.0));
        assert_eq!(rs.apply(&record(3.0, 4.0)), Verdict::Skip);
        assert_eq!(rs.apply(&record(3.0, 0.0)), Verdict::Review);
        assert_eq!(rs.apply(&record(7.0, 4.0)), Verdict::Review);
        assert_eq!(rs.apply(&record(7.0, 0.0)), Verdict::Review);
    }

    #[test]
    fn test_exclusions_without_inclusions_have_no_effect() {
        let rs = RuleSet::skip_none().exclude(leq("nB", 1.0));
        assert_eq!(rs.apply(&record(0.0, 0.0)), Verdict::Review);
    }

    #[test]
    fn test_canonical_rule_sets() {
        assert!(!RuleSet::skip_none().skips(&record(1.0, 1.0)));
        assert!(RuleSet::skip_all().skips(&record(f64::NAN, f64::NAN)));
        assert_eq!(RuleSet::skip_all().complexity(), 1);
        assert_eq!(RuleSet::skip_none().complexity(), 0);
    }

    // ---- Editing ----

    #[test]
    fn test_include_is_duplicate_free() {
        let rs = RuleSet::skip_none().include(leq("nA", 1.0)).include(leq("nA", 1.0));
        assert_eq!(rs.inclusions().len(), 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let rs = RuleSet::skip_none()
            .include(leq("nA", 1.0))
            .include(leq("nA", 2.0))
            .include(leq("nA", 3.0));
        let replaced = rs.replace_inclusion(&leq("nA", 2.0), leq("nB", 9.0));
        assert_eq!(replaced.inclusions()[1], leq("nB", 9.0));
        assert_eq!(rs.replace_exclusion(&leq("nA", 2.0), leq("nB", 9.0)), rs);
        let merged = rs.replace_inclusion(&leq("nA", 2.0), leq("nA", 3.0));
        assert_eq!(merged.inclusions().len(), 2);
    }

    #[test]
    fn test_remove() {
        let rs = RuleSet::skip_none().include(leq("nA", 1.0)).exclude(leq("nB", 1.0));
        assert!(rs.remove_inclusion(&leq("nA", 1.0)).inclusions().is_empty());
        assert!(rs.remove_exclusion(&leq("nB", 1.0)).exclusions().is_empty());
    }

    // ---- Equality & measures ----

    #[test]
    fn test_equality_ignores_order() {
        let first = RuleSet::skip_none().include(leq("nA", 1.0)).include(leq("nB", 2.0));
        let second = RuleSet::skip_none().include(leq("nB", 2.0)).include(leq("nA", 1.0));
        assert_eq!(first, second);
        let mut set = HashSet::new();
        set.insert(first);
        assert!(set.contains(&second));
        assert_ne!(second, RuleSet::skip_none().include(leq("nB", 2.0)));
    }

    #[test]
    fn test_complexity_and_feature_count() {
        let rs = RuleSet::skip_none()
            .include(And::new([
                Rule::leq(&scheme(), "nA", 1.0).unwrap(),
                Rule::leq(&scheme(), "nB", 1.0).unwrap(),
            ]))
            .exclude(leq("nA", 0.5));
        assert_eq!(rs.complexity(), 3 + 2);
        assert_eq!(rs.feature_count(), 2);
    }
}
