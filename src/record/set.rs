//! Immutable record container with precomputed split points.

use super::{ChangePartId, Record, RecordScheme, TriggerClassification};
use crate::error::{MiningError, Result};
use crate::expr::Expression;
use crate::rule::{Column, Rule};
use crate::trigger::{RemarkTriggerMap, TicketInfo};
use crate::util::split_point_with_few_digits;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A scheme plus the records that follow it.
///
/// On construction the set precomputes, for each numeric column, the sorted
/// candidate thresholds between neighbouring values of different class, and
/// for each string column the sorted distinct values.
#[derive(Debug, Clone)]
pub struct RecordSet {
    scheme: Arc<RecordScheme>,
    records: Vec<Record>,
    split_values: Vec<Vec<f64>>,
    string_values: Vec<Vec<Arc<str>>>,
}

impl RecordSet {
    pub fn new(scheme: RecordScheme, records: Vec<Record>) -> Self {
        Self::with_shared_scheme(Arc::new(scheme), records)
    }

    pub fn with_shared_scheme(scheme: Arc<RecordScheme>, records: Vec<Record>) -> Self {
        let split_values = (0..scheme.numeric_count())
            .map(|column| numeric_split_values(&records, column))
            .collect();
        let string_values = (0..scheme.string_count())
            .map(|column| {
                let distinct: BTreeSet<&str> =
                    records.iter().filter_map(|r| r.string_value(column)).collect();
                distinct.into_iter().map(Arc::from).collect()
            })
            .collect();
        Self {
            scheme,
            records,
            split_values,
            string_values,
        }
    }

    pub fn scheme(&self) -> &RecordScheme {
        &self.scheme
    }

    pub fn shared_scheme(&self) -> Arc<RecordScheme> {
        Arc::clone(&self.scheme)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Candidate thresholds of a numeric column, ascending.
    pub fn split_values(&self, numeric_index: usize) -> &[f64] {
        &self.split_values[numeric_index]
    }

    /// Sorted distinct values of a string column.
    pub fn possible_string_values(&self, string_index: usize) -> &[Arc<str>] {
        &self.string_values[string_index]
    }

    /// Smallest threshold strictly above `value`, or `value` itself when
    /// there is none.
    pub fn split_point_above(&self, numeric_index: usize, value: f64) -> f64 {
        let values = &self.split_values[numeric_index];
        match values.binary_search_by(|v| v.total_cmp(&value)) {
            Ok(i) if i + 1 < values.len() => values[i + 1],
            Ok(_) => value,
            Err(insertion) if insertion < values.len() => values[insertion],
            Err(_) => value,
        }
    }

    /// Largest threshold strictly below `value`, or `value` itself when
    /// there is none.
    pub fn split_point_below(&self, numeric_index: usize, value: f64) -> f64 {
        let values = &self.split_values[numeric_index];
        match values.binary_search_by(|v| v.total_cmp(&value)) {
            Ok(i) if i > 0 => values[i - 1],
            Ok(_) => value,
            Err(insertion) if insertion > 0 => values[insertion - 1],
            Err(_) => value,
        }
    }

    /// A random atomic condition on a random column.
    ///
    /// Numeric columns get `<=` or `>=` at one of their thresholds, string
    /// columns `==` or `!=` with one of their values. A column without any
    /// threshold or value yields `Rule::True`.
    pub fn create_random_simple_rule<R: Rng>(&self, rng: &mut R) -> Rule {
        let column_count = self.scheme.column_count();
        if column_count == 0 {
            return Rule::True;
        }
        let abs = rng.random_range(0..column_count);
        let column = Column::new(&self.scheme, abs);
        if self.scheme.is_numeric(abs) {
            match self.split_values[column.index()].choose(rng) {
                Some(&value) if rng.random_bool(0.5) => Rule::Leq(column, value),
                Some(&value) => Rule::Geq(column, value),
                None => Rule::True,
            }
        } else {
            match self.string_values[column.index()].choose(rng) {
                Some(value) if rng.random_bool(0.5) => Rule::Equals(column, value.clone()),
                Some(value) => Rule::NotEquals(column, value.clone()),
                None => Rule::True,
            }
        }
    }

    /// Copy without the records matching `pred`.
    pub fn copy_without(&self, pred: impl Fn(&Record) -> bool) -> RecordSet {
        let kept = self.records.iter().filter(|r| !pred(r)).cloned().collect();
        Self::with_shared_scheme(self.shared_scheme(), kept)
    }

    /// Copy without the records of one ticket.
    pub fn without_ticket(&self, ticket: &str) -> RecordSet {
        self.copy_without(|r| r.id.ticket == ticket)
    }

    /// Distinct tickets in order of first appearance.
    pub fn tickets(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .map(|r| r.id.ticket.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Verifies that the records of each ticket are contiguous.
    pub fn check_grouped_by_ticket(&self) -> Result<()> {
        let mut finished = BTreeSet::new();
        let mut current: Option<&str> = None;
        for record in &self.records {
            let ticket = record.id.ticket.as_str();
            if current == Some(ticket) {
                continue;
            }
            if let Some(previous) = current {
                finished.insert(previous);
            }
            if finished.contains(ticket) {
                return Err(MiningError::UnsortedRecords(ticket.to_string()));
            }
            current = Some(ticket);
        }
        Ok(())
    }

    /// Relabels every record from the trigger map.
    ///
    /// Records the map can only attribute ambiguously keep `CanBe`; use
    /// [`reclassify_distributed`](Self::reclassify_distributed) to resolve
    /// them.
    pub fn reclassify(&self, trigger_map: &RemarkTriggerMap) -> RecordSet {
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let info = TicketRecords::around(&self.records, i);
                r.with_classification(trigger_map.classification(&info, &r.id))
            })
            .collect();
        Self::with_shared_scheme(self.shared_scheme(), records)
    }

    /// Relabels from the trigger map and resolves `CanBe` per ticket: one
    /// uniformly chosen candidate becomes `MustBe`, the others `NoTrigger`.
    pub fn reclassify_distributed<R: Rng>(
        &self,
        trigger_map: &RemarkTriggerMap,
        rng: &mut R,
    ) -> RecordSet {
        let mut relabeled = self.reclassify(trigger_map).records;
        distribute_can_per_ticket(&mut relabeled, rng);
        Self::with_shared_scheme(self.shared_scheme(), relabeled)
    }

    /// Appends a numeric column computed from `expression` for every record.
    pub fn with_computed_column(&self, name: &str, expression: &Expression) -> Result<RecordSet> {
        let scheme = self.scheme.with_numeric_column(name)?;
        let records = self
            .records
            .iter()
            .map(|r| r.with_numeric_value_appended(expression.evaluate(r)))
            .collect();
        Ok(Self::new(scheme, records))
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn numeric_split_values(records: &[Record], column: usize) -> Vec<f64> {
    let mut by_value: BTreeMap<OrderedValue, TriggerClassification> = BTreeMap::new();
    for record in records {
        let value = record.numeric_value(column);
        if value.is_nan() {
            continue;
        }
        by_value
            .entry(OrderedValue(value))
            .and_modify(|c| *c = c.merge(record.classification))
            .or_insert(record.classification);
    }
    let mut splits = Vec::new();
    let mut entries = by_value.into_iter();
    let Some(mut previous) = entries.next() else {
        return splits;
    };
    for current in entries {
        if current.1 != previous.1 || current.1 == TriggerClassification::CanBe {
            splits.push(split_point_with_few_digits(previous.0 .0, current.0 .0));
        }
        previous = current;
    }
    splits
}

pub(crate) fn distribute_can_per_ticket<R: Rng>(records: &mut [Record], rng: &mut R) {
    let mut candidates: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        if r.classification == TriggerClassification::CanBe {
            candidates.entry(r.id.ticket.clone()).or_default().push(i);
        }
    }
    for indices in candidates.values() {
        let chosen = indices.choose(rng).copied();
        for &i in indices {
            records[i].classification = if Some(i) == chosen {
                TriggerClassification::MustBe
            } else {
                TriggerClassification::NoTrigger
            };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedValue(f64);

impl Eq for OrderedValue {}

impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The records of the ticket around one record, used to answer coverage
/// questions while classifying that record.
pub(crate) struct TicketRecords<'a> {
    others: Vec<&'a ChangePartId>,
}

impl<'a> TicketRecords<'a> {
    pub(crate) fn around(records: &'a [Record], index: usize) -> Self {
        let ticket = &records[index].id.ticket;
        let same_ticket = |r: &&Record| &r.id.ticket == ticket;
        let mut others: Vec<&ChangePartId> = records[index + 1..]
            .iter()
            .take_while(same_ticket)
            .map(|r| &r.id)
            .collect();
        others.extend(
            records[..index]
                .iter()
                .rev()
                .take_while(same_ticket)
                .map(|r| &r.id),
        );
        Self { others }
    }
}

impl TicketInfo for TicketRecords<'_> {
    fn contains_changes_outside(&self, commit: &str, file: &str) -> bool {
        self.others.iter().any(|id| !id.same_file(commit, file))
    }

    fn contains_changes_in_file_outside(&self, commit: &str, file: &str, line_from: i32, line_to: i32) -> bool {
        self.others
            .iter()
            .filter(|id| id.same_file(commit, file))
            .any(|id| match id.lines {
                Some((from, to)) => from < line_from || to > line_to,
                None => true,
            })
    }
}
