//! Borrowed, partitioned views on records for rule induction.

use super::{Record, TriggerClassification};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Records split by classification.
///
/// The greedy induction works on `must` and `no` only; `can` holds records
/// that still need to be distributed.
#[derive(Debug, Clone, Default)]
pub struct RecordSubset<'a> {
    must: Vec<&'a Record>,
    can: Vec<&'a Record>,
    no: Vec<&'a Record>,
}

impl<'a> RecordSubset<'a> {
    pub fn from_records<I: IntoIterator<Item = &'a Record>>(records: I) -> Self {
        let mut subset = Self::default();
        for r in records {
            match r.classification {
                TriggerClassification::MustBe => subset.must.push(r),
                TriggerClassification::CanBe => subset.can.push(r),
                TriggerClassification::NoTrigger => subset.no.push(r),
            }
        }
        subset
    }

    pub fn from_parts(must: Vec<&'a Record>, no: Vec<&'a Record>) -> Self {
        Self {
            must,
            can: Vec::new(),
            no,
        }
    }

    pub fn must(&self) -> &[&'a Record] {
        &self.must
    }

    pub fn no(&self) -> &[&'a Record] {
        &self.no
    }

    pub fn can(&self) -> &[&'a Record] {
        &self.can
    }

    pub fn must_count(&self) -> usize {
        self.must.len()
    }

    pub fn no_count(&self) -> usize {
        self.no.len()
    }

    pub fn len(&self) -> usize {
        self.must.len() + self.can.len() + self.no.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keep_satisfying(&self, pred: impl Fn(&Record) -> bool) -> Self {
        Self {
            must: self.must.iter().copied().filter(|r| pred(r)).collect(),
            can: self.can.iter().copied().filter(|r| pred(r)).collect(),
            no: self.no.iter().copied().filter(|r| pred(r)).collect(),
        }
    }

    pub fn keep_not_satisfying(&self, pred: impl Fn(&Record) -> bool) -> Self {
        self.keep_satisfying(|r| !pred(r))
    }

    /// Exchanges the roles of `must` and `no`, used to induce exclusions
    /// with the same machinery as inclusions.
    pub fn swap_must_and_no(&self) -> Self {
        Self {
            must: self.no.clone(),
            can: self.can.clone(),
            no: self.must.clone(),
        }
    }

    /// Resolves `can` records: per ticket one uniformly chosen candidate
    /// counts as `must`, the rest as `no`.
    pub fn distribute_can<R: Rng>(&self, rng: &mut R) -> Self {
        let mut per_ticket: BTreeMap<&str, Vec<&'a Record>> = BTreeMap::new();
        for &r in &self.can {
            per_ticket.entry(r.id.ticket.as_str()).or_default().push(r);
        }
        let mut must = self.must.clone();
        let mut no = self.no.clone();
        for candidates in per_ticket.into_values() {
            let chosen = rng.random_range(0..candidates.len());
            for (i, r) in candidates.into_iter().enumerate() {
                if i == chosen {
                    must.push(r);
                } else {
                    no.push(r);
                }
            }
        }
        Self::from_parts(must, no)
    }

    /// Samples every non-empty class with replacement to exactly
    /// `max(min_size, factor * minority)` records, so that class imbalance
    /// does not carry over into rule induction.
    pub fn downsample<R: Rng>(&self, rng: &mut R, factor: f64, min_size: usize) -> Self {
        let minority = [self.must.len(), self.no.len()]
            .into_iter()
            .filter(|&n| n > 0)
            .min()
            .unwrap_or(0);
        let target = min_size.max((factor * minority as f64) as usize);
        let sample = |class: &[&'a Record], rng: &mut R| -> Vec<&'a Record> {
            (0..target).filter_map(|_| class.choose(rng).copied()).collect()
        };
        let must = sample(&self.must, rng);
        let no = sample(&self.no, rng);
        Self::from_parts(must, no)
    }
}
