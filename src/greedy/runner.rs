//! Greedy top-down induction of rule sets.

use super::config::GreedyConfig;
use super::quality::{QualityFunction, QualitySelection, RuleQuality};
use crate::blackboard::Blackboard;
use crate::error::{MiningError, Result};
use crate::record::{Record, RecordScheme, RecordSubset};
use crate::restriction::{CreationRestriction, RestrictionKind, RuleRestrictions};
use crate::rule::{And, Column, Rule, RuleKind, RuleSet};
use crate::util::split_point_with_few_digits;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Attempts at drawing an admissible random condition per column.
const RANDOM_RULE_RETRIES: usize = 10;

/// Result of a greedy run.
#[derive(Debug, Clone)]
pub struct GreedyResult {
    /// Accepted conjunctions plus everything induced.
    pub rule_set: RuleSet,

    /// Number of induced conjunctions.
    pub induced: usize,

    /// Atomic conditions in the induced conjunctions.
    pub conditions: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// An atomic condition with the counts of the records it keeps covered.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionResult {
    pub rule: Rule,
    pub quality: RuleQuality,
}

/// Creates rule sets by separate-and-conquer induction.
///
/// CAN_BE records are first resolved to MUST_BE or NO_TRIGGER, then both
/// classes are downsampled on a random subset of the features. Inclusions
/// are grown to cover NO_TRIGGER records and exclusions to cover MUST_BE
/// records, alternating until the condition budget is spent or neither
/// side finds a conjunction.
pub struct GreedyRuleCreation;

impl GreedyRuleCreation {
    /// Induces one rule set.
    pub fn run(blackboard: &Blackboard, config: &GreedyConfig) -> Result<GreedyResult> {
        Self::run_with_cancel(blackboard, config, None)
    }

    /// Induces one rule set with an optional cancellation token.
    pub fn run_with_cancel(
        blackboard: &Blackboard,
        config: &GreedyConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GreedyResult> {
        config.validate().map_err(MiningError::InvalidConfig)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => blackboard.create_rng(),
        };

        let data = blackboard.records();
        let scheme = data.scheme();
        let binary = RecordSubset::from_records(data.records()).distribute_can(&mut rng);
        info!(
            must = binary.must_count(),
            no = binary.no_count(),
            "records after binarization"
        );

        let features = sample_feature_subset(
            &mut rng,
            scheme,
            blackboard.rejected_columns(),
            config.min_feature_subset,
        );
        let sample = binary.downsample(
            &mut rng,
            config.downsample_factor,
            features.len() * config.min_samples_per_feature,
        );

        let inclusions = blackboard.inclusion_restrictions();
        let exclusions = blackboard.exclusion_restrictions();
        let include_side = Induction {
            scheme,
            features: &features,
            rejected: blackboard.rejected_columns(),
            totals: RuleQuality::new(sample.must_count(), sample.no_count()),
            selection: config.quality,
            random_condition_probability: config.random_condition_probability,
        };
        let exclude_side = Induction {
            totals: RuleQuality::new(sample.no_count(), sample.must_count()),
            ..include_side
        };

        let mut rule_set = RuleSet::skip_none();
        for and in inclusions.accepted() {
            rule_set = rule_set.include(and.clone());
        }
        for and in exclusions.accepted() {
            rule_set = rule_set.exclude(and.clone());
        }
        let mut uncovered_no = sample.keep_not_satisfying(|r| covered_by_any(inclusions.accepted(), r));
        let mut uncovered_must = sample
            .swap_must_and_no()
            .keep_not_satisfying(|r| covered_by_any(exclusions.accepted(), r));

        let mut induced = 0usize;
        let mut conditions = 0usize;
        let mut cancelled = false;

        'rounds: loop {
            let mut added = false;
            for kind in [RestrictionKind::Inclusions, RestrictionKind::Exclusions] {
                if let Some(ref flag) = cancel {
                    if flag.load(Ordering::Relaxed) {
                        cancelled = true;
                        info!(induced, "greedy rule creation cancelled");
                        break 'rounds;
                    }
                }
                if conditions >= config.condition_budget {
                    break 'rounds;
                }

                let (induction, uncovered, restrictions) = match kind {
                    RestrictionKind::Inclusions => (&include_side, &mut uncovered_no, inclusions),
                    RestrictionKind::Exclusions => (&exclude_side, &mut uncovered_must, exclusions),
                };
                if uncovered.no_count() == 0 {
                    continue;
                }
                let Some(and) = induction.greedy_top_down(&mut rng, uncovered, restrictions) else {
                    continue;
                };

                debug!(%kind, conjunction = %and, "induced conjunction");
                *uncovered = uncovered.keep_not_satisfying(|r| and.test(r));
                conditions += and.len();
                induced += 1;
                added = true;
                rule_set = match kind {
                    RestrictionKind::Inclusions => rule_set.include(and),
                    RestrictionKind::Exclusions => rule_set.exclude(and),
                };
            }
            if !added {
                break;
            }
        }

        info!(induced, conditions, "greedy rule creation finished");
        Ok(GreedyResult {
            rule_set,
            induced,
            conditions,
            cancelled,
        })
    }
}

fn covered_by_any(ands: &[And], record: &Record) -> bool {
    ands.iter().any(|a| a.test(record))
}

/// Random subspace selection: a random subset of the non-rejected columns.
fn sample_feature_subset<R: Rng>(
    rng: &mut R,
    scheme: &RecordScheme,
    rejected: &BTreeSet<String>,
    min_count: usize,
) -> HashSet<String> {
    let mut names: Vec<&str> = scheme.column_names().filter(|n| !rejected.contains(*n)).collect();
    names.shuffle(rng);
    let count = min_count.max(scheme.column_count() / 2);
    names.into_iter().take(count).map(String::from).collect()
}

/// Induction of conjunctions for one side of a rule set.
#[derive(Clone, Copy)]
pub(crate) struct Induction<'a> {
    pub(crate) scheme: &'a RecordScheme,
    pub(crate) features: &'a HashSet<String>,
    pub(crate) rejected: &'a BTreeSet<String>,
    pub(crate) totals: RuleQuality,
    pub(crate) selection: QualitySelection,
    pub(crate) random_condition_probability: f64,
}

impl Induction<'_> {
    /// Grows one conjunction covering `no` records of `to_cover`.
    ///
    /// Conditions are added until none is found; the best prefix seen is
    /// returned. `None` when that prefix covers at least as many `must` as
    /// `no` records.
    pub(crate) fn greedy_top_down<R: Rng>(
        &self,
        rng: &mut R,
        to_cover: &RecordSubset<'_>,
        restrictions: &RuleRestrictions,
    ) -> Option<And> {
        let quality = self.selection.pick(rng);
        let mut to_cover = to_cover.clone();
        let mut prior = And::empty();
        let mut best_rule = And::empty();
        let mut best_quality = RuleQuality::new(to_cover.must_count(), to_cover.no_count());

        loop {
            let restriction = restrictions.to_creation_restrictions(&prior);
            let condition = if rng.random_bool(self.random_condition_probability) {
                self.create_random_condition(rng, &to_cover, &prior, &restriction)
            } else {
                self.find_best_condition(&to_cover, &prior, quality, &restriction)
            };
            let Some(ConditionResult { rule, quality: q }) = condition else {
                break;
            };
            prior = prior.and(rule.clone());
            if best_rule.is_empty() || quality.compare(q, best_quality, self.totals) == CmpOrdering::Greater {
                best_rule = prior.clone();
                best_quality = q;
            }
            to_cover = to_cover.keep_satisfying(|r| rule.test(r));
        }

        if best_rule.is_empty() || best_quality.is_pro_must() {
            None
        } else {
            Some(best_rule)
        }
    }

    /// The best admissible condition extending `prior`.
    ///
    /// String columns come first, then numeric columns, each in scheme
    /// order with values in sorted order. A later candidate only replaces
    /// the best one when strictly better.
    pub(crate) fn find_best_condition(
        &self,
        to_cover: &RecordSubset<'_>,
        prior: &And,
        quality: QualityFunction,
        restriction: &CreationRestriction,
    ) -> Option<ConditionResult> {
        let mut best = None;

        for string_index in 0..self.scheme.string_count() {
            let column = Column::new(self.scheme, self.scheme.abs_from_string_index(string_index));
            let name = column.name();
            if !self.features.contains(name) {
                continue;
            }
            let must_counts = count_strings(to_cover.must(), string_index);
            let no_counts = count_strings(to_cover.no(), string_index);
            if must_counts.is_empty() || no_counts.is_empty() || single_shared_value(&must_counts, &no_counts) {
                continue;
            }
            let must_present: usize = must_counts.values().sum();
            let no_present: usize = no_counts.values().sum();

            if prior.column_usage(name) == 0 && restriction.can_be_valid_kind(name, RuleKind::Equals) {
                for (&value, &no) in &no_counts {
                    let must = must_counts.get(value).copied().unwrap_or(0);
                    self.consider(
                        &mut best,
                        Rule::Equals(column.clone(), Arc::from(value)),
                        RuleQuality::new(must, no),
                        quality,
                        restriction,
                    );
                }
            }
            if restriction.can_be_valid_kind(name, RuleKind::NotEquals) {
                for (&value, &must) in &must_counts {
                    let no = no_counts.get(value).copied().unwrap_or(0);
                    self.consider(
                        &mut best,
                        Rule::NotEquals(column.clone(), Arc::from(value)),
                        RuleQuality::new(must_present - must, no_present - no),
                        quality,
                        restriction,
                    );
                }
            }
        }

        for numeric_index in 0..self.scheme.numeric_count() {
            let column = Column::new(self.scheme, numeric_index);
            let name = column.name();
            if !self.features.contains(name) || self.rejected.contains(name) || prior.column_usage(name) > 1 {
                continue;
            }
            let groups = count_numbers(to_cover, numeric_index);
            let total_must: usize = groups.iter().map(|g| g.1).sum();
            let total_no: usize = groups.iter().map(|g| g.2).sum();
            if total_must == 0 || total_no == 0 {
                continue;
            }
            let try_leq = restriction.can_be_valid_kind(name, RuleKind::Leq);
            let try_geq = restriction.can_be_valid_kind(name, RuleKind::Geq);

            let mut must_sum = 0;
            let mut no_sum = 0;
            for pair in groups.windows(2) {
                let (lower, must, no) = pair[0];
                must_sum += must;
                no_sum += no;
                let split = split_point_with_few_digits(lower, pair[1].0);
                if try_leq {
                    self.consider(
                        &mut best,
                        Rule::Leq(column.clone(), split),
                        RuleQuality::new(must_sum, no_sum),
                        quality,
                        restriction,
                    );
                }
                if try_geq {
                    self.consider(
                        &mut best,
                        Rule::Geq(column.clone(), split),
                        RuleQuality::new(total_must - must_sum, total_no - no_sum),
                        quality,
                        restriction,
                    );
                }
            }
        }

        best
    }

    fn consider(
        &self,
        best: &mut Option<ConditionResult>,
        rule: Rule,
        candidate: RuleQuality,
        quality: QualityFunction,
        restriction: &CreationRestriction,
    ) {
        let better = best
            .as_ref()
            .is_none_or(|b| quality.compare(candidate, b.quality, self.totals) == CmpOrdering::Greater);
        if better && restriction.can_be_valid(&rule) {
            *best = Some(ConditionResult {
                rule,
                quality: candidate,
            });
        }
    }

    /// A random admissible condition on a random unused feature.
    pub(crate) fn create_random_condition<R: Rng>(
        &self,
        rng: &mut R,
        to_cover: &RecordSubset<'_>,
        prior: &And,
        restriction: &CreationRestriction,
    ) -> Option<ConditionResult> {
        if to_cover.must().is_empty() || to_cover.no().is_empty() {
            return None;
        }
        let mut remaining: Vec<usize> = (0..self.scheme.column_count())
            .filter(|&abs| {
                let name = self.scheme.name(abs);
                self.features.contains(name) && !prior.uses_column(name)
            })
            .collect();
        remaining.shuffle(rng);

        for abs in remaining {
            for _ in 0..RANDOM_RULE_RETRIES {
                let Some(rule) = self.random_rule_for_column(rng, abs, to_cover) else {
                    continue;
                };
                if restriction.can_be_valid(&rule) {
                    let covered = to_cover.keep_satisfying(|r| rule.test(r));
                    let quality = RuleQuality::new(covered.must_count(), covered.no_count());
                    return Some(ConditionResult { rule, quality });
                }
            }
        }
        None
    }

    fn random_rule_for_column<R: Rng>(&self, rng: &mut R, abs: usize, to_cover: &RecordSubset<'_>) -> Option<Rule> {
        let column = Column::new(self.scheme, abs);
        let index = column.index();
        if self.scheme.is_numeric(abs) {
            let must = to_cover.must().choose(rng)?.numeric_value(index);
            let no = to_cover.no().choose(rng)?.numeric_value(index);
            if must.is_nan() || no.is_nan() {
                return None;
            }
            if no < must {
                Some(Rule::Leq(column, no))
            } else {
                Some(Rule::Geq(column, must))
            }
        } else if rng.random_bool(0.5) {
            let value = to_cover.no().choose(rng)?.string_value(index)?;
            Some(Rule::Equals(column, Arc::from(value)))
        } else {
            let value = to_cover.must().choose(rng)?.string_value(index)?;
            Some(Rule::NotEquals(column, Arc::from(value)))
        }
    }
}

fn count_strings<'r>(records: &[&'r Record], string_index: usize) -> BTreeMap<&'r str, usize> {
    let mut counts = BTreeMap::new();
    for r in records {
        if let Some(value) = r.string_value(string_index) {
            *counts.entry(value).or_insert(0) += 1;
        }
    }
    counts
}

/// Both sides know at most one value, and it is the same one.
fn single_shared_value(must: &BTreeMap<&str, usize>, no: &BTreeMap<&str, usize>) -> bool {
    if must.len() > 1 || no.len() > 1 {
        return false;
    }
    must.keys().chain(no.keys()).collect::<HashSet<_>>().len() <= 1
}

/// Distinct non-missing values in ascending order with their must and no
/// counts.
fn count_numbers(to_cover: &RecordSubset<'_>, numeric_index: usize) -> Vec<(f64, usize, usize)> {
    let mut values: Vec<(f64, bool)> = to_cover
        .must()
        .iter()
        .map(|r| (r.numeric_value(numeric_index), true))
        .chain(to_cover.no().iter().map(|r| (r.numeric_value(numeric_index), false)))
        .filter(|(v, _)| !v.is_nan())
        .collect();
    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<(f64, usize, usize)> = Vec::new();
    for (value, is_must) in values {
        match groups.last_mut() {
            Some(last) if last.0 == value => {}
            _ => groups.push((value, 0, 0)),
        }
        if let Some(last) = groups.last_mut() {
            if is_must {
                last.1 += 1;
            } else {
                last.2 += 1;
            }
        }
    }
    groups
}
