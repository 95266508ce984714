//! The shared session state.

use super::purge::rules_to_keep;
use super::{BlackboardConfig, DataCleaningAction};
use crate::archive::{NavigationLimits, NondominatedResults};
use crate::error::{MiningError, Result};
use crate::evaluation::{TargetFunction, ValuedResult};
use crate::expr::Expression;
use crate::record::{ChangePartId, RecordSet};
use crate::restriction::{RestrictionKind, RuleRestrictions};
use crate::rule::{parse_and, And, Rule, RuleSet};
use crate::trigger::{RemarkFeatures, RemarkTriggerMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Records, restrictions, evaluation cache and Pareto archive of one mining
/// session.
///
/// Every search component reads the data through the blackboard and
/// reports each evaluated rule set back with
/// [`simplify_evaluate_and_add`](Self::simplify_evaluate_and_add).
#[derive(Debug)]
pub struct Blackboard {
    records: RecordSet,
    trigger_map: RemarkTriggerMap,
    saved_line_column: Option<usize>,
    target_function: TargetFunction,
    navigation_limits: NavigationLimits,
    remark_features: RemarkFeatures,
    auto_purge_limit: usize,
    purge_count_to_keep: usize,
    inclusion_restrictions: RuleRestrictions,
    exclusion_restrictions: RuleRestrictions,
    rejected_columns: BTreeSet<String>,
    cleaning_history: Vec<DataCleaningAction>,
    cache_index: HashMap<RuleSet, usize>,
    cache: Vec<ValuedResult<RuleSet>>,
    archive: NondominatedResults<RuleSet>,
    seed_counter: AtomicU64,
}

impl Blackboard {
    /// Starts a session.
    ///
    /// Without a trigger map, every MUST_BE record is assumed to have
    /// triggered one remark of its own. The records must be grouped by
    /// ticket.
    pub fn new(
        records: RecordSet,
        trigger_map: Option<RemarkTriggerMap>,
        config: Option<BlackboardConfig>,
        seed: u64,
    ) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate().map_err(MiningError::InvalidConfig)?;
        records.check_grouped_by_ticket()?;
        let saved_line_column = match &config.saved_line_column {
            Some(name) => {
                let abs = records.scheme().abs_index(name)?;
                if !records.scheme().is_numeric(abs) {
                    return Err(MiningError::ColumnKind {
                        name: name.clone(),
                        expected: "numeric",
                    });
                }
                Some(records.scheme().to_numeric_index(abs))
            }
            None => None,
        };
        let trigger_map = trigger_map.unwrap_or_else(|| RemarkTriggerMap::from_must_records(&records));
        info!(
            seed,
            records = records.len(),
            remarks = trigger_map.remark_count(),
            "blackboard created"
        );
        Ok(Self {
            records,
            trigger_map,
            saved_line_column,
            target_function: config.target_function,
            navigation_limits: NavigationLimits::new(),
            remark_features: config.remark_features,
            auto_purge_limit: config.auto_purge_limit,
            purge_count_to_keep: config.purge_count_to_keep,
            inclusion_restrictions: RuleRestrictions::new(RestrictionKind::Inclusions),
            exclusion_restrictions: RuleRestrictions::new(RestrictionKind::Exclusions),
            rejected_columns: BTreeSet::new(),
            cleaning_history: Vec::new(),
            cache_index: HashMap::new(),
            cache: Vec::new(),
            archive: NondominatedResults::new(),
            seed_counter: AtomicU64::new(seed),
        })
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn trigger_map(&self) -> &RemarkTriggerMap {
        &self.trigger_map
    }

    // ---- Validation & evaluation ----

    /// Adapts a rule set to the restrictions.
    ///
    /// Conjunctions using a rejected column are dropped, accepted
    /// conjunctions are added, and conjunctions matching a rejection pattern
    /// are dropped unless they are accepted or candidates.
    pub fn make_valid(&self, rule_set: &RuleSet) -> RuleSet {
        let mut valid = rule_set.retain_conjunctions(|and| !self.uses_rejected_column(and));
        for and in self.inclusion_restrictions.accepted() {
            valid = valid.include(and.clone());
        }
        for and in self.exclusion_restrictions.accepted() {
            valid = valid.exclude(and.clone());
        }
        let restrictions = &self.inclusion_restrictions;
        for and in valid.inclusions().to_vec() {
            if is_rejected(restrictions, &and) {
                valid = valid.remove_inclusion(&and);
            }
        }
        let restrictions = &self.exclusion_restrictions;
        for and in valid.exclusions().to_vec() {
            if is_rejected(restrictions, &and) {
                valid = valid.remove_exclusion(&and);
            }
        }
        valid
    }

    fn uses_rejected_column(&self, and: &And) -> bool {
        and.children()
            .iter()
            .any(|r| r.column().is_some_and(|c| self.rejected_columns.contains(c.name())))
    }

    fn is_invalid(&self, rule_set: &RuleSet) -> bool {
        self.make_valid(rule_set) != *rule_set
    }

    /// Evaluates on the current data, memoized by rule set.
    ///
    /// Once the cache outgrows the configured limit it is purged, so a
    /// purged rule set is simply evaluated again when it comes back.
    pub fn evaluate(&mut self, rule_set: RuleSet) -> ValuedResult<RuleSet> {
        if let Some(&i) = self.cache_index.get(&rule_set) {
            return self.cache[i].clone();
        }
        let result = self.evaluate_uncached(rule_set);
        self.remember(result.clone());
        if self.cache.len() > self.auto_purge_limit {
            info!(
                cached = self.cache.len(),
                limit = self.auto_purge_limit,
                "evaluation cache full"
            );
            self.purge_rules(self.purge_count_to_keep);
        }
        result
    }

    fn evaluate_uncached(&self, rule_set: RuleSet) -> ValuedResult<RuleSet> {
        ValuedResult::create(rule_set, &self.records, &self.trigger_map, self.saved_line_column)
    }

    fn remember(&mut self, result: ValuedResult<RuleSet>) {
        self.cache_index.insert(result.item.clone(), self.cache.len());
        self.cache.push(result);
    }

    pub fn make_valid_and_evaluate(&mut self, rule_set: &RuleSet) -> ValuedResult<RuleSet> {
        let valid = self.make_valid(rule_set);
        self.evaluate(valid)
    }

    /// Simplifies on the current data, makes valid, evaluates and offers the
    /// result to the archive.
    pub fn simplify_evaluate_and_add(&mut self, rule_set: &RuleSet) -> ValuedResult<RuleSet> {
        let simplified = rule_set.simplify(&self.records);
        let result = self.make_valid_and_evaluate(&simplified);
        self.archive.add(result.clone());
        result
    }

    /// Re-adds every member of `results` on the current data.
    pub fn add_all(&mut self, results: &NondominatedResults<RuleSet>) {
        for result in results.items() {
            self.simplify_evaluate_and_add(&result.item);
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Shrinks the cache and the archive to about `count_to_keep` results
    /// spread over the Pareto front.
    ///
    /// The best result within the navigation limits survives for the
    /// current and every standard target, and so does the neutral rule set.
    pub fn purge_rules(&mut self, count_to_keep: usize) {
        let mut rng = self.create_rng();
        let mut targets = TargetFunction::standard(self.records.tickets().len());
        if !targets.contains(&self.target_function) {
            targets.insert(0, self.target_function.clone());
        }
        let kept = rules_to_keep(
            &self.archive,
            &self.navigation_limits,
            count_to_keep,
            &targets,
            &self.records,
            &mut rng,
        );
        let before = self.cache.len();
        self.cache.clear();
        self.cache_index.clear();
        self.archive.clear();
        for result in kept {
            self.remember(result.clone());
            self.archive.add(result);
        }
        let neutral = self.make_valid(&RuleSet::skip_none());
        if !self.cache_index.contains_key(&neutral) {
            let result = self.evaluate_uncached(neutral);
            self.remember(result.clone());
            self.archive.add(result);
        }
        info!(before, remaining = self.cache.len(), "purged rule sets");
    }

    // ---- Archive access ----

    pub fn nondominated_results_snapshot(&self) -> NondominatedResults<RuleSet> {
        self.archive.clone()
    }

    pub fn random_result<R: Rng>(&self, rng: &mut R) -> Option<ValuedResult<RuleSet>> {
        self.archive.random_item(rng)
    }

    /// Best member for the current target among those within the
    /// navigation limits.
    pub fn best_result_in_limits<R: Rng>(&self, rng: &mut R) -> Option<ValuedResult<RuleSet>> {
        self.navigation_limits
            .filter(&self.archive)
            .best_item(rng, &self.target_function)
    }

    pub fn current_target_function(&self) -> &TargetFunction {
        &self.target_function
    }

    pub fn set_current_target_function(&mut self, target: TargetFunction) {
        info!(target = %target, "changing target function");
        self.target_function = target;
    }

    pub fn navigation_limits(&self) -> &NavigationLimits {
        &self.navigation_limits
    }

    pub fn navigation_limits_mut(&mut self) -> &mut NavigationLimits {
        &mut self.navigation_limits
    }

    // ---- Randomness ----

    /// Hands out consecutive seeds starting at the constructor seed.
    pub fn next_random_seed(&self) -> u64 {
        let seed = self.seed_counter.fetch_add(1, Ordering::Relaxed);
        debug!(seed, "handing out random seed");
        seed
    }

    pub fn create_rng(&self) -> StdRng {
        let seed = self.seed_counter.fetch_add(1, Ordering::Relaxed);
        info!(seed, "creating new random generator");
        StdRng::seed_from_u64(seed)
    }

    // ---- Restrictions ----

    pub fn inclusion_restrictions(&self) -> &RuleRestrictions {
        &self.inclusion_restrictions
    }

    pub fn exclusion_restrictions(&self) -> &RuleRestrictions {
        &self.exclusion_restrictions
    }

    pub fn restrictions(&self, kind: RestrictionKind) -> &RuleRestrictions {
        match kind {
            RestrictionKind::Inclusions => &self.inclusion_restrictions,
            RestrictionKind::Exclusions => &self.exclusion_restrictions,
        }
    }

    /// Applies an edit to one side's restrictions and revalidates the
    /// archive.
    ///
    /// ```
    /// use skip_rules::blackboard::Blackboard;
    /// use skip_rules::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
    /// use skip_rules::restriction::{RestrictionKind, RulePattern};
    ///
    /// let scheme = RecordScheme::new(["size"], Vec::<&str>::new()).unwrap();
    /// let record = Record::new(ChangePartId::new("T1", "c", "f"), vec![1.0], vec![], TriggerClassification::NoTrigger);
    /// let data = RecordSet::new(scheme, vec![record]);
    /// let mut board = Blackboard::new(data, None, None, 1).unwrap();
    /// let pattern = RulePattern::parse(board.records().scheme(), "size >= * and *").unwrap();
    /// board.edit_restrictions(RestrictionKind::Inclusions, |r| r.reject_pattern(pattern));
    /// assert_eq!(board.inclusion_restrictions().rejected().len(), 1);
    /// ```
    pub fn edit_restrictions<T>(&mut self, kind: RestrictionKind, edit: impl FnOnce(&mut RuleRestrictions) -> T) -> T {
        let restrictions = match kind {
            RestrictionKind::Inclusions => &mut self.inclusion_restrictions,
            RestrictionKind::Exclusions => &mut self.exclusion_restrictions,
        };
        let outcome = edit(restrictions);
        self.revalidate();
        outcome
    }

    pub fn rejected_columns(&self) -> &BTreeSet<String> {
        &self.rejected_columns
    }

    pub fn add_rejected_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        info!(?columns, "adding rejected columns");
        self.rejected_columns.extend(columns);
        self.revalidate();
    }

    pub fn remove_column_rejection(&mut self, column: &str) {
        info!(column, "undoing rejection of column");
        self.rejected_columns.remove(column);
        self.revalidate();
    }

    /// Drops archive members that no longer satisfy the restrictions, then
    /// refills it from every rule set evaluated so far.
    fn revalidate(&mut self) {
        let invalid: Vec<RuleSet> = self
            .archive
            .items()
            .into_iter()
            .map(|r| r.item)
            .filter(|rs| self.is_invalid(rs))
            .collect();
        self.archive.retain(|rs| !invalid.contains(rs));
        self.simplify_evaluate_and_add(&RuleSet::skip_none());
        let entries = self.cache.clone();
        self.refill(entries);
    }

    /// Re-adds old results, those within the navigation limits first, each
    /// group in order of the current target.
    fn refill(&mut self, mut entries: Vec<ValuedResult<RuleSet>>) {
        info!(entries = entries.len(), "start refilling pareto set");
        let target = self.target_function.clone();
        entries.sort_by(|a, b| target.apply(&a.values).total_cmp(&target.apply(&b.values)));
        for entry in &entries {
            if self.navigation_limits.contains(entry) {
                self.simplify_evaluate_and_add(&entry.item);
            }
        }
        for entry in &entries {
            self.simplify_evaluate_and_add(&entry.item);
        }
        info!(archived = self.archive.len(), "refilling pareto set finished");
    }

    // ---- Data cleaning ----

    /// Removes a ticket's records and remarks and re-evaluates everything.
    pub fn remove_ticket(&mut self, ticket: &str) -> String {
        let action = DataCleaningAction::RemoveTicket(ticket.to_string());
        info!(action = %action, "data cleaning");
        let before = self.records.len();
        self.records = self.records.without_ticket(ticket);
        self.trigger_map = self.trigger_map.without_ticket(ticket);
        self.reevaluate_after_data_change();
        let message = format!(
            "Removed {} potential trigger records for ticket {ticket}",
            before - self.records.len()
        );
        self.finish_cleaning(action, message)
    }

    /// Removes one record and re-evaluates everything. The remarks stay, so
    /// removing a trigger may turn its remark into a missed one.
    pub fn remove_record(&mut self, id: &ChangePartId) -> String {
        let action = DataCleaningAction::RemoveRecord(id.clone());
        info!(action = %action, "data cleaning");
        let before = self.records.len();
        self.records = self.records.copy_without(|r| r.id == *id);
        self.reevaluate_after_data_change();
        let message = format!("Removed {} record with ID {id}", before - self.records.len());
        self.finish_cleaning(action, message)
    }

    /// Removes the remarks whose feature values satisfy `condition`, such
    /// as `(category == 'style' and author != 'bot')`, relabels the records
    /// and re-evaluates everything.
    ///
    /// Only `==` and `!=` over the remark feature fields are supported. A
    /// missing value satisfies every `!=`.
    pub fn remove_remarks_with_condition(&mut self, condition: &str) -> Result<String> {
        let scheme = self.remark_features.scheme()?;
        let text = condition.trim();
        let condition = if text.starts_with('(') {
            parse_and(&scheme, text)?
        } else {
            parse_and(&scheme, &format!("({text})"))?
        };
        let action = DataCleaningAction::RemoveRemarksWithCondition(condition.to_string());
        info!(action = %action, "data cleaning");
        let features = &self.remark_features;
        let (trigger_map, removed) = self
            .trigger_map
            .without_remarks(|ticket, remark| remark_matches(features, &condition, ticket, remark));
        self.trigger_map = trigger_map;
        self.records = self.records.reclassify(&self.trigger_map);
        self.reevaluate_after_data_change();
        let message = format!("Removed {removed} remarks with {condition}");
        Ok(self.finish_cleaning(action, message))
    }

    /// Appends a numeric column computed from `expression`. Existing
    /// results stay valid because no existing value changes.
    pub fn add_computed_column(&mut self, name: &str, expression: &str) -> Result<String> {
        let action = DataCleaningAction::AddComputedColumn {
            name: name.to_string(),
            expression: expression.to_string(),
        };
        info!(action = %action, "data cleaning");
        let parsed = Expression::parse(self.records.scheme(), expression)?;
        self.records = self.records.with_computed_column(name, &parsed)?;
        let message = format!("Added column {name}");
        Ok(self.finish_cleaning(action, message))
    }

    fn finish_cleaning(&mut self, action: DataCleaningAction, message: String) -> String {
        info!(%message, "data cleaning finished");
        self.cleaning_history.push(action);
        message
    }

    pub fn cleaning_action_history(&self) -> &[DataCleaningAction] {
        &self.cleaning_history
    }

    /// Runs a recorded cleaning action again.
    pub fn apply_cleaning(&mut self, action: &DataCleaningAction) -> Result<String> {
        match action {
            DataCleaningAction::RemoveTicket(ticket) => Ok(self.remove_ticket(ticket)),
            DataCleaningAction::RemoveRecord(id) => Ok(self.remove_record(id)),
            DataCleaningAction::RemoveRemarksWithCondition(condition) => {
                self.remove_remarks_with_condition(condition)
            }
            DataCleaningAction::AddComputedColumn { name, expression } => {
                self.add_computed_column(name, expression)
            }
        }
    }

    /// Installs restored restrictions and results, then re-evaluates
    /// everything on the current data.
    pub(super) fn restore(
        &mut self,
        rejected_columns: Vec<String>,
        inclusions: RuleRestrictions,
        exclusions: RuleRestrictions,
        front: Vec<ValuedResult<RuleSet>>,
    ) {
        self.rejected_columns.extend(rejected_columns);
        self.inclusion_restrictions = inclusions;
        self.exclusion_restrictions = exclusions;
        for result in front {
            if !self.cache_index.contains_key(&result.item) {
                self.remember(result.clone());
            }
            self.archive.add(result);
        }
        self.reevaluate_after_data_change();
    }

    fn reevaluate_after_data_change(&mut self) {
        let old_entries = std::mem::take(&mut self.cache);
        self.cache_index.clear();
        self.archive.clear();
        self.simplify_evaluate_and_add(&RuleSet::skip_none());
        self.simplify_evaluate_and_add(&RuleSet::skip_all());
        self.refill(old_entries);
    }
}

fn remark_matches(features: &RemarkFeatures, condition: &And, ticket: &str, remark: &str) -> bool {
    condition.children().iter().all(|rule| match rule {
        Rule::True => true,
        Rule::Equals(c, v) => features.value(ticket, remark, c.name()) == Some(&**v),
        Rule::NotEquals(c, v) => features.value(ticket, remark, c.name()) != Some(&**v),
        Rule::False | Rule::Leq(..) | Rule::Geq(..) => false,
    })
}

fn is_rejected(restrictions: &RuleRestrictions, and: &And) -> bool {
    restrictions.matches_rejection(and) && !restrictions.is_accepted(and) && !restrictions.is_candidate(and)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChangePartId, Record, RecordScheme, TriggerClassification};
    use crate::restriction::RulePattern;
    use crate::rule::{parse_and, Rule};
    use crate::testing::{mixed_columns, one_numeric_column};

    fn leq(data: &RecordSet, value: f64) -> And {
        And::new([Rule::leq(data.scheme(), "numCol", value).unwrap()])
    }

    fn board(no: &[f64], must: &[f64]) -> Blackboard {
        Blackboard::new(one_numeric_column(no, must), None, None, 42).unwrap()
    }

    // ---- Construction ----

    #[test]
    fn test_unsorted_records_are_rejected() {
        let scheme = RecordScheme::new(["n"], Vec::<&str>::new()).unwrap();
        let records = ["T1", "T2", "T1"]
            .iter()
            .map(|t| Record::new(ChangePartId::new(*t, "c", "f"), vec![1.0], vec![], TriggerClassification::NoTrigger))
            .collect();
        let result = Blackboard::new(RecordSet::new(scheme, records), None, None, 0);
        assert!(matches!(result, Err(MiningError::UnsortedRecords(t)) if t == "T1"));
    }

    #[test]
    fn test_saved_line_column_must_be_numeric() {
        let data = mixed_columns(4, 2, 2);
        let config = BlackboardConfig::default().with_saved_line_column("strCol0");
        assert!(matches!(
            Blackboard::new(data.clone(), None, Some(config), 0),
            Err(MiningError::ColumnKind { .. })
        ));
        let config = BlackboardConfig::default().with_saved_line_column("numCol0");
        assert!(Blackboard::new(data, None, Some(config), 0).is_ok());
    }

    // ---- Evaluation ----

    #[test]
    fn test_evaluation_is_memoized() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let rs = RuleSet::skip_none().include(leq(b.records(), 3.5));
        let first = b.evaluate(rs.clone());
        let second = b.evaluate(rs);
        assert_eq!(first, second);
        assert_eq!(b.cache_size(), 1);
        assert_eq!(first.values.saved_hunk_count, -3.0);
        assert_eq!(first.values.missed_remark_count, 0.0);
    }

    #[test]
    fn test_simplify_evaluate_and_add_archives() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        let redundant = RuleSet::skip_none().include(leq(&data, 3.5)).include(leq(&data, 2.5));
        let result = b.simplify_evaluate_and_add(&redundant);
        assert_eq!(result.item, RuleSet::skip_none().include(leq(&data, 3.5)));
        let snapshot = b.nondominated_results_snapshot();
        assert!(snapshot.contains(&result));
        assert_eq!(snapshot.len(), 1);
    }

    // ---- Restrictions ----

    #[test]
    fn test_make_valid() {
        let mut b = board(&[1.0, 2.0], &[3.0]);
        let data = b.records().clone();
        let rs = RuleSet::skip_none().include(leq(&data, 1.5));
        b.edit_restrictions(RestrictionKind::Exclusions, |r| r.accept([leq(&data, 0.5)]));
        let valid = b.make_valid(&rs);
        assert_eq!(valid.exclusions(), &[leq(&data, 0.5)]);

        let pattern = RulePattern::parse(data.scheme(), "numCol <= *").unwrap();
        b.edit_restrictions(RestrictionKind::Inclusions, |r| r.reject_pattern(pattern));
        assert!(b.make_valid(&rs).inclusions().is_empty());
        b.edit_restrictions(RestrictionKind::Inclusions, |r| r.keep_as_candidate([leq(&data, 1.5)]));
        assert_eq!(b.make_valid(&rs).inclusions().len(), 1);

        b.add_rejected_columns(["numCol"]);
        let stripped = b.make_valid(&rs);
        assert!(stripped.inclusions().is_empty());
        assert_eq!(stripped.exclusions().len(), 1);
    }

    #[test]
    fn test_revalidation_drops_rejected_members() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        let good = RuleSet::skip_none().include(leq(&data, 3.5));
        b.simplify_evaluate_and_add(&good);
        b.simplify_evaluate_and_add(&RuleSet::skip_none().include(leq(&data, 2.5)));
        b.edit_restrictions(RestrictionKind::Inclusions, |r| r.reject([leq(&data, 3.5)]));
        let items: Vec<RuleSet> = b.nondominated_results_snapshot().items().into_iter().map(|r| r.item).collect();
        assert!(!items.contains(&good));
        assert!(items.contains(&RuleSet::skip_none().include(leq(&data, 2.5))));

        b.remove_column_rejection("numCol");
        b.edit_restrictions(RestrictionKind::Inclusions, |r| r.remove_pattern(&RulePattern::create_exact(&leq(&data, 3.5))));
        let items: Vec<RuleSet> = b.nondominated_results_snapshot().items().into_iter().map(|r| r.item).collect();
        assert!(items.contains(&good));
    }

    #[test]
    fn test_rejected_column_revalidation_keeps_skip_none() {
        let mut b = board(&[1.0], &[2.0]);
        let data = b.records().clone();
        b.simplify_evaluate_and_add(&RuleSet::skip_none().include(leq(&data, 1.5)));
        b.add_rejected_columns(["numCol"]);
        let items = b.nondominated_results_snapshot().items();
        assert!(items.iter().all(|r| r.item.inclusions().iter().all(|a| !a.uses_column("numCol"))));
        assert!(items.iter().any(|r| r.item == RuleSet::skip_none()));
        assert!(b.rejected_columns().contains("numCol"));
    }

    // ---- Archive access ----

    #[test]
    fn test_best_result_respects_limits() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        b.simplify_evaluate_and_add(&RuleSet::skip_none().include(leq(&data, 3.5)));
        b.simplify_evaluate_and_add(&RuleSet::skip_all());
        let mut rng = b.create_rng();
        b.set_current_target_function(TargetFunction::saved_hunks());
        assert_eq!(b.best_result_in_limits(&mut rng).unwrap().item, RuleSet::skip_all());
        b.navigation_limits_mut().set_limit(TargetFunction::missed_remarks(), 0.0);
        let best = b.best_result_in_limits(&mut rng).unwrap();
        assert_eq!(best.item, RuleSet::skip_none().include(leq(&data, 3.5)));
        assert!(b.random_result(&mut rng).is_some());
    }

    // ---- Cache purge ----

    #[test]
    fn test_cache_is_purged_past_limit() {
        let config = BlackboardConfig::default()
            .with_auto_purge_limit(8)
            .with_purge_count_to_keep(2)
            .with_target_function(TargetFunction::saved_hunks());
        let mut b = Blackboard::new(one_numeric_column(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), None, Some(config), 42).unwrap();
        let data = b.records().clone();
        let lossless = RuleSet::skip_none().include(leq(&data, 3.5));
        let lossy = RuleSet::skip_none().include(leq(&data, 4.5));
        for rs in [RuleSet::skip_none(), lossless.clone(), lossy.clone(), RuleSet::skip_none().include(leq(&data, 5.5)), RuleSet::skip_all()] {
            b.simplify_evaluate_and_add(&rs);
        }
        let lossy_values = b.evaluate(lossy.clone()).values;
        b.navigation_limits_mut().set_limit(TargetFunction::missed_remarks(), 0.0);
        assert_eq!(b.cache_size(), 5);

        for v in [0.25, 1.25, 2.25, 3.25] {
            b.evaluate(RuleSet::skip_none().include(leq(&data, v)));
        }
        assert_eq!(b.cache_size(), 2);
        let items: Vec<RuleSet> = b.nondominated_results_snapshot().items().into_iter().map(|r| r.item).collect();
        assert!(items.contains(&RuleSet::skip_none()));
        assert!(items.contains(&lossless));
        let mut rng = b.create_rng();
        assert_eq!(b.best_result_in_limits(&mut rng).unwrap().item, lossless);

        // purged rule sets are evaluated again on demand
        assert_eq!(b.evaluate(lossy).values, lossy_values);
        assert_eq!(b.cache_size(), 3);
    }

    #[test]
    fn test_explicit_purge_keeps_neutral_rule_set() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        for v in [1.5, 2.5, 3.5, 4.5, 5.5] {
            b.simplify_evaluate_and_add(&RuleSet::skip_none().include(leq(&data, v)));
        }
        b.simplify_evaluate_and_add(&RuleSet::skip_all());
        b.purge_rules(1);
        let items = b.nondominated_results_snapshot().items();
        assert!(items.iter().any(|r| r.item == RuleSet::skip_none()));
        assert!(items.iter().any(|r| r.item == RuleSet::skip_all()));
        assert_eq!(b.cache_size(), items.len());
    }

    #[test]
    fn test_seeds_are_consecutive() {
        let b = board(&[1.0], &[2.0]);
        assert_eq!(b.next_random_seed(), 42);
        assert_eq!(b.next_random_seed(), 43);
        let _ = b.create_rng();
        assert_eq!(b.next_random_seed(), 45);
    }

    // ---- Data cleaning ----

    #[test]
    fn test_remove_ticket_reevaluates() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        b.simplify_evaluate_and_add(&RuleSet::skip_none().include(leq(&data, 4.5)));
        let message = b.remove_ticket("T3");
        assert_eq!(message, "Removed 1 potential trigger records for ticket T3");
        assert_eq!(b.records().len(), 5);
        assert_eq!(b.trigger_map().remark_count(), 2);
        let items = b.nondominated_results_snapshot().items();
        let reevaluated = items
            .iter()
            .find(|r| r.item == RuleSet::skip_none().include(leq(&data, 4.5)))
            .unwrap();
        assert_eq!(reevaluated.values.missed_remark_count, 0.0);
        assert_eq!(reevaluated.values.saved_hunk_count, -3.0);
        assert_eq!(b.cleaning_action_history(), &[DataCleaningAction::RemoveTicket("T3".into())]);
    }

    #[test]
    fn test_remove_record_keeps_remarks() {
        let mut b = board(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let data = b.records().clone();
        let rs = RuleSet::skip_none().include(leq(&data, 4.5));
        b.simplify_evaluate_and_add(&rs);
        let id = ChangePartId::new("T3", "c", "F3");
        let message = b.remove_record(&id);
        assert_eq!(message, "Removed 1 record with ID T3,c,F3");
        assert_eq!(b.records().len(), 5);
        assert!(b.records().iter().all(|r| r.id != id));
        assert_eq!(b.trigger_map().remark_count(), 3);
        let items = b.nondominated_results_snapshot().items();
        let reevaluated = items.iter().find(|r| r.item == rs).unwrap();
        assert_eq!(reevaluated.values.saved_hunk_count, -3.0);

        let message = b.remove_record(&ChangePartId::new("T9", "c", "F9"));
        assert_eq!(message, "Removed 0 record with ID T9,c,F9");
        assert_eq!(
            b.cleaning_action_history(),
            &[
                DataCleaningAction::RemoveRecord(id),
                DataCleaningAction::RemoveRecord(ChangePartId::new("T9", "c", "F9")),
            ]
        );
    }

    #[test]
    fn test_remove_remarks_with_condition() {
        let features = RemarkFeatures::parse("ticket;remark;category\nT3;c,F3;style\nT4;c,F4;bug\n").unwrap();
        let config = BlackboardConfig::default().with_remark_features(features);
        let mut b = Blackboard::new(one_numeric_column(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), None, Some(config), 42).unwrap();
        let data = b.records().clone();
        let rs = RuleSet::skip_none().include(leq(&data, 4.5));
        b.simplify_evaluate_and_add(&rs);

        let message = b.remove_remarks_with_condition("category == 'style'").unwrap();
        assert_eq!(message, "Removed 1 remarks with (category == 'style')");
        assert_eq!(b.trigger_map().remark_count(), 2);
        assert_eq!(b.records().records()[3].classification, TriggerClassification::NoTrigger);
        assert_eq!(b.records().records()[4].classification, TriggerClassification::MustBe);
        let items = b.nondominated_results_snapshot().items();
        let reevaluated = items.iter().find(|r| r.item == rs).unwrap();
        assert_eq!(reevaluated.values.missed_remark_count, 0.0);
        assert_eq!(reevaluated.values.saved_hunk_count, -4.0);

        // T5 has no category, so it passes the inequality
        let message = b.remove_remarks_with_condition("(category != 'bug')").unwrap();
        assert_eq!(message, "Removed 1 remarks with (category != 'bug')");
        assert_eq!(b.trigger_map().remark_count(), 1);

        assert!(matches!(b.remove_remarks_with_condition("(category<=1.0)"), Err(MiningError::ColumnKind { .. })));
        assert!(matches!(b.remove_remarks_with_condition("(author == 'x')"), Err(MiningError::UnknownColumn { .. })));
        assert_eq!(
            b.cleaning_action_history(),
            &[
                DataCleaningAction::RemoveRemarksWithCondition("(category == 'style')".into()),
                DataCleaningAction::RemoveRemarksWithCondition("(category != 'bug')".into()),
            ]
        );
    }

    #[test]
    fn test_apply_cleaning_replays_actions() {
        let mut b = board(&[1.0, 2.0], &[3.0]);
        b.apply_cleaning(&DataCleaningAction::RemoveTicket("T0".into())).unwrap();
        b.apply_cleaning(&DataCleaningAction::AddComputedColumn {
            name: "half".into(),
            expression: "numCol / 2".into(),
        })
        .unwrap();
        assert_eq!(b.records().len(), 2);
        assert!(b.records().scheme().contains("half"));
        assert_eq!(b.cleaning_action_history().len(), 2);
    }

    #[test]
    fn test_add_computed_column() {
        let mut b = board(&[1.0, 2.0], &[3.0]);
        let message = b.add_computed_column("double", "numCol * 2").unwrap();
        assert_eq!(message, "Added column double");
        assert_eq!(b.records().scheme().column_count(), 2);
        assert_eq!(b.records().records()[2].numeric_value(1), 6.0);
        assert!(matches!(b.add_computed_column("double", "numCol"), Err(MiningError::DuplicateColumn(_))));
        assert!(matches!(b.add_computed_column("x", "numCol +"), Err(MiningError::Syntax { .. })));
        assert_eq!(b.cleaning_action_history().len(), 1);

        let rs = RuleSet::skip_none().include(parse_and(b.records().scheme(), "(double<=4.0)").unwrap());
        let values = b.evaluate(rs).values;
        assert_eq!(values.missed_remark_count, 0.0);
        assert_eq!(values.saved_hunk_count, -2.0);
        assert_eq!(values.feature_count, 1.0);
    }
}
