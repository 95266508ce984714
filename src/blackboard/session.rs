//! Text form of a session's user decisions and Pareto front.
//!
//! A session text is a sequence of blocks, each opened by a
//! `#block <name>` line:
//!
//! ```text
//! #block dataCleaning
//! removeTicket,T-1
//! #block rejectedColumns
//! author
//! #block rejectedInclusions
//! added <= * and *
//! #block paretoFront
//! normally use review
//! skip when one of
//!   (added<=12.5)
//! #values 0,-4,1,1,0,0,-1
//! ```
//!
//! Restoring replays the cleaning actions on fresh data, reinstalls the
//! restrictions and re-evaluates the stored front on the cleaned data.

use super::{Blackboard, BlackboardConfig, DataCleaningAction};
use crate::error::{MiningError, Result};
use crate::evaluation::{ObjectiveVector, ValuedResult, AXIS_COUNT};
use crate::record::RecordSet;
use crate::restriction::{RestrictionKind, RulePattern, RuleRestrictions};
use crate::rule::{parse_and, RuleSet};
use crate::trigger::RemarkTriggerMap;
use std::fmt::Write;
use tracing::info;

const BLOCK_PREFIX: &str = "#block ";
const VALUES_PREFIX: &str = "#values ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    DataCleaning,
    RejectedColumns,
    Accepted(RestrictionKind),
    Candidates(RestrictionKind),
    Rejected(RestrictionKind),
    ParetoFront,
}

const BLOCKS: [Block; 9] = [
    Block::DataCleaning,
    Block::RejectedColumns,
    Block::Accepted(RestrictionKind::Inclusions),
    Block::Candidates(RestrictionKind::Inclusions),
    Block::Rejected(RestrictionKind::Inclusions),
    Block::Accepted(RestrictionKind::Exclusions),
    Block::Candidates(RestrictionKind::Exclusions),
    Block::Rejected(RestrictionKind::Exclusions),
    Block::ParetoFront,
];

impl Block {
    fn name(self) -> &'static str {
        use RestrictionKind::{Exclusions, Inclusions};
        match self {
            Block::DataCleaning => "dataCleaning",
            Block::RejectedColumns => "rejectedColumns",
            Block::Accepted(Inclusions) => "acceptedInclusions",
            Block::Candidates(Inclusions) => "candidateInclusions",
            Block::Rejected(Inclusions) => "rejectedInclusions",
            Block::Accepted(Exclusions) => "acceptedExclusions",
            Block::Candidates(Exclusions) => "candidateExclusions",
            Block::Rejected(Exclusions) => "rejectedExclusions",
            Block::ParetoFront => "paretoFront",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        BLOCKS.into_iter().find(|b| b.name() == name)
    }
}

impl Blackboard {
    /// Writes the cleaning history, the restrictions and the Pareto front
    /// as text that [`restore_session`](Self::restore_session) reads back.
    pub fn session_text(&self) -> String {
        let mut out = String::new();
        for block in BLOCKS {
            // Writing to a String never fails.
            let _ = writeln!(out, "{BLOCK_PREFIX}{}", block.name());
            match block {
                Block::DataCleaning => {
                    for action in self.cleaning_action_history() {
                        let _ = writeln!(out, "{}", action.serialize());
                    }
                }
                Block::RejectedColumns => {
                    for column in self.rejected_columns() {
                        let _ = writeln!(out, "{column}");
                    }
                }
                Block::Accepted(kind) => {
                    for and in self.restrictions(kind).accepted() {
                        let _ = writeln!(out, "{and}");
                    }
                }
                Block::Candidates(kind) => {
                    for and in self.restrictions(kind).candidates() {
                        let _ = writeln!(out, "{and}");
                    }
                }
                Block::Rejected(kind) => {
                    for pattern in self.restrictions(kind).rejected() {
                        let _ = writeln!(out, "{pattern}");
                    }
                }
                Block::ParetoFront => {
                    for result in self.nondominated_results_snapshot().items_sorted() {
                        let values: Vec<String> = result.values.axes().iter().map(f64::to_string).collect();
                        let _ = write!(out, "{}", result.item);
                        let _ = writeln!(out, "{VALUES_PREFIX}{}", values.join(","));
                    }
                }
            }
        }
        out
    }

    /// Starts a session on `records` and brings it back to the state
    /// described by `text`.
    ///
    /// Cleaning actions run first, in their recorded order, so later blocks
    /// may refer to computed columns. The stored front is re-evaluated on
    /// the cleaned data rather than trusted.
    pub fn restore_session(
        records: RecordSet,
        trigger_map: Option<RemarkTriggerMap>,
        config: Option<BlackboardConfig>,
        seed: u64,
        text: &str,
    ) -> Result<Self> {
        let mut board = Self::new(records, trigger_map, config, seed)?;
        let mut rejected_columns = Vec::new();
        let mut inclusions = RuleRestrictions::new(RestrictionKind::Inclusions);
        let mut exclusions = RuleRestrictions::new(RestrictionKind::Exclusions);
        let mut front = Vec::new();
        let mut pending_rule_set = String::new();
        let mut block: Option<Block> = None;

        for line in text.lines() {
            if let Some(name) = line.strip_prefix(BLOCK_PREFIX) {
                if !pending_rule_set.trim().is_empty() {
                    return Err(MiningError::MalformedSession("rule set without values".into()));
                }
                block = Some(
                    Block::from_name(name.trim())
                        .ok_or_else(|| MiningError::MalformedSession(format!("unknown block '{}'", name.trim())))?,
                );
                continue;
            }
            let Some(current) = block else {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(MiningError::MalformedSession(format!("line outside of a block: {line}")));
            };
            if current != Block::ParetoFront && line.trim().is_empty() {
                continue;
            }
            match current {
                Block::DataCleaning => {
                    let action = DataCleaningAction::parse(line)?;
                    board.apply_cleaning(&action)?;
                }
                Block::RejectedColumns => rejected_columns.push(line.trim().to_string()),
                Block::Accepted(kind) => {
                    let and = parse_and(board.records().scheme(), line)?;
                    side(kind, &mut inclusions, &mut exclusions).accept([and]);
                }
                Block::Candidates(kind) => {
                    let and = parse_and(board.records().scheme(), line)?;
                    side(kind, &mut inclusions, &mut exclusions).keep_as_candidate([and]);
                }
                Block::Rejected(kind) => {
                    let pattern = RulePattern::parse(board.records().scheme(), line.trim())?;
                    side(kind, &mut inclusions, &mut exclusions).reject_pattern(pattern);
                }
                Block::ParetoFront => match line.strip_prefix(VALUES_PREFIX) {
                    Some(values) => {
                        let rule_set = RuleSet::parse(board.records().scheme(), &pending_rule_set)?;
                        front.push(ValuedResult::new(rule_set, parse_values(values)?));
                        pending_rule_set.clear();
                    }
                    None => {
                        pending_rule_set.push_str(line);
                        pending_rule_set.push('\n');
                    }
                },
            }
        }
        if !pending_rule_set.trim().is_empty() {
            return Err(MiningError::MalformedSession("rule set without values".into()));
        }

        info!(
            cleaning_actions = board.cleaning_action_history().len(),
            rejected_columns = rejected_columns.len(),
            front = front.len(),
            "restoring session"
        );
        board.restore(rejected_columns, inclusions, exclusions, front);
        Ok(board)
    }
}

fn side<'a>(
    kind: RestrictionKind,
    inclusions: &'a mut RuleRestrictions,
    exclusions: &'a mut RuleRestrictions,
) -> &'a mut RuleRestrictions {
    match kind {
        RestrictionKind::Inclusions => inclusions,
        RestrictionKind::Exclusions => exclusions,
    }
}

fn parse_values(text: &str) -> Result<ObjectiveVector> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|_| MiningError::InvalidNumber(v.to_string())))
        .collect::<Result<Vec<f64>>>()?;
    let axes: [f64; AXIS_COUNT] = values
        .try_into()
        .map_err(|v: Vec<f64>| MiningError::MalformedSession(format!("expected {AXIS_COUNT} values, got {}", v.len())))?;
    Ok(ObjectiveVector::from_axes(axes))
}
