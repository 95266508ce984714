//! Counting of remarks missed by a skip decision.

use super::{RemarkId, RemarkTriggerMap};
use crate::record::Record;
use crate::util::trimmed_mean;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
struct TicketState {
    open_remarks: BTreeSet<RemarkId>,
    remark_total: usize,
    saved_hunks: usize,
}

/// Per-ticket aggregates of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissedTriggerSummary {
    /// Remarks none of whose triggers stays under review.
    pub missed_remarks: usize,
    /// Sum over tickets of `missed * ln(total + 1) / total`.
    pub missed_remark_log: f64,
    /// Negated 10%-trimmed mean of skipped records per ticket.
    pub saved_hunk_trimmed_mean: f64,
}

/// Tracks, per ticket, which remarks are still reachable through reviewed
/// change parts.
///
/// Every record of the evaluated data is fed exactly once, either as
/// active (reviewed) or inactive (skipped).
#[derive(Debug)]
pub struct MissedTriggerCounter<'a> {
    map: &'a RemarkTriggerMap,
    tickets: HashMap<String, TicketState>,
    order: Vec<String>,
}

impl<'a> MissedTriggerCounter<'a> {
    pub fn new(map: &'a RemarkTriggerMap) -> Self {
        Self {
            map,
            tickets: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn state(&mut self, record: &Record) -> &mut TicketState {
        let map = self.map;
        let order = &mut self.order;
        self.tickets
            .entry(record.id.ticket.clone())
            .or_insert_with(|| {
                let open: BTreeSet<RemarkId> = map.all_remarks_for(&record.id.ticket).into_iter().collect();
                order.push(record.id.ticket.clone());
                TicketState {
                    remark_total: open.len(),
                    open_remarks: open,
                    saved_hunks: 0,
                }
            })
    }

    /// The record stays under review, so its remarks are found.
    pub fn handle_active(&mut self, record: &Record) {
        let covered = self.map.covered_remarks(&record.id);
        let state = self.state(record);
        for remark in covered {
            state.open_remarks.remove(&remark);
        }
    }

    /// The record is skipped.
    pub fn handle_inactive(&mut self, record: &Record) {
        self.state(record).saved_hunks += 1;
    }

    pub fn finish(self) -> MissedTriggerSummary {
        let mut missed_remarks = 0;
        let mut missed_remark_log = 0.0;
        let mut saved = Vec::with_capacity(self.order.len());
        for ticket in &self.order {
            let Some(state) = self.tickets.get(ticket) else {
                continue;
            };
            let missed = state.open_remarks.len();
            missed_remarks += missed;
            if missed > 0 {
                let total = state.remark_total as f64;
                missed_remark_log += missed as f64 * (total + 1.0).ln() / total;
            }
            saved.push(state.saved_hunks as f64);
        }
        MissedTriggerSummary {
            missed_remarks,
            missed_remark_log,
            saved_hunk_trimmed_mean: -trimmed_mean(&saved),
        }
    }
}
