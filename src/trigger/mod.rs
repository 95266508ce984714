//! Remark/trigger map.
//!
//! Links review remarks to the change parts that potentially triggered
//! them. A map line reads `remark;ticket;trigger`, where both locations
//! are either `WT` (whole ticket), `commit,file` or `commit,file,line`.
//! Records are labeled by asking which remarks they alone can explain.

mod counter;
mod features;

pub use counter::{MissedTriggerCounter, MissedTriggerSummary};
pub use features::RemarkFeatures;

use crate::error::{MiningError, Result};
use crate::record::{ChangePartId, RecordSet, TriggerClassification};
use std::collections::{BTreeMap, BTreeSet, HashMap};

const WHOLE_TICKET: &str = "WT";

/// Coverage questions about the other changes of the ticket a record
/// belongs to.
pub trait TicketInfo {
    /// Whether the ticket changes anything besides `file` in `commit`.
    fn contains_changes_outside(&self, commit: &str, file: &str) -> bool;

    /// Whether `file` in `commit` has changes outside `line_from..=line_to`.
    fn contains_changes_in_file_outside(&self, commit: &str, file: &str, line_from: i32, line_to: i32) -> bool;
}

/// Identifier of a remark within a [`RemarkTriggerMap`].
pub type RemarkId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Ticket,
    File,
    Line,
}

#[derive(Debug, Clone)]
struct Node {
    granularity: Granularity,
    linked: BTreeSet<usize>,
}

#[derive(Debug, Clone, Default)]
struct FileEntry {
    node: usize,
    lines: BTreeMap<i32, usize>,
}

#[derive(Debug, Clone, Default)]
struct TicketEntry {
    node: usize,
    files: HashMap<(String, String), FileEntry>,
}

/// One side of the map: the locations of remarks or of triggers.
#[derive(Debug, Clone, Default)]
struct LocationIndex {
    nodes: Vec<Node>,
    tickets: HashMap<String, TicketEntry>,
}

impl LocationIndex {
    fn push(nodes: &mut Vec<Node>, granularity: Granularity) -> usize {
        nodes.push(Node {
            granularity,
            linked: BTreeSet::new(),
        });
        nodes.len() - 1
    }

    fn get_or_create(&mut self, ticket: &str, location: &str, line: &str) -> Result<usize> {
        let nodes = &mut self.nodes;
        let entry = self
            .tickets
            .entry(ticket.to_string())
            .or_insert_with(|| TicketEntry {
                node: Self::push(nodes, Granularity::Ticket),
                files: HashMap::new(),
            });
        if location == WHOLE_TICKET {
            return Ok(entry.node);
        }
        let parts: Vec<&str> = location.split(',').collect();
        let (commit, file, line_number) = match parts.as_slice() {
            [commit, file] => (*commit, *file, None),
            [commit, file, number] => {
                let parsed = number
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| MiningError::InvalidNumber(number.to_string()))?;
                (*commit, *file, Some(parsed))
            }
            _ => return Err(MiningError::MalformedTriggerLine(line.to_string())),
        };
        let file_entry = entry
            .files
            .entry((commit.to_string(), file.to_string()))
            .or_insert_with(|| FileEntry {
                node: Self::push(nodes, Granularity::File),
                lines: BTreeMap::new(),
            });
        match line_number {
            None => Ok(file_entry.node),
            Some(n) => Ok(*file_entry
                .lines
                .entry(n)
                .or_insert_with(|| Self::push(nodes, Granularity::Line))),
        }
    }

    /// Nodes of a ticket, in no particular order.
    fn nodes_of_ticket(&self, ticket: &str) -> Vec<usize> {
        let Some(entry) = self.tickets.get(ticket) else {
            return Vec::new();
        };
        let mut result = vec![entry.node];
        for file in entry.files.values() {
            result.push(file.node);
            result.extend(file.lines.values().copied());
        }
        result
    }

    /// Every node with its ticket and location text.
    fn locations(&self) -> Vec<(&str, String, usize)> {
        let mut result = Vec::new();
        for (ticket, entry) in &self.tickets {
            result.push((ticket.as_str(), WHOLE_TICKET.to_string(), entry.node));
            for ((commit, file), file_entry) in &entry.files {
                result.push((ticket.as_str(), format!("{commit},{file}"), file_entry.node));
                for (line, &node) in &file_entry.lines {
                    result.push((ticket.as_str(), format!("{commit},{file},{line}"), node));
                }
            }
        }
        result
    }

    /// Nodes touched by a change part: its ticket, its file and the lines
    /// inside its range. A change part without lines touches every line.
    fn nodes_touched_by(&self, id: &ChangePartId) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        let Some(entry) = self.tickets.get(&id.ticket) else {
            return result;
        };
        result.insert(entry.node);
        if let Some(file) = entry.files.get(&(id.commit.clone(), id.file.clone())) {
            result.insert(file.node);
            match id.lines {
                Some((from, to)) if from <= to => result.extend(file.lines.range(from..=to).map(|(_, &n)| n)),
                Some(_) => {}
                None => result.extend(file.lines.values().copied()),
            }
        }
        result
    }
}

/// Map between review remarks and their potential triggers.
#[derive(Debug, Clone, Default)]
pub struct RemarkTriggerMap {
    remarks: LocationIndex,
    triggers: LocationIndex,
}

impl RemarkTriggerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a whole map, one entry per non-empty line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut map = Self::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            map.add(line)?;
        }
        Ok(map)
    }

    /// Adds one `remark;ticket;trigger` entry.
    pub fn add(&mut self, line: &str) -> Result<()> {
        let parts: Vec<&str> = line.split(';').collect();
        let [remark, ticket, trigger] = parts.as_slice() else {
            return Err(MiningError::MalformedTriggerLine(line.to_string()));
        };
        let remark_node = self.remarks.get_or_create(ticket, remark, line)?;
        let trigger_node = self.triggers.get_or_create(ticket, trigger, line)?;
        self.remarks.nodes[remark_node].linked.insert(trigger_node);
        self.triggers.nodes[trigger_node].linked.insert(remark_node);
        Ok(())
    }

    /// Derives a map in which every MUST_BE record triggered exactly one
    /// remark of its own. Used when no external map is available.
    pub fn from_must_records(records: &RecordSet) -> Self {
        let mut map = Self::new();
        for record in records.iter() {
            if record.classification != TriggerClassification::MustBe {
                continue;
            }
            let id = &record.id;
            let location = match id.lines {
                Some((from, _)) => format!("{},{},{}", id.commit, id.file, from),
                None => format!("{},{}", id.commit, id.file),
            };
            // Commit and file come from an existing record, so the line parses.
            if map.add(&format!("{location};{};{location}", id.ticket)).is_err() {
                tracing::warn!(record = %id, "skipping record that cannot be mapped to a remark");
            }
        }
        map
    }

    /// Remarks of a ticket that have at least one potential trigger.
    pub fn all_remarks_for(&self, ticket: &str) -> Vec<RemarkId> {
        let mut remarks: Vec<RemarkId> = self
            .remarks
            .nodes_of_ticket(ticket)
            .into_iter()
            .filter(|&n| !self.remarks.nodes[n].linked.is_empty())
            .collect();
        remarks.sort_unstable();
        remarks
    }

    /// Remarks with at least one potential trigger inside the change part.
    pub fn covered_remarks(&self, id: &ChangePartId) -> BTreeSet<RemarkId> {
        self.triggers
            .nodes_touched_by(id)
            .into_iter()
            .flat_map(|n| self.triggers.nodes[n].linked.iter().copied())
            .collect()
    }

    /// Number of remarks over all tickets.
    pub fn remark_count(&self) -> usize {
        let mut tickets: Vec<&String> = self.remarks.tickets.keys().collect();
        tickets.sort();
        tickets.into_iter().map(|t| self.all_remarks_for(t).len()).sum()
    }

    /// Labels a change part.
    ///
    /// `MustBe` when some remark has all of its potential triggers inside
    /// the change part, `CanBe` when the change part is only one of several
    /// potential triggers, `NoTrigger` otherwise.
    pub fn classification(&self, info: &dyn TicketInfo, id: &ChangePartId) -> TriggerClassification {
        let touched = self.triggers.nodes_touched_by(id);
        let mut has_triggers = false;
        for &node in &touched {
            for &remark in &self.triggers.nodes[node].linked {
                has_triggers = true;
                let triggers = &self.remarks.nodes[remark].linked;
                let fully_explained = triggers
                    .iter()
                    .all(|t| touched.contains(t) && !self.is_not_completely_covered(*t, info, id));
                if fully_explained {
                    return TriggerClassification::MustBe;
                }
            }
        }
        if has_triggers {
            TriggerClassification::CanBe
        } else {
            TriggerClassification::NoTrigger
        }
    }

    fn is_not_completely_covered(&self, trigger: usize, info: &dyn TicketInfo, id: &ChangePartId) -> bool {
        let in_file_outside = || match id.lines {
            Some((from, to)) => info.contains_changes_in_file_outside(&id.commit, &id.file, from, to),
            None => false,
        };
        match self.triggers.nodes[trigger].granularity {
            Granularity::Ticket => info.contains_changes_outside(&id.commit, &id.file) || in_file_outside(),
            Granularity::File => in_file_outside(),
            Granularity::Line => false,
        }
    }

    /// Copy without any remark or trigger of the ticket.
    pub fn without_ticket(&self, ticket: &str) -> Self {
        let mut copy = self.clone();
        copy.remarks.tickets.remove(ticket);
        copy.triggers.tickets.remove(ticket);
        copy
    }

    /// Copy without the remarks for which `pred(ticket, remark_location)`
    /// holds, together with the number of removed remarks.
    pub fn without_remarks(&self, pred: impl Fn(&str, &str) -> bool) -> (Self, usize) {
        let mut copy = self.clone();
        let mut removed = 0;
        for (ticket, location, node) in self.remarks.locations() {
            if self.remarks.nodes[node].linked.is_empty() || !pred(ticket, &location) {
                continue;
            }
            let triggers = std::mem::take(&mut copy.remarks.nodes[node].linked);
            for trigger in triggers {
                copy.triggers.nodes[trigger].linked.remove(&node);
            }
            removed += 1;
        }
        (copy, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SingleChange;

    impl TicketInfo for SingleChange {
        fn contains_changes_outside(&self, _commit: &str, _file: &str) -> bool {
            false
        }

        fn contains_changes_in_file_outside(&self, _c: &str, _f: &str, _from: i32, _to: i32) -> bool {
            false
        }
    }

    struct OtherFiles;

    impl TicketInfo for OtherFiles {
        fn contains_changes_outside(&self, _commit: &str, _file: &str) -> bool {
            true
        }

        fn contains_changes_in_file_outside(&self, _c: &str, _f: &str, _from: i32, _to: i32) -> bool {
            false
        }
    }

    // ---- Parsing ----

    #[test]
    fn test_add_rejects_malformed_lines() {
        let mut map = RemarkTriggerMap::new();
        assert!(matches!(map.add("a;b"), Err(MiningError::MalformedTriggerLine(_))));
        assert!(matches!(map.add("c,f;T;c,f,x"), Err(MiningError::InvalidNumber(_))));
        assert!(matches!(map.add("c,f;T;a,b,c,d"), Err(MiningError::MalformedTriggerLine(_))));
    }

    #[test]
    fn test_parse_counts_remarks() {
        let map = RemarkTriggerMap::parse("c,A;T1;c,A\nc,B;T1;c,B\n\nc,C;T2;WT\n").unwrap();
        assert_eq!(map.remark_count(), 3);
        assert_eq!(map.all_remarks_for("T1").len(), 2);
        assert!(map.all_remarks_for("T3").is_empty());
    }

    // ---- Classification ----

    #[test]
    fn test_file_trigger_is_must() {
        let map = RemarkTriggerMap::parse("c,A;T;c,A").unwrap();
        let id = ChangePartId::new("T", "c", "A");
        assert_eq!(map.classification(&SingleChange, &id), TriggerClassification::MustBe);
        let other = ChangePartId::new("T", "c", "B");
        assert_eq!(map.classification(&SingleChange, &other), TriggerClassification::NoTrigger);
    }

    #[test]
    fn test_two_potential_triggers_are_can() {
        let map = RemarkTriggerMap::parse("c,R;T;c,A\nc,R;T;c,B").unwrap();
        let id = ChangePartId::new("T", "c", "A");
        assert_eq!(map.classification(&SingleChange, &id), TriggerClassification::CanBe);
    }

    #[test]
    fn test_whole_ticket_trigger_depends_on_other_changes() {
        let map = RemarkTriggerMap::parse("c,R;T;WT").unwrap();
        let id = ChangePartId::new("T", "c", "A");
        assert_eq!(map.classification(&SingleChange, &id), TriggerClassification::MustBe);
        assert_eq!(map.classification(&OtherFiles, &id), TriggerClassification::CanBe);
    }

    #[test]
    fn test_covered_remarks_by_line_range() {
        let map = RemarkTriggerMap::parse("c,A,3;T;c,A,3\nc,A,9;T;c,A,9").unwrap();
        let narrow = ChangePartId::new("T", "c", "A").with_lines(1, 5);
        assert_eq!(map.covered_remarks(&narrow).len(), 1);
        let whole = ChangePartId::new("T", "c", "A");
        assert_eq!(map.covered_remarks(&whole).len(), 2);
    }

    #[test]
    fn test_without_ticket() {
        let map = RemarkTriggerMap::parse("c,A;T1;c,A\nc,B;T2;c,B").unwrap();
        let reduced = map.without_ticket("T1");
        assert_eq!(reduced.remark_count(), 1);
        let id = ChangePartId::new("T1", "c", "A");
        assert_eq!(reduced.classification(&SingleChange, &id), TriggerClassification::NoTrigger);
    }

    #[test]
    fn test_without_remarks() {
        let map = RemarkTriggerMap::parse("c,A;T1;c,A\nc,R;T1;c,A\nc,R;T1;c,B\nWT;T2;c,C").unwrap();
        let (reduced, removed) = map.without_remarks(|ticket, remark| ticket == "T1" && remark == "c,R");
        assert_eq!(removed, 1);
        assert_eq!(reduced.remark_count(), 2);
        let b = ChangePartId::new("T1", "c", "B");
        assert_eq!(map.classification(&SingleChange, &b), TriggerClassification::CanBe);
        assert_eq!(reduced.classification(&SingleChange, &b), TriggerClassification::NoTrigger);
        let a = ChangePartId::new("T1", "c", "A");
        assert_eq!(reduced.classification(&SingleChange, &a), TriggerClassification::MustBe);

        let (whole, removed) = map.without_remarks(|_, remark| remark == "WT");
        assert_eq!(removed, 1);
        assert_eq!(whole.remark_count(), 2);
        // unchanged source map
        assert_eq!(map.remark_count(), 3);
    }
}
