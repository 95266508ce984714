//! Data cleaning actions applied during a session.

use crate::error::{MiningError, Result};
use crate::record::ChangePartId;
use std::fmt;

/// An edit of the session data, kept in the cleaning history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataCleaningAction {
    /// Drops all records and remarks of a ticket.
    RemoveTicket(String),
    /// Drops a single record. The trigger map is left alone.
    RemoveRecord(ChangePartId),
    /// Drops the remarks whose feature values satisfy a parenthesized
    /// conjunction of `==` and `!=` conditions, then relabels the records.
    RemoveRemarksWithCondition(String),
    /// Appends a numeric column computed from an arithmetic expression.
    AddComputedColumn { name: String, expression: String },
}

impl DataCleaningAction {
    /// Compact single-line form such as `removeTicket,T-1`,
    /// `removeRecord,T-1,c,f` or `addComputedColumn,name,expression`.
    pub fn serialize(&self) -> String {
        match self {
            DataCleaningAction::RemoveTicket(ticket) => format!("removeTicket,{ticket}"),
            DataCleaningAction::RemoveRecord(id) => format!("removeRecord,{id}"),
            DataCleaningAction::RemoveRemarksWithCondition(condition) => {
                format!("removeRemarksCondition,{condition}")
            }
            DataCleaningAction::AddComputedColumn { name, expression } => {
                format!("addComputedColumn,{name},{expression}")
            }
        }
    }

    /// Parses the output of [`serialize`](Self::serialize).
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(',')
            .ok_or_else(|| MiningError::syntax(line, "expected action,arguments"))?;
        match name {
            "removeTicket" => Ok(DataCleaningAction::RemoveTicket(rest.to_string())),
            "removeRecord" => Ok(DataCleaningAction::RemoveRecord(ChangePartId::parse(rest)?)),
            "removeRemarksCondition" => Ok(DataCleaningAction::RemoveRemarksWithCondition(rest.to_string())),
            "addComputedColumn" => {
                let (column, expression) = rest
                    .split_once(',')
                    .ok_or_else(|| MiningError::syntax(line, "expected addComputedColumn,name,expression"))?;
                Ok(DataCleaningAction::AddComputedColumn {
                    name: column.to_string(),
                    expression: expression.to_string(),
                })
            }
            _ => Err(MiningError::syntax(line, format!("unknown cleaning action '{name}'"))),
        }
    }
}

impl fmt::Display for DataCleaningAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCleaningAction::RemoveTicket(ticket) => write!(f, "remove ticket {ticket}"),
            DataCleaningAction::RemoveRecord(id) => write!(f, "remove record {id}"),
            DataCleaningAction::RemoveRemarksWithCondition(condition) => {
                write!(f, "remove remarks with {condition}")
            }
            DataCleaningAction::AddComputedColumn { name, expression } => {
                write!(f, "add computed column {name} = {expression}")
            }
        }
    }
}
