//! Identity of a change part.

use crate::error::{MiningError, Result};
use std::fmt;

/// Identifies one change part: a file in a commit of a ticket, optionally
/// narrowed to a line range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangePartId {
    /// Ticket the change belongs to. Records of one ticket form a group.
    pub ticket: String,
    /// Commit (revision) identifier.
    pub commit: String,
    /// File path.
    pub file: String,
    /// Inclusive line range, `None` for file granularity.
    pub lines: Option<(i32, i32)>,
}

impl ChangePartId {
    pub fn new(ticket: impl Into<String>, commit: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            commit: commit.into(),
            file: file.into(),
            lines: None,
        }
    }

    /// Parses the `Display` form, `ticket,commit,file` with an optional
    /// `,from,to` line range.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split(',').collect();
        match parts.as_slice() {
            [ticket, commit, file] => Ok(Self::new(*ticket, *commit, *file)),
            [ticket, commit, file, from, to] => {
                let line = |v: &str| v.trim().parse::<i32>().map_err(|_| MiningError::InvalidNumber(v.to_string()));
                Ok(Self::new(*ticket, *commit, *file).with_lines(line(*from)?, line(*to)?))
            }
            _ => Err(MiningError::syntax(text, "expected ticket,commit,file[,from,to]")),
        }
    }

    pub fn with_lines(mut self, line_from: i32, line_to: i32) -> Self {
        self.lines = Some((line_from, line_to));
        self
    }

    pub fn is_line_granularity(&self) -> bool {
        self.lines.is_some()
    }

    /// Whether this id refers to exactly the same file in the same commit.
    pub fn same_file(&self, commit: &str, file: &str) -> bool {
        self.commit == commit && self.file == file
    }
}

impl fmt::Display for ChangePartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.ticket, self.commit, self.file)?;
        if let Some((from, to)) = self.lines {
            write!(f, ",{from},{to}")?;
        }
        Ok(())
    }
}
