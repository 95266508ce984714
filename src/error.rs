//! Error types for skip-rules.
//!
//! Parsing and lookup operations fail fast with [`MiningError`]. Rule
//! application, restriction checks, evaluation and archive maintenance are
//! total and never produce errors.

use thiserror::Error;

/// Error type for everything that can go wrong while setting up or editing
/// a mining session.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MiningError {
    /// A column name is not part of the record scheme.
    #[error("unknown column '{name}', known columns are {known:?}")]
    UnknownColumn { name: String, known: Vec<String> },

    /// A column with this name already exists.
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    /// A column was used with the wrong kind (numeric vs. string).
    #[error("column '{name}' is not a {expected} column")]
    ColumnKind { name: String, expected: &'static str },

    /// Malformed rule, rule set, pattern or expression text.
    #[error("syntax error in '{input}': {reason}")]
    Syntax { input: String, reason: String },

    /// A numeric literal could not be parsed.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Records of one ticket are not contiguous.
    #[error("records are not grouped by ticket, ticket '{0}' appears twice")]
    UnsortedRecords(String),

    /// A trigger map line does not follow `remark;ticket;trigger`.
    #[error("malformed trigger map line: {0}")]
    MalformedTriggerLine(String),

    /// A remark feature row does not have one value per field.
    #[error("malformed remark feature row: {0}")]
    MalformedFeatureRow(String),

    /// A session text block is missing, unknown or out of place.
    #[error("malformed session text: {0}")]
    MalformedSession(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MiningError {
    pub(crate) fn syntax(input: &str, reason: impl Into<String>) -> Self {
        MiningError::Syntax {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MiningError>;
