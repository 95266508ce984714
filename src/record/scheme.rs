//! Column layout of a record set.

use crate::error::{MiningError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Names of the numeric and string columns.
///
/// Columns are addressed by an absolute index: numeric columns come first,
/// string columns follow. The index within a kind is obtained with
/// [`to_numeric_index`](Self::to_numeric_index) and
/// [`to_string_index`](Self::to_string_index).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScheme {
    numeric: Vec<Arc<str>>,
    strings: Vec<Arc<str>>,
    by_name: HashMap<Arc<str>, usize>,
}

impl RecordScheme {
    /// Creates a scheme, rejecting duplicate column names.
    pub fn new<N, S>(numeric: N, strings: S) -> Result<Self>
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let numeric: Vec<Arc<str>> = numeric.into_iter().map(|n| Arc::from(n.as_ref())).collect();
        let strings: Vec<Arc<str>> = strings.into_iter().map(|n| Arc::from(n.as_ref())).collect();
        let mut by_name = HashMap::new();
        for (abs, name) in numeric.iter().chain(strings.iter()).enumerate() {
            if by_name.insert(name.clone(), abs).is_some() {
                return Err(MiningError::DuplicateColumn(name.to_string()));
            }
        }
        Ok(Self {
            numeric,
            strings,
            by_name,
        })
    }

    pub fn numeric_count(&self) -> usize {
        self.numeric.len()
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn column_count(&self) -> usize {
        self.numeric.len() + self.strings.len()
    }

    pub fn is_numeric(&self, abs: usize) -> bool {
        abs < self.numeric.len()
    }

    pub fn to_numeric_index(&self, abs: usize) -> usize {
        abs
    }

    pub fn to_string_index(&self, abs: usize) -> usize {
        abs - self.numeric.len()
    }

    pub fn abs_from_string_index(&self, string_index: usize) -> usize {
        string_index + self.numeric.len()
    }

    /// Absolute index of a column, or `UnknownColumn` listing the known names.
    pub fn abs_index(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| MiningError::UnknownColumn {
                name: name.to_string(),
                known: self.column_names().map(str::to_string).collect(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn name(&self, abs: usize) -> &str {
        self.name_arc(abs)
    }

    pub(crate) fn name_arc(&self, abs: usize) -> &Arc<str> {
        if abs < self.numeric.len() {
            &self.numeric[abs]
        } else {
            &self.strings[abs - self.numeric.len()]
        }
    }

    /// All column names in absolute index order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.numeric.iter().chain(self.strings.iter()).map(|n| &**n)
    }

    /// Returns a scheme with one more numeric column appended after the
    /// existing numeric columns.
    ///
    /// String column absolute indices shift by one.
    pub fn with_numeric_column(&self, name: &str) -> Result<Self> {
        if self.contains(name) {
            return Err(MiningError::DuplicateColumn(name.to_string()));
        }
        let mut numeric: Vec<&str> = self.numeric.iter().map(|n| &**n).collect();
        numeric.push(name);
        Self::new(numeric, self.strings.iter().map(|n| &**n))
    }
}
