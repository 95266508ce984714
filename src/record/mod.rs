//! Record model.
//!
//! A record describes one change part with numeric and string features and
//! a trigger classification that says whether the change caused a review
//! remark. Records are grouped by ticket inside a [`RecordSet`].

mod id;
mod scheme;
mod set;
mod subset;

pub use id::ChangePartId;
pub use scheme::RecordScheme;
pub use set::RecordSet;
pub use subset::RecordSubset;

use std::fmt;

/// Whether a change part triggered a review remark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerClassification {
    /// No remark can be attributed to this change part.
    NoTrigger,
    /// One of several candidate change parts triggered a remark.
    CanBe,
    /// This change part definitely triggered a remark.
    MustBe,
}

impl TriggerClassification {
    /// Combines the labels of two records sharing a feature value.
    pub(crate) fn merge(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            TriggerClassification::CanBe
        }
    }
}

impl fmt::Display for TriggerClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerClassification::NoTrigger => "NO_TRIGGER",
            TriggerClassification::CanBe => "CAN_BE",
            TriggerClassification::MustBe => "MUST_BE",
        };
        f.write_str(name)
    }
}

/// One change part with its feature values.
///
/// Missing numeric values are NaN, missing string values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: ChangePartId,
    pub numeric: Vec<f64>,
    pub strings: Vec<Option<String>>,
    pub classification: TriggerClassification,
}

impl Record {
    pub fn new(
        id: ChangePartId,
        numeric: Vec<f64>,
        strings: Vec<Option<String>>,
        classification: TriggerClassification,
    ) -> Self {
        Self {
            id,
            numeric,
            strings,
            classification,
        }
    }

    /// Numeric value at a numeric column index, NaN when missing.
    pub fn numeric_value(&self, index: usize) -> f64 {
        self.numeric.get(index).copied().unwrap_or(f64::NAN)
    }

    /// String value at a string column index.
    pub fn string_value(&self, index: usize) -> Option<&str> {
        self.strings.get(index).and_then(|s| s.as_deref())
    }

    pub fn with_classification(&self, classification: TriggerClassification) -> Self {
        Self {
            classification,
            ..self.clone()
        }
    }

    pub(crate) fn with_numeric_value_appended(&self, value: f64) -> Self {
        let mut copy = self.clone();
        copy.numeric.push(value);
        copy
    }

    /// Whether the column at absolute index `abs` has a value.
    pub fn contains_value_for(&self, scheme: &RecordScheme, abs: usize) -> bool {
        if scheme.is_numeric(abs) {
            !self.numeric_value(scheme.to_numeric_index(abs)).is_nan()
        } else {
            self.string_value(scheme.to_string_index(abs)).is_some()
        }
    }
}
