//! Field values attached to remarks.

use crate::error::{MiningError, Result};
use crate::record::RecordScheme;
use std::collections::HashMap;

/// Named string fields per remark, such as the reviewer or the remark
/// category, keyed by ticket and remark location.
///
/// The text form has a header line `ticket;remark;field...` followed by one
/// row per remark. Empty cells are missing values.
///
/// ```
/// use skip_rules::trigger::RemarkFeatures;
///
/// let features = RemarkFeatures::parse("ticket;remark;category\nT1;c,A;style\nT1;c,B;").unwrap();
/// assert_eq!(features.value("T1", "c,A", "category"), Some("style"));
/// assert_eq!(features.value("T1", "c,B", "category"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemarkFeatures {
    field_names: Vec<String>,
    values: HashMap<(String, String), Vec<Option<String>>>,
}

impl RemarkFeatures {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            values: HashMap::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| MiningError::MalformedFeatureRow(String::new()))?;
        let names: Vec<&str> = header.split(';').collect();
        if names.len() < 2 {
            return Err(MiningError::MalformedFeatureRow(header.to_string()));
        }
        let mut features = Self::new(names[2..].iter().map(|n| n.trim()));
        for line in lines {
            let cells: Vec<&str> = line.split(';').collect();
            let [ticket, remark, values @ ..] = cells.as_slice() else {
                return Err(MiningError::MalformedFeatureRow(line.to_string()));
            };
            let values = values
                .iter()
                .map(|v| (!v.is_empty()).then(|| v.to_string()))
                .collect();
            features
                .add(*ticket, *remark, values)
                .map_err(|_| MiningError::MalformedFeatureRow(line.to_string()))?;
        }
        Ok(features)
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Sets the values of one remark, one per field.
    pub fn add(&mut self, ticket: impl Into<String>, remark: impl Into<String>, values: Vec<Option<String>>) -> Result<()> {
        let key = (ticket.into(), remark.into());
        if values.len() != self.field_names.len() {
            return Err(MiningError::MalformedFeatureRow(format!(
                "{};{} has {} values for {} fields",
                key.0,
                key.1,
                values.len(),
                self.field_names.len()
            )));
        }
        self.values.insert(key, values);
        Ok(())
    }

    pub fn value(&self, ticket: &str, remark: &str, field: &str) -> Option<&str> {
        let index = self.field_names.iter().position(|n| n == field)?;
        self.values
            .get(&(ticket.to_string(), remark.to_string()))
            .and_then(|row| row[index].as_deref())
    }

    /// A scheme with one string column per field, for parsing conditions
    /// over remarks.
    pub fn scheme(&self) -> Result<RecordScheme> {
        RecordScheme::new(Vec::<&str>::new(), self.field_names.iter().map(String::as_str))
    }
}
