//! Record set fixtures for unit tests.
//!
//! Every record gets its own ticket `T<i>` and file `F<i>`; records listed
//! as `no` come first, followed by the `must` records.

use crate::record::{ChangePartId, Record, RecordScheme, RecordSet, TriggerClassification};
use crate::trigger::RemarkTriggerMap;

fn id(i: usize) -> ChangePartId {
    ChangePartId::new(format!("T{i}"), "c", format!("F{i}"))
}

type Row = (Vec<f64>, Vec<Option<String>>);

fn build(scheme: RecordScheme, no: Vec<Row>, must: Vec<Row>) -> RecordSet {
    let labeled = no
        .into_iter()
        .map(|v| (v, TriggerClassification::NoTrigger))
        .chain(must.into_iter().map(|v| (v, TriggerClassification::MustBe)));
    let records = labeled
        .enumerate()
        .map(|(i, ((numeric, strings), class))| Record::new(id(i), numeric, strings, class))
        .collect();
    RecordSet::new(scheme, records)
}

pub(crate) fn one_numeric_column(no: &[f64], must: &[f64]) -> RecordSet {
    let scheme = RecordScheme::new(["numCol"], Vec::<&str>::new()).expect("scheme");
    let rows = |values: &[f64]| -> Vec<Row> {
        values.iter().map(|&v| (vec![v], Vec::new())).collect()
    };
    build(scheme, rows(no), rows(must))
}

pub(crate) fn two_numeric_columns(no: &[(f64, f64)], must: &[(f64, f64)]) -> RecordSet {
    let scheme = RecordScheme::new(["numCol0", "numCol1"], Vec::<&str>::new()).expect("scheme");
    let rows = |values: &[(f64, f64)]| -> Vec<Row> {
        values.iter().map(|&(a, b)| (vec![a, b], Vec::new())).collect()
    };
    build(scheme, rows(no), rows(must))
}

pub(crate) fn one_string_column(no: &[&str], must: &[&str]) -> RecordSet {
    let scheme = RecordScheme::new(Vec::<&str>::new(), ["strCol"]).expect("scheme");
    let rows = |values: &[&str]| -> Vec<Row> {
        values
            .iter()
            .map(|&v| (Vec::new(), vec![Some(v.to_string())]))
            .collect()
    };
    build(scheme, rows(no), rows(must))
}

pub(crate) fn two_string_columns(no: &[(&str, &str)], must: &[(&str, &str)]) -> RecordSet {
    let scheme = RecordScheme::new(Vec::<&str>::new(), ["strCol0", "strCol1"]).expect("scheme");
    let rows = |values: &[(&str, &str)]| -> Vec<Row> {
        values
            .iter()
            .map(|&(a, b)| (Vec::new(), vec![Some(a.to_string()), Some(b.to_string())]))
            .collect()
    };
    build(scheme, rows(no), rows(must))
}

/// `count` records with `numCol0 = i` and `strCol0` = `a` below
/// `string_switch`, `b` above; records below `must_below` are MUST_BE.
pub(crate) fn mixed_columns(count: usize, string_switch: usize, must_below: usize) -> RecordSet {
    let scheme = RecordScheme::new(["numCol0"], ["strCol0"]).expect("scheme");
    let records = (0..count)
        .map(|i| {
            let s = if i < string_switch { "a" } else { "b" };
            let class = if i < must_below {
                TriggerClassification::MustBe
            } else {
                TriggerClassification::NoTrigger
            };
            Record::new(id(i), vec![i as f64], vec![Some(s.to_string())], class)
        })
        .collect();
    RecordSet::new(scheme, records)
}

/// Trigger map with one remark for every MUST_BE record.
pub(crate) fn trigger_map(data: &RecordSet) -> RemarkTriggerMap {
    RemarkTriggerMap::from_must_records(data)
}
