//! Text syntax of rules, conjunctions and rule sets.
//!
//! ```text
//! normally use review
//! skip when one of
//!   (numCol<=1.5 and strCol == 'a')
//!   or (numCol>=9.5)
//! unless one of
//!   (strCol != 'b')
//! ```

use super::{And, Rule, RuleKind, RuleSet, Verdict};
use crate::error::{MiningError, Result};
use crate::record::RecordScheme;

/// Value part of a parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionValue {
    Number(f64),
    Text(String),
    Wildcard,
}

/// One term of a conjunction or pattern.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Term<'a> {
    Constant(bool),
    Condition {
        column: &'a str,
        kind: RuleKind,
        value: ConditionValue,
    },
    /// A lone `*`: any further conditions.
    AnyOther,
}

/// Splits at top-level ` and ` separators, ignoring those inside quotes.
pub(crate) fn split_conjunction(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => {
                i += 2;
                continue;
            }
            b'\'' => in_quote = !in_quote,
            b' ' if !in_quote && text[i..].starts_with(" and ") => {
                parts.push(text[start..i].trim());
                i += 5;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(text[start..].trim());
    parts
}

pub(crate) fn parse_term(text: &str) -> Result<Term<'_>> {
    let t = text.trim();
    match t {
        "true" => return Ok(Term::Constant(true)),
        "false" => return Ok(Term::Constant(false)),
        "*" => return Ok(Term::AnyOther),
        _ => {}
    }
    let name_end = t
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(t.len());
    if name_end == 0 {
        return Err(MiningError::syntax(t, "missing column name"));
    }
    let column = &t[..name_end];
    let rest = t[name_end..].trim_start();
    let kind = rest
        .get(..2)
        .and_then(RuleKind::from_symbol)
        .ok_or_else(|| MiningError::syntax(t, "expected one of <=, >=, ==, !="))?;
    let value_text = rest[2..].trim();
    let value = if value_text == "*" {
        ConditionValue::Wildcard
    } else if kind.is_ordinal() {
        let number = value_text
            .parse::<f64>()
            .map_err(|_| MiningError::InvalidNumber(value_text.to_string()))?;
        ConditionValue::Number(number)
    } else {
        ConditionValue::Text(unquote(value_text).ok_or_else(|| MiningError::syntax(t, "expected a quoted string"))?)
    };
    Ok(Term::Condition { column, kind, value })
}

fn unquote(text: &str) -> Option<String> {
    let mut chars = text.strip_prefix('\'')?.chars();
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => value.push(chars.next()?),
            '\'' => break,
            c => value.push(c),
        }
    }
    if chars.next().is_some() {
        return None;
    }
    Some(value)
}

pub(crate) fn term_to_rule(scheme: &RecordScheme, input: &str, term: Term<'_>) -> Result<Rule> {
    match term {
        Term::Constant(true) => Ok(Rule::True),
        Term::Constant(false) => Ok(Rule::False),
        Term::AnyOther => Err(MiningError::syntax(input, "wildcards are only allowed in patterns")),
        Term::Condition { column, kind, value } => match (kind, value) {
            (RuleKind::Leq, ConditionValue::Number(v)) => Rule::leq(scheme, column, v),
            (RuleKind::Geq, ConditionValue::Number(v)) => Rule::geq(scheme, column, v),
            (RuleKind::Equals, ConditionValue::Text(v)) => Rule::equals(scheme, column, &v),
            (RuleKind::NotEquals, ConditionValue::Text(v)) => Rule::not_equals(scheme, column, &v),
            _ => Err(MiningError::syntax(input, "wildcards are only allowed in patterns")),
        },
    }
}

/// Parses one atomic rule such as `numCol<=1.5` or `strCol != 'x'`.
pub fn parse_rule(scheme: &RecordScheme, text: &str) -> Result<Rule> {
    term_to_rule(scheme, text, parse_term(text)?)
}

/// Parses a parenthesized conjunction such as `(a<=1.0 and b == 'x')`.
pub fn parse_and(scheme: &RecordScheme, text: &str) -> Result<And> {
    let t = text.trim();
    let inner = t
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| MiningError::syntax(t, "a conjunction must be enclosed in parentheses"))?;
    if inner.trim().is_empty() {
        return Ok(And::empty());
    }
    let rules = split_conjunction(inner)
        .into_iter()
        .map(|part| parse_rule(scheme, part))
        .collect::<Result<Vec<_>>>()?;
    Ok(And::new(rules))
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Inclusions,
    Exclusions,
}

impl RuleSet {
    /// Parses the text produced by `Display`.
    pub fn parse(scheme: &RecordScheme, text: &str) -> Result<RuleSet> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let first = lines
            .next()
            .ok_or_else(|| MiningError::syntax(text, "empty rule set"))?;
        let default = match first.strip_prefix("normally use ") {
            Some("review") => Verdict::Review,
            Some("skip") => Verdict::Skip,
            _ => return Err(MiningError::syntax(first, "expected 'normally use review' or 'normally use skip'")),
        };
        let inclusion_header = format!("{} when one of", default.opposite());
        let mut rule_set = RuleSet::new(default);
        let mut section = Section::Header;
        for line in lines {
            if line == inclusion_header {
                section = Section::Inclusions;
                continue;
            }
            if line == "unless one of" {
                section = Section::Exclusions;
                continue;
            }
            let and = parse_and(scheme, line.strip_prefix("or ").unwrap_or(line))?;
            rule_set = match section {
                Section::Inclusions => rule_set.include(and),
                Section::Exclusions => rule_set.exclude(and),
                Section::Header => return Err(MiningError::syntax(line, "conjunction outside of a section")),
            };
        }
        Ok(rule_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> RecordScheme {
        RecordScheme::new(["numCol", "n2"], ["strCol"]).unwrap()
    }

    // ---- Terms ----

    #[test]
    fn test_split_conjunction_respects_quotes() {
        assert_eq!(split_conjunction("a<=1.0 and b == 'x and y'"), vec!["a<=1.0", "b == 'x and y'"]);
        assert_eq!(split_conjunction("x == 'it\\' and more'"), vec!["x == 'it\\' and more'"]);
    }

    #[test]
    fn test_parse_rule_variants() {
        let s = scheme();
        assert_eq!(parse_rule(&s, "numCol<=1.5").unwrap(), Rule::leq(&s, "numCol", 1.5).unwrap());
        assert_eq!(parse_rule(&s, "numCol >= 2").unwrap(), Rule::geq(&s, "numCol", 2.0).unwrap());
        assert_eq!(parse_rule(&s, "strCol == 'a'").unwrap(), Rule::equals(&s, "strCol", "a").unwrap());
        assert_eq!(
            parse_rule(&s, "strCol != 'it\\'s \\\\'").unwrap(),
            Rule::not_equals(&s, "strCol", "it's \\").unwrap()
        );
        assert_eq!(parse_rule(&s, "true").unwrap(), Rule::True);
        assert_eq!(parse_rule(&s, "false").unwrap(), Rule::False);
    }

    #[test]
    fn test_parse_rule_errors() {
        let s = scheme();
        assert!(matches!(parse_rule(&s, "numCol<=abc"), Err(MiningError::InvalidNumber(_))));
        assert!(matches!(parse_rule(&s, "numCol < 1"), Err(MiningError::Syntax { .. })));
        assert!(matches!(parse_rule(&s, "strCol == a"), Err(MiningError::Syntax { .. })));
        assert!(matches!(parse_rule(&s, "strCol == 'a' x"), Err(MiningError::Syntax { .. })));
        assert!(matches!(parse_rule(&s, "other<=1"), Err(MiningError::UnknownColumn { .. })));
        assert!(matches!(parse_rule(&s, "numCol<=*"), Err(MiningError::Syntax { .. })));
    }

    // ---- Conjunctions ----

    #[test]
    fn test_parse_and() {
        let s = scheme();
        let and = parse_and(&s, "(strCol == 'a' and numCol<=3.0)").unwrap();
        assert_eq!(and.to_string(), "(numCol<=3.0 and strCol == 'a')");
        assert_eq!(parse_and(&s, "()").unwrap(), And::empty());
        assert!(parse_and(&s, "numCol<=3.0").is_err());
    }

    // ---- Rule sets ----

    #[test]
    fn test_parse_rule_set_round_trip() {
        let s = scheme();
        let rs = RuleSet::skip_none()
            .include(parse_and(&s, "(numCol<=1.5)").unwrap())
            .include(parse_and(&s, "(n2>=3.0 and strCol == 'x')").unwrap())
            .exclude(parse_and(&s, "(strCol != 'y')").unwrap());
        let text = rs.to_string();
        assert_eq!(
            text,
            "normally use review\nskip when one of\n  (numCol<=1.5)\n  or (n2>=3.0 and strCol == 'x')\nunless one of\n  (strCol != 'y')\n"
        );
        assert_eq!(RuleSet::parse(&s, &text).unwrap(), rs);
    }

    #[test]
    fn test_parse_rule_set_default_skip() {
        let s = scheme();
        let rs = RuleSet::parse(&s, "normally use skip\nreview when one of\n  (numCol>=7.0)\n").unwrap();
        assert_eq!(rs.default_verdict(), Verdict::Skip);
        assert_eq!(rs.inclusions().len(), 1);
    }

    #[test]
    fn test_parse_rule_set_errors() {
        let s = scheme();
        assert!(RuleSet::parse(&s, "").is_err());
        assert!(RuleSet::parse(&s, "normally use maybe").is_err());
        assert!(RuleSet::parse(&s, "normally use review\n(numCol<=1.0)").is_err());
        assert!(RuleSet::parse(&s, "normally use review\nreview when one of\n(numCol<=1.0)").is_err());
    }
}
