//! Numeric coercion of raw parameter text.
//!
//! Parameters stay strings until a lowering rule asks for a number. A value
//! that does not parse is replaced by the caller's fallback without any
//! diagnostic in the generated code. Bracketed lists (`[1 2 3]`) are reduced
//! to their first element and the reduction is noted next to the statement
//! that uses it.

use indexmap::IndexMap;

/// A scalar ready to be pasted into C source.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// C literal text.
    pub literal: String,
    /// Set when the raw value was a list reduced to its first element.
    pub reduced_from: Option<String>,
}

impl Scalar {
    fn plain(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            reduced_from: None,
        }
    }

    /// Append the simplification marker, if any, to a statement.
    pub fn annotate(&self, statement: String) -> String {
        match &self.reduced_from {
            Some(raw) => format!(
                "{}  /* simplified: {} reduced to first element */",
                statement,
                comment_safe(raw)
            ),
            None => statement,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Parse a finite number, rejecting `inf`/`NaN` spellings C cannot use.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_list(raw: &str) -> bool {
    let t = raw.trim();
    t.len() >= 2 && t.starts_with('[') && t.ends_with(']')
}

fn list_items(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

/// Coerce `raw` to a scalar literal, falling back to `fallback` (itself a
/// valid C literal) when it is not numeric.
pub fn scalar(raw: Option<&str>, fallback: &str) -> Scalar {
    let Some(raw) = raw else {
        return Scalar::plain(fallback);
    };
    if is_list(raw) {
        let first = list_items(raw).next().filter(|t| parse_number(t).is_some());
        return Scalar {
            literal: first.unwrap_or(fallback).to_string(),
            reduced_from: Some(raw.trim().to_string()),
        };
    }
    match parse_number(raw) {
        Some(_) => Scalar::plain(raw.trim()),
        None => Scalar::plain(fallback),
    }
}

/// Look up the first present key among `keys` and coerce it.
pub fn param(params: &IndexMap<String, String>, keys: &[&str], fallback: &str) -> Scalar {
    let raw = keys.iter().find_map(|k| params.get(*k)).map(|s| s.as_str());
    scalar(raw, fallback)
}

/// Parse a coefficient list like `[1 2 3]` (or a bare scalar). Entries that
/// do not parse make the whole list fall back.
pub fn coefficients(raw: Option<&str>, fallback: &[f64]) -> Vec<f64> {
    let Some(raw) = raw else {
        return fallback.to_vec();
    };
    let parsed: Option<Vec<f64>> = list_items(raw).map(parse_number).collect();
    match parsed {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_vec(),
    }
}

/// Render a float as a C double literal (always with a `.` or exponent).
pub fn c_float(v: f64) -> String {
    format!("{:?}", v)
}

/// Keep arbitrary text from closing a C comment early.
pub fn comment_safe(raw: &str) -> String {
    raw.replace("*/", "* /").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pass_through_verbatim() {
        assert_eq!(scalar(Some(" 2.5 "), "1.0").literal, "2.5");
        assert_eq!(scalar(Some("-1e-3"), "1.0").literal, "-1e-3");
    }

    #[test]
    fn non_numeric_falls_back_silently() {
        let s = scalar(Some("not_a_number"), "0.0");
        assert_eq!(s.literal, "0.0");
        assert!(s.reduced_from.is_none());
        assert_eq!(scalar(Some("inf"), "1.0").literal, "1.0");
        assert_eq!(scalar(None, "3.0").literal, "3.0");
    }

    #[test]
    fn lists_reduce_to_first_element_with_marker() {
        let s = scalar(Some("[4 5 6]"), "1.0");
        assert_eq!(s.literal, "4");
        assert_eq!(
            s.annotate("x = 4;".into()),
            "x = 4;  /* simplified: [4 5 6] reduced to first element */"
        );
        assert_eq!(scalar(Some("[a, 2]"), "1.0").literal, "1.0");
    }

    #[test]
    fn coefficient_lists() {
        assert_eq!(coefficients(Some("[1 2.5]"), &[1.0]), vec![1.0, 2.5]);
        assert_eq!(coefficients(Some("[1,x]"), &[1.0, 1.0]), vec![1.0, 1.0]);
        assert_eq!(coefficients(Some("3"), &[1.0]), vec![3.0]);
    }

    #[test]
    fn c_float_always_has_a_decimal_point() {
        assert_eq!(c_float(1.0), "1.0");
        assert_eq!(c_float(-0.5), "-0.5");
    }
}
