//! Search parameter model.
//!
//! A [`SearchParameter`] names one filterable field and carries an ordered
//! sequence of raw string values. Whether a parameter can be sent to the
//! remote API verbatim or must be evaluated locally is derived from its
//! non-blank value count at filter time; it is never stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Reserved parameter name carrying the free-text query string.
///
/// Never sent as a remote field; consumed by the text filter pass.
/// Expected to carry a single value; only the first non-blank value is
/// used when an editor hands over more.
pub const QUERY_PARAM: &str = "query";
/// Flag parameter: search the issue subject in the text pass.
pub const IS_SUBJECT_PARAM: &str = "is_subject";
/// Flag parameter: search the issue description in the text pass.
pub const IS_DESCRIPTION_PARAM: &str = "is_description";
/// Flag parameter: search comment bodies. Accepted but inert - comment
/// bodies are not part of the fetched issue record, so this flag never
/// contributes matches.
pub const IS_COMMENTS_PARAM: &str = "is_comments";

/// Sentinel flag value meaning "enabled".
pub const TRUTHY_VALUE: &str = "1";

/// A single raw parameter value.
///
/// The NONE sentinel (`!*`, the tracker's "field unset" token) matches
/// issues whose corresponding reference field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterValue(String);

impl ParameterValue {
    /// The tracker's wire token for "field is unset".
    pub const NONE_TOKEN: &'static str = "!*";

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The NONE sentinel value.
    #[must_use]
    pub fn none() -> Self {
        Self(Self::NONE_TOKEN.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff this value is the reserved "field unset" sentinel.
    #[must_use]
    pub fn is_none_sentinel(&self) -> bool {
        self.0 == Self::NONE_TOKEN
    }

    /// True iff the value is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One named search criterion with one or more values.
///
/// Invariant: a parameter with zero non-blank values is inert and must
/// not affect a query in any way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameter {
    name: String,
    values: Vec<ParameterValue>,
}

impl SearchParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for a single-value parameter.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, vec![ParameterValue::new(value)])
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    /// Total value count, blank values included.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// True iff every value is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(ParameterValue::is_blank)
    }

    /// The effective value sequence, order preserved.
    pub fn non_blank_values(&self) -> impl Iterator<Item = &ParameterValue> {
        self.values.iter().filter(|v| !v.is_blank())
    }

    /// The sole non-blank value, if this parameter has exactly one.
    #[must_use]
    pub fn single_value(&self) -> Option<&ParameterValue> {
        let mut iter = self.non_blank_values();
        match (iter.next(), iter.next()) {
            (Some(value), None) => Some(value),
            _ => None,
        }
    }

    /// Interpret this parameter as a boolean flag: true iff it has a
    /// single value equal to the truthy sentinel `"1"`.
    #[must_use]
    pub fn is_truthy_flag(&self) -> bool {
        self.single_value().is_some_and(|v| v.as_str() == TRUTHY_VALUE)
    }
}

/// A parameter set keyed by parameter name, as assembled by a query editor.
pub type ParameterMap = HashMap<String, SearchParameter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        let blank = SearchParameter::new(
            "status_id",
            vec![ParameterValue::new(""), ParameterValue::new("   ")],
        );
        assert!(blank.is_blank());
        assert_eq!(blank.value_count(), 2);
        assert_eq!(blank.single_value(), None);

        let set = SearchParameter::single("status_id", "2");
        assert!(!set.is_blank());
    }

    #[test]
    fn test_single_value_ignores_blanks() {
        let p = SearchParameter::new(
            "priority_id",
            vec![ParameterValue::new(""), ParameterValue::new("4")],
        );
        assert_eq!(p.single_value().map(ParameterValue::as_str), Some("4"));
    }

    #[test]
    fn test_multi_value_has_no_single() {
        let p = SearchParameter::new(
            "status_id",
            vec![ParameterValue::new("1"), ParameterValue::new("2")],
        );
        assert_eq!(p.single_value(), None);
        assert_eq!(p.non_blank_values().count(), 2);
    }

    #[test]
    fn test_truthy_flag() {
        assert!(SearchParameter::single(IS_SUBJECT_PARAM, "1").is_truthy_flag());
        assert!(!SearchParameter::single(IS_SUBJECT_PARAM, "0").is_truthy_flag());
        assert!(!SearchParameter::single(IS_SUBJECT_PARAM, "").is_truthy_flag());
        // Two truthy values is not a flag.
        let two = SearchParameter::new(
            IS_SUBJECT_PARAM,
            vec![ParameterValue::new("1"), ParameterValue::new("1")],
        );
        assert!(!two.is_truthy_flag());
    }

    #[test]
    fn test_none_sentinel() {
        let none = ParameterValue::none();
        assert!(none.is_none_sentinel());
        assert!(!none.is_blank());
        assert_eq!(none.as_str(), "!*");
    }
}
