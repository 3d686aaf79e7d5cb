use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{f64_as_integral, f64_to_i64_safe};

lazy_static! {
    static ref PARTIAL_VERSION: Regex =
        Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(.*)$").unwrap();
}

/// The attributes supplied alongside a key when requesting a treatment.
pub type Attributes = HashMap<String, AttributeValue>;

/// A single attribute as supplied by the caller. Objects have no representation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    /// A list, usually of strings, compared by the set matchers.
    Array(Vec<AttributeValue>),
    /// Any JSON number. Integers and epoch milliseconds are carried as floats too.
    Number(f64),
    Bool(bool),
    Null,
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        AttributeValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => (*b).into(),
            Value::Number(n) => n.as_f64().map_or_else(
                || {
                    warn!("number {} does not fit a float, keeping it as a string", n);
                    n.to_string().into()
                },
                AttributeValue::Number,
            ),
            Value::String(s) => s.as_str().into(),
            Value::Array(values) => {
                AttributeValue::Array(values.iter().map(AttributeValue::from).collect())
            }
            Value::Object(_) => {
                warn!("object attributes are not supported, treating {} as null", value);
                AttributeValue::Null
            }
        }
    }
}

impl AttributeValue {
    /// Returns None unless self is a String. It will not convert.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders scalar values the way string matchers see them: strings as-is, integral numbers
    /// without a fractional part, other numbers in shortest form, and booleans as `true`/`false`.
    pub fn to_match_string(&self) -> Option<Cow<'_, str>> {
        match self {
            AttributeValue::String(s) => Some(Cow::Borrowed(s)),
            AttributeValue::Number(f) if f.is_finite() => Some(Cow::Owned(
                f64_as_integral(*f)
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| f.to_string()),
            )),
            AttributeValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Returns the wrapped value as a float for numbers and numeric strings, and None otherwise.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(f) => Some(*f),
            AttributeValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Returns the value as a bool for booleans and for the strings `true`/`false` in any case.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            AttributeValue::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Collects an array of scalars into a de-duplicated set of their string renderings.
    ///
    /// Returns None for non-arrays and for empty arrays.
    pub fn to_string_set(&self) -> Option<HashSet<String>> {
        match self {
            AttributeValue::Array(values) => {
                let set: HashSet<String> = values
                    .iter()
                    .filter_map(|v| v.to_match_string().map(Cow::into_owned))
                    .collect();
                if set.is_empty() {
                    None
                } else {
                    Some(set)
                }
            }
            _ => None,
        }
    }

    /// Reads the value as an instant: numbers are epoch milliseconds and strings are RFC 3339
    /// timestamps.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Number(millis) => {
                Utc.timestamp_millis_opt(f64_to_i64_safe(*millis)?).single()
            }
            AttributeValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|time| time.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Parses a string attribute as a version. See [parse_semver].
    pub fn as_semver(&self) -> Option<semver::Version> {
        parse_semver(self.as_str()?)
    }
}

/// Parses a version, filling in a missing minor or patch component with zero. Build metadata is
/// dropped so that it never takes part in comparisons.
pub(crate) fn parse_semver(version: &str) -> Option<semver::Version> {
    let version = version.trim();
    let mut parsed = semver::Version::parse(version)
        .ok()
        .or_else(|| complete_partial_version(version))?;
    parsed.build = semver::BuildMetadata::EMPTY;
    Some(parsed)
}

fn complete_partial_version(version: &str) -> Option<semver::Version> {
    let captures = PARTIAL_VERSION.captures(version)?;
    let component = |i| captures.get(i).map_or("0", |m| m.as_str());
    let completed = format!(
        "{}.{}.{}{}",
        component(1),
        component(2),
        component(3),
        component(4)
    );
    semver::Version::parse(&completed).ok()
}
