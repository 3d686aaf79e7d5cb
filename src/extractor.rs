use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Timelike, Utc};
use log::{debug, warn};
use serde::Deserialize;

use crate::attribute_value::{AttributeValue, Attributes};
use crate::key::EvaluationKey;

/// Selects what a matcher looks at: the request's matching key, or a named attribute.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeySelector {
    #[serde(default)]
    pub traffic_type: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
}

/// The input type a matcher expects once its value has been coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValueType {
    Any,
    String,
    Number,
    DateTime(Granularity),
    Set,
    Boolean,
    Semver,
}

/// Resolution at which datetime operands are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Granularity {
    Day,
    Minute,
}

impl Granularity {
    pub(crate) fn truncate(self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Day => time
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| Utc.from_utc_datetime(&midnight)),
            Granularity::Minute => time.with_second(0)?.with_nanosecond(0),
        }
    }

    /// Truncates a datetime operand and returns it as epoch milliseconds.
    pub(crate) fn truncate_millis(self, value: &AttributeValue) -> Option<f64> {
        let time = value.to_datetime()?;
        self.truncate(time).map(|t| t.timestamp_millis() as f64)
    }
}

/// A runtime value coerced into the type its matcher works on.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MatchValue<'a> {
    Present,
    Str(Cow<'a, str>),
    Number(f64),
    Set(HashSet<String>),
    Bool(bool),
    Version(semver::Version),
}

impl KeySelector {
    pub(crate) fn for_key() -> Self {
        KeySelector::default()
    }

    /// Resolves the value a matcher should test and coerces it to `value_type`.
    ///
    /// Returns None when there is nothing usable to match on: the attribute map is missing, the
    /// attribute is absent or null, or its value cannot be coerced.
    pub(crate) fn extract<'a>(
        &self,
        key: &'a EvaluationKey,
        attributes: Option<&'a Attributes>,
        value_type: ValueType,
    ) -> Option<MatchValue<'a>> {
        let attribute = match &self.attribute {
            None => return coerce_key(key.matching_key(), value_type),
            Some(attribute) => attribute,
        };

        let attributes = match attributes {
            Some(attributes) => attributes,
            None => {
                warn!("Defined attribute '{}', no attributes received", attribute);
                return None;
            }
        };

        let value = match attributes.get(attribute) {
            None | Some(AttributeValue::Null) => {
                debug!("attribute '{}' is not present", attribute);
                return None;
            }
            Some(value) => value,
        };

        let coerced = coerce(value, value_type);
        if coerced.is_none() {
            debug!(
                "value {:?} of attribute '{}' does not match the expected type {:?}",
                value, attribute, value_type
            );
        }
        coerced
    }
}

fn coerce_key(matching_key: &str, value_type: ValueType) -> Option<MatchValue<'_>> {
    match value_type {
        ValueType::Any => Some(MatchValue::Present),
        ValueType::String => Some(MatchValue::Str(Cow::Borrowed(matching_key))),
        other => {
            let value = AttributeValue::from(matching_key);
            let coerced = coerce(&value, other).map(into_owned);
            if coerced.is_none() {
                debug!(
                    "key '{}' does not match the expected type {:?}",
                    matching_key, other
                );
            }
            coerced
        }
    }
}

fn coerce(value: &AttributeValue, value_type: ValueType) -> Option<MatchValue<'_>> {
    match value_type {
        ValueType::Any => Some(MatchValue::Present),
        ValueType::String => value.to_match_string().map(MatchValue::Str),
        ValueType::Number => value.to_f64().map(MatchValue::Number),
        ValueType::DateTime(granularity) => {
            granularity.truncate_millis(value).map(MatchValue::Number)
        }
        ValueType::Set => value.to_string_set().map(MatchValue::Set),
        ValueType::Boolean => value.to_bool().map(MatchValue::Bool),
        ValueType::Semver => value.as_semver().map(MatchValue::Version),
    }
}

fn into_owned(value: MatchValue<'_>) -> MatchValue<'static> {
    match value {
        MatchValue::Present => MatchValue::Present,
        MatchValue::Str(s) => MatchValue::Str(Cow::Owned(s.into_owned())),
        MatchValue::Number(n) => MatchValue::Number(n),
        MatchValue::Set(set) => MatchValue::Set(set),
        MatchValue::Bool(b) => MatchValue::Bool(b),
        MatchValue::Version(v) => MatchValue::Version(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::{hashmap, hashset};
    use spectral::prelude::*;
    use test_case::test_case;

    fn on(attribute: &str) -> KeySelector {
        KeySelector {
            traffic_type: Some("user".into()),
            attribute: Some(attribute.into()),
        }
    }

    fn alice() -> EvaluationKey {
        EvaluationKey::with_bucketing_key("alice", "bucket-me").unwrap()
    }

    #[test]
    fn uses_matching_key_without_attribute() {
        let key = alice();
        let value = KeySelector::for_key().extract(&key, None, ValueType::String);
        assert_that!(value).contains_value(MatchValue::Str("alice".into()));
    }

    #[test]
    fn missing_attribute_map_is_not_a_match() {
        let key = alice();
        assert_that!(on("age").extract(&key, None, ValueType::Number)).is_none();
    }

    #[test]
    fn missing_or_null_attribute_is_not_a_match() {
        let key = alice();
        let attributes = hashmap! {"age".to_string() => AttributeValue::Null};
        assert_that!(on("age").extract(&key, Some(&attributes), ValueType::Number)).is_none();
        assert_that!(on("plan").extract(&key, Some(&attributes), ValueType::Any)).is_none();
    }

    #[test_case(AttributeValue::from(30_i64), ValueType::Number, Some(MatchValue::Number(30.0)))]
    #[test_case(AttributeValue::from("30"), ValueType::Number, Some(MatchValue::Number(30.0)))]
    #[test_case(AttributeValue::from("thirty"), ValueType::Number, None)]
    #[test_case(AttributeValue::from(30_i64), ValueType::String, Some(MatchValue::Str("30".into())))]
    #[test_case(AttributeValue::from("TRUE"), ValueType::Boolean, Some(MatchValue::Bool(true)))]
    #[test_case(AttributeValue::from(1_i64), ValueType::Boolean, None)]
    #[test_case(AttributeValue::from(vec!["a", "b", "a"]), ValueType::Set, Some(MatchValue::Set(hashset!{"a".to_string(), "b".to_string()})))]
    #[test_case(AttributeValue::from("a"), ValueType::Set, None)]
    #[test_case(AttributeValue::from(false), ValueType::Any, Some(MatchValue::Present))]
    fn coerces_attributes(value: AttributeValue, value_type: ValueType, expected: Option<MatchValue<'static>>) {
        let key = alice();
        let attributes = hashmap! {"attr".to_string() => value};
        assert_eq!(on("attr").extract(&key, Some(&attributes), value_type), expected);
    }

    #[test]
    fn truncates_datetimes() {
        let key = alice();
        // 2023-11-14T22:13:20.500Z
        let attributes = hashmap! {"at".to_string() => AttributeValue::from(1_700_000_000_500_i64)};

        let by_day = on("at").extract(&key, Some(&attributes), ValueType::DateTime(Granularity::Day));
        assert_that!(by_day).contains_value(MatchValue::Number(1_699_920_000_000.0));

        let by_minute =
            on("at").extract(&key, Some(&attributes), ValueType::DateTime(Granularity::Minute));
        assert_that!(by_minute).contains_value(MatchValue::Number(1_699_999_980_000.0));
    }

    #[test]
    fn numeric_keys_can_feed_numeric_matchers() {
        let key = EvaluationKey::new("42").unwrap();
        let value = KeySelector::for_key().extract(&key, None, ValueType::Number);
        assert_that!(value).contains_value(MatchValue::Number(42.0));
    }

    #[test]
    fn parses_selector_with_null_attribute() {
        let selector: KeySelector =
            serde_json::from_str(r#"{"trafficType": "user", "attribute": null}"#).unwrap();
        assert_eq!(selector.attribute, None);
    }
}
