use std::collections::HashSet;

use log::warn;
use regex::Regex;
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError, DefaultOnNull};

use crate::attribute_value::{parse_semver, AttributeValue, Attributes};
use crate::extractor::{Granularity, KeySelector, MatchValue, ValueType};
use crate::key::EvaluationKey;

/// A single predicate of a condition.
///
/// Matchers are built from their wire definition when a flag is parsed: operands are validated and
/// regular expressions compiled once. Malformed operands never fail parsing; an invalid regular
/// expression yields a matcher that never matches, and an unknown or incomplete definition yields
/// [MatcherKind::Unsupported].
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "MatcherDefinition")]
pub struct Matcher {
    pub(crate) key_selector: KeySelector,
    pub(crate) negate: bool,
    pub(crate) kind: MatcherKind,
}

#[derive(Clone, Debug)]
pub(crate) enum MatcherKind {
    AllKeys,
    Whitelist(HashSet<String>),
    EqualTo(f64, DataType),
    GreaterThanOrEqualTo(f64, DataType),
    LessThanOrEqualTo(f64, DataType),
    Between {
        start: f64,
        end: f64,
        data_type: DataType,
    },
    EqualToSet(HashSet<String>),
    ContainsAnyOfSet(HashSet<String>),
    ContainsAllOfSet(HashSet<String>),
    PartOfSet(HashSet<String>),
    StartsWith(Vec<String>),
    EndsWith(Vec<String>),
    ContainsString(Vec<String>),
    MatchesString(Option<Regex>),
    EqualToBoolean(bool),
    EqualToSemver(semver::Version),
    GreaterThanOrEqualToSemver(semver::Version),
    LessThanOrEqualToSemver(semver::Version),
    BetweenSemver {
        start: semver::Version,
        end: semver::Version,
    },
    InListSemver(Vec<semver::Version>),
    Unsupported(String),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    #[default]
    Number,
    Datetime,
}

impl Matcher {
    /// Evaluates the matcher for a request. A value that cannot be resolved counts as no match
    /// before `negate` is applied.
    pub(crate) fn matches(&self, key: &EvaluationKey, attributes: Option<&Attributes>) -> bool {
        let matched = self
            .key_selector
            .extract(key, attributes, self.kind.value_type())
            .map(|value| self.kind.matches(&value))
            .unwrap_or(false);
        matched != self.negate
    }

    pub(crate) fn all_keys() -> Self {
        Matcher {
            key_selector: KeySelector::for_key(),
            negate: false,
            kind: MatcherKind::AllKeys,
        }
    }

    /// The name of the matcher type if this build of the engine cannot evaluate it.
    pub(crate) fn unsupported_type(&self) -> Option<&str> {
        match &self.kind {
            MatcherKind::Unsupported(matcher_type) => Some(matcher_type.as_str()),
            _ => None,
        }
    }
}

impl MatcherKind {
    fn value_type(&self) -> ValueType {
        match self {
            MatcherKind::AllKeys | MatcherKind::Unsupported(_) => ValueType::Any,
            MatcherKind::Whitelist(_)
            | MatcherKind::StartsWith(_)
            | MatcherKind::EndsWith(_)
            | MatcherKind::ContainsString(_)
            | MatcherKind::MatchesString(_) => ValueType::String,
            MatcherKind::EqualTo(_, data_type) => data_type.value_type(Granularity::Day),
            MatcherKind::GreaterThanOrEqualTo(_, data_type)
            | MatcherKind::LessThanOrEqualTo(_, data_type)
            | MatcherKind::Between { data_type, .. } => data_type.value_type(Granularity::Minute),
            MatcherKind::EqualToSet(_)
            | MatcherKind::ContainsAnyOfSet(_)
            | MatcherKind::ContainsAllOfSet(_)
            | MatcherKind::PartOfSet(_) => ValueType::Set,
            MatcherKind::EqualToBoolean(_) => ValueType::Boolean,
            MatcherKind::EqualToSemver(_)
            | MatcherKind::GreaterThanOrEqualToSemver(_)
            | MatcherKind::LessThanOrEqualToSemver(_)
            | MatcherKind::BetweenSemver { .. }
            | MatcherKind::InListSemver(_) => ValueType::Semver,
        }
    }

    #[allow(clippy::float_cmp)]
    fn matches(&self, value: &MatchValue) -> bool {
        use MatchValue::*;

        match (self, value) {
            (MatcherKind::AllKeys, _) => true,
            (MatcherKind::Whitelist(set), Str(s)) => set.contains(&**s),

            // numeric ops
            (MatcherKind::EqualTo(v, _), Number(n)) => n == v,
            (MatcherKind::GreaterThanOrEqualTo(v, _), Number(n)) => n >= v,
            (MatcherKind::LessThanOrEqualTo(v, _), Number(n)) => n <= v,
            (MatcherKind::Between { start, end, .. }, Number(n)) => start <= n && n <= end,

            // set ops
            (MatcherKind::EqualToSet(set), Set(values)) => {
                values.len() == set.len() && values.iter().all(|v| set.contains(v))
            }
            (MatcherKind::ContainsAnyOfSet(set), Set(values)) => {
                set.iter().any(|v| values.contains(v))
            }
            (MatcherKind::ContainsAllOfSet(set), Set(values)) => {
                values.len() >= set.len() && set.iter().all(|v| values.contains(v))
            }
            (MatcherKind::PartOfSet(set), Set(values)) => {
                values.len() <= set.len() && values.iter().all(|v| set.contains(v))
            }

            // string ops
            (MatcherKind::StartsWith(prefixes), Str(s)) => {
                prefixes.iter().any(|p| s.starts_with(p.as_str()))
            }
            (MatcherKind::EndsWith(suffixes), Str(s)) => {
                suffixes.iter().any(|p| s.ends_with(p.as_str()))
            }
            (MatcherKind::ContainsString(needles), Str(s)) => {
                needles.iter().any(|p| s.contains(p.as_str()))
            }
            (MatcherKind::MatchesString(Some(regex)), Str(s)) => regex.is_match(s),

            (MatcherKind::EqualToBoolean(expected), Bool(b)) => b == expected,

            // semver ops
            (MatcherKind::EqualToSemver(v), Version(version)) => version == v,
            (MatcherKind::GreaterThanOrEqualToSemver(v), Version(version)) => version >= v,
            (MatcherKind::LessThanOrEqualToSemver(v), Version(version)) => version <= v,
            (MatcherKind::BetweenSemver { start, end }, Version(version)) => {
                start <= version && version <= end
            }
            (MatcherKind::InListSemver(versions), Version(version)) => versions.contains(version),

            _ => false,
        }
    }
}

impl DataType {
    fn value_type(self, granularity: Granularity) -> ValueType {
        match self {
            DataType::Number => ValueType::Number,
            DataType::Datetime => ValueType::DateTime(granularity),
        }
    }

    fn operand(self, value: f64, granularity: Granularity) -> Option<f64> {
        match self {
            DataType::Number => Some(value),
            DataType::Datetime => granularity.truncate_millis(&AttributeValue::Number(value)),
        }
    }
}

// The shape of a matcher as delivered by the flag service. Each matcher type reads the single
// operand field it needs; the others are null. An operand of the wrong shape reads as missing.
#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatcherDefinition {
    #[serde(default)]
    key_selector: Option<KeySelector>,
    matcher_type: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    negate: bool,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    whitelist_matcher_data: Option<WhitelistData>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    unary_numeric_matcher_data: Option<UnaryNumericData>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    between_matcher_data: Option<BetweenData>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    boolean_matcher_data: Option<bool>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    string_matcher_data: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    between_string_matcher_data: Option<BetweenStringData>,
}

#[derive(Deserialize)]
struct WhitelistData {
    #[serde(default)]
    whitelist: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnaryNumericData {
    #[serde(default)]
    data_type: Option<DataType>,
    value: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BetweenData {
    #[serde(default)]
    data_type: Option<DataType>,
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct BetweenStringData {
    start: String,
    end: String,
}

impl From<MatcherDefinition> for Matcher {
    fn from(definition: MatcherDefinition) -> Self {
        let kind = build_kind(&definition).unwrap_or_else(|| {
            warn!(
                "matcher type {} is unsupported or missing its operand",
                definition.matcher_type
            );
            MatcherKind::Unsupported(definition.matcher_type.clone())
        });
        Matcher {
            key_selector: definition.key_selector.unwrap_or_default(),
            negate: definition.negate,
            kind,
        }
    }
}

fn build_kind(definition: &MatcherDefinition) -> Option<MatcherKind> {
    let whitelist = || {
        definition
            .whitelist_matcher_data
            .as_ref()
            .map(|data| data.whitelist.clone())
    };
    let set = || whitelist().map(|values| values.into_iter().collect::<HashSet<_>>());
    let unary = |granularity: Granularity| -> Option<(f64, DataType)> {
        let data = definition.unary_numeric_matcher_data.as_ref()?;
        let data_type = data.data_type.unwrap_or_default();
        Some((data_type.operand(data.value, granularity)?, data_type))
    };
    let version = || -> Option<semver::Version> {
        parse_semver(definition.string_matcher_data.as_deref()?)
    };

    let kind = match definition.matcher_type.as_str() {
        "ALL_KEYS" => MatcherKind::AllKeys,
        "WHITELIST" => MatcherKind::Whitelist(set()?),
        "EQUAL_TO" => {
            let (value, data_type) = unary(Granularity::Day)?;
            MatcherKind::EqualTo(value, data_type)
        }
        "GREATER_THAN_OR_EQUAL_TO" => {
            let (value, data_type) = unary(Granularity::Minute)?;
            MatcherKind::GreaterThanOrEqualTo(value, data_type)
        }
        "LESS_THAN_OR_EQUAL_TO" => {
            let (value, data_type) = unary(Granularity::Minute)?;
            MatcherKind::LessThanOrEqualTo(value, data_type)
        }
        "BETWEEN" => {
            let data = definition.between_matcher_data.as_ref()?;
            let data_type = data.data_type.unwrap_or_default();
            MatcherKind::Between {
                start: data_type.operand(data.start, Granularity::Minute)?,
                end: data_type.operand(data.end, Granularity::Minute)?,
                data_type,
            }
        }
        "EQUAL_TO_SET" => MatcherKind::EqualToSet(set()?),
        "CONTAINS_ANY_OF_SET" => MatcherKind::ContainsAnyOfSet(set()?),
        "CONTAINS_ALL_OF_SET" => MatcherKind::ContainsAllOfSet(set()?),
        "PART_OF_SET" => MatcherKind::PartOfSet(set()?),
        "STARTS_WITH" => MatcherKind::StartsWith(whitelist()?),
        "ENDS_WITH" => MatcherKind::EndsWith(whitelist()?),
        "CONTAINS_STRING" => MatcherKind::ContainsString(whitelist()?),
        "MATCHES_STRING" => {
            let pattern = definition.string_matcher_data.as_deref()?;
            MatcherKind::MatchesString(match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Invalid regex for MATCHES_STRING matcher ({}): {}", e, pattern);
                    None
                }
            })
        }
        "EQUAL_TO_BOOLEAN" => MatcherKind::EqualToBoolean(definition.boolean_matcher_data?),
        "EQUAL_TO_SEMVER" => MatcherKind::EqualToSemver(version()?),
        "GREATER_THAN_OR_EQUAL_TO_SEMVER" => MatcherKind::GreaterThanOrEqualToSemver(version()?),
        "LESS_THAN_OR_EQUAL_TO_SEMVER" => MatcherKind::LessThanOrEqualToSemver(version()?),
        "BETWEEN_SEMVER" => {
            let data = definition.between_string_matcher_data.as_ref()?;
            MatcherKind::BetweenSemver {
                start: parse_semver(&data.start)?,
                end: parse_semver(&data.end)?,
            }
        }
        "IN_LIST_SEMVER" => MatcherKind::InListSemver(
            whitelist()?
                .iter()
                .map(|v| parse_semver(v))
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;
    use test_case::test_case;

    fn matcher(definition: serde_json::Value) -> Matcher {
        serde_json::from_value(definition).expect("matcher should parse")
    }

    fn on_attr(matcher_type: &str, operand: serde_json::Value) -> Matcher {
        let mut definition = json!({
            "keySelector": {"trafficType": "user", "attribute": "attr"},
            "matcherType": matcher_type,
            "negate": false,
        });
        if let (Some(map), Some(operand)) = (definition.as_object_mut(), operand.as_object()) {
            map.extend(operand.clone());
        }
        matcher(definition)
    }

    fn eval(matcher: &Matcher, value: impl Into<AttributeValue>) -> bool {
        let key = EvaluationKey::new("some-key").unwrap();
        let attributes = hashmap! {"attr".to_string() => value.into()};
        matcher.matches(&key, Some(&attributes))
    }

    fn whitelist(values: &[&str]) -> serde_json::Value {
        json!({"whitelistMatcherData": {"whitelist": values}})
    }

    #[test]
    fn all_keys_matches_any_key() {
        let m = matcher(json!({"matcherType": "ALL_KEYS", "negate": false}));
        let key = EvaluationKey::new("anyone").unwrap();
        assert!(m.matches(&key, None));
    }

    #[test]
    fn all_keys_does_not_match_missing_attribute() {
        let m = on_attr("ALL_KEYS", json!({}));
        let key = EvaluationKey::new("anyone").unwrap();
        assert!(!m.matches(&key, Some(&hashmap! {})));
        assert!(eval(&m, "present"));
    }

    #[test]
    fn whitelist_on_key() {
        let m = matcher(json!({
            "keySelector": {"trafficType": "user", "attribute": null},
            "matcherType": "WHITELIST",
            "whitelistMatcherData": {"whitelist": ["alice", "bob"]},
        }));
        assert!(m.matches(&EvaluationKey::new("alice").unwrap(), None));
        assert!(!m.matches(&EvaluationKey::new("carol").unwrap(), None));
        assert!(
            !m.matches(&EvaluationKey::new("Alice").unwrap(), None),
            "case sensitive"
        );
    }

    #[test]
    fn whitelist_on_numeric_attribute() {
        let m = on_attr("WHITELIST", whitelist(&["42"]));
        assert!(eval(&m, 42_i64));
        assert!(!eval(&m, 42.5));
    }

    #[test]
    fn numeric_comparisons() {
        let number = |value| json!({"unaryNumericMatcherData": {"dataType": "NUMBER", "value": value}});

        let eq = on_attr("EQUAL_TO", number(10));
        assert!(eval(&eq, 10_i64));
        assert!(eval(&eq, "10"), "numeric strings are converted");
        assert!(!eval(&eq, 11_i64));
        assert!(!eval(&eq, "ten"));

        let gte = on_attr("GREATER_THAN_OR_EQUAL_TO", number(10));
        assert!(eval(&gte, 10_i64));
        assert!(eval(&gte, 11_i64));
        assert!(!eval(&gte, 9_i64));

        let lte = on_attr("LESS_THAN_OR_EQUAL_TO", number(10));
        assert!(eval(&lte, 10_i64));
        assert!(eval(&lte, -3_i64));
        assert!(!eval(&lte, 10.5));
    }

    #[test]
    fn between_is_inclusive() {
        let m = on_attr(
            "BETWEEN",
            json!({"betweenMatcherData": {"dataType": "NUMBER", "start": 5, "end": 10}}),
        );
        assert!(eval(&m, 5_i64));
        assert!(eval(&m, 7.5));
        assert!(eval(&m, 10_i64));
        assert!(!eval(&m, 4.99));
        assert!(!eval(&m, 10.01));
    }

    #[test]
    fn datetime_equality_compares_days() {
        // 2023-11-14T00:00:00Z
        let m = on_attr(
            "EQUAL_TO",
            json!({"unaryNumericMatcherData": {"dataType": "DATETIME", "value": 1_699_920_000_000_i64}}),
        );
        assert!(eval(&m, 1_700_000_000_000_i64), "later the same day");
        assert!(eval(&m, "2023-11-14T23:59:59Z"));
        assert!(!eval(&m, "2023-11-15T00:00:00Z"));
    }

    #[test]
    fn datetime_ranges_compare_minutes() {
        // 2023-11-14T22:13:00Z
        let m = on_attr(
            "GREATER_THAN_OR_EQUAL_TO",
            json!({"unaryNumericMatcherData": {"dataType": "DATETIME", "value": 1_699_999_980_000_i64}}),
        );
        assert!(eval(&m, "2023-11-14T22:13:59Z"), "same minute");
        assert!(!eval(&m, "2023-11-14T22:12:59Z"));

        let between = on_attr(
            "BETWEEN",
            json!({"betweenMatcherData": {
                "dataType": "DATETIME",
                "start": 1_699_999_980_000_i64,
                "end": 1_700_000_040_000_i64
            }}),
        );
        assert!(eval(&between, "2023-11-14T22:14:30Z"));
        assert!(!eval(&between, "2023-11-14T22:15:00Z"));
    }

    #[test_case(&["a", "b"], &["a", "b"], true)]
    #[test_case(&["a", "b"], &["b", "a", "a"], true; "order and duplicates are ignored")]
    #[test_case(&["a", "b"], &["a"], false)]
    #[test_case(&["a", "b"], &["a", "b", "c"], false)]
    fn equal_to_set(rule: &[&str], runtime: &[&str], expected: bool) {
        let m = on_attr("EQUAL_TO_SET", whitelist(rule));
        assert_eq!(eval(&m, runtime.to_vec()), expected);
    }

    #[test_case(&["a", "b"], &["c", "b"], true)]
    #[test_case(&["a", "b"], &["c", "d"], false)]
    fn contains_any_of_set(rule: &[&str], runtime: &[&str], expected: bool) {
        let m = on_attr("CONTAINS_ANY_OF_SET", whitelist(rule));
        assert_eq!(eval(&m, runtime.to_vec()), expected);
    }

    #[test_case(&["a", "b"], &["a", "b", "c"], true)]
    #[test_case(&["a", "b"], &["a", "c"], false)]
    #[test_case(&["a", "b"], &["a"], false)]
    fn contains_all_of_set(rule: &[&str], runtime: &[&str], expected: bool) {
        let m = on_attr("CONTAINS_ALL_OF_SET", whitelist(rule));
        assert_eq!(eval(&m, runtime.to_vec()), expected);
    }

    #[test_case(&["a", "b", "c"], &["a", "c"], true)]
    #[test_case(&["a", "b"], &["a", "b", "c"], false; "longer runtime list")]
    #[test_case(&["a", "b", "c"], &["a", "d"], false)]
    #[test_case(&["a", "b"], &["a", "a", "a"], true; "duplicates collapse before the length check")]
    fn part_of_set(rule: &[&str], runtime: &[&str], expected: bool) {
        let m = on_attr("PART_OF_SET", whitelist(rule));
        assert_eq!(eval(&m, runtime.to_vec()), expected);
    }

    #[test]
    fn set_matchers_need_a_non_empty_list() {
        let m = on_attr("CONTAINS_ANY_OF_SET", whitelist(&["a"]));
        assert!(!eval(&m, "a"));
        assert!(!eval(&m, Vec::<&str>::new()));
    }

    #[test]
    fn string_matchers() {
        let starts = on_attr("STARTS_WITH", whitelist(&["foo", "bar"]));
        assert!(eval(&starts, "food"));
        assert!(eval(&starts, "barn"));
        assert!(!eval(&starts, "Food"), "case sensitive");

        let ends = on_attr("ENDS_WITH", whitelist(&["@example.com"]));
        assert!(eval(&ends, "me@example.com"));
        assert!(!eval(&ends, "example.com.evil"));

        let contains = on_attr("CONTAINS_STRING", whitelist(&["oo"]));
        assert!(eval(&contains, "food"));
        assert!(!eval(&contains, "fd"));
    }

    #[test]
    fn regex_matcher() {
        let m = on_attr("MATCHES_STRING", json!({"stringMatcherData": "hello.*rld"}));
        assert!(eval(&m, "hello world"));
        assert!(!eval(&m, "aloha"));
    }

    #[test]
    fn invalid_regex_never_matches() {
        let m = on_attr("MATCHES_STRING", json!({"stringMatcherData": "***bad regex"}));
        assert!(m.unsupported_type().is_none());
        assert!(!eval(&m, "***bad regex"));
        assert!(!eval(&m, ""));
    }

    #[test]
    fn boolean_matcher() {
        let m = on_attr("EQUAL_TO_BOOLEAN", json!({"booleanMatcherData": true}));
        assert!(eval(&m, true));
        assert!(eval(&m, "True"));
        assert!(!eval(&m, false));
        assert!(!eval(&m, "yes"));
    }

    #[test]
    fn semver_matchers() {
        let eq = on_attr("EQUAL_TO_SEMVER", json!({"stringMatcherData": "2.0.0"}));
        assert!(eval(&eq, "2.0.0"));
        assert!(eval(&eq, "2"), "missing components are filled in with zeroes");
        assert!(eval(&eq, "2.0.0+build"), "build metadata is ignored");
        assert!(!eval(&eq, "2.0.1"));

        let gte = on_attr(
            "GREATER_THAN_OR_EQUAL_TO_SEMVER",
            json!({"stringMatcherData": "2.0.0-rc.2"}),
        );
        assert!(eval(&gte, "2.0.0-rc.10"));
        assert!(eval(&gte, "2.0.0"));
        assert!(!eval(&gte, "2.0.0-rc.1"));

        let lte = on_attr("LESS_THAN_OR_EQUAL_TO_SEMVER", json!({"stringMatcherData": "1.5.0"}));
        assert!(eval(&lte, "1.4.99"));
        assert!(!eval(&lte, "1.10.0"));

        let between = on_attr(
            "BETWEEN_SEMVER",
            json!({"betweenStringMatcherData": {"start": "1.0.0", "end": "2.0.0"}}),
        );
        assert!(eval(&between, "1.0.0"));
        assert!(eval(&between, "2.0.0"));
        assert!(!eval(&between, "2.0.1"));

        let in_list = on_attr("IN_LIST_SEMVER", whitelist(&["1.0.0", "3.1.4"]));
        assert!(eval(&in_list, "3.1.4"));
        assert!(!eval(&in_list, "3.1.5"));
        assert!(!eval(&in_list, 3_i64), "numbers are not versions");
    }

    #[test]
    fn negate_inverts_result() {
        let mut m = on_attr("WHITELIST", whitelist(&["a"]));
        m.negate = true;
        assert!(!eval(&m, "a"));
        assert!(eval(&m, "b"));
    }

    #[test]
    fn negate_applies_to_missing_values() {
        let mut m = on_attr("WHITELIST", whitelist(&["a"]));
        m.negate = true;
        let key = EvaluationKey::new("k").unwrap();
        assert!(m.matches(&key, None));
        assert!(m.matches(&key, Some(&hashmap! {})));
    }

    #[test_case(json!({"matcherType": "IN_SEGMENT", "userDefinedSegmentMatcherData": {"segmentName": "s"}}), "IN_SEGMENT")]
    #[test_case(json!({"matcherType": "WHITELIST"}), "WHITELIST"; "missing operand")]
    #[test_case(json!({"matcherType": "EQUAL_TO_SEMVER", "stringMatcherData": "banana"}), "EQUAL_TO_SEMVER"; "invalid version")]
    #[test_case(json!({"matcherType": "EQUAL_TO", "unaryNumericMatcherData": {"dataType": "NUMBER", "value": "10"}}), "EQUAL_TO"; "string number operand")]
    #[test_case(json!({"matcherType": "BETWEEN", "betweenMatcherData": {"start": 1}}), "BETWEEN"; "incomplete range")]
    #[test_case(json!({"matcherType": "WHITELIST", "whitelistMatcherData": {"whitelist": "a"}}), "WHITELIST"; "scalar whitelist")]
    #[test_case(json!({"matcherType": "EQUAL_TO_BOOLEAN", "booleanMatcherData": "yes"}), "EQUAL_TO_BOOLEAN"; "string boolean operand")]
    fn unsupported_definitions(definition: serde_json::Value, expected: &str) {
        let m = matcher(definition);
        assert_eq!(m.unsupported_type(), Some(expected));
        let key = EvaluationKey::new("k").unwrap();
        assert!(!m.matches(&key, None));
    }

    #[test]
    fn null_negate_is_false() {
        let m = matcher(json!({
            "keySelector": {"trafficType": "user", "attribute": "attr"},
            "matcherType": "WHITELIST",
            "negate": null,
            "whitelistMatcherData": {"whitelist": ["a"]},
        }));
        assert!(!m.negate);
        assert!(eval(&m, "a"));
    }
}
