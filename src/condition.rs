use serde::Deserialize;

use crate::attribute_value::Attributes;
use crate::eval::{Label, CONTROL};
use crate::key::EvaluationKey;
use crate::matcher::Matcher;
use crate::treatments::{Partition, Treatments};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    Whitelist,
    #[default]
    Rollout,
}

/// How the matchers of a group are joined. Only AND exists today.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Combiner {
    #[default]
    And,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MatcherGroup {
    #[serde(default)]
    pub combiner: Combiner,
    pub matchers: Vec<Matcher>,
}

/// One targeting rule: when its matchers all hold, the key is distributed over its partitions.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub condition_type: ConditionType,
    pub matcher_group: MatcherGroup,
    #[serde(rename = "partitions")]
    pub treatments: Treatments,
    #[serde(default)]
    pub label: String,
}

impl MatcherGroup {
    pub fn matches(&self, key: &EvaluationKey, attributes: Option<&Attributes>) -> bool {
        match self.combiner {
            Combiner::And => self
                .matchers
                .iter()
                .all(|matcher| matcher.matches(key, attributes)),
        }
    }
}

impl Condition {
    pub fn matches(&self, key: &EvaluationKey, attributes: Option<&Attributes>) -> bool {
        self.matcher_group.matches(key, attributes)
    }

    /// The catch-all condition that sends every key to `control`.
    pub(crate) fn unsupported() -> Self {
        Condition {
            condition_type: ConditionType::Whitelist,
            matcher_group: MatcherGroup {
                combiner: Combiner::And,
                matchers: vec![Matcher::all_keys()],
            },
            treatments: Treatments::from(vec![Partition::new(CONTROL, 100)]),
            label: Label::UnsupportedMatcher.to_string(),
        }
    }

    pub(crate) fn unsupported_matcher(&self) -> Option<&str> {
        self.matcher_group
            .matchers
            .iter()
            .find_map(Matcher::unsupported_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;
    use spectral::prelude::*;

    fn condition(matchers: serde_json::Value) -> Condition {
        serde_json::from_value(json!({
            "conditionType": "ROLLOUT",
            "matcherGroup": {"combiner": "AND", "matchers": matchers},
            "partitions": [{"treatment": "on", "size": 100}],
            "label": "in segment all"
        }))
        .expect("condition should parse")
    }

    #[test]
    fn parses_defaults() {
        let condition: Condition = serde_json::from_value(json!({
            "matcherGroup": {"matchers": [{"matcherType": "ALL_KEYS"}]},
            "partitions": [{"treatment": "on", "size": 100}]
        }))
        .unwrap();
        assert_that!(condition.condition_type).is_equal_to(ConditionType::Rollout);
        assert_that!(condition.matcher_group.combiner).is_equal_to(Combiner::And);
        assert_that!(condition.label.as_str()).is_equal_to("");
        assert_that!(condition.unsupported_matcher()).is_none();
    }

    #[test]
    fn rejects_unknown_combiner() {
        let parsed = serde_json::from_value::<Condition>(json!({
            "matcherGroup": {"combiner": "OR", "matchers": []},
            "partitions": []
        }));
        assert_that!(parsed).is_err();
    }

    #[test]
    fn all_matchers_must_hold() {
        let c = condition(json!([
            {"keySelector": {"attribute": "plan"}, "matcherType": "WHITELIST",
             "whitelistMatcherData": {"whitelist": ["pro"]}},
            {"keySelector": {"attribute": "age"}, "matcherType": "GREATER_THAN_OR_EQUAL_TO",
             "unaryNumericMatcherData": {"dataType": "NUMBER", "value": 18}}
        ]));
        let key = EvaluationKey::new("k").unwrap();

        let adult_pro: Attributes = hashmap! {"plan".to_string() => "pro".into(), "age".to_string() => 30_i64.into()};
        assert!(c.matches(&key, Some(&adult_pro)));

        let minor_pro: Attributes = hashmap! {"plan".to_string() => "pro".into(), "age".to_string() => 12_i64.into()};
        assert!(!c.matches(&key, Some(&minor_pro)));

        let adult_free: Attributes = hashmap! {"plan".to_string() => "free".into(), "age".to_string() => 30_i64.into()};
        assert!(!c.matches(&key, Some(&adult_free)));
    }

    #[test]
    fn empty_group_matches() {
        let c = condition(json!([]));
        assert!(c.matches(&EvaluationKey::new("k").unwrap(), None));
    }

    #[test]
    fn reports_unsupported_matchers() {
        let c = condition(json!([
            {"matcherType": "ALL_KEYS"},
            {"matcherType": "IN_LARGE_SEGMENT"}
        ]));
        assert_that!(c.unsupported_matcher()).contains_value("IN_LARGE_SEGMENT");
    }

    #[test]
    fn unsupported_condition_sends_everyone_to_control() {
        let c = Condition::unsupported();
        let key = EvaluationKey::new("anyone").unwrap();
        assert!(c.matches(&key, None));
        assert_that!(c.treatments.treatment_for(42)).is_equal_to("control");
        assert_that!(c.label.as_str()).is_equal_to(Label::UnsupportedMatcher.as_str());
    }
}
