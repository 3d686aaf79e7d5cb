use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_with::{serde_as, DefaultOnNull};

use crate::attribute_value::Attributes;
use crate::condition::Condition;
use crate::hash::bucket;
use crate::key::EvaluationKey;

/// A flag definition as delivered by the flag service.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub name: String,
    #[serde(default)]
    pub traffic_type_name: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub killed: bool,

    pub seed: i32,
    #[serde(default = "all_traffic")]
    pub traffic_allocation: u32,
    #[serde(default)]
    pub traffic_allocation_seed: Option<i32>,

    pub default_treatment: String,
    #[serde(default)]
    pub change_number: i64,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub configurations: HashMap<String, String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default, deserialize_with = "deserialize_conditions")]
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Archived,
}

/// A dependency on the treatment another flag gives the same key.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Prerequisite {
    #[serde(rename = "n", alias = "flagName")]
    pub flag_name: String,
    #[serde(rename = "ts", alias = "treatments")]
    pub treatments: HashSet<String>,
}

fn all_traffic() -> u32 {
    100
}

// If any matcher cannot be evaluated the flag's targeting is unreliable as a whole, so every key
// is sent to control instead.
fn deserialize_conditions<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Option::<Vec<Condition>>::deserialize(deserializer)?.unwrap_or_default();
    if let Some(matcher_type) = conditions.iter().find_map(Condition::unsupported_matcher) {
        warn!(
            "conditions use unsupported matcher type {}, targeting every key to control",
            matcher_type
        );
        return Ok(vec![Condition::unsupported()]);
    }
    Ok(conditions)
}

impl Prerequisite {
    pub fn is_met_by(&self, treatment: &str) -> bool {
        self.treatments.contains(treatment)
    }
}

impl Flag {
    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived
    }

    /// The configuration payload attached to `treatment`, if any.
    pub fn configuration(&self, treatment: &str) -> Option<&str> {
        self.configurations.get(treatment).map(String::as_str)
    }

    /// Whether the key falls inside the flag's traffic allocation. The allocation has its own seed
    /// so that it can be resized without reshuffling the rollout; older definitions share `seed`.
    pub(crate) fn in_traffic_allocation(&self, key: &EvaluationKey) -> bool {
        if self.traffic_allocation >= 100 {
            return true;
        }
        let seed = self.traffic_allocation_seed.unwrap_or(self.seed);
        bucket(key.bucketing_key(), seed) <= self.traffic_allocation
    }

    /// The treatment and label of the first condition the key satisfies.
    pub(crate) fn match_conditions(
        &self,
        key: &EvaluationKey,
        attributes: Option<&Attributes>,
    ) -> Option<(&str, &str)> {
        let (index, condition) = self
            .conditions
            .iter()
            .enumerate()
            .find(|(_, condition)| condition.matches(key, attributes))?;
        debug!("flag {} matched condition {} ({})", self.name, index, condition.label);
        let treatment = condition
            .treatments
            .treatment_for_key(key.bucketing_key(), self.seed);
        Some((treatment, condition.label.as_str()))
    }
}
