#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};

use crate::attribute_value::Attributes;
use crate::error::EvaluationError;
use crate::eval::{Evaluation, CONTROL};
use crate::flag::Flag;
use crate::key::EvaluationKey;
use crate::maybe_async::MaybeAsync;
use crate::prerequisites::CrossEvaluator;
use crate::store::{FlagLookup, Store, StoreError};

pub struct TestStore {
    flags: HashMap<String, Arc<Flag>>,
}

impl TestStore {
    pub fn new() -> Self {
        let definitions = [
            r#"{
                "name": "simple",
                "trafficTypeName": "user",
                "seed": 1,
                "defaultTreatment": "off",
                "changeNumber": 10,
                "configurations": {"on": "{\"color\":\"green\"}"},
                "conditions": [{
                    "conditionType": "ROLLOUT",
                    "matcherGroup": {"combiner": "AND", "matchers": [{
                        "keySelector": {"trafficType": "user", "attribute": null},
                        "matcherType": "ALL_KEYS",
                        "negate": false
                    }]},
                    "partitions": [{"treatment": "on", "size": 100}],
                    "label": "default rule"
                }]
            }"#,
            r#"{
                "name": "full",
                "trafficTypeName": "user",
                "status": "ACTIVE",
                "killed": false,
                "seed": -1222652054,
                "trafficAllocation": 100,
                "trafficAllocationSeed": 1234,
                "defaultTreatment": "off",
                "changeNumber": 1700000000000,
                "configurations": {"on": "{\"color\":\"blue\"}"},
                "prerequisites": [{"n": "simple", "ts": ["on"]}],
                "conditions": [
                    {
                        "conditionType": "WHITELIST",
                        "matcherGroup": {"combiner": "AND", "matchers": [{
                            "keySelector": {"trafficType": "user", "attribute": "plan"},
                            "matcherType": "WHITELIST",
                            "negate": false,
                            "whitelistMatcherData": {"whitelist": ["pro"]},
                            "unaryNumericMatcherData": null,
                            "betweenMatcherData": null,
                            "booleanMatcherData": null,
                            "stringMatcherData": null,
                            "betweenStringMatcherData": null
                        }]},
                        "partitions": [{"treatment": "on", "size": 100}],
                        "label": "pro plan"
                    },
                    {
                        "conditionType": "ROLLOUT",
                        "matcherGroup": {"combiner": "AND", "matchers": [{
                            "keySelector": {"trafficType": "user", "attribute": null},
                            "matcherType": "ALL_KEYS",
                            "negate": false,
                            "whitelistMatcherData": null,
                            "unaryNumericMatcherData": null,
                            "betweenMatcherData": null,
                            "booleanMatcherData": null,
                            "stringMatcherData": null,
                            "betweenStringMatcherData": null
                        }]},
                        "partitions": [
                            {"treatment": "on", "size": 50},
                            {"treatment": "off", "size": 50}
                        ],
                        "label": "default rule"
                    }
                ]
            }"#,
            r#"{
                "name": "killed",
                "seed": 5,
                "killed": true,
                "defaultTreatment": "off",
                "changeNumber": 3,
                "conditions": []
            }"#,
            r#"{
                "name": "requires-killed",
                "seed": 5,
                "defaultTreatment": "off",
                "prerequisites": [{"n": "killed", "ts": ["on"]}],
                "conditions": []
            }"#,
            r#"{
                "name": "requires-missing",
                "seed": 5,
                "defaultTreatment": "off",
                "prerequisites": [{"n": "not-in-store", "ts": ["on"]}],
                "conditions": []
            }"#,
            r#"{
                "name": "cycle-a",
                "seed": 5,
                "defaultTreatment": "off",
                "prerequisites": [{"n": "cycle-b", "ts": ["on"]}],
                "conditions": []
            }"#,
            r#"{
                "name": "cycle-b",
                "seed": 5,
                "defaultTreatment": "off",
                "prerequisites": [{"n": "cycle-a", "ts": ["on"]}],
                "conditions": []
            }"#,
            r#"{
                "name": "self-loop",
                "seed": 5,
                "defaultTreatment": "off",
                "prerequisites": [{"n": "self-loop", "ts": ["on"]}],
                "conditions": []
            }"#,
        ];

        let flags = definitions
            .iter()
            .map(|definition| {
                let flag: Flag = serde_json::from_str(definition).unwrap();
                (flag.name.clone(), Arc::new(flag))
            })
            .collect();
        Self { flags }
    }
}

impl Store for TestStore {
    fn flag<'a>(&'a self, name: &str) -> MaybeAsync<'a, FlagLookup> {
        self.flags.flag(name)
    }
}

/// Answers every lookup of the wrapped store through a future.
pub struct DeferredStore<S>(pub S);

impl<S: Store> Store for DeferredStore<S> {
    fn flag<'a>(&'a self, name: &str) -> MaybeAsync<'a, FlagLookup> {
        let lookup = self.0.flag(name);
        MaybeAsync::deferred(lookup.into_future())
    }
}

/// A store whose backend is always down.
pub struct FailingStore {
    pub deferred: bool,
}

impl Store for FailingStore {
    fn flag<'a>(&'a self, _name: &str) -> MaybeAsync<'a, FlagLookup> {
        let error = Err(StoreError::Unavailable("connection refused".to_string()));
        if self.deferred {
            MaybeAsync::deferred(async move { error })
        } else {
            MaybeAsync::Ready(error)
        }
    }
}

/// A cross evaluator that answers from a fixed table of treatments and records what it was asked.
pub struct FixedEvaluator {
    treatments: HashMap<String, String>,
    failing: HashSet<String>,
    deferred: bool,
    calls: Mutex<Vec<String>>,
}

impl FixedEvaluator {
    pub fn new(treatments: &[(&str, &str)]) -> Self {
        Self {
            treatments: treatments
                .iter()
                .map(|(name, treatment)| (name.to_string(), treatment.to_string()))
                .collect(),
            failing: HashSet::new(),
            deferred: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn deferred(self) -> Self {
        Self {
            deferred: true,
            ..self
        }
    }

    pub fn failing_on(mut self, flag_name: &str) -> Self {
        self.failing.insert(flag_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl<'a> CrossEvaluator<'a> for FixedEvaluator {
    fn evaluate(
        &self,
        _key: &'a EvaluationKey,
        flag_name: &str,
        _attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, Result<Evaluation, EvaluationError>> {
        self.calls.lock().unwrap().push(flag_name.to_string());

        let result = if self.failing.contains(flag_name) {
            Err(EvaluationError::CircularPrerequisite(flag_name.to_string()))
        } else {
            Ok(Evaluation {
                treatment: self
                    .treatments
                    .get(flag_name)
                    .map_or(CONTROL, String::as_str)
                    .to_string(),
                label: "default rule".to_string(),
                config: None,
                change_number: Some(1),
            })
        };

        if self.deferred {
            MaybeAsync::deferred(async move { result })
        } else {
            MaybeAsync::Ready(result)
        }
    }
}
