use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::attribute_value::Attributes;
use crate::error::EvaluationError;
use crate::fallback::FallbackResolution;
use crate::flag::Flag;
use crate::key::EvaluationKey;
use crate::maybe_async::MaybeAsync;
use crate::prerequisites::{self, CrossEvaluator};

/// The treatment returned whenever no meaningful treatment can be computed.
pub const CONTROL: &str = "control";

/// Machine-readable reasons for an outcome that was not decided by one of the flag's conditions.
/// Conditions carry their own label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    /// The flag is killed; every key gets the default treatment.
    Killed,
    /// No condition matched the key.
    DefaultRule,
    /// The store does not know the flag.
    DefinitionNotFound,
    /// The evaluation could not complete.
    Exception,
    /// The flag is archived; every key gets `control`.
    Archived,
    /// The key falls outside the flag's traffic allocation.
    NotInSplit,
    /// The flag uses a matcher this crate cannot evaluate.
    UnsupportedMatcher,
    /// One of the flag's prerequisites did not give the key an allowed treatment.
    PrerequisitesNotMet,
}

impl Label {
    pub const fn as_str(self) -> &'static str {
        match self {
            Label::Killed => "killed",
            Label::DefaultRule => "default rule",
            Label::DefinitionNotFound => "definition not found",
            Label::Exception => "exception",
            Label::Archived => "archived",
            Label::NotInSplit => "not in split",
            Label::UnsupportedMatcher => "targeting rule type unsupported by sdk",
            Label::PrerequisitesNotMet => "prerequisites not fulfilled",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of evaluating a flag for one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub treatment: String,
    pub label: String,
    /// The configuration payload the flag attaches to `treatment`.
    pub config: Option<String>,
    /// The version of the flag definition that was evaluated; unknown when no definition was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_number: Option<i64>,
}

impl Evaluation {
    fn for_flag(flag: &Flag, treatment: &str, label: &str) -> Self {
        Evaluation {
            treatment: treatment.to_string(),
            label: label.to_string(),
            config: flag.configuration(treatment).map(str::to_string),
            change_number: Some(flag.change_number),
        }
    }

    pub(crate) fn not_found() -> Self {
        Evaluation {
            treatment: CONTROL.to_string(),
            label: Label::DefinitionNotFound.to_string(),
            config: None,
            change_number: None,
        }
    }
}

impl From<FallbackResolution> for Evaluation {
    fn from(resolution: FallbackResolution) -> Self {
        Evaluation {
            treatment: resolution.treatment,
            label: resolution.label.unwrap_or_default(),
            config: resolution.config,
            change_number: None,
        }
    }
}

/// Evaluate a flag for the specified key.
///
/// The first applicable step decides the outcome:
///
/// 1. an archived flag gives `control`,
/// 2. a killed flag gives its default treatment,
/// 3. unmet prerequisites give the default treatment,
/// 4. keys outside the traffic allocation get the default treatment,
/// 5. the first condition the key matches distributes it over the condition's partitions,
/// 6. otherwise the key gets the default treatment.
///
/// Prerequisites are the only step that may be deferred; they are resolved through `evaluator`.
/// The configuration for the chosen treatment and the flag's change number are attached to the
/// result.
pub fn evaluate<'a, E>(
    flag: Arc<Flag>,
    key: &'a EvaluationKey,
    attributes: Option<&'a Attributes>,
    evaluator: E,
) -> MaybeAsync<'a, Result<Evaluation, EvaluationError>>
where
    E: CrossEvaluator<'a> + 'a,
{
    if flag.is_archived() {
        return MaybeAsync::Ready(Ok(Evaluation::for_flag(
            &flag,
            CONTROL,
            Label::Archived.as_str(),
        )));
    }

    if flag.killed {
        return MaybeAsync::Ready(Ok(Evaluation::for_flag(
            &flag,
            &flag.default_treatment,
            Label::Killed.as_str(),
        )));
    }

    prerequisites::all_met(flag.clone(), key, attributes, evaluator).map(
        move |met| -> Result<Evaluation, EvaluationError> {
            if !met? {
                return Ok(Evaluation::for_flag(
                    &flag,
                    &flag.default_treatment,
                    Label::PrerequisitesNotMet.as_str(),
                ));
            }
            Ok(evaluate_targeting(&flag, key, attributes))
        },
    )
}

fn evaluate_targeting(
    flag: &Flag,
    key: &EvaluationKey,
    attributes: Option<&Attributes>,
) -> Evaluation {
    if !flag.in_traffic_allocation(key) {
        debug!("key {} is outside the traffic allocation of {}", key.matching_key(), flag.name);
        return Evaluation::for_flag(flag, &flag.default_treatment, Label::NotInSplit.as_str());
    }

    match flag.match_conditions(key, attributes) {
        Some((treatment, label)) => Evaluation::for_flag(flag, treatment, label),
        None => Evaluation::for_flag(flag, &flag.default_treatment, Label::DefaultRule.as_str()),
    }
}
