use std::collections::HashMap;

use itertools::{Either, Itertools};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

use crate::eval::CONTROL;

const MAX_LENGTH: usize = 100;
const LABEL_PREFIX: &str = "fallback - ";

lazy_static! {
    static ref TREATMENT_REGEX: Regex =
        Regex::new(r"^[0-9]+[.a-zA-Z0-9_-]*$|^[a-zA-Z]+[a-zA-Z0-9_-]*$")
            .expect("treatment regex should compile");
}

/// A treatment to return, with an optional configuration payload, when a flag cannot be evaluated.
///
/// In configuration it may be written as a bare treatment name or as an object.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(from = "FallbackTreatmentDefinition")]
pub struct FallbackTreatment {
    pub treatment: String,
    pub config: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FallbackTreatmentDefinition {
    Treatment(String),
    Detailed {
        treatment: String,
        #[serde(default)]
        config: Option<String>,
    },
}

impl From<FallbackTreatmentDefinition> for FallbackTreatment {
    fn from(definition: FallbackTreatmentDefinition) -> Self {
        match definition {
            FallbackTreatmentDefinition::Treatment(treatment) => FallbackTreatment {
                treatment,
                config: None,
            },
            FallbackTreatmentDefinition::Detailed { treatment, config } => {
                FallbackTreatment { treatment, config }
            }
        }
    }
}

impl FallbackTreatment {
    pub fn new(treatment: impl Into<String>) -> Self {
        FallbackTreatment {
            treatment: treatment.into(),
            config: None,
        }
    }

    pub fn with_config(treatment: impl Into<String>, config: impl Into<String>) -> Self {
        FallbackTreatment {
            treatment: treatment.into(),
            config: Some(config.into()),
        }
    }
}

/// User supplied fallback treatments: one for every flag, and overrides for named flags.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FallbackTreatmentsConfiguration {
    #[serde(default)]
    pub global: Option<FallbackTreatment>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub by_flag: HashMap<String, FallbackTreatment>,
}

/// What to return for a flag whose evaluation could not complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackResolution {
    pub treatment: String,
    pub config: Option<String>,
    pub label: Option<String>,
}

/// Resolves fallback treatments from a sanitized [FallbackTreatmentsConfiguration].
#[derive(Clone, Debug, Default)]
pub struct FallbackTreatmentsCalculator {
    global: Option<FallbackTreatment>,
    by_flag: HashMap<String, FallbackTreatment>,
}

impl FallbackTreatmentsCalculator {
    /// Builds a calculator, dropping every entry whose flag name or treatment is invalid. This
    /// never fails; each dropped entry is logged.
    pub fn new(configuration: FallbackTreatmentsConfiguration) -> Self {
        let global = configuration
            .global
            .filter(|fallback| match treatment_problem(&fallback.treatment) {
                Some(problem) => {
                    warn!("dropping global fallback treatment: {}", problem);
                    false
                }
                None => true,
            });

        let (by_flag, dropped): (HashMap<_, _>, Vec<_>) = configuration
            .by_flag
            .into_iter()
            .partition_map(|(flag_name, fallback)| {
                let problem = flag_name_problem(&flag_name)
                    .or_else(|| treatment_problem(&fallback.treatment));
                match problem {
                    None => Either::Left((flag_name, fallback)),
                    Some(problem) => Either::Right((flag_name, problem)),
                }
            });
        for (flag_name, problem) in dropped.into_iter().sorted() {
            warn!("dropping fallback treatment for flag {}: {}", flag_name, problem);
        }

        FallbackTreatmentsCalculator { global, by_flag }
    }

    /// The fallback for `flag_name`: its own override, else the global one, else `control`.
    ///
    /// When a configured fallback is used the label is prefixed with `fallback - `. A missing label
    /// stays missing.
    pub fn resolve(&self, flag_name: &str, label: Option<&str>) -> FallbackResolution {
        match self.by_flag.get(flag_name).or(self.global.as_ref()) {
            Some(fallback) => FallbackResolution {
                treatment: fallback.treatment.clone(),
                config: fallback.config.clone(),
                label: label.map(|label| format!("{}{}", LABEL_PREFIX, label)),
            },
            None => FallbackResolution {
                treatment: CONTROL.to_string(),
                config: None,
                label: label.map(str::to_string),
            },
        }
    }
}

fn flag_name_problem(flag_name: &str) -> Option<&'static str> {
    if flag_name.chars().count() > MAX_LENGTH {
        Some("flag name is longer than 100 characters")
    } else if flag_name.chars().any(char::is_whitespace) {
        Some("flag name contains whitespace")
    } else {
        None
    }
}

fn treatment_problem(treatment: &str) -> Option<&'static str> {
    if treatment.chars().count() > MAX_LENGTH {
        Some("treatment is longer than 100 characters")
    } else if !TREATMENT_REGEX.is_match(treatment) {
        Some("treatment is not a valid treatment name")
    } else {
        None
    }
}
