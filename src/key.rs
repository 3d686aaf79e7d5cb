use serde::Deserialize;

use crate::error::KeyError;

/// The normalized form of a caller-supplied key.
///
/// The matching key is what matchers compare against; the bucketing key feeds the hash that drives
/// traffic allocation and percentage rollouts. When no bucketing key is supplied, the matching key
/// is used for both.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "KeyVariant")]
pub struct EvaluationKey {
    matching_key: String,
    bucketing_key: String,
}

impl EvaluationKey {
    /// Builds a key whose bucketing key is the same as its matching key.
    pub fn new(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(KeyError::EmptyMatchingKey);
        }
        Ok(Self {
            bucketing_key: key.clone(),
            matching_key: key,
        })
    }

    /// Builds a key with a distinct bucketing key.
    pub fn with_bucketing_key(
        matching_key: impl Into<String>,
        bucketing_key: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let matching_key = matching_key.into();
        let bucketing_key = bucketing_key.into();
        if matching_key.is_empty() {
            return Err(KeyError::EmptyMatchingKey);
        }
        if bucketing_key.is_empty() {
            return Err(KeyError::EmptyBucketingKey);
        }
        Ok(Self {
            matching_key,
            bucketing_key,
        })
    }

    pub fn matching_key(&self) -> &str {
        &self.matching_key
    }

    pub fn bucketing_key(&self) -> &str {
        &self.bucketing_key
    }
}

impl TryFrom<&str> for EvaluationKey {
    type Error = KeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        EvaluationKey::new(key)
    }
}

// Keys arrive either as a bare string or as an object with explicit matching and bucketing keys.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyVariant {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Composite {
        matching_key: String,
        bucketing_key: Option<String>,
    },
}

impl TryFrom<KeyVariant> for EvaluationKey {
    type Error = KeyError;

    fn try_from(variant: KeyVariant) -> Result<Self, Self::Error> {
        match variant {
            KeyVariant::Plain(key)
            | KeyVariant::Composite {
                matching_key: key,
                bucketing_key: None,
            } => EvaluationKey::new(key),
            KeyVariant::Composite {
                matching_key,
                bucketing_key: Some(bucketing_key),
            } => EvaluationKey::with_bucketing_key(matching_key, bucketing_key),
        }
    }
}
