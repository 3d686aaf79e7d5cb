use thiserror::Error;

use crate::store::StoreError;

/// Raised when an [crate::EvaluationKey] cannot be built from the supplied parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyError {
    /// The matching key was empty.
    #[error("matching key must be a non-empty string")]
    EmptyMatchingKey,
    /// The bucketing key was supplied but empty.
    #[error("bucketing key must be a non-empty string")]
    EmptyBucketingKey,
}

/// A failure that prevented a flag from being evaluated.
///
/// These never reach callers of [crate::evaluate_feature]; they are logged and converted into the
/// `exception` fallback outcome.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvaluationError {
    /// The injected store could not serve a flag definition.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A prerequisite chain led back to a flag that is already being evaluated.
    #[error("prerequisite on `{0}` is circular")]
    CircularPrerequisite(String),
}
