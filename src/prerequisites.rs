use std::sync::Arc;

use log::debug;

use crate::attribute_value::Attributes;
use crate::error::EvaluationError;
use crate::eval::Evaluation;
use crate::flag::Flag;
use crate::key::EvaluationKey;
use crate::maybe_async::MaybeAsync;

/// Evaluates another flag for the same key and attributes, on behalf of a flag that lists it as a
/// prerequisite.
///
/// This is normally the top-level evaluation entry point itself, which makes dependency chains of
/// any depth possible. The returned value must not borrow `self` or `flag_name`.
pub trait CrossEvaluator<'a>: Send + Sync {
    fn evaluate(
        &self,
        key: &'a EvaluationKey,
        flag_name: &str,
        attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, Result<Evaluation, EvaluationError>>;
}

impl<'a, T: CrossEvaluator<'a> + ?Sized> CrossEvaluator<'a> for &T {
    fn evaluate(
        &self,
        key: &'a EvaluationKey,
        flag_name: &str,
        attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, Result<Evaluation, EvaluationError>> {
        (**self).evaluate(key, flag_name, attributes)
    }
}

/// Checks the flag's prerequisites in order, stopping at the first one whose flag does not give
/// the key one of the allowed treatments. Later prerequisites are then never evaluated.
///
/// A failed cross evaluation is returned as an error rather than counted as unmet.
pub fn all_met<'a, E>(
    flag: Arc<Flag>,
    key: &'a EvaluationKey,
    attributes: Option<&'a Attributes>,
    evaluator: E,
) -> MaybeAsync<'a, Result<bool, EvaluationError>>
where
    E: CrossEvaluator<'a> + 'a,
{
    check_from(flag, 0, key, attributes, evaluator)
}

fn check_from<'a, E>(
    flag: Arc<Flag>,
    index: usize,
    key: &'a EvaluationKey,
    attributes: Option<&'a Attributes>,
    evaluator: E,
) -> MaybeAsync<'a, Result<bool, EvaluationError>>
where
    E: CrossEvaluator<'a> + 'a,
{
    let prerequisite = match flag.prerequisites.get(index) {
        Some(prerequisite) => prerequisite,
        None => return MaybeAsync::Ready(Ok(true)),
    };

    evaluator
        .evaluate(key, &prerequisite.flag_name, attributes)
        .and_then(move |result| {
            let evaluation = match result {
                Ok(evaluation) => evaluation,
                Err(e) => return MaybeAsync::Ready(Err(e)),
            };

            let met = flag
                .prerequisites
                .get(index)
                .map_or(false, |prerequisite| prerequisite.is_met_by(&evaluation.treatment));
            if !met {
                debug!(
                    "flag {} got treatment {} from prerequisite {}",
                    flag.name, evaluation.treatment, index
                );
                return MaybeAsync::Ready(Ok(false));
            }

            check_from(flag, index + 1, key, attributes, evaluator)
        })
}
