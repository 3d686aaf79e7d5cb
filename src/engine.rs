use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::attribute_value::Attributes;
use crate::error::EvaluationError;
use crate::eval::{self, Evaluation, Label};
use crate::fallback::FallbackTreatmentsCalculator;
use crate::key::EvaluationKey;
use crate::maybe_async::MaybeAsync;
use crate::prerequisites::CrossEvaluator;
use crate::store::Store;

/// Evaluate the flag named `flag_name` for a key.
///
/// The flag is looked up in `store`. A flag the store does not know gives `control` with the
/// `definition not found` label; fallbacks are not consulted for it. Any failure, whether in the
/// lookup or while resolving prerequisites through `evaluator`, is logged and answered with the
/// `exception` fallback from `fallback`. This function never returns an error.
pub fn evaluate_feature<'a, S, E>(
    key: &'a EvaluationKey,
    flag_name: &str,
    attributes: Option<&'a Attributes>,
    store: &'a S,
    fallback: &'a FallbackTreatmentsCalculator,
    evaluator: E,
) -> MaybeAsync<'a, Evaluation>
where
    S: Store + ?Sized,
    E: CrossEvaluator<'a> + 'a,
{
    let name = flag_name.to_string();
    let missing = name.clone();

    store
        .flag(flag_name)
        .and_then(move |lookup| match lookup {
            Ok(Some(flag)) => eval::evaluate(flag, key, attributes, evaluator),
            Ok(None) => {
                debug!("flag {} not found", missing);
                MaybeAsync::Ready(Ok(Evaluation::not_found()))
            }
            Err(e) => MaybeAsync::Ready(Err(EvaluationError::from(e))),
        })
        .map(move |result| {
            result.unwrap_or_else(|e| {
                warn!("evaluation of flag {} failed: {}", name, e);
                fallback
                    .resolve(&name, Some(Label::Exception.as_str()))
                    .into()
            })
        })
}

/// Evaluates flags from a store, resolving prerequisites against the same store.
///
/// The engine remembers which flags an evaluation passes through on its way down a prerequisite
/// chain. A prerequisite that leads back to one of them fails with
/// [EvaluationError::CircularPrerequisite], so the flag that asked for it gets the `exception`
/// fallback.
pub struct Engine<S> {
    store: S,
    fallback: FallbackTreatmentsCalculator,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, fallback: FallbackTreatmentsCalculator) -> Self {
        Engine { store, fallback }
    }

    /// Evaluate one flag. See [evaluate_feature].
    pub fn evaluate<'a>(
        &'a self,
        key: &'a EvaluationKey,
        flag_name: &str,
        attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, Evaluation> {
        self.evaluate_in_chain(key, flag_name, attributes, EvaluationChain::default())
    }

    /// Evaluate several flags for the same key, keyed by flag name.
    ///
    /// Deferred lookups are driven concurrently; if every lookup is immediate so is the result.
    pub fn evaluate_many<'a>(
        &'a self,
        key: &'a EvaluationKey,
        flag_names: &[&str],
        attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, HashMap<String, Evaluation>> {
        let names: Vec<String> = flag_names.iter().map(|name| name.to_string()).collect();
        let evaluations = flag_names
            .iter()
            .map(|name| self.evaluate(key, name, attributes));
        MaybeAsync::join_all(evaluations)
            .map(move |evaluations| names.into_iter().zip(evaluations).collect())
    }

    fn evaluate_in_chain<'a>(
        &'a self,
        key: &'a EvaluationKey,
        flag_name: &str,
        attributes: Option<&'a Attributes>,
        chain: EvaluationChain,
    ) -> MaybeAsync<'a, Evaluation> {
        let evaluator = ChainedEvaluator {
            engine: self,
            chain: chain.with(flag_name),
        };
        evaluate_feature(
            key,
            flag_name,
            attributes,
            &self.store,
            &self.fallback,
            evaluator,
        )
    }
}

#[derive(Clone, Debug, Default)]
struct EvaluationChain {
    flags: HashSet<String>,
}

impl EvaluationChain {
    fn contains(&self, flag_name: &str) -> bool {
        self.flags.contains(flag_name)
    }

    fn with(mut self, flag_name: &str) -> Self {
        self.flags.insert(flag_name.to_string());
        self
    }
}

struct ChainedEvaluator<'a, S> {
    engine: &'a Engine<S>,
    chain: EvaluationChain,
}

impl<'a, S: Store> CrossEvaluator<'a> for ChainedEvaluator<'a, S> {
    fn evaluate(
        &self,
        key: &'a EvaluationKey,
        flag_name: &str,
        attributes: Option<&'a Attributes>,
    ) -> MaybeAsync<'a, Result<Evaluation, EvaluationError>> {
        if self.chain.contains(flag_name) {
            warn!(
                "prerequisite relationship to {} caused a circular reference; this is probably a temporary condition due to an incomplete update",
                flag_name
            );
            return MaybeAsync::Ready(Err(EvaluationError::CircularPrerequisite(
                flag_name.to_string(),
            )));
        }
        self.engine
            .evaluate_in_chain(key, flag_name, attributes, self.chain.clone())
            .map(Ok)
    }
}
