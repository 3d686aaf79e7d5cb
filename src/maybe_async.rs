use std::fmt;
use std::future::{Future, IntoFuture};

use futures::future::{self, BoxFuture, FutureExt};

/// A value that is either available now or will be produced by a future.
///
/// Stores and cross-flag evaluators may answer immediately (in-memory data) or later (network
/// backed data). Evaluation logic is written once against the combinators below: when every input
/// is [MaybeAsync::Ready] they collapse into plain function calls and no future is ever allocated;
/// as soon as one input is [MaybeAsync::Deferred] the remainder of the chain runs inside a future
/// with the same step ordering.
pub enum MaybeAsync<'a, T> {
    /// The value is already available.
    Ready(T),
    /// The value will be produced by the future.
    Deferred(BoxFuture<'a, T>),
}

impl<'a, T: Send + 'a> MaybeAsync<'a, T> {
    /// Wraps a future as a deferred value.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'a,
    {
        MaybeAsync::Deferred(future.boxed())
    }

    /// Returns true if the value is available without awaiting.
    pub fn is_ready(&self) -> bool {
        matches!(self, MaybeAsync::Ready(_))
    }

    /// Returns the value if it is available now, or gives back `self` unchanged otherwise.
    pub fn try_ready(self) -> Result<T, Self> {
        match self {
            MaybeAsync::Ready(value) => Ok(value),
            deferred => Err(deferred),
        }
    }

    /// Applies `f` to the value, immediately if it is ready.
    pub fn map<U, F>(self, f: F) -> MaybeAsync<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        match self {
            MaybeAsync::Ready(value) => MaybeAsync::Ready(f(value)),
            MaybeAsync::Deferred(future) => MaybeAsync::Deferred(future.map(f).boxed()),
        }
    }

    /// Chains a computation that may itself be deferred.
    pub fn and_then<U, F>(self, f: F) -> MaybeAsync<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> MaybeAsync<'a, U> + Send + 'a,
    {
        match self {
            MaybeAsync::Ready(value) => f(value),
            MaybeAsync::Deferred(future) => MaybeAsync::Deferred(
                async move {
                    match f(future.await) {
                        MaybeAsync::Ready(value) => value,
                        MaybeAsync::Deferred(next) => next.await,
                    }
                }
                .boxed(),
            ),
        }
    }

    /// Collects many values, preserving order.
    ///
    /// If every value is ready the result is ready. Otherwise all deferred values are driven
    /// concurrently rather than one after another.
    pub fn join_all<I>(values: I) -> MaybeAsync<'a, Vec<T>>
    where
        I: IntoIterator<Item = MaybeAsync<'a, T>>,
    {
        let values: Vec<MaybeAsync<'a, T>> = values.into_iter().collect();
        if values.iter().all(MaybeAsync::is_ready) {
            return MaybeAsync::Ready(
                values
                    .into_iter()
                    .filter_map(|value| value.try_ready().ok())
                    .collect(),
            );
        }
        MaybeAsync::Deferred(future::join_all(values.into_iter().map(IntoFuture::into_future)).boxed())
    }
}

impl<'a, T: Send + 'a> IntoFuture for MaybeAsync<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            MaybeAsync::Ready(value) => future::ready(value).boxed(),
            MaybeAsync::Deferred(future) => future,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MaybeAsync<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeAsync::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            MaybeAsync::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
