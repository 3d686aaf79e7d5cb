use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::flag::Flag;
use crate::maybe_async::MaybeAsync;

/// The outcome of a flag lookup: the definition, `None` if the store does not know the flag, or an
/// error if the store could not answer.
pub type FlagLookup = Result<Option<Arc<Flag>>, StoreError>;

/// Store is an interface for a data store that holds the flag definitions received by the SDK.
///
/// Implementations backed by memory answer with [MaybeAsync::Ready]; implementations backed by a
/// remote key-value store answer with [MaybeAsync::Deferred]. The returned value must not borrow
/// `name`.
pub trait Store: Send + Sync {
    /// Retrieve the flag named `name`.
    fn flag<'a>(&'a self, name: &str) -> MaybeAsync<'a, FlagLookup>;
}

/// Raised by a [Store] that could not serve a lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing storage could not be reached or refused the request.
    #[error("flag store is unavailable: {0}")]
    Unavailable(String),

    /// The stored definition could not be decoded.
    #[error("definition of flag `{name}` is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

impl Store for HashMap<String, Arc<Flag>> {
    fn flag<'a>(&'a self, name: &str) -> MaybeAsync<'a, FlagLookup> {
        MaybeAsync::Ready(Ok(self.get(name).cloned()))
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn flag<'a>(&'a self, name: &str) -> MaybeAsync<'a, FlagLookup> {
        (**self).flag(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_common::{DeferredStore, TestStore};
    use futures::executor::block_on;
    use spectral::prelude::*;
    use std::future::IntoFuture;

    #[test]
    fn hash_map_store_answers_immediately() {
        let flag: Flag = serde_json::from_str(
            r#"{"name": "f", "seed": 1, "defaultTreatment": "off", "conditions": []}"#,
        )
        .unwrap();
        let store: HashMap<String, Arc<Flag>> =
            maplit::hashmap! {"f".to_string() => Arc::new(flag)};

        let found = store.flag("f").try_ready().unwrap().unwrap();
        assert_that!(found.map(|f| f.name.clone())).contains_value("f".to_string());

        let missing = store.flag("g").try_ready().unwrap().unwrap();
        assert_that!(missing).is_none();
    }

    #[test]
    fn deferred_store_defers() {
        let store = DeferredStore(TestStore::new());
        let lookup = store.flag("simple");
        assert!(!lookup.is_ready());
        let found = block_on(lookup.into_future()).unwrap();
        assert_that!(found).is_some();
    }

    #[test]
    fn store_errors_display() {
        let error = StoreError::Malformed {
            name: "f".into(),
            reason: "missing field `seed`".into(),
        };
        assert_eq!(
            error.to_string(),
            "definition of flag `f` is malformed: missing field `seed`"
        );
    }
}
