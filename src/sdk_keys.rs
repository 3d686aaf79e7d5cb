use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;
use log::{debug, warn};

lazy_static! {
    static ref ACTIVE_SDK_KEYS: Mutex<HashMap<String, usize>> = Mutex::new(HashMap::new());
}

fn active_keys() -> MutexGuard<'static, HashMap<String, usize>> {
    // the map is consistent after every operation, so a poisoned lock is still usable
    ACTIVE_SDK_KEYS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A live use of an SDK key within this process.
///
/// Creating several factories for the same key usually means an application is building clients
/// it does not need, so registering a key that already has live registrations logs a warning. The
/// registration is released when this value is dropped.
#[derive(Debug)]
pub struct SdkKeyRegistration {
    key: String,
}

impl SdkKeyRegistration {
    pub fn register(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut keys = active_keys();
        match keys.get(&key).copied().unwrap_or(0) {
            0 if !keys.is_empty() => warn!(
                "factory instantiation: you already have an instance of the factory with another SDK key"
            ),
            0 => {}
            count => warn!(
                "factory instantiation: you already have {} {} with this SDK key; we recommend keeping only one instance of the factory at all times",
                count,
                if count == 1 { "factory" } else { "factories" }
            ),
        }
        *keys.entry(key.clone()).or_insert(0) += 1;
        debug!("registered SDK key, {} active key(s)", keys.len());
        SdkKeyRegistration { key }
    }

    /// The number of live registrations of `key`.
    pub fn active_count(key: &str) -> usize {
        active_keys().get(key).copied().unwrap_or(0)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for SdkKeyRegistration {
    fn drop(&mut self) {
        let mut keys = active_keys();
        if let Some(count) = keys.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                keys.remove(&self.key);
            }
        }
    }
}
