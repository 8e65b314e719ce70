//! Waiter registry state and selectors.

use crate::record::WaiterRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Every waiter record, keyed by name.
///
/// Names with no recorded activity are not stored; reading them yields the
/// idle default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaiterState {
    waiters: HashMap<String, WaiterRecord>,
}

impl WaiterState {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            waiters: HashMap::new(),
        }
    }

    /// The record for `name`, or the idle default.
    #[must_use]
    pub fn get(&self, name: &str) -> WaiterRecord {
        self.waiters.get(name).cloned().unwrap_or_default()
    }

    /// The stored record for `name`, if any activity was ever recorded.
    #[must_use]
    pub fn get_stored(&self, name: &str) -> Option<&WaiterRecord> {
        self.waiters.get(name)
    }

    /// Store the record for `name`.
    pub fn insert(&mut self, name: impl Into<String>, record: WaiterRecord) {
        self.waiters.insert(name.into(), record);
    }

    /// Whether `name` has a stored record.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.waiters.contains_key(name)
    }

    /// Names with a stored record.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.waiters.keys().map(String::as_str)
    }

    /// Count of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Check if no record is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

/// The record for `name`; the idle default when unknown. Never fails.
#[must_use]
pub fn get_waiter(state: &WaiterState, name: &str) -> WaiterRecord {
    state.get(name)
}

/// Last successful response held by `name`.
#[must_use]
pub fn get_waiter_response(state: &WaiterState, name: &str) -> Option<Value> {
    state.get_stored(name).and_then(|record| record.response.clone())
}

/// Last error held by `name`.
#[must_use]
pub fn get_waiter_error(state: &WaiterState, name: &str) -> Option<Value> {
    state.get_stored(name).and_then(|record| record.error.clone())
}
