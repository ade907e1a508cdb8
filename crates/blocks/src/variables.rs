//! Key-value store shared by blocks that need get/set capability.
//!
//! A `Variables` handle is owned by whoever drives runs (the server, the
//! CLI) and handed to every block through its `InvocationContext`. Cloning
//! the handle shares the underlying map; nothing else in the process holds
//! block-visible state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct Variables {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Store `value` under `key`, returning the previous value if any.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Append `value` to the array stored under `key`.
    ///
    /// A missing key starts a new array; a non-array value is wrapped into
    /// the first element of one.
    pub fn push(&self, key: impl Into<String>, value: Value) {
        let mut map = self.lock();
        let slot = map.entry(key.into()).or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value),
            other => {
                let previous = other.take();
                *other = Value::Array(vec![previous, value]);
            }
        }
    }

    /// Remove and return the elements of the array under `key` matching `pred`.
    pub fn drain_matching(&self, key: &str, pred: impl Fn(&Value) -> bool) -> Vec<Value> {
        let mut map = self.lock();
        let Some(Value::Array(items)) = map.get_mut(key) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Value>, Vec<Value>) = std::mem::take(items).into_iter().partition(|v| pred(v));
        *items = kept;
        taken
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
