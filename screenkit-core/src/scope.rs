//! Session and application stores, and widget-trail keys.
//!
//! Values written to the `user` or `application` scope are keyed by the
//! widget trail they were set under, so two widgets setting the same field
//! name do not collide. Reads fall back from the full trail to shorter
//! prefixes and finally to the bare field name.

use parking_lot::RwLock;
use screenkit_types::{Value, ValueMap};

/// Joins trail entries and the field name in scoped-store keys
pub const TRAIL_SEPARATOR: &str = "|";

/// A shared store outliving a single request (a session or the application).
///
/// Implementations synchronize internally; actions only hold `&self`.
pub trait ScopedStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
}

/// In-memory [`ScopedStore`]. Writing null removes the key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<ValueMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ValueMap {
        self.values.read().clone()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl ScopedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut values = self.values.write();
        if value.is_null() {
            values.remove(key);
        } else {
            values.insert(key.to_string(), value);
        }
    }
}

/// Store key for `name` under the full widget `trail`.
///
/// A trail that joins to an empty string adds no prefix.
pub fn trail_key(trail: &[String], name: &str) -> String {
    let mut key = trail.join(TRAIL_SEPARATOR);
    if key.is_empty() {
        return name.to_string();
    }
    key.push_str(TRAIL_SEPARATOR);
    key.push_str(name);
    key
}

/// Look `name` up under the longest trail prefix that has a non-null value.
pub fn find_in_trail(store: &dyn ScopedStore, trail: &[String], name: &str) -> Option<Value> {
    (0..=trail.len()).rev().find_map(|len| {
        let key = trail_key(&trail[..len], name);
        store.get(&key).filter(|v| !v.is_null())
    })
}
