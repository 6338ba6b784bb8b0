//! Application key-value store.
//!
//! # Responsibilities
//! - Hold application-wide values shared by every request
//! - Offer typed access through serde
//!
//! # Design Decisions
//! - Injected into each `Context` by the dispatcher; there is no process global
//! - Values are `serde_json::Value` so any serializable type can be stored
//! - `DashMap` shards its locks; readers of different keys do not contend

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Concurrent application state.
#[derive(Debug, Default)]
pub struct Store {
    entries: DashMap<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store `value`, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Deserialize the value under `key`. A value of the wrong shape reads as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Stored value has unexpected shape");
                None
            }
        }
    }

    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> Result<Option<Value>, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(key, value))
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Visits {
        count: u32,
    }

    #[test]
    fn test_set_get_remove() {
        let store = Store::new();
        assert!(store.is_empty());
        assert_eq!(store.set("name", "switchyard"), None);
        assert_eq!(store.set("name", "router"), Some(json!("switchyard")));
        assert_eq!(store.get("name"), Some(json!("router")));
        assert!(store.contains("name"));
        assert_eq!(store.remove("name"), Some(json!("router")));
        assert!(store.get("name").is_none());
    }

    #[test]
    fn test_typed_access() {
        let store = Store::new();
        store.set_as("visits", &Visits { count: 3 }).unwrap();
        assert_eq!(store.get_as::<Visits>("visits"), Some(Visits { count: 3 }));
        assert_eq!(store.get_as::<String>("visits"), None);
        assert_eq!(store.get_as::<Visits>("missing"), None);
    }

    #[test]
    fn test_clear() {
        let store = Store::new();
        store.set("a", 1);
        store.set("b", 2);
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
    }
}
