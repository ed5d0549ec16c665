/// Persistent key/value storage backing the preferences (chrome.storage.local)

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::bridge;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {key}: {message}")]
    Read { key: String, message: String },
    #[error("could not write {key}: {message}")]
    Write { key: String, message: String },
}

/// Whole values are read and written; there are no partial updates.
#[async_trait(?Send)]
pub trait Storage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            values: RefCell::new(HashMap::new()),
        }
    }
}

#[async_trait(?Send)]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// chrome.storage.local through the JS bridge
#[derive(Debug, Default)]
pub struct ChromeStorage;

#[async_trait(?Send)]
impl Storage for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let read_error = |message: String| StorageError::Read {
            key: key.to_string(),
            message,
        };

        let stored = bridge::storageGet(key)
            .await
            .map_err(|e| read_error(bridge::js_error_message(&e)))?;

        if stored.is_null() || stored.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(stored)
            .map(Some)
            .map_err(|e| read_error(e.to_string()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let write_error = |message: String| StorageError::Write {
            key: key.to_string(),
            message,
        };

        let value_js = bridge::to_js(&value).map_err(|e| write_error(e.to_string()))?;

        bridge::storageSet(key, value_js)
            .await
            .map_err(|e| write_error(bridge::js_error_message(&e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_memory_storage_missing_key() {
        let storage = MemoryStorage::new();

        assert_eq!(block_on(storage.get("options")), Ok(None));
    }

    #[test]
    fn test_memory_storage_overwrites_whole_value() {
        let storage = MemoryStorage::new();

        block_on(storage.set("options", json!({ "a": 1, "b": 2 }))).unwrap();
        block_on(storage.set("options", json!({ "a": 3 }))).unwrap();

        assert_eq!(block_on(storage.get("options")), Ok(Some(json!({ "a": 3 }))));
    }
}
