//! Index implementation
//!
//! HashMap-based key/value map with a RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

/// In-memory key/value map shared between request handlers
#[derive(Debug, Default)]
pub struct Index {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl Index {
    /// Create a new empty Index
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Whether the key is present (read lock)
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Insert or overwrite a value (write lock)
    pub fn insert(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, value);
    }

    /// Remove a key if present (write lock)
    pub fn remove(&self, key: &[u8]) {
        self.data.write().remove(key);
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
