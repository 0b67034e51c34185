use std::collections::HashMap;
use std::sync::RwLock;

/// The synchronous fast path: an in-process key-value map of serialized JSON
/// strings, the immediately-readable copy that views render from. Reads and
/// writes are plain function calls; durability is the mirror's job.
#[derive(Debug, Default)]
pub struct FastStore {
    cells: RwLock<HashMap<String, String>>,
}

impl FastStore {
    pub fn new() -> Self {
        FastStore::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.cells
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: String) {
        self.cells
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.cells
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .is_some()
    }
}
