#![allow(clippy::unwrap_used, clippy::expect_used)]

use absentia::{DualStore, StoreConfig};

/// In-memory dual store for tests; must be called inside a tokio runtime.
#[allow(dead_code)]
pub fn memory_store() -> DualStore {
    DualStore::open(StoreConfig::in_memory()).expect("store opens inside the test runtime")
}
