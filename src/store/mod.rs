use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::config::StoreConfig;
use crate::error::{AppError, AppResult};
use crate::events::{StoreEvent, StoreEvents};

mod durable;
mod fast;

pub use durable::DurableStore;
pub use fast::FastStore;

/// The five persisted collections. Each one is a single serialized blob under
/// a well-known key in both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreName {
    Validations,
    History,
    Plans,
    Drafts,
    Queue,
}

impl StoreName {
    pub const ALL: [StoreName; 5] = [
        StoreName::Validations,
        StoreName::History,
        StoreName::Plans,
        StoreName::Drafts,
        StoreName::Queue,
    ];

    /// Object-store name in the durable backend.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreName::Validations => "validations",
            StoreName::History => "history",
            StoreName::Plans => "plans",
            StoreName::Drafts => "drafts",
            StoreName::Queue => "queue",
        }
    }

    /// Blob key inside the object store. Kept verbatim from the legacy
    /// dashboard profiles so data migrated from them stays addressable.
    pub fn blob_key(self) -> &'static str {
        match self {
            StoreName::Validations => "queue",
            StoreName::History => "records",
            StoreName::Plans => "plans",
            StoreName::Drafts => "drafts",
            StoreName::Queue => "queue",
        }
    }

    /// Key in the fast store.
    pub fn storage_key(self) -> &'static str {
        match self {
            StoreName::Validations => "app_medical_validations",
            StoreName::History => "app_medical_history",
            StoreName::Plans => "app_preventive_plans",
            StoreName::Drafts => "app_absence_drafts",
            StoreName::Queue => "app_operation_queue",
        }
    }
}

/// Dual-backend persistence adapter: a synchronous in-process fast store
/// fronting a durable SQLite mirror, with reconciliation-on-read.
///
/// Consistency is last-write-wins at whole-blob granularity. Mirror writes
/// are fire-and-forget, so a rapid sequence of writes to one collection can
/// land in the durable store out of issue order; acceptable for the
/// single-writer usage this serves, unsafe for concurrent writers.
///
/// Cloning is cheap; clones share the same backends and event channel.
#[derive(Clone)]
pub struct DualStore {
    fast: Arc<FastStore>,
    durable: Arc<DurableStore>,
    events: StoreEvents,
    runtime: Handle,
}

impl DualStore {
    /// Build the store inside a tokio runtime; the handle is captured for the
    /// fire-and-forget mirror and reconcile tasks.
    pub fn open(config: StoreConfig) -> AppResult<Self> {
        let runtime = Handle::try_current().map_err(|err| {
            AppError::new("STORAGE/RUNTIME", "DualStore requires a tokio runtime")
                .with_context("error", err.to_string())
        })?;
        Ok(DualStore {
            fast: Arc::new(FastStore::new()),
            durable: Arc::new(DurableStore::new(config)),
            events: StoreEvents::new(),
            runtime,
        })
    }

    pub fn events(&self) -> &StoreEvents {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn durable(&self) -> &DurableStore {
        &self.durable
    }

    /// Fast-path read. Returns the deserialized collection or its default
    /// when absent or malformed; malformed blobs are logged, never raised.
    /// Kicks off a background reconciliation pass against the durable copy.
    pub fn read<T>(&self, store: StoreName) -> T
    where
        T: DeserializeOwned + Default,
    {
        let value = self.read_local(store);
        self.spawn_reconcile(store);
        value
    }

    /// Same as [`read`](Self::read) but without triggering reconciliation.
    /// Mutation paths use this before writing the blob back, so an in-flight
    /// mirror write cannot heal the fast store backwards mid-update; it is
    /// also the deterministic way to inspect state.
    pub fn read_local<T>(&self, store: StoreName) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.fast.get(store.storage_key()) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                AppError::from(err)
                    .with_context("store", store.as_str())
                    .log("fast_read_malformed");
                T::default()
            }
        }
    }

    /// Fast-path write: serialize, store synchronously, notify, and mirror
    /// into the durable backend without waiting for it. Failures on either
    /// leg are logged and swallowed.
    pub fn write<T>(&self, store: StoreName, value: &T)
    where
        T: Serialize,
    {
        let Some(raw) = self.serialize(store, value) else {
            return;
        };
        self.fast.set(store.storage_key(), raw.clone());
        self.events.emit(store);
        let durable = self.durable.clone();
        self.runtime.spawn(async move {
            if let Err(err) = durable.put(store, store.blob_key(), &raw).await {
                err.log("durable_mirror_failed");
            }
        });
    }

    /// Write and wait for the durable mirror to land. Seeding and shutdown
    /// paths use this; the UI-facing paths use [`write`](Self::write).
    pub async fn write_durable<T>(&self, store: StoreName, value: &T) -> AppResult<()>
    where
        T: Serialize,
    {
        let raw = self.serialize(store, value).ok_or_else(|| {
            AppError::new("STORAGE/SERIALIZE", "collection failed to serialize")
                .with_context("store", store.as_str())
        })?;
        self.fast.set(store.storage_key(), raw.clone());
        self.events.emit(store);
        self.durable.put(store, store.blob_key(), &raw).await
    }

    /// Drop the collection from both backends, best-effort on the durable leg.
    pub fn clear(&self, store: StoreName) {
        self.fast.remove(store.storage_key());
        self.events.emit(store);
        let durable = self.durable.clone();
        self.runtime.spawn(async move {
            if let Err(err) = durable.delete(store, store.blob_key()).await {
                err.log("durable_delete_failed");
            }
        });
    }

    /// Explicit heal step: fetch the durable copy, compare structurally, and
    /// overwrite the fast store when they diverge. The durable copy silently
    /// wins. Returns whether a heal happened.
    pub async fn reconcile(&self, store: StoreName) -> AppResult<bool> {
        let Some(durable_raw) = self.durable.get(store, store.blob_key()).await? else {
            return Ok(false);
        };
        let durable_value: Value = serde_json::from_str(&durable_raw).map_err(|err| {
            AppError::from(err)
                .with_context("store", store.as_str())
                .with_context("operation", "reconcile_parse")
        })?;
        let fast_value: Option<Value> = self
            .fast
            .get(store.storage_key())
            .and_then(|raw| serde_json::from_str(&raw).ok());
        if fast_value.as_ref() == Some(&durable_value) {
            return Ok(false);
        }
        self.fast.set(store.storage_key(), durable_raw);
        self.events.emit(store);
        tracing::debug!(
            target: "absentia",
            event = "reconcile_heal",
            store = store.as_str(),
        );
        Ok(true)
    }

    /// Reconcile every collection; used at startup to repopulate the fast
    /// store from the durable copy. Returns how many collections healed.
    pub async fn hydrate(&self) -> AppResult<usize> {
        let mut healed = 0;
        for store in StoreName::ALL {
            if self.reconcile(store).await? {
                healed += 1;
            }
        }
        tracing::info!(target: "absentia", event = "hydrate_done", healed);
        Ok(healed)
    }

    fn serialize<T: Serialize>(&self, store: StoreName, value: &T) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(raw) => Some(raw),
            Err(err) => {
                AppError::from(err)
                    .with_context("store", store.as_str())
                    .log("fast_write_serialize_failed");
                None
            }
        }
    }

    fn spawn_reconcile(&self, store: StoreName) {
        let this = self.clone();
        self.runtime.spawn(async move {
            if let Err(err) = this.reconcile(store).await {
                err.log("reconcile_failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_returns_default_when_absent() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        let value: Vec<Value> = store.read(StoreName::Validations);
        assert!(value.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn write_durable_lands_in_both_backends() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        store
            .write_durable(StoreName::Plans, &serde_json::json!({"a": 1}))
            .await?;
        let fast: Value = store.read_local(StoreName::Plans);
        assert_eq!(fast["a"], 1);
        let durable = store
            .durable()
            .get(StoreName::Plans, StoreName::Plans.blob_key())
            .await?;
        assert_eq!(durable.as_deref(), Some("{\"a\":1}"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_fast_blob_degrades_to_default() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        store
            .fast
            .set(StoreName::History.storage_key(), "{not json".into());
        let value: serde_json::Map<String, Value> = store.read_local(StoreName::History);
        assert!(value.is_empty());
        Ok(())
    }
}
