//! Persistence, synchronization, and reporting core for an
//! occupational-health absence dashboard.
//!
//! The centerpiece is a dual-backend store: a synchronous in-process fast
//! path mirrored into SQLite, healed by reconciliation-on-read, with typed
//! change notifications. On top of it sit the domain collections (validation
//! queue, medical history, preventive plans, absence drafts), an
//! offline-tolerant operation queue with a configurable retry policy, JSON
//! and CSV interop for the history collection, and the risk/recurrence
//! aggregation the dashboards read.

pub mod config;
pub mod drafts;
pub mod error;
pub mod events;
pub mod history;
pub mod id;
pub mod interop;
pub mod logging;
pub mod pathology;
pub mod plans;
pub mod queue;
pub mod reporting;
pub mod risk;
pub mod seed;
pub mod store;
pub mod time;
pub mod users;
pub mod validations;

pub use config::StoreConfig;
pub use error::{AppError, AppResult};
pub use events::{StoreEvent, StoreEvents};
pub use queue::{
    start_queue_sync, Backoff, NetworkStatus, Operation, OperationMeta, OperationPatch,
    OperationQueue, OperationStatus, PassSummary, QueueSyncHandle, RetryPolicy, StubSyncHandler,
    SyncHandler, SyncOutcome,
};
pub use store::{DualStore, StoreName};
