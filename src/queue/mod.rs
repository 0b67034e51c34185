use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::id::new_operation_id;
use crate::store::{DualStore, StoreName};
use crate::time::{now_iso, now_ms};

mod retry;
mod scheduler;

pub use retry::{Backoff, RetryPolicy};
pub use scheduler::{start_queue_sync, QueueSyncHandle};

/// A unit of deferred work: a user action that must eventually reach the
/// remote system. Synced operations are removed from the queue, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub status: OperationStatus,
    pub created_at: String,
    #[serde(default)]
    pub last_attempt_at: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Pending,
    Synced,
}

/// Optional fields supplied at enqueue time; everything else is generated.
#[derive(Debug, Clone, Default)]
pub struct OperationMeta {
    pub id: Option<String>,
    pub status: Option<OperationStatus>,
    pub last_attempt_at: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub user: Option<String>,
    pub entity_id: Option<String>,
}

/// Patch applied alongside a status change in [`OperationQueue::mark_status`].
#[derive(Debug, Clone, Default)]
pub struct OperationPatch {
    pub retry_count: Option<u32>,
    pub last_error: Option<String>,
}

/// Result of one sync attempt for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Ok,
    Failed(String),
}

/// The seam a real transport plugs into. Handlers resolve to a [`SyncOutcome`];
/// panics inside a handler are caught and converted into a failure, so one bad
/// operation never aborts the pass over the rest of the queue.
pub trait SyncHandler: Send + Sync {
    fn handle<'a>(&'a self, op: &'a Operation) -> BoxFuture<'a, SyncOutcome>;
}

/// Counts returned by one [`OperationQueue::process`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassSummary {
    pub processed: usize,
    pub pending: usize,
}

/// Shared online/offline signal. The embedding application flips it from its
/// connectivity probes; the queue short-circuits on it and the scheduler
/// runs an extra pass when it turns back on.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    tx: Arc<watch::Sender<bool>>,
}

impl NetworkStatus {
    pub fn online() -> Self {
        let (tx, _rx) = watch::channel(true);
        NetworkStatus { tx: Arc::new(tx) }
    }

    pub fn offline() -> Self {
        let status = Self::online();
        status.set_online(false);
        status
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_replace(online);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Buffer of user actions awaiting remote confirmation. Operations are
/// upserted by id, retried according to the [`RetryPolicy`], and removed only
/// when a sync attempt reports success.
#[derive(Clone)]
pub struct OperationQueue {
    store: DualStore,
    network: NetworkStatus,
    policy: RetryPolicy,
}

impl OperationQueue {
    pub fn new(store: DualStore, network: NetworkStatus) -> Self {
        Self::with_policy(store, network, RetryPolicy::default())
    }

    pub fn with_policy(store: DualStore, network: NetworkStatus, policy: RetryPolicy) -> Self {
        OperationQueue {
            store,
            network,
            policy,
        }
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Current queue contents; triggers background reconciliation.
    pub fn read(&self) -> Vec<Operation> {
        self.store.read(StoreName::Queue)
    }

    /// Queue contents without the reconcile trigger; deterministic, which is
    /// what inspection tooling and the mutation paths below want: skipping
    /// the trigger keeps an in-flight durable mirror from healing the fast
    /// store backwards mid-mutation.
    pub fn snapshot(&self) -> Vec<Operation> {
        self.store.read_local(StoreName::Queue)
    }

    fn persist(&self, queue: &Vec<Operation>) {
        self.store.write(StoreName::Queue, queue);
    }

    /// Upsert an operation: any prior entry with the same id is replaced.
    /// Returns `None` when `kind` is empty.
    pub fn enqueue(
        &self,
        kind: impl Into<String>,
        payload: Value,
        meta: OperationMeta,
    ) -> Option<Operation> {
        let kind = kind.into();
        if kind.is_empty() {
            return None;
        }
        let op = Operation {
            id: meta.id.unwrap_or_else(new_operation_id),
            kind,
            payload,
            status: meta.status.unwrap_or_default(),
            created_at: now_iso(),
            last_attempt_at: meta.last_attempt_at,
            retry_count: meta.retry_count,
            last_error: meta.last_error,
            user: meta.user,
            entity_id: meta.entity_id,
        };
        let mut queue = self.snapshot();
        queue.retain(|item| item.id != op.id);
        queue.push(op.clone());
        self.persist(&queue);
        tracing::debug!(
            target: "absentia",
            event = "operation_enqueued",
            id = %op.id,
            kind = %op.kind,
        );
        Some(op)
    }

    /// Direct status transition outside the main process loop.
    pub fn mark_status(&self, id: &str, status: OperationStatus, patch: OperationPatch) {
        if id.is_empty() {
            return;
        }
        let mut queue = self.snapshot();
        for op in queue.iter_mut() {
            if op.id != id {
                continue;
            }
            op.status = status;
            op.last_attempt_at = Some(now_iso());
            if let Some(retry_count) = patch.retry_count {
                op.retry_count = retry_count;
            }
            if let Some(last_error) = patch.last_error.clone() {
                op.last_error = Some(last_error);
            }
        }
        self.persist(&queue);
    }

    pub fn remove(&self, id: &str) {
        if id.is_empty() {
            return;
        }
        let mut queue = self.snapshot();
        let before = queue.len();
        queue.retain(|op| op.id != id);
        if queue.len() == before {
            return;
        }
        self.persist(&queue);
    }

    pub fn clear(&self) {
        self.persist(&Vec::new());
    }

    /// One pass over the queue.
    ///
    /// Synced leftovers are dropped silently. While offline, operations are
    /// retained untouched. Otherwise each due operation is handed to
    /// `handler`; success drops it, failure retains it with incremented retry
    /// metadata, unless the policy attempt ceiling is hit, in which case
    /// it is dropped with a dead-letter warning. The queue is persisted only
    /// when its contents changed.
    pub async fn process(&self, handler: &dyn SyncHandler) -> PassSummary {
        let queue = self.snapshot();
        if queue.is_empty() {
            return PassSummary::default();
        }

        let mut next_queue: Vec<Operation> = Vec::with_capacity(queue.len());
        let mut processed = 0;

        for op in &queue {
            if op.status == OperationStatus::Synced {
                continue;
            }
            if !self.network.is_online() {
                next_queue.push(op.clone());
                continue;
            }
            if !self.policy.eligible(op, now_ms()) {
                next_queue.push(op.clone());
                continue;
            }

            let attempt_at = now_iso();
            let outcome = AssertUnwindSafe(handler.handle(op))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| SyncOutcome::Failed(panic_message(payload.as_ref())));

            match outcome {
                SyncOutcome::Ok => {
                    processed += 1;
                }
                SyncOutcome::Failed(reason) => {
                    let retry_count = op.retry_count + 1;
                    if self.policy.exhausted(retry_count) {
                        tracing::warn!(
                            target: "absentia",
                            event = "queue_dead_letter",
                            id = %op.id,
                            kind = %op.kind,
                            retry_count,
                            reason = %reason,
                        );
                        continue;
                    }
                    let mut retained = op.clone();
                    retained.status = OperationStatus::Pending;
                    retained.last_attempt_at = Some(attempt_at);
                    retained.retry_count = retry_count;
                    retained.last_error = Some(reason);
                    next_queue.push(retained);
                }
            }
        }

        if processed > 0 || next_queue != queue {
            self.persist(&next_queue);
        }

        let summary = PassSummary {
            processed,
            pending: next_queue.len(),
        };
        tracing::debug!(
            target: "absentia",
            event = "queue_pass",
            processed = summary.processed,
            pending = summary.pending,
        );
        summary
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "sync handler panicked".to_string()
    }
}

/// Stand-in for the real transport: reports failure while offline, otherwise
/// waits a short fixed delay and reports success.
pub struct StubSyncHandler {
    network: NetworkStatus,
    delay: Duration,
}

impl StubSyncHandler {
    pub fn new(network: NetworkStatus) -> Self {
        StubSyncHandler {
            network,
            delay: Duration::from_millis(20),
        }
    }
}

impl SyncHandler for StubSyncHandler {
    fn handle<'a>(&'a self, _op: &'a Operation) -> BoxFuture<'a, SyncOutcome> {
        async move {
            if !self.network.is_online() {
                return SyncOutcome::Failed("offline".to_string());
            }
            tokio::time::sleep(self.delay).await;
            SyncOutcome::Ok
        }
        .boxed()
    }
}
