use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{OperationQueue, SyncHandler};

/// Owner handle for the background sync task. Dropping it stops the task,
/// which is how an embedding context unwires the timer and the online
/// listener on shutdown.
#[derive(Debug)]
pub struct QueueSyncHandle {
    task: JoinHandle<()>,
}

impl QueueSyncHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for QueueSyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the recurring queue sync: one pass immediately, then one per policy
/// interval, plus an extra pass whenever the network signal flips to online.
/// Passes run sequentially on a single task, so they never overlap.
pub fn start_queue_sync(queue: OperationQueue, handler: Arc<dyn SyncHandler>) -> QueueSyncHandle {
    let interval = queue.policy().sync_interval;
    let mut online_rx = queue.network().subscribe();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    queue.process(handler.as_ref()).await;
                }
                changed = online_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if *online_rx.borrow_and_update() {
                        queue.process(handler.as_ref()).await;
                    }
                }
            }
        }
    });
    QueueSyncHandle { task }
}
