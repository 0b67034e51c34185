use uuid::Uuid;

use crate::time::now_ms;

pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Operation ids follow the `op-<millis>-<suffix>` shape the queue has always
/// used, so persisted queues from older profiles stay readable.
pub fn new_operation_id() -> String {
    format!("op-{}-{}", now_ms(), short_suffix())
}

pub fn new_draft_id() -> String {
    format!("draft-{}-{}", now_ms(), short_suffix())
}

fn short_suffix() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..6].to_string()
}
