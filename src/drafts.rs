use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::new_draft_id;
use crate::queue::{OperationMeta, OperationQueue};
use crate::store::{DualStore, StoreName};
use crate::time::now_iso;

/// An in-progress absence registration form, kept so an interrupted session
/// can resume where it left off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceDraft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub updated_at: String,
    /// Free-form form fields; the store does not interpret them.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub type DraftMap = BTreeMap<String, AbsenceDraft>;

pub fn all_drafts(store: &DualStore) -> DraftMap {
    store.read(StoreName::Drafts)
}

pub fn draft(store: &DualStore, id: &str) -> Option<AbsenceDraft> {
    if id.is_empty() {
        return None;
    }
    all_drafts(store).remove(id)
}

/// Upsert a draft (generating an id when absent), persist, and enqueue a
/// `saveDraft` operation so the draft eventually reaches the remote system.
pub fn save_draft(
    store: &DualStore,
    queue: &OperationQueue,
    mut draft: AbsenceDraft,
    user: Option<&str>,
) -> AbsenceDraft {
    if draft.id.is_empty() {
        draft.id = new_draft_id();
    }
    draft.updated_at = now_iso();

    let mut drafts: DraftMap = store.read_local(StoreName::Drafts);
    drafts.insert(draft.id.clone(), draft.clone());
    store.write(StoreName::Drafts, &drafts);

    queue.enqueue(
        "saveDraft",
        serde_json::json!({ "draftId": draft.id, "employeeId": draft.employee_id }),
        OperationMeta {
            entity_id: Some(draft.id.clone()),
            user: user.map(str::to_string),
            ..OperationMeta::default()
        },
    );
    draft
}

pub fn delete_draft(store: &DualStore, id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    let mut drafts: DraftMap = store.read_local(StoreName::Drafts);
    if drafts.remove(id).is_none() {
        return false;
    }
    store.write(StoreName::Drafts, &drafts);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::queue::NetworkStatus;

    #[tokio::test]
    async fn save_generates_id_and_enqueues() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        let queue = OperationQueue::new(store.clone(), NetworkStatus::online());

        let mut fields = Map::new();
        fields.insert("reason".into(), Value::String("flu".into()));
        let draft = save_draft(
            &store,
            &queue,
            AbsenceDraft {
                employee_id: "emp-1".into(),
                fields,
                ..AbsenceDraft::default()
            },
            Some("u-1"),
        );

        assert!(draft.id.starts_with("draft-"));
        assert_eq!(all_drafts(&store).len(), 1);

        let ops = queue.snapshot();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, "saveDraft");
        assert_eq!(ops[0].entity_id.as_deref(), Some(draft.id.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        let queue = OperationQueue::new(store.clone(), NetworkStatus::online());
        let draft = save_draft(&store, &queue, AbsenceDraft::default(), None);
        assert!(delete_draft(&store, &draft.id));
        assert!(!delete_draft(&store, &draft.id));
        Ok(())
    }
}
