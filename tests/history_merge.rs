use absentia::history::{
    all_history, append_employee_history, employee_history, merge_history_payload,
};
use absentia::StoreName;
use anyhow::Result;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

#[path = "util.rs"]
mod util;

fn record(id: &str, issued: &str) -> Map<String, Value> {
    json!({
        "id": id,
        "title": "Medical rest",
        "issued": issued,
        "status": "validated",
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[tokio::test]
async fn append_with_new_key_appends() -> Result<()> {
    let store = util::memory_store();
    append_employee_history(&store, "emp-1", record("CM-1", "2024-01-10"));
    append_employee_history(&store, "emp-1", record("CM-2", "2024-01-20"));
    assert_eq!(employee_history(&store, "emp-1").len(), 2);
    Ok(())
}

#[tokio::test]
async fn append_with_matching_key_merges_new_fields_win() -> Result<()> {
    let store = util::memory_store();
    append_employee_history(&store, "emp-1", record("CM-1", "2024-01-10"));

    let mut update = Map::new();
    update.insert("reference".into(), json!("CM-1"));
    update.insert("status".into(), json!("rejected"));
    update.insert("reviewer".into(), json!("Dr. Caamano"));
    append_employee_history(&store, "emp-1", update);

    let history = employee_history(&store, "emp-1");
    assert_eq!(history.len(), 1);
    // New fields win, untouched fields survive.
    assert_eq!(history[0]["status"], "rejected");
    assert_eq!(history[0]["reviewer"], "Dr. Caamano");
    assert_eq!(history[0]["title"], "Medical rest");
    assert_eq!(history[0]["id"], "CM-1");
    Ok(())
}

#[tokio::test]
async fn double_fire_from_a_retried_operation_keeps_one_entry() -> Result<()> {
    let store = util::memory_store();
    // The same append fired twice, as a retried queue operation would.
    append_employee_history(&store, "emp-1", record("CM-1", "2024-01-10"));
    append_employee_history(&store, "emp-1", record("CM-1", "2024-01-10"));
    assert_eq!(employee_history(&store, "emp-1").len(), 1);
    Ok(())
}

#[tokio::test]
async fn records_without_natural_key_are_kept_as_is() -> Result<()> {
    let store = util::memory_store();
    let mut anonymous = Map::new();
    anonymous.insert("title".into(), json!("Unlabelled note"));
    append_employee_history(&store, "emp-1", anonymous.clone());
    append_employee_history(&store, "emp-1", anonymous);
    // No key to merge on: both survive.
    assert_eq!(employee_history(&store, "emp-1").len(), 2);
    Ok(())
}

#[tokio::test]
async fn on_read_repair_persists_the_cleaned_array() -> Result<()> {
    let store = util::memory_store();
    let mut map: std::collections::BTreeMap<String, Vec<Value>> = Default::default();
    map.insert(
        "emp-1".into(),
        vec![
            json!({"id": "CM-1", "issued": "2024-01-10"}),
            Value::Null,
            json!({"id": "CM-1", "issued": "2024-02-10"}),
            json!({"id": "CM-2", "issued": "2024-03-10"}),
        ],
    );
    store.write(StoreName::History, &map);

    let history = employee_history(&store, "emp-1");
    assert_eq!(history.len(), 2);

    // The repair was written back: a direct read shows the cleaned array.
    let repaired = all_history(&store);
    assert_eq!(repaired["emp-1"].len(), 2);
    Ok(())
}

#[tokio::test]
async fn merge_payload_appends_across_employees() -> Result<()> {
    let store = util::memory_store();
    append_employee_history(&store, "emp-1", record("CM-1", "2024-01-10"));

    let payload = json!({
        "emp-1": [{"id": "CM-9", "issued": "2024-04-01"}],
        "emp-2": [{"id": "CM-10", "issued": "2024-04-02"}],
    })
    .as_object()
    .cloned()
    .unwrap();
    let stats = merge_history_payload(&store, payload);
    assert_eq!(stats.employees, 2);
    assert_eq!(stats.records, 2);
    assert_eq!(employee_history(&store, "emp-1").len(), 2);
    assert_eq!(employee_history(&store, "emp-2").len(), 1);
    Ok(())
}

proptest! {
    // Reading history yields ascending issued order for every input ordering
    // of the same record set, and never more entries than distinct ids.
    #[test]
    fn history_reads_are_sorted_for_all_orderings(
        mut days in proptest::collection::vec(1u32..=28, 1..12),
        seed in 0usize..1000,
    ) {
        let runtime = tokio::runtime::Runtime::new().expect("create tokio runtime");
        runtime.block_on(async move {
            let store = util::memory_store();
            // Deterministic shuffle of insertion order.
            let len = days.len();
            for i in 0..len {
                days.swap(i, (seed + i * 7) % len);
            }
            for (idx, day) in days.iter().enumerate() {
                let issued = format!("2024-03-{day:02}");
                append_employee_history(&store, "emp-1", record(&format!("CM-{idx}"), &issued));
            }

            let history = employee_history(&store, "emp-1");
            assert_eq!(history.len(), len);
            let issued: Vec<&str> = history
                .iter()
                .map(|r| r["issued"].as_str().unwrap())
                .collect();
            let mut sorted = issued.clone();
            sorted.sort();
            assert_eq!(issued, sorted);
        });
    }
}
