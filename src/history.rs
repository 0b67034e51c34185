//! Medical-history records keyed by employee.
//!
//! Records are free-form JSON objects whose identity is a natural key (`id`
//! or `reference`). Appending merges by that key instead of blindly pushing,
//! so a retried operation firing the append path twice still yields one
//! logical entry. Reads de-duplicate and sort, repairing the stored blob when
//! duplicates had crept in.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::store::{DualStore, StoreName};
use crate::time::issued_ms;

/// Employee key -> ordered history records.
pub type HistoryMap = BTreeMap<String, Vec<Value>>;

/// Counters returned by [`merge_history_payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub employees: usize,
    pub records: usize,
}

/// The record's own identity field, distinct from storage position.
pub fn natural_key(record: &Value) -> Option<String> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            record
                .get("reference")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}

// Mutation and repair paths read without the reconcile trigger; see
// `DualStore::read_local`.
fn read_map(store: &DualStore) -> HistoryMap {
    store.read_local(StoreName::History)
}

pub fn all_history(store: &DualStore) -> HistoryMap {
    store.read(StoreName::History)
}

/// One employee's history: de-duplicated by natural key (first occurrence
/// wins) and sorted ascending by issued date. When de-duplication actually
/// removed entries the cleaned array is persisted back: lazy on-read repair.
pub fn employee_history(store: &DualStore, employee_key: &str) -> Vec<Value> {
    if employee_key.is_empty() {
        return Vec::new();
    }
    let mut records = read_map(store);
    let entries = records.get(employee_key).cloned().unwrap_or_default();

    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped: Vec<Value> = Vec::with_capacity(entries.len());
    for item in &entries {
        if item.is_null() {
            continue;
        }
        if let Some(key) = natural_key(item) {
            if !seen.insert(key) {
                continue;
            }
        }
        deduped.push(item.clone());
    }

    if deduped.len() != entries.len() {
        records.insert(employee_key.to_string(), deduped.clone());
        store.write(StoreName::History, &records);
    }

    deduped.sort_by_key(|item| {
        item.get("issued")
            .and_then(Value::as_str)
            .map(issued_ms)
            .unwrap_or(0)
    });
    deduped
}

/// Append a record to an employee's history, merging by natural key: when an
/// entry with the same key exists, the new fields are shallow-merged onto it
/// (new values win per field); otherwise the record is appended.
pub fn append_employee_history(
    store: &DualStore,
    employee_key: &str,
    record: Map<String, Value>,
) {
    if employee_key.is_empty() || record.is_empty() {
        return;
    }
    let mut records = read_map(store);
    let existing = records.remove(employee_key).unwrap_or_default();
    let normalized_id = natural_key(&Value::Object(record.clone()));

    let mut next: Vec<Value> = Vec::with_capacity(existing.len() + 1);
    let mut inserted = false;
    for item in existing {
        if item.is_null() {
            continue;
        }
        let item_key = natural_key(&item);
        match (&normalized_id, &item_key) {
            (Some(id), Some(key)) if id == key => {
                let mut merged = item.as_object().cloned().unwrap_or_default();
                for (field, value) in &record {
                    merged.insert(field.clone(), value.clone());
                }
                merged.insert("id".to_string(), Value::String(id.clone()));
                next.push(Value::Object(merged));
                inserted = true;
            }
            _ => next.push(item),
        }
    }
    if !inserted {
        let mut fresh = record;
        if let Some(id) = &normalized_id {
            fresh.insert("id".to_string(), Value::String(id.clone()));
        }
        next.push(Value::Object(fresh));
    }

    records.insert(employee_key.to_string(), next);
    store.write(StoreName::History, &records);
}

/// Merge an imported employee->records mapping into the stored history.
/// Entries that are not objects are dropped; employees contributing nothing
/// are skipped. De-duplication is left to the on-read repair.
pub fn merge_history_payload(store: &DualStore, payload: Map<String, Value>) -> MergeStats {
    let employees = payload.len();
    let mut current = read_map(store);
    let mut records_added = 0;

    for (employee_key, entries) in payload {
        if employee_key.is_empty() {
            continue;
        }
        let Some(entries) = entries.as_array() else {
            continue;
        };
        let safe: Vec<Value> = entries.iter().filter(|e| e.is_object()).cloned().collect();
        if safe.is_empty() {
            continue;
        }
        records_added += safe.len();
        current.entry(employee_key).or_default().extend(safe);
    }

    store.write(StoreName::History, &current);
    MergeStats {
        employees,
        records: records_added,
    }
}
