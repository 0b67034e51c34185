//! JSON/CSV interop for the history collection.
//!
//! Unlike the storage adapter, import validation fails loudly: a malformed
//! payload raises synchronously so the caller can surface a message, and a
//! CSV with missing required columns is rejected outright with no partial
//! merge.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::history::{self, MergeStats};
use crate::id::new_uuid_v7;
use crate::store::DualStore;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("nothing to import")]
    Empty,
    #[error("imported history must be a JSON object keyed by employee")]
    InvalidPayload,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV needs a header row and at least one data row")]
    TooShort,
    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

const REQUIRED_COLUMNS: [&str; 3] = ["employeeId", "title", "status"];
const OPTIONAL_COLUMNS: [&str; 7] = [
    "reference",
    "issued",
    "days",
    "document",
    "institution",
    "notes",
    "reviewer",
];

/// Export the full history mapping as pretty-printed JSON.
pub fn export_history_json(store: &DualStore) -> String {
    let records = history::all_history(store);
    serde_json::to_string_pretty(&records).unwrap_or_else(|_| "{}".to_string())
}

/// Import a JSON export produced by [`export_history_json`] (or compatible
/// hand-built payloads) and merge it into the stored history.
pub fn import_history_json(store: &DualStore, text: &str) -> Result<MergeStats, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let payload: Value = serde_json::from_str(text)?;
    let Some(object) = payload.as_object() else {
        return Err(ImportError::InvalidPayload);
    };
    Ok(history::merge_history_payload(store, object.clone()))
}

/// Import history rows from CSV text. The header must contain `employeeId`,
/// `title`, and `status`; other known columns are optional. The import is
/// all-or-nothing: a missing column rejects the whole document.
pub fn import_history_csv(store: &DualStore, text: &str) -> Result<MergeStats, ImportError> {
    let payload = parse_csv_history(text)?;
    Ok(history::merge_history_payload(store, payload))
}

fn parse_csv_history(text: &str) -> Result<Map<String, Value>, ImportError> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .collect();
    if rows.len() < 2 {
        return Err(ImportError::TooShort);
    }

    let headers: Vec<String> = rows[0].split(',').map(|h| h.trim().to_string()).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let column = |cells: &[&str], name: &str| -> String {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| cells.get(idx))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    };

    let mut payload: Map<String, Value> = Map::new();
    for row in &rows[1..] {
        let cells: Vec<&str> = row.split(',').collect();
        let employee_key = column(&cells, "employeeId");
        if employee_key.is_empty() {
            continue;
        }

        let mut record = Map::new();
        let reference = column(&cells, "reference");
        // Rows without a reference still need distinct ids, or the on-read
        // de-duplication would collapse them into one entry.
        let id = if reference.is_empty() {
            format!("CSV-{}", new_uuid_v7())
        } else {
            reference
        };
        record.insert("id".to_string(), Value::String(id));
        let title = column(&cells, "title");
        record.insert(
            "title".to_string(),
            Value::String(if title.is_empty() {
                "Untitled".to_string()
            } else {
                title
            }),
        );
        let status = column(&cells, "status");
        record.insert(
            "status".to_string(),
            Value::String(if status.is_empty() {
                "Pending".to_string()
            } else {
                status
            }),
        );
        for name in OPTIONAL_COLUMNS {
            if name == "reference" {
                continue;
            }
            record.insert(name.to_string(), Value::String(column(&cells, name)));
        }

        if let Some(entries) = payload
            .entry(employee_key)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
        {
            entries.push(Value::Object(record));
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    #[tokio::test]
    async fn csv_missing_columns_are_named() {
        let err = parse_csv_history("employeeId,title\nemp-1,Rest").unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => assert_eq!(cols, vec!["status"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn csv_header_only_is_too_short() {
        assert!(matches!(
            parse_csv_history("employeeId,title,status"),
            Err(ImportError::TooShort)
        ));
    }

    #[tokio::test]
    async fn json_import_rejects_non_objects() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        assert!(matches!(
            import_history_json(&store, "[1, 2]"),
            Err(ImportError::InvalidPayload)
        ));
        assert!(matches!(
            import_history_json(&store, "   "),
            Err(ImportError::Empty)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn csv_rows_become_records() -> anyhow::Result<()> {
        let store = DualStore::open(StoreConfig::in_memory())?;
        let text = "employeeId,title,status,reference,issued\n\
                    emp-1,Medical rest,Validated,CM-1,2024-01-05\n\
                    emp-1,Check-up,Pending,CM-2,2024-02-10\n\
                    ,skipped,row,CM-3,2024-03-01";
        let stats = import_history_csv(&store, text)?;
        assert_eq!(stats.records, 2);
        let records = history::employee_history(&store, "emp-1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "CM-1");
        assert_eq!(records[0]["title"], "Medical rest");
        Ok(())
    }
}
