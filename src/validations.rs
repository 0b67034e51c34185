//! Certificate validation queue and its review workflow:
//! pending -> in-review -> validated/rejected.
//!
//! Closing a review appends a history record through the additive merge,
//! stores any preventive plan, and enqueues an operation for eventual remote
//! confirmation; the local write is optimistic, the queue catches up later.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::history::append_employee_history;
use crate::plans::{save_plan, PreventivePlan};
use crate::queue::{OperationMeta, OperationQueue};
use crate::risk::{assess_score, score_certificate, RiskLevel};
use crate::store::{DualStore, StoreName};
use crate::time::{issued_ms, now_iso, now_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CertificateStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-review")]
    InReview,
    #[serde(rename = "validated")]
    Validated,
    #[serde(rename = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Metadata of the uploaded certificate document; the bytes themselves never
/// enter the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFile {
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default, rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEntry {
    pub reference: String,
    pub employee: String,
    pub employee_id: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub status: CertificateStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub submitted: String,
    #[serde(default)]
    pub received_timestamp: i64,
    #[serde(default)]
    pub detailed_reason: String,
    #[serde(default)]
    pub absence_days: u32,
    #[serde(default)]
    pub absence_type: String,
    #[serde(default)]
    pub certificate_type: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_file: Option<CertificateFile>,
}

/// Reviewer input when closing a certificate.
#[derive(Debug, Clone, Default)]
pub struct ReviewDecision {
    /// Manual risk score; when absent the keyword fallback scores the entry.
    pub score: Option<f64>,
    pub notes: Option<String>,
    pub reviewer: Option<String>,
    pub plan: Option<PreventivePlan>,
}

pub fn validation_entries(store: &DualStore) -> Vec<ValidationEntry> {
    store.read(StoreName::Validations)
}

fn entries_for_update(store: &DualStore) -> Vec<ValidationEntry> {
    store.read_local(StoreName::Validations)
}

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn absence_days(start_date: &str, end_date: &str) -> u32 {
    let start = issued_ms(start_date);
    let end = issued_ms(end_date);
    if start == 0 || end == 0 || end < start {
        return 1;
    }
    (((end - start) / DAY_MS) + 1).max(1) as u32
}

/// Register a certificate: normalize the entry, upsert it by reference, and
/// enqueue a `submitCertificate` operation.
pub fn submit_certificate(
    store: &DualStore,
    queue: &OperationQueue,
    mut entry: ValidationEntry,
    user: Option<&str>,
) -> ValidationEntry {
    entry.status = CertificateStatus::Pending;
    if entry.submitted.is_empty() {
        entry.submitted = now_iso();
    }
    if entry.received_timestamp == 0 {
        entry.received_timestamp = now_ms();
    }
    if entry.absence_days == 0 {
        entry.absence_days = absence_days(&entry.start_date, &entry.end_date);
    }

    let mut entries = entries_for_update(store);
    entries.retain(|existing| existing.reference != entry.reference);
    entries.push(entry.clone());
    store.write(StoreName::Validations, &entries);

    queue.enqueue(
        "submitCertificate",
        json!({ "reference": entry.reference }),
        OperationMeta {
            entity_id: Some(entry.reference.clone()),
            user: user.map(str::to_string),
            ..OperationMeta::default()
        },
    );
    entry
}

/// Move a pending certificate into review. Returns whether the entry exists.
pub fn begin_review(store: &DualStore, reference: &str) -> bool {
    let mut entries = entries_for_update(store);
    let mut found = false;
    for entry in entries.iter_mut() {
        if entry.reference == reference {
            entry.status = CertificateStatus::InReview;
            found = true;
        }
    }
    if found {
        store.write(StoreName::Validations, &entries);
    }
    found
}

pub fn approve_certificate(
    store: &DualStore,
    queue: &OperationQueue,
    reference: &str,
    decision: ReviewDecision,
) -> Option<ValidationEntry> {
    close_review(store, queue, reference, decision, CertificateStatus::Validated)
}

pub fn reject_certificate(
    store: &DualStore,
    queue: &OperationQueue,
    reference: &str,
    decision: ReviewDecision,
) -> Option<ValidationEntry> {
    close_review(store, queue, reference, decision, CertificateStatus::Rejected)
}

fn close_review(
    store: &DualStore,
    queue: &OperationQueue,
    reference: &str,
    decision: ReviewDecision,
    status: CertificateStatus,
) -> Option<ValidationEntry> {
    let mut entries = entries_for_update(store);
    let entry = entries.iter_mut().find(|e| e.reference == reference)?;

    let risk = match decision.score {
        Some(score) => assess_score(score),
        None => {
            let absence_type = if entry.certificate_type.is_empty() {
                entry.absence_type.as_str()
            } else {
                entry.certificate_type.as_str()
            };
            score_certificate(absence_type, &entry.detailed_reason)
        }
    };

    entry.status = status;
    entry.risk_score = Some(risk.score);
    entry.risk_level = Some(risk.level);
    entry.risk_descriptor = Some(risk.descriptor().to_string());
    entry.reviewer = decision.reviewer.clone();
    if let Some(notes) = &decision.notes {
        if entry.notes.is_empty() {
            entry.notes = notes.clone();
        } else {
            entry.notes = format!("{} / {}", entry.notes, notes);
        }
    }
    let updated = entry.clone();
    store.write(StoreName::Validations, &entries);

    let decision_label = match status {
        CertificateStatus::Validated => "validated",
        CertificateStatus::Rejected => "rejected",
        // close_review is only called with terminal statuses.
        _ => "pending",
    };

    let mut record = history_record(&updated, decision_label);
    if let Some(plan) = decision.plan.as_ref().filter(|plan| !plan.is_empty()) {
        record.insert("planActions".into(), json!(plan.actions));
        record.insert("planFollowUps".into(), json!(plan.follow_ups));
        record.insert("planRecommendations".into(), json!(plan.recommendations));
        save_plan(store, &updated.employee_id, plan.clone());
    }
    append_employee_history(store, &updated.employee_id, record);

    queue.enqueue(
        "validateCertificate",
        json!({ "reference": updated.reference, "decision": decision_label }),
        OperationMeta {
            entity_id: Some(updated.reference.clone()),
            user: updated.reviewer.clone(),
            ..OperationMeta::default()
        },
    );
    Some(updated)
}

fn history_record(entry: &ValidationEntry, decision_label: &str) -> Map<String, Value> {
    let issued = if entry.start_date.is_empty() {
        now_iso()
    } else {
        entry.start_date.clone()
    };
    let title = if entry.certificate_type.is_empty() {
        "Medical certificate".to_string()
    } else {
        entry.certificate_type.clone()
    };
    let mut record = Map::new();
    record.insert("id".into(), Value::String(entry.reference.clone()));
    record.insert("reference".into(), Value::String(entry.reference.clone()));
    record.insert("title".into(), Value::String(title));
    record.insert("issued".into(), Value::String(issued));
    record.insert("days".into(), json!(entry.absence_days));
    record.insert("status".into(), Value::String(decision_label.to_string()));
    record.insert("institution".into(), Value::String(entry.institution.clone()));
    record.insert("notes".into(), Value::String(entry.notes.clone()));
    if let Some(reviewer) = &entry.reviewer {
        record.insert("reviewer".into(), Value::String(reviewer.clone()));
    }
    if let Some(score) = entry.risk_score {
        record.insert("riskScore".into(), json!(score));
    }
    if let Some(level) = entry.risk_level {
        record.insert("riskLevel".into(), json!(level));
    }
    if let Some(descriptor) = &entry.risk_descriptor {
        record.insert("riskDescriptor".into(), Value::String(descriptor.clone()));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_days_is_inclusive() {
        assert_eq!(absence_days("2024-01-01", "2024-01-01"), 1);
        assert_eq!(absence_days("2024-01-01", "2024-01-07"), 7);
        assert_eq!(absence_days("", "2024-01-07"), 1);
        assert_eq!(absence_days("2024-01-07", "2024-01-01"), 1);
    }

    #[test]
    fn status_serde_uses_wire_names() {
        let value = serde_json::to_value(CertificateStatus::InReview).unwrap();
        assert_eq!(value, "in-review");
        let back: CertificateStatus = serde_json::from_value(value).unwrap();
        assert_eq!(back, CertificateStatus::InReview);
    }
}
