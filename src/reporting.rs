//! Dashboard aggregation: recurrent pathologies and per-employee risk.
//!
//! Pure functions over the persisted collections; nothing here writes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::history::all_history;
use crate::pathology::classify;
use crate::risk::{assess_score, score_certificate, RiskLevel};
use crate::store::DualStore;
use crate::validations::validation_entries;

/// One employee/pathology bucket: how often the pathology appears for the
/// employee and the worst risk observed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathologyBucket {
    pub employee_key: String,
    pub employee: String,
    pub pathology: String,
    pub occurrences: u32,
    pub score: f64,
    pub level: RiskLevel,
    pub recurrent: bool,
}

/// Employee ranking row: the employee's most recurrent pathology and their
/// highest risk score across buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRisk {
    pub employee_key: String,
    pub employee: String,
    pub top_pathology: String,
    pub occurrences: u32,
    pub score: f64,
    pub level: RiskLevel,
}

#[derive(Default)]
struct BucketAccum {
    employee: String,
    occurrences: u32,
    score: f64,
}

const RECURRENT_THRESHOLD: u32 = 2;

/// Aggregate validation entries and history records into employee/pathology
/// buckets, keeping the maximum risk score seen per bucket.
pub fn recurrence_summary(store: &DualStore) -> Vec<PathologyBucket> {
    let mut buckets: BTreeMap<(String, &'static str), BucketAccum> = BTreeMap::new();

    for entry in validation_entries(store) {
        if entry.employee_id.is_empty() {
            continue;
        }
        let text = format!(
            "{} {} {}",
            entry.certificate_type, entry.absence_type, entry.detailed_reason
        );
        let category = classify(&text);
        let score = match entry.risk_score {
            Some(score) => assess_score(score).score,
            None => score_certificate(&entry.certificate_type, &entry.detailed_reason).score,
        };
        let accum = buckets
            .entry((entry.employee_id.clone(), category.label))
            .or_default();
        accum.occurrences += 1;
        accum.score = accum.score.max(score);
        if accum.employee.is_empty() {
            accum.employee = entry.employee.clone();
        }
    }

    for (employee_key, records) in all_history(store) {
        for record in &records {
            let title = record.get("title").and_then(Value::as_str).unwrap_or("");
            let notes = record.get("notes").and_then(Value::as_str).unwrap_or("");
            let category = classify(&format!("{title} {notes}"));
            let score = match record.get("riskScore").and_then(Value::as_f64) {
                Some(score) => assess_score(score).score,
                None => score_certificate(title, notes).score,
            };
            let accum = buckets
                .entry((employee_key.clone(), category.label))
                .or_default();
            accum.occurrences += 1;
            accum.score = accum.score.max(score);
        }
    }

    let mut summary: Vec<PathologyBucket> = buckets
        .into_iter()
        .map(|((employee_key, pathology), accum)| PathologyBucket {
            employee: if accum.employee.is_empty() {
                employee_key.clone()
            } else {
                accum.employee
            },
            employee_key,
            pathology: pathology.to_string(),
            occurrences: accum.occurrences,
            score: accum.score,
            level: assess_score(accum.score).level,
            recurrent: accum.occurrences >= RECURRENT_THRESHOLD,
        })
        .collect();
    summary.sort_by(compare_buckets);
    summary
}

/// One row per employee, ranked by risk score descending.
pub fn employee_risk_ranking(store: &DualStore) -> Vec<EmployeeRisk> {
    let mut by_employee: BTreeMap<String, PathologyBucket> = BTreeMap::new();
    for bucket in recurrence_summary(store) {
        let replace = match by_employee.get(&bucket.employee_key) {
            Some(best) => compare_buckets(best, &bucket) == Ordering::Greater,
            None => true,
        };
        if replace {
            by_employee.insert(bucket.employee_key.clone(), bucket);
        }
    }
    let mut ranking: Vec<EmployeeRisk> = by_employee
        .into_values()
        .map(|bucket| EmployeeRisk {
            employee_key: bucket.employee_key,
            employee: bucket.employee,
            top_pathology: bucket.pathology,
            occurrences: bucket.occurrences,
            score: bucket.score,
            level: bucket.level,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(b.occurrences.cmp(&a.occurrences))
    });
    ranking
}

fn compare_buckets(a: &PathologyBucket, b: &PathologyBucket) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(b.occurrences.cmp(&a.occurrences))
        .then(a.employee_key.cmp(&b.employee_key))
}
