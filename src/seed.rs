//! Deterministic demo data, loaded through the normal persistence path so
//! events fire and the durable mirror is written. The `seed_demo` binary is
//! the composition root that calls this.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::error::AppResult;
use crate::history::HistoryMap;
use crate::plans::{PlanMap, PreventivePlan};
use crate::risk::RiskLevel;
use crate::store::{DualStore, StoreName};
use crate::validations::{CertificateFile, CertificateStatus, Priority, ValidationEntry};

const DEMO_CERTIFICATE_COUNT: usize = 20;
const HISTORY_EMPLOYEE_COUNT: usize = 8;
const PLAN_EMPLOYEE_COUNT: usize = 4;

struct DemoEmployee {
    id: &'static str,
    name: &'static str,
    position: &'static str,
    sector: &'static str,
}

const DEMO_EMPLOYEES: &[DemoEmployee] = &[
    DemoEmployee { id: "emp-1001", name: "Carla Mendez", position: "Warehouse operator", sector: "Logistics" },
    DemoEmployee { id: "emp-1002", name: "Jorge Alonso", position: "Line technician", sector: "Production" },
    DemoEmployee { id: "emp-1003", name: "Valeria Ruiz", position: "Quality inspector", sector: "Quality" },
    DemoEmployee { id: "emp-1004", name: "Martin Paez", position: "Forklift driver", sector: "Logistics" },
    DemoEmployee { id: "emp-1005", name: "Sofia Bravo", position: "Administrative assistant", sector: "Administration" },
    DemoEmployee { id: "emp-1006", name: "Diego Funes", position: "Maintenance mechanic", sector: "Maintenance" },
    DemoEmployee { id: "emp-1007", name: "Ana Castells", position: "Shift supervisor", sector: "Production" },
    DemoEmployee { id: "emp-1008", name: "Luis Ocampo", position: "Safety officer", sector: "Safety" },
];

struct Scenario {
    priority: Priority,
    status: CertificateStatus,
    absence_type: &'static str,
    certificate_type: &'static str,
    detailed_reason: &'static str,
    institution: &'static str,
    duration_days: i64,
    notes: &'static str,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        priority: Priority::High,
        status: CertificateStatus::Pending,
        absence_type: "accident",
        certificate_type: "Workplace accident",
        detailed_reason: "Lumbar injury after load handling. Needs rest and physiotherapy.",
        institution: "Clinica del Sur",
        duration_days: 7,
        notes: "Waiting for complementary imaging report.",
    },
    Scenario {
        priority: Priority::Medium,
        status: CertificateStatus::InReview,
        absence_type: "illness",
        certificate_type: "Flu rest",
        detailed_reason: "Fever with intense headache. Home rest prescribed.",
        institution: "Hospital Central",
        duration_days: 5,
        notes: "Complementary lab work requested.",
    },
    Scenario {
        priority: Priority::Low,
        status: CertificateStatus::Pending,
        absence_type: "illness",
        certificate_type: "Preventive check-up",
        detailed_reason: "Scheduled cardiology control. 48h rest after the study.",
        institution: "Centro Cardiologico Norte",
        duration_days: 2,
        notes: "No additional observations.",
    },
    Scenario {
        priority: Priority::Medium,
        status: CertificateStatus::Validated,
        absence_type: "illness",
        certificate_type: "Musculoskeletal injury",
        detailed_reason: "Chronic lumbar pain flare-up. Supervised physiotherapy required.",
        institution: "Sanatorio Oeste",
        duration_days: 9,
        notes: "Preventive plan assigned by the occupational physician.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub validations: usize,
    pub employees_with_history: usize,
    pub employees_with_plans: usize,
}

/// Fill the store with the demo dataset: a validation queue, per-employee
/// history, and a few preventive plans. Waits for the durable mirror so a
/// freshly seeded profile survives a fast-store wipe.
pub async fn run_demo_seed(store: &DualStore) -> AppResult<SeedSummary> {
    let now = Utc::now();

    let entries: Vec<ValidationEntry> = (0..DEMO_CERTIFICATE_COUNT)
        .map(|index| {
            let employee = &DEMO_EMPLOYEES[index % DEMO_EMPLOYEES.len()];
            let scenario = &SCENARIOS[index % SCENARIOS.len()];
            let submitted = now - Duration::minutes(90 * index as i64);
            let start = submitted - Duration::days(scenario.duration_days + 1);
            let end = start + Duration::days(scenario.duration_days);
            let reference = format!("CM-DEMO-{:04}", index + 1);
            ValidationEntry {
                reference: reference.clone(),
                employee: employee.name.to_string(),
                employee_id: employee.id.to_string(),
                position: employee.position.to_string(),
                sector: employee.sector.to_string(),
                status: scenario.status,
                priority: scenario.priority,
                submitted: submitted.to_rfc3339(),
                received_timestamp: submitted.timestamp_millis(),
                detailed_reason: scenario.detailed_reason.to_string(),
                absence_days: scenario.duration_days.max(1) as u32,
                absence_type: scenario.absence_type.to_string(),
                certificate_type: scenario.certificate_type.to_string(),
                institution: scenario.institution.to_string(),
                start_date: start.format("%Y-%m-%d").to_string(),
                end_date: end.format("%Y-%m-%d").to_string(),
                notes: scenario.notes.to_string(),
                risk_score: None,
                risk_level: None,
                risk_descriptor: None,
                reviewer: None,
                certificate_file: Some(CertificateFile {
                    name: format!("{reference}.png"),
                    size: "0.42 MB".to_string(),
                    uploaded_at: submitted.to_rfc3339(),
                    content_type: "image/png".to_string(),
                }),
            }
        })
        .collect();

    let mut history = HistoryMap::new();
    for (idx, employee) in DEMO_EMPLOYEES.iter().take(HISTORY_EMPLOYEE_COUNT).enumerate() {
        let issued = (now - Duration::days(idx as i64 + 5)).format("%Y-%m-%d").to_string();
        let reference = format!("CM-HIS-{:04}", idx + 101);
        let level = if idx % 3 == 0 {
            RiskLevel::High
        } else if idx % 2 == 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        let score = match level {
            RiskLevel::High => 7.8,
            RiskLevel::Medium => 5.2,
            RiskLevel::Low => 3.9,
        };
        let record = json!({
            "id": reference,
            "reference": reference,
            "title": "Medical rest",
            "issued": issued,
            "days": 5,
            "status": "validated",
            "document": format!("{reference}.pdf"),
            "institution": "Sanatorio Central",
            "notes": "Weekly medical follow-up.",
            "reviewer": "Dr. Gabriel Caamano",
            "riskScore": score,
            "riskLevel": level,
            "riskDescriptor": level.descriptor(),
        });
        history.insert(employee.id.to_string(), vec![record]);
    }

    let mut plans = PlanMap::new();
    for (idx, employee) in DEMO_EMPLOYEES.iter().take(PLAN_EMPLOYEE_COUNT).enumerate() {
        plans.insert(
            employee.id.to_string(),
            PreventivePlan {
                actions: vec![
                    "Adapt workstation to avoid torsion efforts".to_string(),
                    "Weekly clinical check".to_string(),
                ],
                follow_ups: vec![
                    format!("15 Mar - Physiotherapy session {}", idx + 1),
                    format!("30 Mar - Occupational clinic {}", idx + 1),
                ],
                recommendations: vec![
                    "Log symptoms in the corporate wellness app".to_string(),
                    "Active breaks every 90 minutes".to_string(),
                ],
            },
        );
    }

    store.write_durable(StoreName::Validations, &entries).await?;
    store.write_durable(StoreName::History, &history).await?;
    store.write_durable(StoreName::Plans, &plans).await?;

    let summary = SeedSummary {
        validations: entries.len(),
        employees_with_history: history.len(),
        employees_with_plans: plans.len(),
    };
    tracing::info!(
        target: "absentia",
        event = "demo_seed_done",
        validations = summary.validations,
        history_employees = summary.employees_with_history,
        plans = summary.employees_with_plans,
    );
    Ok(summary)
}
