use absentia::history::employee_history;
use absentia::plans::{employee_plan, PreventivePlan};
use absentia::risk::RiskLevel;
use absentia::validations::{
    approve_certificate, begin_review, reject_certificate, submit_certificate, validation_entries,
    CertificateStatus, ReviewDecision, ValidationEntry,
};
use absentia::{NetworkStatus, OperationQueue};
use anyhow::Result;

#[path = "util.rs"]
mod util;

fn entry(reference: &str) -> ValidationEntry {
    ValidationEntry {
        reference: reference.to_string(),
        employee: "Carla Mendez".to_string(),
        employee_id: "emp-1001".to_string(),
        position: "Warehouse operator".to_string(),
        sector: "Logistics".to_string(),
        detailed_reason: "Lumbar injury after load handling, surgery scheduled.".to_string(),
        certificate_type: "Workplace accident".to_string(),
        absence_type: "accident".to_string(),
        institution: "Clinica del Sur".to_string(),
        start_date: "2024-03-01".to_string(),
        end_date: "2024-03-07".to_string(),
        notes: "Waiting for imaging report.".to_string(),
        ..ValidationEntry::default()
    }
}

fn fixture() -> (absentia::DualStore, OperationQueue) {
    let store = util::memory_store();
    let queue = OperationQueue::new(store.clone(), NetworkStatus::online());
    (store, queue)
}

#[tokio::test]
async fn submit_normalizes_and_enqueues() -> Result<()> {
    let (store, queue) = fixture();
    let submitted = submit_certificate(&store, &queue, entry("CM-0001"), Some("u-hr-1"));

    assert_eq!(submitted.status, CertificateStatus::Pending);
    assert_eq!(submitted.absence_days, 7);
    assert!(!submitted.submitted.is_empty());

    let entries = validation_entries(&store);
    assert_eq!(entries.len(), 1);

    let ops = queue.snapshot();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, "submitCertificate");
    assert_eq!(ops[0].entity_id.as_deref(), Some("CM-0001"));
    assert_eq!(ops[0].user.as_deref(), Some("u-hr-1"));
    // The acting user resolves in the mock directory.
    let user = absentia::users::find_user("u-hr-1").expect("mock user exists");
    assert_eq!(user.role, "hr-analyst");
    Ok(())
}

#[tokio::test]
async fn resubmitting_a_reference_replaces_the_entry() -> Result<()> {
    let (store, queue) = fixture();
    submit_certificate(&store, &queue, entry("CM-0001"), None);
    let mut corrected = entry("CM-0001");
    corrected.institution = "Hospital Central".to_string();
    submit_certificate(&store, &queue, corrected, None);

    let entries = validation_entries(&store);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].institution, "Hospital Central");
    Ok(())
}

#[tokio::test]
async fn full_review_cycle_approval() -> Result<()> {
    let (store, queue) = fixture();
    submit_certificate(&store, &queue, entry("CM-0001"), None);

    assert!(begin_review(&store, "CM-0001"));
    assert_eq!(
        validation_entries(&store)[0].status,
        CertificateStatus::InReview
    );
    assert!(!begin_review(&store, "CM-MISSING"));

    let plan = PreventivePlan {
        actions: vec!["Supervised physiotherapy".to_string()],
        follow_ups: vec!["Clinical check in two weeks".to_string()],
        recommendations: vec!["No load handling for a month".to_string()],
    };
    let approved = approve_certificate(
        &store,
        &queue,
        "CM-0001",
        ReviewDecision {
            score: Some(7.8),
            notes: Some("Validated with imaging report.".to_string()),
            reviewer: Some("Dr. Gabriel Caamano".to_string()),
            plan: Some(plan.clone()),
        },
    )
    .expect("entry exists");

    assert_eq!(approved.status, CertificateStatus::Validated);
    assert_eq!(approved.risk_level, Some(RiskLevel::High));
    assert_eq!(approved.risk_score, Some(7.8));

    // History record landed through the additive merge.
    let history = employee_history(&store, "emp-1001");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], "CM-0001");
    assert_eq!(history[0]["status"], "validated");
    assert_eq!(history[0]["riskLevel"], "high");
    assert_eq!(history[0]["planActions"][0], "Supervised physiotherapy");

    // Plan stored for the employee.
    assert_eq!(employee_plan(&store, "emp-1001"), Some(plan));

    // Both workflow steps queued an operation.
    let ops = queue.snapshot();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1].kind, "validateCertificate");
    assert_eq!(ops[1].payload["decision"], "validated");
    Ok(())
}

#[tokio::test]
async fn approving_twice_does_not_duplicate_history() -> Result<()> {
    let (store, queue) = fixture();
    submit_certificate(&store, &queue, entry("CM-0001"), None);

    let decision = || ReviewDecision {
        score: Some(6.0),
        reviewer: Some("Dr. Gabriel Caamano".to_string()),
        ..ReviewDecision::default()
    };
    approve_certificate(&store, &queue, "CM-0001", decision());
    // The same action fired again, as a replayed operation would cause.
    approve_certificate(&store, &queue, "CM-0001", decision());

    assert_eq!(employee_history(&store, "emp-1001").len(), 1);
    Ok(())
}

#[tokio::test]
async fn rejection_records_reviewer_notes() -> Result<()> {
    let (store, queue) = fixture();
    submit_certificate(&store, &queue, entry("CM-0002"), None);

    let rejected = reject_certificate(
        &store,
        &queue,
        "CM-0002",
        ReviewDecision {
            notes: Some("Certificate unreadable, please re-upload.".to_string()),
            reviewer: Some("Dra. Lucia Ferreyra".to_string()),
            ..ReviewDecision::default()
        },
    )
    .expect("entry exists");

    assert_eq!(rejected.status, CertificateStatus::Rejected);
    assert!(rejected.notes.contains("re-upload"));
    // Without a manual score the keyword fallback still assigns a band.
    assert!(rejected.risk_score.is_some());

    let history = employee_history(&store, "emp-1001");
    assert_eq!(history[0]["status"], "rejected");
    assert_eq!(history[0]["reviewer"], "Dra. Lucia Ferreyra");

    let ops = queue.snapshot();
    assert_eq!(ops[1].payload["decision"], "rejected");
    Ok(())
}

#[tokio::test]
async fn closing_a_missing_reference_returns_none() -> Result<()> {
    let (store, queue) = fixture();
    assert!(approve_certificate(&store, &queue, "CM-NOPE", ReviewDecision::default()).is_none());
    assert!(queue.snapshot().is_empty());
    Ok(())
}
