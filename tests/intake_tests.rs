/// Tests for the intake pipeline
/// Drives `process_submission` against in-memory fakes to cover every
/// terminal state: validation rejection, acceptance with and without a
/// persistence warning, and notification failure.
use chrono::{DateTime, Utc};
use lead_capture_api::errors::AppError;
use lead_capture_api::intake_handler::{process_submission, IntakeOutcome};
use lead_capture_api::lead_store::LeadStore;
use lead_capture_api::mailer::LeadNotifier;
use lead_capture_api::models::{Lead, LeadFilter, LeadKind, LeadSubmission};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

struct FakeStore {
    leads: Mutex<Vec<Lead>>,
    fail_create: bool,
}

impl FakeStore {
    fn new() -> Self {
        Self {
            leads: Mutex::new(Vec::new()),
            fail_create: false,
        }
    }

    fn failing() -> Self {
        Self {
            leads: Mutex::new(Vec::new()),
            fail_create: true,
        }
    }

    fn stored(&self) -> Vec<Lead> {
        self.leads.lock().unwrap().clone()
    }
}

impl LeadStore for FakeStore {
    async fn create(&self, mut lead: Lead) -> Result<Lead, AppError> {
        if self.fail_create {
            return Err(AppError::Storage(sqlx::Error::PoolTimedOut));
        }
        if lead.name.trim().is_empty() || lead.phone.trim().is_empty() {
            return Err(AppError::Validation {
                message: "name and phone are required".to_string(),
                field: None,
            });
        }
        lead.id = Some(Uuid::new_v4());
        self.leads.lock().unwrap().push(lead.clone());
        Ok(lead)
    }

    async fn find(
        &self,
        _filter: &LeadFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Lead>, AppError> {
        let mut all = self.stored();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, _filter: &LeadFilter) -> Result<i64, AppError> {
        Ok(self.stored().len() as i64)
    }

    async fn delete_many(&self, before: Option<DateTime<Utc>>) -> Result<u64, AppError> {
        let mut leads = self.leads.lock().unwrap();
        let original = leads.len();
        match before {
            Some(cutoff) => leads.retain(|l| l.created_at >= cutoff),
            None => leads.clear(),
        }
        Ok((original - leads.len()) as u64)
    }
}

#[derive(Default)]
struct FakeNotifier {
    fail: bool,
    sent: Mutex<Vec<(LeadKind, Lead)>>,
}

impl FakeNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::default(),
        }
    }

    fn deliveries(&self) -> Vec<(LeadKind, Lead)> {
        self.sent.lock().unwrap().clone()
    }
}

impl LeadNotifier for FakeNotifier {
    async fn send(&self, kind: LeadKind, lead: &Lead) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Notify(
                "provider rejected the message".to_string(),
            ));
        }
        self.sent.lock().unwrap().push((kind, lead.clone()));
        Ok(())
    }
}

/// Notifier that never completes; exercises the caller-imposed timeout.
struct StuckNotifier;

impl LeadNotifier for StuckNotifier {
    async fn send(&self, _kind: LeadKind, _lead: &Lead) -> Result<(), AppError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

fn submission(name: &str, phone: &str) -> LeadSubmission {
    LeadSubmission {
        name: Some(name.to_string()),
        phone: Some(phone.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn b2b_lead_with_free_email_is_rejected() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let mut payload = submission("Acme Corp", "+911234567890");
    payload.email = Some("ceo@gmail.com".to_string());

    let outcome =
        process_submission(&store, &notifier, LeadKind::B2B, payload, NOTIFY_TIMEOUT).await;

    match outcome {
        IntakeOutcome::Rejected(AppError::Validation { message, field }) => {
            assert_eq!(field, Some("email"));
            assert!(message.contains("Business email required"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(store.stored().is_empty());
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn b2b_lead_with_business_email_is_accepted() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let mut payload = submission("Jane", "555-0100");
    payload.email = Some("jane@acmecorp.com".to_string());

    let outcome =
        process_submission(&store, &notifier, LeadKind::B2B, payload, NOTIFY_TIMEOUT).await;

    match outcome {
        IntakeOutcome::Accepted { lead, warning } => {
            assert!(warning.is_none());
            assert!(lead.id.is_some());
            assert_eq!(lead.source, "Home Page");
        }
        other => panic!("expected acceptance, got {:?}", other),
    }

    assert_eq!(store.stored().len(), 1);
    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (kind, lead) = &deliveries[0];
    assert_eq!(*kind, LeadKind::B2B);
    assert_eq!(lead.name, "Jane");
    assert_eq!(lead.email.as_deref(), Some("jane@acmecorp.com"));
}

#[tokio::test]
async fn b2c_lead_without_email_is_accepted() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2C,
        submission("Sam", "555-0111"),
        NOTIFY_TIMEOUT,
    )
    .await;

    match outcome {
        IntakeOutcome::Accepted { lead, warning } => {
            assert!(warning.is_none());
            assert_eq!(lead.source, "Employee Verification");
            assert!(lead.email.is_none());
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
}

#[tokio::test]
async fn b2c_lead_accepts_free_provider_email() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let mut payload = submission("Sam", "555-0111");
    payload.email = Some("sam@gmail.com".to_string());

    let outcome =
        process_submission(&store, &notifier, LeadKind::B2C, payload, NOTIFY_TIMEOUT).await;

    assert!(matches!(outcome, IntakeOutcome::Accepted { .. }));
}

#[tokio::test]
async fn b2c_lead_with_malformed_email_is_rejected() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let mut payload = submission("Sam", "555-0111");
    payload.email = Some("not-an-email".to_string());

    let outcome =
        process_submission(&store, &notifier, LeadKind::B2C, payload, NOTIFY_TIMEOUT).await;

    match outcome {
        IntakeOutcome::Rejected(AppError::Validation { field, .. }) => {
            assert_eq!(field, Some("email"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_required_fields_are_named() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2B,
        LeadSubmission {
            name: Some("Jane".to_string()),
            ..Default::default()
        },
        NOTIFY_TIMEOUT,
    )
    .await;
    match outcome {
        IntakeOutcome::Rejected(AppError::Validation { message, .. }) => {
            assert!(message.contains("phone"));
            assert!(!message.contains("name"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2B,
        LeadSubmission::default(),
        NOTIFY_TIMEOUT,
    )
    .await;
    match outcome {
        IntakeOutcome::Rejected(AppError::Validation { message, .. }) => {
            assert!(message.contains("name and phone"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn whitespace_only_fields_count_as_missing() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2C,
        submission("   ", "555-0111"),
        NOTIFY_TIMEOUT,
    )
    .await;

    assert!(matches!(
        outcome,
        IntakeOutcome::Rejected(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn persistence_failure_still_notifies_with_warning() {
    let store = FakeStore::failing();
    let notifier = FakeNotifier::default();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2B,
        submission("Jane", "555-0100"),
        NOTIFY_TIMEOUT,
    )
    .await;

    match outcome {
        IntakeOutcome::Accepted { lead, warning } => {
            assert!(warning.is_some());
            // Unsaved fallback record: no id, but full contact data
            assert!(lead.id.is_none());
            assert_eq!(lead.name, "Jane");
        }
        other => panic!("expected acceptance with warning, got {:?}", other),
    }

    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].1.phone, "555-0100");
}

#[tokio::test]
async fn notify_failure_returns_lead_payload() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::failing();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2C,
        submission("Jane", "555-0100"),
        NOTIFY_TIMEOUT,
    )
    .await;

    match outcome {
        IntakeOutcome::NotifyFailed {
            lead,
            error,
            db_warning,
        } => {
            assert_eq!(lead.name, "Jane");
            assert_eq!(lead.phone, "555-0100");
            assert!(error.contains("provider rejected"));
            assert!(db_warning.is_none());
        }
        other => panic!("expected notify failure, got {:?}", other),
    }

    // The lead was persisted even though the notification failed
    assert_eq!(store.stored().len(), 1);
}

#[tokio::test]
async fn notify_failure_after_persistence_failure_reports_both() {
    let store = FakeStore::failing();
    let notifier = FakeNotifier::failing();

    let outcome = process_submission(
        &store,
        &notifier,
        LeadKind::B2B,
        submission("Jane", "555-0100"),
        NOTIFY_TIMEOUT,
    )
    .await;

    match outcome {
        IntakeOutcome::NotifyFailed {
            lead, db_warning, ..
        } => {
            assert!(lead.id.is_none());
            assert!(db_warning.is_some());
        }
        other => panic!("expected notify failure, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_notifier_is_bounded_by_timeout() {
    let store = FakeStore::new();

    let outcome = process_submission(
        &store,
        &StuckNotifier,
        LeadKind::B2B,
        submission("Jane", "555-0100"),
        Duration::from_millis(50),
    )
    .await;

    match outcome {
        IntakeOutcome::NotifyFailed { error, .. } => {
            assert!(error.contains("timed out"));
        }
        other => panic!("expected timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn company_is_dropped_for_b2c_leads() {
    let store = FakeStore::new();
    let notifier = FakeNotifier::default();

    let mut payload = submission("Sam", "555-0111");
    payload.company = Some("Acme Corp".to_string());

    let outcome =
        process_submission(&store, &notifier, LeadKind::B2C, payload, NOTIFY_TIMEOUT).await;

    match outcome {
        IntakeOutcome::Accepted { lead, .. } => assert!(lead.company.is_none()),
        other => panic!("expected acceptance, got {:?}", other),
    }
}
