use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::AppError,
    lead_store::{LeadStore, PgLeadStore},
    mailer::LeadNotifier,
    models::{IntakeAccepted, IntakeNotifyFailed, Lead, LeadKind, LeadSubmission},
    validation::{validate_business_email, validate_consumer_email},
};

/// Advisory warning attached to a 201 whose persistence step failed.
const DB_WARNING: &str =
    "Lead was not saved to the database; the email notification was still sent.";

/// Terminal states of one intake attempt.
///
/// Flow per submission: required-field check, kind-specific email check,
/// best-effort persistence, then the notification attempt whose outcome
/// determines the HTTP status. Persistence failure alone never blocks the
/// notification.
#[derive(Debug)]
pub enum IntakeOutcome {
    /// A required or invalid field stopped the submission.
    Rejected(AppError),
    /// Notification succeeded; `warning` is set when persistence failed and
    /// the notified record is unsaved.
    Accepted {
        lead: Lead,
        warning: Option<String>,
    },
    /// The notification step failed; the lead payload is retained for the
    /// error response.
    NotifyFailed {
        lead: Lead,
        error: String,
        db_warning: Option<String>,
    },
}

impl IntakeOutcome {
    pub fn into_response(self) -> Response {
        match self {
            IntakeOutcome::Rejected(err) => err.into_response(),
            IntakeOutcome::Accepted { lead, warning } => (
                StatusCode::CREATED,
                Json(IntakeAccepted {
                    success: true,
                    data: lead,
                    warning,
                }),
            )
                .into_response(),
            IntakeOutcome::NotifyFailed {
                lead,
                error,
                db_warning,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IntakeNotifyFailed {
                    success: false,
                    message: "Failed to send email notification".to_string(),
                    error,
                    data: lead,
                    db_warning,
                }),
            )
                .into_response(),
        }
    }
}

/// Runs one submission through the intake pipeline.
///
/// Generic over the store and notifier so the pipeline is exercised against
/// in-memory fakes in tests and the Postgres store + mail vendor in handlers.
pub async fn process_submission<S, N>(
    store: &S,
    notifier: &N,
    kind: LeadKind,
    submission: LeadSubmission,
    notify_timeout: Duration,
) -> IntakeOutcome
where
    S: LeadStore,
    N: LeadNotifier,
{
    // Step 1: required fields
    let has_name = submission
        .name
        .as_deref()
        .map(str::trim)
        .is_some_and(|s| !s.is_empty());
    let has_phone = submission
        .phone
        .as_deref()
        .map(str::trim)
        .is_some_and(|s| !s.is_empty());

    if !has_name || !has_phone {
        let missing: Vec<&str> = [(!has_name, "name"), (!has_phone, "phone")]
            .iter()
            .filter_map(|(missing, field)| missing.then_some(*field))
            .collect();
        return IntakeOutcome::Rejected(AppError::Validation {
            message: format!("{} required", missing.join(" and ")),
            field: None,
        });
    }

    // Step 2: email rules differ per kind. B2B demands a business-grade
    // address; B2C accepts any well-formed one. Absent email is fine for both.
    if let Some(email) = submission
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        let check = match kind {
            LeadKind::B2B => validate_business_email(email),
            LeadKind::B2C => validate_consumer_email(email),
        };
        if !check.is_valid {
            return IntakeOutcome::Rejected(AppError::Validation {
                message: check.message.unwrap_or("Invalid email address").to_string(),
                field: Some("email"),
            });
        }
        if kind == LeadKind::B2B && !check.is_business {
            return IntakeOutcome::Rejected(AppError::Validation {
                message: check
                    .message
                    .unwrap_or("Business email required")
                    .to_string(),
                field: Some("email"),
            });
        }
    }

    // Step 3: best-effort persistence. A storage failure is logged and the
    // unsaved record carries on so the notification still has full lead data.
    let draft = submission.into_lead(kind);
    let (lead, warning) = match store.create(draft.clone()).await {
        Ok(stored) => {
            tracing::info!("{} lead saved: {:?}", kind, stored.id);
            (stored, None)
        }
        Err(err @ AppError::Validation { .. }) => return IntakeOutcome::Rejected(err),
        Err(e) => {
            tracing::error!(
                "Database save failed ({} lead) - continuing to send notification: {}",
                kind,
                e
            );
            (draft, Some(DB_WARNING.to_string()))
        }
    };

    // Step 4: notification decides the HTTP outcome.
    match tokio::time::timeout(notify_timeout, notifier.send(kind, &lead)).await {
        Ok(Ok(())) => {
            tracing::info!("Notification sent for {} lead '{}'", kind, lead.name);
            IntakeOutcome::Accepted { lead, warning }
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to notify {} lead '{}': {}", kind, lead.name, e);
            IntakeOutcome::NotifyFailed {
                lead,
                error: e.to_string(),
                db_warning: warning,
            }
        }
        Err(_) => {
            tracing::error!(
                "Notification timed out after {}s for {} lead '{}'",
                notify_timeout.as_secs(),
                kind,
                lead.name
            );
            IntakeOutcome::NotifyFailed {
                lead,
                error: format!(
                    "email notification timed out after {}s",
                    notify_timeout.as_secs()
                ),
                db_warning: warning,
            }
        }
    }
}

/// POST /api/v1/leads/b2b
pub async fn submit_b2b_lead(
    State(state): State<Arc<crate::handlers::AppState>>,
    Json(payload): Json<LeadSubmission>,
) -> Response {
    tracing::info!("POST /leads/b2b - source: {:?}", payload.source);
    let store = PgLeadStore::new(state.db.clone(), LeadKind::B2B);
    process_submission(
        &store,
        &state.mailer,
        LeadKind::B2B,
        payload,
        state.config.notify_timeout(),
    )
    .await
    .into_response()
}

/// POST /api/v1/leads/b2c
pub async fn submit_b2c_lead(
    State(state): State<Arc<crate::handlers::AppState>>,
    Json(payload): Json<LeadSubmission>,
) -> Response {
    tracing::info!("POST /leads/b2c - source: {:?}", payload.source);
    let store = PgLeadStore::new(state.db.clone(), LeadKind::B2C);
    process_submission(
        &store,
        &state.mailer,
        LeadKind::B2C,
        payload,
        state.config.notify_timeout(),
    )
    .await
    .into_response()
}
