use crate::config::Config;
use crate::db::Database;
use crate::errors::AppError;
use crate::lead_query::{self, KindSelector};
use crate::lead_store::{LeadStore, PgLeadStore};
use crate::mailer::{LeadNotifier, MailNotifier};
use crate::models::{LeadKind, LeadListing, LeadQueryParams, NotifyRequest, PurgeParams};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// The configured notification transport.
    pub mailer: MailNotifier,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-capture-api",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn list_with(
    state: Arc<AppState>,
    params: LeadQueryParams,
) -> Result<Json<LeadListing>, AppError> {
    let b2b = PgLeadStore::new(state.db.clone(), LeadKind::B2B);
    let b2c = PgLeadStore::new(state.db.clone(), LeadKind::B2C);
    let listing = lead_query::run_query(&b2b, &b2c, &params).await?;
    Ok(Json(listing))
}

/// GET /api/v1/leads
///
/// Paginated, filtered listing over one or both lead collections.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeadQueryParams>,
) -> Result<Json<LeadListing>, AppError> {
    tracing::info!("GET /leads - params: {:?}", params);
    list_with(state, params).await
}

/// GET /api/v1/leads/b2b — per-kind convenience listing.
pub async fn list_b2b_leads(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<LeadQueryParams>,
) -> Result<Json<LeadListing>, AppError> {
    params.kind = Some("b2b".to_string());
    list_with(state, params).await
}

/// GET /api/v1/leads/b2c — per-kind convenience listing.
pub async fn list_b2c_leads(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<LeadQueryParams>,
) -> Result<Json<LeadListing>, AppError> {
    params.kind = Some("b2c".to_string());
    list_with(state, params).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Checks the caller's bearer token against the server-held admin secret.
/// A server without a configured token refuses rather than running open.
fn check_admin(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = expected.ok_or_else(|| {
        AppError::Internal("ADMIN_TOKEN not configured on server".to_string())
    })?;
    match bearer_token(headers) {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized(
            "admin token missing or mismatched".to_string(),
        )),
    }
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    check_admin(state.config.admin_token.as_deref(), headers)
}

/// DELETE /api/v1/admin/leads?kind=&before=
///
/// Authenticated retention purge: one batched delete per addressed kind,
/// restricted to leads created strictly before the cutoff.
pub async fn purge_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PurgeParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    let before: Option<DateTime<Utc>> = match &params.before {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| {
                    AppError::BadRequest("Invalid before date (use ISO string)".to_string())
                })?,
        ),
        None => None,
    };

    tracing::info!(
        "DELETE /admin/leads - kind: {:?}, before: {:?}",
        params.kind,
        before
    );

    match KindSelector::parse(params.kind.as_deref())? {
        KindSelector::One(kind) => {
            let store = PgLeadStore::new(state.db.clone(), kind);
            let deleted = store.delete_many(before).await?;
            Ok(Json(json!({
                "success": true,
                "kind": kind.as_str(),
                "deletedCount": deleted,
            })))
        }
        KindSelector::All => {
            let b2b = PgLeadStore::new(state.db.clone(), LeadKind::B2B);
            let b2c = PgLeadStore::new(state.db.clone(), LeadKind::B2C);
            let deleted_b2b = b2b.delete_many(before).await?;
            let deleted_b2c = b2c.delete_many(before).await?;
            Ok(Json(json!({
                "success": true,
                "kind": "all",
                "deleted": { "b2b": deleted_b2b, "b2c": deleted_b2c },
            })))
        }
    }
}

/// POST /api/v1/notify
///
/// Dispatches a notification for an explicit lead payload, without touching
/// the stores. Used to re-send an alert for an already-captured lead.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (kind, lead) = match (request.kind, request.lead) {
        (Some(kind), Some(lead)) => (kind, lead),
        _ => {
            return Err(AppError::BadRequest(
                "kind and lead are required".to_string(),
            ))
        }
    };

    if lead.name.trim().is_empty() || lead.phone.trim().is_empty() {
        return Err(AppError::Validation {
            message: "lead.name and lead.phone are required".to_string(),
            field: None,
        });
    }

    tracing::info!("POST /notify - {} lead '{}'", kind, lead.name);

    let timeout = state.config.notify_timeout();
    match tokio::time::timeout(timeout, state.mailer.send(kind, &lead)).await {
        Ok(Ok(())) => Ok(Json(json!({
            "success": true,
            "message": "Email sent successfully",
        }))),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(AppError::Notify(format!(
            "email notification timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// GET /api/v1/diagnostics/db
///
/// Probes database connectivity and reports pool state.
pub async fn db_diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    Database::ping(&state.db).await.map_err(AppError::Storage)?;

    Ok(Json(json!({
        "success": true,
        "message": "Database connection successful",
        "pool": {
            "size": state.db.size(),
            "idle": state.db.num_idle(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/v1/diagnostics/email
///
/// Admin-gated, redacted report of the mail configuration. Never returns the
/// API key itself.
pub async fn email_diagnostics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    let key_preview: String = state.config.mail_api_key.chars().take(6).collect();

    Ok(Json(json!({
        "success": true,
        "message": "Email configuration diagnostic",
        "config": {
            "provider": state.config.mail_provider.as_str(),
            "apiKeyPrefix": format!("{}...", key_preview),
            "emailFrom": state.config.email_from,
            "emailTo": state.config.email_to,
            "notifyTimeoutSecs": state.config.notify_timeout_secs,
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(
            bearer_token(&headers_with_auth("Bearer secret")),
            Some("secret")
        );
        assert_eq!(bearer_token(&headers_with_auth("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn admin_check_requires_a_configured_token() {
        let err = check_admin(None, &headers_with_auth("Bearer secret")).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn admin_check_rejects_missing_or_mismatched_tokens() {
        let err = check_admin(Some("secret"), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = check_admin(Some("secret"), &headers_with_auth("Bearer wrong")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn admin_check_accepts_the_configured_token() {
        assert!(check_admin(Some("secret"), &headers_with_auth("Bearer secret")).is_ok());
    }
}
