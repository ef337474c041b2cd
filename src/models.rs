use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates the two lead collections. B2B leads come from the
/// business-facing pages, B2C leads from the consumer/employee-verification
/// pages; each kind persists to its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadKind {
    B2B,
    B2C,
}

impl LeadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadKind::B2B => "b2b",
            LeadKind::B2C => "b2c",
        }
    }

    /// Table backing this kind's collection.
    pub fn table(&self) -> &'static str {
        match self {
            LeadKind::B2B => "b2b_leads",
            LeadKind::B2C => "b2c_leads",
        }
    }

    /// Origin-page tag applied when a submission carries no explicit source.
    pub fn default_source(&self) -> &'static str {
        match self {
            LeadKind::B2B => "Home Page",
            LeadKind::B2C => "Employee Verification",
        }
    }

    /// Human-readable label used in notification subjects and bodies.
    pub fn type_label(&self) -> &'static str {
        match self {
            LeadKind::B2B => "B2B Profile Verification",
            LeadKind::B2C => "Employee Verification",
        }
    }
}

impl std::fmt::Display for LeadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LeadKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "b2b" => Ok(LeadKind::B2B),
            "b2c" => Ok(LeadKind::B2C),
            other => Err(format!("unknown lead kind '{}'", other)),
        }
    }
}

/// A captured prospect record.
///
/// `id` is `None` only on the unsaved in-memory fallback built when the
/// database is unreachable at intake time; persisted rows always carry one.
/// Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub source: String,
    #[sqlx(try_from = "String")]
    pub kind: LeadKind,
    #[serde(rename = "pagePath", default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Raw form submission body for the intake endpoints.
///
/// `name`/`phone` are optional here so the handler can report exactly which
/// required fields are missing instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "pagePath", default)]
    pub page_path: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

impl LeadSubmission {
    /// Builds the unsaved lead record for `kind`. `name` and `phone` must have
    /// been checked for presence by the caller; empty strings are passed
    /// through and rejected by the store.
    pub fn into_lead(self, kind: LeadKind) -> Lead {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Lead {
            id: None,
            name: self.name.map(|s| s.trim().to_string()).unwrap_or_default(),
            phone: self.phone.map(|s| s.trim().to_string()).unwrap_or_default(),
            email: non_empty(self.email),
            company: match kind {
                LeadKind::B2B => non_empty(self.company),
                LeadKind::B2C => None,
            },
            service: non_empty(self.service),
            source: non_empty(self.source).unwrap_or_else(|| kind.default_source().to_string()),
            kind,
            page_path: non_empty(self.page_path),
            utm_source: non_empty(self.utm_source),
            utm_medium: non_empty(self.utm_medium),
            utm_campaign: non_empty(self.utm_campaign),
            meta: self.meta,
            created_at: Utc::now(),
        }
    }
}

/// Store-level filter shared by `find`, `count` and the query service.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    /// Exact-match origin tag.
    pub source: Option<String>,
    /// Case-insensitive substring, OR-matched across the text columns.
    pub search: Option<String>,
}

/// Query string accepted by the lead listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQueryParams {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Per-kind totals reported alongside a merged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindTotals {
    pub b2b: i64,
    pub b2c: i64,
}

/// Response body for the listing endpoints.
#[derive(Debug, Serialize)]
pub struct LeadListing {
    pub success: bool,
    pub kind: &'static str,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub items: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<KindTotals>,
}

/// 201 body for a successfully notified submission.
#[derive(Debug, Serialize)]
pub struct IntakeAccepted {
    pub success: bool,
    pub data: Lead,
    /// Present when persistence failed and the lead was notified unsaved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// 500 body when the notification step failed. The lead payload is included
/// so the client still has confirmation context.
#[derive(Debug, Serialize)]
pub struct IntakeNotifyFailed {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub data: Lead,
    #[serde(rename = "dbWarning", skip_serializing_if = "Option::is_none")]
    pub db_warning: Option<String>,
}

/// Query string for the retention purge endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurgeParams {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    /// ISO-8601 cutoff; only leads created strictly before it are deleted.
    #[serde(default)]
    pub before: Option<String>,
}

/// Body for the direct notification endpoint.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(default, alias = "type")]
    pub kind: Option<LeadKind>,
    #[serde(default)]
    pub lead: Option<Lead>,
}
