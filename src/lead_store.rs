use crate::errors::{AppError, ResultExt};
use crate::models::{Lead, LeadFilter, LeadKind};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Columns the substring search is OR-matched against.
const SEARCH_COLUMNS: &[&str] = &["name", "email", "phone", "company", "service", "source"];

/// Persistence contract for one lead kind. Implemented by the Postgres store
/// in production and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait LeadStore: Send + Sync {
    /// Assigns `id` and `created_at`, persists, returns the stored record.
    /// Rejects empty `name`/`phone` with a field-scoped validation error.
    async fn create(&self, lead: Lead) -> Result<Lead, AppError>;

    /// Filtered page of leads, newest first.
    async fn find(&self, filter: &LeadFilter, skip: i64, limit: i64) -> Result<Vec<Lead>, AppError>;

    /// Number of leads matching `filter`.
    async fn count(&self, filter: &LeadFilter) -> Result<i64, AppError>;

    /// Batched retention purge: deletes leads created strictly before
    /// `before`, or every lead of this kind when no cutoff is given.
    async fn delete_many(&self, before: Option<DateTime<Utc>>) -> Result<u64, AppError>;
}

/// Postgres-backed store for one lead kind's table.
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
    kind: LeadKind,
}

impl PgLeadStore {
    pub fn new(pool: PgPool, kind: LeadKind) -> Self {
        Self { pool, kind }
    }

    pub fn kind(&self) -> LeadKind {
        self.kind
    }
}

impl LeadStore for PgLeadStore {
    async fn create(&self, mut lead: Lead) -> Result<Lead, AppError> {
        if lead.name.trim().is_empty() {
            return Err(AppError::Validation {
                message: "name is required".to_string(),
                field: Some("name"),
            });
        }
        if lead.phone.trim().is_empty() {
            return Err(AppError::Validation {
                message: "phone is required".to_string(),
                field: Some("phone"),
            });
        }

        lead.id = Some(Uuid::new_v4());

        let sql = format!(
            r#"
            INSERT INTO {} (
                id, name, phone, email, company, service, source, kind,
                page_path, utm_source, utm_medium, utm_campaign, meta
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
            self.kind.table()
        );

        let stored = sqlx::query_as::<_, Lead>(&sql)
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.phone)
            .bind(&lead.email)
            .bind(&lead.company)
            .bind(&lead.service)
            .bind(&lead.source)
            .bind(self.kind.as_str())
            .bind(&lead.page_path)
            .bind(&lead.utm_source)
            .bind(&lead.utm_medium)
            .bind(&lead.utm_campaign)
            .bind(&lead.meta)
            .fetch_one(&self.pool)
            .await
            .context(format!("insert into {}", self.kind.table()))?;

        tracing::debug!("Lead stored in {}: {:?}", self.kind.table(), stored.id);
        Ok(stored)
    }

    async fn find(&self, filter: &LeadFilter, skip: i64, limit: i64) -> Result<Vec<Lead>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", self.kind.table()));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(skip);

        qb.build_query_as::<Lead>()
            .fetch_all(&self.pool)
            .await
            .context(format!("list {}", self.kind.table()))
    }

    async fn count(&self, filter: &LeadFilter) -> Result<i64, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", self.kind.table()));
        push_filter(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context(format!("count {}", self.kind.table()))
    }

    async fn delete_many(&self, before: Option<DateTime<Utc>>) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {}", self.kind.table()));
        if let Some(cutoff) = before {
            qb.push(" WHERE created_at < ");
            qb.push_bind(cutoff);
        }

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context(format!("purge {}", self.kind.table()))?;

        tracing::info!(
            "Purged {} lead(s) from {}",
            result.rows_affected(),
            self.kind.table()
        );
        Ok(result.rows_affected())
    }
}

/// Appends the shared WHERE clause for `filter` to `qb`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    qb.push(" WHERE 1=1");

    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ");
        qb.push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at <= ");
        qb.push_bind(to);
    }
    if let Some(source) = &filter.source {
        qb.push(" AND source = ");
        qb.push_bind(source.clone());
    }
    if let Some(search) = &filter.search {
        if !search.is_empty() {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (");
            for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column);
                qb.push(" ILIKE ");
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

/// Escapes LIKE metacharacters so user search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
