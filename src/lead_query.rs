//! Paginated, filtered read access over both lead collections.
//!
//! Single-kind queries delegate straight to that kind's store. `all` queries
//! merge the newest window of each kind. The merge window is `limit` rows per
//! kind, so pages past the first can undercount when one kind dominates a
//! page boundary; that matches the observable behavior of the admin listing
//! this service replaces and is covered by a test rather than corrected.

use crate::errors::AppError;
use crate::lead_store::LeadStore;
use crate::models::{KindTotals, Lead, LeadFilter, LeadKind, LeadListing, LeadQueryParams};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Which collection(s) a listing request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelector {
    All,
    One(LeadKind),
}

impl KindSelector {
    /// Parses the `kind` query value. `home` is accepted as a legacy alias
    /// for the B2B collection.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("all") => Ok(KindSelector::All),
            Some("b2b") | Some("home") => Ok(KindSelector::One(LeadKind::B2B)),
            Some("b2c") => Ok(KindSelector::One(LeadKind::B2C)),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unknown lead kind '{}' (expected b2b, b2c or all)",
                other
            ))),
        }
    }
}

pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn filter_from(params: &LeadQueryParams) -> LeadFilter {
    LeadFilter {
        from: params.from,
        to: params.to,
        source: params
            .source
            .clone()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "all"),
        search: params
            .search
            .clone()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    }
}

/// Runs a listing query against the two stores.
pub async fn run_query<S>(
    b2b: &S,
    b2c: &S,
    params: &LeadQueryParams,
) -> Result<LeadListing, AppError>
where
    S: LeadStore,
{
    let page = clamp_page(params.page);
    let limit = clamp_limit(params.limit);
    let filter = filter_from(params);

    match KindSelector::parse(params.kind.as_deref())? {
        KindSelector::One(kind) => {
            let store = match kind {
                LeadKind::B2B => b2b,
                LeadKind::B2C => b2c,
            };
            let skip = (page - 1) * limit;
            let total = store.count(&filter).await?;
            let items = store.find(&filter, skip, limit).await?;
            Ok(LeadListing {
                success: true,
                kind: kind.as_str(),
                total,
                page,
                limit,
                items,
                totals: None,
            })
        }
        KindSelector::All => {
            let b2b_items = b2b.find(&filter, 0, limit).await?;
            let b2b_total = b2b.count(&filter).await?;
            let b2c_items = b2c.find(&filter, 0, limit).await?;
            let b2c_total = b2c.count(&filter).await?;

            let mut merged: Vec<Lead> = b2b_items.into_iter().chain(b2c_items).collect();
            merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let start = ((page - 1) * limit) as usize;
            let items: Vec<Lead> = merged
                .into_iter()
                .skip(start)
                .take(limit as usize)
                .collect();

            Ok(LeadListing {
                success: true,
                kind: "all",
                total: b2b_total + b2c_total,
                page,
                limit,
                items,
                totals: Some(KindTotals {
                    b2b: b2b_total,
                    b2c: b2c_total,
                }),
            })
        }
    }
}
