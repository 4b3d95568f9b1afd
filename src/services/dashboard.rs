//! Dashboard refresh orchestration.
//!
//! One refresh issues the four report fetches concurrently and computes
//! the derived rows only when every fetch succeeded. A partial failure
//! fails the whole refresh rather than mixing stale and fresh metrics.
//! A generation counter makes overlapping refreshes "last request wins":
//! a slow, superseded response is discarded instead of overwriting a
//! newer snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::clients::backend::{ApiError, list_entries};
use crate::models::{CogsSoldSummary, DailyFinancialRow, Totals};
use crate::services::finance::{build_daily_rows, compute_totals, pick_amount};
use crate::session::SessionManager;

const COGS_SALES_FIELDS: &[&str] = &["cogsSales", "cogs_sales", "salesTotal", "sales", "revenue"];
const COGS_COST_FIELDS: &[&str] = &["cogsCost", "cogs_cost", "costTotal", "cost"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Appends `from`/`to` query parameters to an endpoint path.
    #[must_use]
    pub fn apply(&self, path: &str) -> String {
        let mut parts = Vec::new();
        if let Some(from) = self.from {
            parts.push(format!("from={from}"));
        }
        if let Some(to) = self.to {
            parts.push(format!("to={to}"));
        }

        if parts.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", parts.join("&"))
        }
    }
}

/// The complete derived view for one refresh. Replaced wholesale, never
/// patched.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub rows: Vec<DailyFinancialRow>,
    pub totals: Totals,
    pub cogs_sold: CogsSoldSummary,
    pub refreshed_at: DateTime<Utc>,
}

pub struct DashboardService {
    session: Arc<SessionManager>,
    tz: FixedOffset,
    generation: AtomicU64,
    latest: RwLock<Option<DashboardSnapshot>>,
}

impl DashboardService {
    #[must_use]
    pub fn new(session: Arc<SessionManager>, tz: FixedOffset) -> Self {
        Self {
            session,
            tz,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub async fn latest(&self) -> Option<DashboardSnapshot> {
        self.latest.read().await.clone()
    }

    /// Fetches all four report payloads and recomputes the snapshot.
    ///
    /// Returns `Ok(None)` when a newer refresh was issued while this one
    /// was in flight; the stale result is discarded unseen.
    pub async fn refresh(&self, range: DateRange) -> Result<Option<DashboardSnapshot>, ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let sales_path = range.apply("reports/sales-summary");
        let expenses_path = range.apply("expenses");
        let purchases_path = range.apply("inventory/purchases");
        let cogs_path = range.apply("reports/cogs-summary");
        let (sales, expenses, purchases, cogs_sold) = tokio::try_join!(
            self.fetch(&sales_path),
            self.fetch(&expenses_path),
            self.fetch(&purchases_path),
            self.fetch(&cogs_path),
        )?;

        let cogs_sold = CogsSoldSummary {
            cogs_sales: pick_amount(&cogs_sold, COGS_SALES_FIELDS),
            cogs_cost: pick_amount(&cogs_sold, COGS_COST_FIELDS),
        };

        let rows = build_daily_rows(
            &sales,
            &list_entries(&expenses),
            &list_entries(&purchases),
            self.tz,
        );
        let totals = compute_totals(&rows, &cogs_sold);

        let snapshot = DashboardSnapshot {
            rows,
            totals,
            cogs_sold,
            refreshed_at: Utc::now(),
        };

        let mut latest = self.latest.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "stale dashboard refresh discarded");
            return Ok(None);
        }
        *latest = Some(snapshot.clone());

        Ok(Some(snapshot))
    }

    async fn fetch(&self, path: &str) -> Result<Value, ApiError> {
        self.session.request(Method::GET, path, None).await
    }
}
