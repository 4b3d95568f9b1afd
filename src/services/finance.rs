//! Financial aggregation for the dashboard.
//!
//! The backend's report payloads are loosely typed: the same concept has
//! shipped under several field names, amounts arrive as numbers, numeric
//! strings, or currency-formatted strings, and fields go missing. All of
//! that tolerance lives here, at the boundary; everything downstream
//! sees only [`DailyFinancialRow`] and [`Totals`]. Missing numerics
//! default to zero; nothing in this module panics on backend data.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::constants::fields;
use crate::models::{CogsSoldSummary, DailyFinancialRow, Totals, Trend};

static AMOUNT_DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.\-]").expect("static regex"));

/// Parses any monetary field the backend may send: a number, a numeric
/// string, or a currency-formatted string ("PHP 1,234.50", "₱2,000").
/// Anything unparseable is zero. Idempotent.
#[must_use]
pub fn normalize_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => {
            let stripped = AMOUNT_DECORATION.replace_all(s, "");
            stripped
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// First present, non-null value among the candidate keys.
#[must_use]
pub fn pick_field<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|key| record.get(key).filter(|v| !v.is_null()))
}

#[must_use]
pub fn pick_amount(record: &Value, candidates: &[&str]) -> f64 {
    pick_field(record, candidates).map_or(0.0, normalize_amount)
}

/// Calendar-date key for a record: an explicit date field when present,
/// otherwise a timestamp truncated to the business timezone's day.
/// Records with neither cannot be placed on the timeline.
#[must_use]
pub fn date_key(record: &Value, tz: FixedOffset) -> Option<String> {
    if let Some(date) = pick_field(record, fields::DATE).and_then(Value::as_str) {
        // "2024-01-01" or "2024-01-01T08:30:00Z"; the day part is enough.
        if let Some(day) = date.get(..10) {
            return Some(day.to_string());
        }
    }

    let ts = pick_field(record, fields::TIMESTAMP)?;
    let instant: DateTime<Utc> = match ts {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Epoch millis vs seconds.
            let secs = if raw.abs() > 10_000_000_000 { raw / 1000 } else { raw };
            DateTime::from_timestamp(secs, 0)?
        }
        _ => return None,
    };

    Some(instant.with_timezone(&tz).format("%Y-%m-%d").to_string())
}

/// The per-day entries inside a sales-summary payload, wherever the
/// backend put them.
#[must_use]
pub fn summary_entries(summary: &Value) -> Vec<Value> {
    if let Some(entries) = summary.as_array() {
        return entries.clone();
    }
    for key in ["days", "daily", "rows", "data", "summary"] {
        if let Some(entries) = summary.get(key).and_then(Value::as_array) {
            return entries.clone();
        }
    }
    Vec::new()
}

/// Whether an expense record is a COGS purchase (restocking cash
/// outflow) rather than a true operating expense.
#[must_use]
pub fn is_cogs_purchase(record: &Value) -> bool {
    for key in ["isCogs", "is_cogs", "cogsPurchase", "cogs_purchase"] {
        if record.get(key).and_then(Value::as_bool) == Some(true) {
            return true;
        }
    }

    pick_field(record, fields::CATEGORY)
        .and_then(Value::as_str)
        .is_some_and(|category| {
            let category = category.trim().to_ascii_lowercase();
            category.contains("cogs")
                || matches!(
                    category.as_str(),
                    "inventory" | "stock" | "stock purchase" | "stock_purchase" | "restock" | "purchase"
                )
        })
}

/// Folds the three report collections into one row per calendar date.
///
/// Dates are seeded from the sales summary and unioned with any date
/// that only appears in expenses or COGS purchases. Expense records are
/// partitioned op-ex vs COGS purchase; records without a usable date are
/// dropped from the timeline. Rows come back sorted ascending by date.
#[must_use]
pub fn build_daily_rows(
    sales_summary: &Value,
    expenses: &[Value],
    cogs_purchases: &[Value],
    tz: FixedOffset,
) -> Vec<DailyFinancialRow> {
    let mut rows: BTreeMap<String, DailyFinancialRow> = BTreeMap::new();
    let mut explicit_balance: BTreeSet<String> = BTreeSet::new();

    for entry in summary_entries(sales_summary) {
        let Some(date) = date_key(&entry, tz) else {
            debug!("sales summary entry without a date; skipped");
            continue;
        };

        let row = rows.entry(date.clone()).or_insert_with(|| DailyFinancialRow {
            date: date.clone(),
            ..DailyFinancialRow::default()
        });
        row.gross += pick_amount(&entry, fields::GROSS);
        row.paid += pick_amount(&entry, fields::PAID);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            row.sales_count += pick_amount(&entry, fields::COUNT).max(0.0) as u32;
        }

        if let Some(balance) = pick_field(&entry, fields::BALANCE) {
            row.balance += normalize_amount(balance);
            explicit_balance.insert(date);
        }
    }

    // A source-supplied balance wins; otherwise balance derives from
    // gross and paid, floored at zero.
    for (date, row) in &mut rows {
        if !explicit_balance.contains(date) {
            row.balance = row.derived_balance();
        }
    }

    for record in expenses {
        let Some(date) = date_key(record, tz) else {
            debug!("expense record without a date; dropped from daily rows");
            continue;
        };
        let amount = pick_amount(record, fields::AMOUNT);
        let row = rows.entry(date.clone()).or_insert_with(|| DailyFinancialRow {
            date,
            ..DailyFinancialRow::default()
        });
        if is_cogs_purchase(record) {
            row.cogs_purchases += amount;
        } else {
            row.op_ex += amount;
        }
    }

    for record in cogs_purchases {
        let Some(date) = date_key(record, tz) else {
            debug!("purchase record without a date; dropped from daily rows");
            continue;
        };
        let amount = pick_amount(record, fields::AMOUNT);
        rows.entry(date.clone())
            .or_insert_with(|| DailyFinancialRow {
                date,
                ..DailyFinancialRow::default()
            })
            .cogs_purchases += amount;
    }

    rows.into_values().collect()
}

/// Column sums plus the two profit figures. The cost bases deliberately
/// differ: `net` subtracts restocking cash-out (`cogs_purchases`), while
/// `gross_profit`/`net_profit` use the cost basis of units actually sold.
#[must_use]
pub fn compute_totals(rows: &[DailyFinancialRow], cogs_sold: &CogsSoldSummary) -> Totals {
    let mut totals = Totals::default();

    for row in rows {
        totals.gross += row.gross;
        totals.paid += row.paid;
        totals.balance += row.balance;
        totals.op_ex += row.op_ex;
        totals.cogs_purchases += row.cogs_purchases;
        totals.sales_count += row.sales_count;
    }

    totals.net = totals.paid - (totals.op_ex + totals.cogs_purchases);
    totals.gross_profit = cogs_sold.cogs_sales - cogs_sold.cogs_cost;
    totals.net_profit = totals.gross_profit - totals.op_ex;
    totals
}

/// Change of one column between the second-to-last and last day.
/// `None` with fewer than two rows, or when the baseline is zero (the
/// percentage would be undefined, not infinite).
#[must_use]
pub fn trend_between_last_two_days(
    rows: &[DailyFinancialRow],
    field: impl Fn(&DailyFinancialRow) -> f64,
) -> Option<Trend> {
    if rows.len() < 2 {
        return None;
    }

    let baseline = field(&rows[rows.len() - 2]);
    let latest = field(&rows[rows.len() - 1]);
    if baseline == 0.0 {
        return None;
    }

    let absolute = latest - baseline;
    Some(Trend {
        absolute,
        percent: absolute / baseline * 100.0,
    })
}
