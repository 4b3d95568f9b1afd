//! Derived financial shapes consumed by the dashboard.
//!
//! These are views, recomputed wholesale on every refresh; nothing here
//! is persisted or incrementally patched.

use serde::{Deserialize, Serialize};

/// One row per calendar date in the business timezone.
///
/// `balance` is `max(0, gross - paid)` unless the source record carried
/// an explicit balance, in which case that value wins. The day's net is
/// always derived via [`Self::net`], never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DailyFinancialRow {
    /// `YYYY-MM-DD` key, also the sort order.
    pub date: String,

    pub gross: f64,

    pub paid: f64,

    pub balance: f64,

    /// Operating expenses, explicitly excluding stock purchases.
    pub op_ex: f64,

    /// Cash spent restocking inventory this day. Distinct from the cost
    /// basis of goods actually sold ([`CogsSoldSummary`]).
    pub cogs_purchases: f64,

    pub sales_count: u32,
}

impl DailyFinancialRow {
    #[must_use]
    pub fn net(&self) -> f64 {
        self.paid - (self.op_ex + self.cogs_purchases)
    }

    #[must_use]
    pub fn derived_balance(&self) -> f64 {
        (self.gross - self.paid).max(0.0)
    }
}

/// Cost basis of the units actually sold in the period, fetched from its
/// own endpoint. Never folded into [`DailyFinancialRow::cogs_purchases`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CogsSoldSummary {
    /// Revenue attributable to COGS-tracked items.
    pub cogs_sales: f64,

    /// Cost basis of those sold units.
    pub cogs_cost: f64,
}

/// Range-wide sums plus the two profit figures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Totals {
    pub gross: f64,
    pub paid: f64,
    pub balance: f64,
    pub op_ex: f64,
    pub cogs_purchases: f64,
    pub sales_count: u32,

    /// `paid - (op_ex + cogs_purchases)`.
    pub net: f64,

    /// `cogs_sales - cogs_cost`.
    pub gross_profit: f64,

    /// `gross_profit - op_ex`.
    pub net_profit: f64,
}

/// Change of one column between the last two days of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub absolute: f64,

    /// Undefined (the whole trend is `None`) when the baseline is zero.
    pub percent: f64,
}
