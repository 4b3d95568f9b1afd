pub mod session {
    use std::time::Duration;

    /// Slack added on top of the decoded token expiry before the
    /// auto-logout timer fires.
    pub const EXPIRY_SKEW: Duration = Duration::from_millis(1500);

    /// How often the store watcher checks whether another process
    /// removed the shared session file.
    pub const STORE_POLL: Duration = Duration::from_secs(2);
}

pub mod dashboard {
    use std::time::Duration;

    /// Refresh cadence in watch mode.
    pub const WATCH_REFRESH: Duration = Duration::from_secs(30);
}

/// Field-name variants the backend has historically used for the same
/// concept. Ordered by preference; the first present, non-null key wins.
pub mod fields {
    pub const DATE: &[&str] = &["date", "day", "salesDate", "sales_date"];

    pub const TIMESTAMP: &[&str] = &["createdAt", "created_at", "timestamp", "recordedAt"];

    pub const GROSS: &[&str] = &[
        "gross",
        "grossTotal",
        "gross_total",
        "totalAmount",
        "total_amount",
        "subtotal",
        "total",
    ];

    pub const PAID: &[&str] = &["paid", "amountPaid", "amount_paid", "paidAmount", "payments"];

    pub const BALANCE: &[&str] = &["balance", "balanceDue", "balance_due", "outstanding"];

    pub const COUNT: &[&str] = &["count", "salesCount", "sales_count", "transactions"];

    pub const AMOUNT: &[&str] = &["amount", "value", "cost", "total"];

    pub const CATEGORY: &[&str] = &["category", "expenseType", "expense_type", "type"];
}
