//! Dashboard command handler

use chrono::NaiveDate;
use tracing::debug;

use crate::App;
use crate::constants::dashboard::WATCH_REFRESH;
use crate::services::dashboard::{DashboardSnapshot, DateRange};
use crate::services::finance::trend_between_last_two_days;
use crate::session::SessionEvent;

pub async fn cmd_dashboard(
    app: &App,
    from: Option<String>,
    to: Option<String>,
    watch: bool,
) -> anyhow::Result<()> {
    let range = DateRange {
        from: parse_date(from.as_deref())?,
        to: parse_date(to.as_deref())?,
    };

    if !watch {
        if let Some(snapshot) = app.dashboard.refresh(range).await? {
            render(&snapshot);
        }
        return Ok(());
    }

    // Watch mode: periodic guarded refreshes plus the session heartbeat,
    // until the user interrupts or the session ends underneath us.
    let heartbeat_secs = app.config.session.heartbeat_seconds;
    let _heartbeat = (heartbeat_secs > 0).then(|| {
        app.session
            .spawn_heartbeat(std::time::Duration::from_secs(heartbeat_secs))
    });

    let mut events = app.session.subscribe();
    let mut ticker = tokio::time::interval(WATCH_REFRESH);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match app.dashboard.refresh(range).await {
                    Ok(Some(snapshot)) => render(&snapshot),
                    Ok(None) => debug!("refresh superseded; nothing to render"),
                    Err(e) => println!("Refresh failed: {e}"),
                }
            }
            event = events.recv() => {
                if let Ok(SessionEvent::LoggedOut { reason }) = event {
                    println!("Session ended ({reason:?}); leaving dashboard.");
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                return Ok(());
            }
        }
    }
}

fn parse_date(raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
    })
    .transpose()
}

fn render(snapshot: &DashboardSnapshot) {
    println!();
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "date", "gross", "paid", "balance", "opEx", "cogsPur", "net", "sales"
    );
    println!("{:-<86}", "");

    for row in &snapshot.rows {
        println!(
            "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>6}",
            row.date,
            row.gross,
            row.paid,
            row.balance,
            row.op_ex,
            row.cogs_purchases,
            row.net(),
            row.sales_count
        );
    }

    let totals = &snapshot.totals;
    println!("{:-<86}", "");
    println!(
        "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>6}",
        "total",
        totals.gross,
        totals.paid,
        totals.balance,
        totals.op_ex,
        totals.cogs_purchases,
        totals.net,
        totals.sales_count
    );
    println!();
    println!(
        "Gross profit: {:.2} (COGS sales {:.2} - cost {:.2}) | Net profit: {:.2}",
        totals.gross_profit, snapshot.cogs_sold.cogs_sales, snapshot.cogs_sold.cogs_cost, totals.net_profit
    );

    if let Some(trend) = trend_between_last_two_days(&snapshot.rows, |r| r.paid) {
        println!(
            "Paid vs previous day: {:+.2} ({:+.1}%)",
            trend.absolute, trend.percent
        );
    }

    println!("Refreshed at {}", snapshot.refreshed_at.format("%H:%M:%S UTC"));
}
