//! Handlers for the `sessions` command group.

use chrono::{DateTime, NaiveTime, Utc};
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{CrashedArgs, SessionListArgs};
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::Database;
use crate::domain::{LegSummary, PositionId, Session, SessionFilter, SessionId};
use crate::error::Result;
use crate::port::outbound::report::SessionReportReader;
use crate::port::outbound::store::SessionStore;

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Session")]
    session_id: String,
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Expiry")]
    expiry: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Orders")]
    orders: String,
    #[tabled(rename = "Net P&L")]
    net_pnl: String,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            index: session.index_symbol.clone(),
            expiry: session.expiry_date.to_string(),
            status: session.status.to_string(),
            date: session.session_date.format("%Y-%m-%d %H:%M").to_string(),
            orders: format!(
                "{}/{}",
                session.counters.orders_executed, session.counters.orders_placed
            ),
            net_pnl: session.net_pnl.to_string(),
        }
    }
}

#[derive(Tabled)]
struct LegRow {
    #[tabled(rename = "Leg")]
    leg: i32,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Exit")]
    exit: String,
    #[tabled(rename = "Realized")]
    realized: String,
}

impl From<&LegSummary> for LegRow {
    fn from(leg: &LegSummary) -> Self {
        let price = |p: Option<rust_decimal::Decimal>| p.map_or_else(|| "-".into(), |p| p.to_string());
        Self {
            leg: leg.leg_number,
            symbol: leg.symbol.clone(),
            status: leg.status.to_string(),
            entry: price(leg.entry_price),
            exit: price(leg.exit_price),
            realized: leg.realized_pnl.to_string(),
        }
    }
}

fn start_of_day(date: chrono::NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Execute `sessions list`.
pub async fn execute_list(db: &Database, args: &SessionListArgs) -> Result<()> {
    let filter = SessionFilter {
        index_symbol: args.index.clone(),
        status: args.status,
        expiry_date: args.expiry,
        from: args.from.map(start_of_day),
        to: args.to.map(start_of_day),
        limit: Some(args.limit),
    };
    let sessions = db.sessions().list(&filter).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "sessions.list",
            "sessions": sessions,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    if sessions.is_empty() {
        output::note("No sessions found");
        return Ok(());
    }
    let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

/// Execute `sessions show`.
pub fn execute_show(db: &Database, session_id: &str) -> Result<()> {
    let summary = db.reports().require_summary(&SessionId::new(session_id))?;

    if output::is_json() {
        output::json_output(json!({
            "command": "sessions.show",
            "summary": summary,
        }));
        return Ok(());
    }

    output::section(&format!("Session {}", summary.session_id));
    output::field("Index", &summary.index_symbol);
    output::field("Expiry", summary.expiry_date);
    output::field("Status", summary.status);
    if let Some(start) = summary.start_time {
        output::field("Started", start.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(end) = summary.end_time {
        output::field("Ended", end.format("%Y-%m-%d %H:%M:%S"));
    }
    output::field(
        "Positions",
        format!(
            "{} ({} closed, {} active)",
            summary.total_positions, summary.closed_positions, summary.active_positions
        ),
    );
    output::field("Orders", summary.total_orders);
    output::field("Net P&L", output::pnl(summary.net_pnl));

    if !summary.legs.is_empty() {
        output::section("Legs");
        let rows: Vec<LegRow> = summary.legs.iter().map(LegRow::from).collect();
        output::lines(&Table::new(rows).to_string());
    }
    Ok(())
}

/// Execute `sessions crashed`.
pub fn execute_crashed(db: &Database, args: &CrashedArgs) -> Result<()> {
    let reports = db.reports();
    let crashed = reports.crashed_sessions()?;

    let mut marked = 0;
    let mut recovered = 0;
    if args.mark && !crashed.is_empty() {
        let ids: Vec<SessionId> = crashed.iter().map(|c| c.session_id.clone()).collect();
        marked = reports.mark_crashed(&ids, &args.reason)?;
    }
    if args.recover {
        let positions: Vec<PositionId> = crashed
            .iter()
            .flat_map(|c| c.active_positions.iter().copied())
            .collect();
        recovered = reports.mark_recovered(&positions)?;
    }

    if output::is_json() {
        output::json_output(json!({
            "command": "sessions.crashed",
            "sessions": crashed,
            "marked": marked,
            "recovered": recovered,
        }));
        return Ok(());
    }

    if crashed.is_empty() {
        output::success("No crashed sessions");
        return Ok(());
    }

    output::section("Crashed sessions");
    for session in &crashed {
        let legs: Vec<String> = session
            .legs
            .iter()
            .map(|leg| format!("{}:{}", leg.leg_number, leg.symbol))
            .collect();
        output::field(
            session.session_id.as_str(),
            format!("expiry {}, active legs {}", session.expiry_date, legs.join(", ")),
        );
    }
    if args.mark {
        output::success(&format!("Marked {marked} sessions as CRASHED"));
    } else {
        output::hint("run with --mark to record the crash");
    }
    if args.recover {
        output::success(&format!("Flagged {recovered} positions as RECOVERED"));
    }
    Ok(())
}
