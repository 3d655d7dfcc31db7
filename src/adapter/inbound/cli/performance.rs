//! Handler for `legbook performance`.

use serde_json::json;

use crate::adapter::inbound::cli::command::PerformanceArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::Database;
use crate::error::Result;
use crate::port::outbound::report::SessionReportReader;

/// Execute `performance`.
pub fn execute(db: &Database, args: &PerformanceArgs) -> Result<()> {
    let performance = db.reports().expiry_performance(args.expiry)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "performance",
            "expiry_date": args.expiry.to_string(),
            "performance": performance,
        }));
        return Ok(());
    }

    let Some(performance) = performance else {
        output::warning(&format!("No sessions for expiry {}", args.expiry));
        return Ok(());
    };

    output::section(&format!("Expiry {}", performance.expiry_date));
    output::field("Sessions", performance.num_sessions);
    output::field("Positions", performance.total_positions);
    output::field("Orders", performance.total_orders);
    output::field("Net P&L", output::pnl(performance.net_pnl));
    if output::is_quiet() {
        return Ok(());
    }
    let ids: Vec<&str> = performance.sessions.iter().map(|id| id.as_str()).collect();
    output::note(&ids.join(", "));
    Ok(())
}
