//! Handler for `legbook timeline`.

use std::fs::File;
use std::io::BufWriter;

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::TimelineArgs;
use crate::adapter::inbound::cli::{output, paths};
use crate::adapter::outbound::sqlite::Database;
use crate::domain::{SessionId, TimelineEntry};
use crate::error::Result;
use crate::port::outbound::report::TimelineReader;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Leg")]
    leg: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl From<&TimelineEntry> for EntryRow {
    fn from(entry: &TimelineEntry) -> Self {
        Self {
            time: entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            source: entry.source.to_string(),
            action: entry.action.clone(),
            leg: entry
                .leg_number
                .map_or_else(|| "-".to_string(), |leg| leg.to_string()),
            symbol: entry.symbol.clone().unwrap_or_default(),
            details: entry.details.clone(),
        }
    }
}

/// Execute `timeline`.
pub fn execute(db: &Database, args: &TimelineArgs) -> Result<()> {
    let timeline = db.timeline().timeline(&SessionId::new(&args.session_id))?;

    if let Some(path) = &args.csv {
        paths::ensure_parent(path)?;
        timeline.write_csv(BufWriter::new(File::create(path)?))?;
        if output::is_json() {
            output::json_output(json!({
                "command": "timeline",
                "session_id": args.session_id,
                "csv": path.display().to_string(),
                "rows": timeline.len(),
            }));
        } else {
            output::success(&format!(
                "Wrote {} rows to {}",
                timeline.len(),
                path.display()
            ));
        }
        return Ok(());
    }

    if output::is_json() {
        let entries: Vec<&TimelineEntry> = timeline.iter().collect();
        output::json_output(json!({
            "command": "timeline",
            "session_id": args.session_id,
            "entries": entries,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    if timeline.is_empty() {
        output::note(&format!("No events or orders for session {}", args.session_id));
        return Ok(());
    }
    let rows: Vec<EntryRow> = timeline.iter().map(EntryRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
