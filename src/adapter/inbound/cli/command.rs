//! Command-line interface definitions.
//!
//! Defines the CLI structure for the legbook application using `clap`.
//! Subcommands cover inspecting sessions, exporting timelines, expiry-day
//! reports, and the retention purges.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};

use super::paths;
use crate::domain::SessionStatus;

/// Session ledger and retention tool for multi-leg options strategies
#[derive(Parser, Debug)]
#[command(name = "legbook")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Path to the SQLite database (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the legbook CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the database
    Init(InitArgs),

    /// Inspect stored sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// Show the merged event and order timeline of a session
    Timeline(TimelineArgs),

    /// Aggregate every session of one expiry date
    Performance(PerformanceArgs),

    /// Delete sessions and everything they own
    #[command(subcommand)]
    Purge(PurgeCommand),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `legbook sessions`.
#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List sessions, newest first.
    List(SessionListArgs),
    /// Summarize one session and its legs.
    Show {
        /// External session id.
        session_id: String,
    },
    /// Find sessions left running with active legs.
    Crashed(CrashedArgs),
}

/// Subcommands for `legbook purge`.
///
/// Every purge is one transaction: either all targeted rows are removed or
/// none are. Without `--yes` an interactive confirmation is required.
#[derive(Subcommand, Debug)]
pub enum PurgeCommand {
    /// Delete sessions dated strictly before a cutoff.
    Before(PurgeBeforeArgs),
    /// Keep only the most recent sessions of one index.
    KeepLast(PurgeKeepLastArgs),
    /// Delete one session.
    Session(PurgeSessionArgs),
    /// Delete every session.
    Truncate(ConfirmArg),
    /// Apply the `[retention]` policies from the configuration file.
    Auto(ConfirmArg),
}

/// Subcommands for `legbook config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file for correctness.
    Validate,
}

/// Arguments for `legbook init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also write a commented configuration template to the config path.
    #[arg(long)]
    pub write_config: bool,

    /// Overwrite an existing configuration file.
    #[arg(long, requires = "write_config")]
    pub force: bool,
}

/// Arguments for `legbook sessions list`.
#[derive(Args, Debug)]
pub struct SessionListArgs {
    /// Only sessions of this index symbol.
    #[arg(long)]
    pub index: Option<String>,

    /// Only sessions with this status (RUNNING, COMPLETED, ...).
    #[arg(long)]
    pub status: Option<SessionStatus>,

    /// Only sessions for this expiry date (YYYY-MM-DD).
    #[arg(long)]
    pub expiry: Option<NaiveDate>,

    /// Sessions dated on or after this day (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Sessions dated before this day (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Maximum number of sessions to show.
    #[arg(long, default_value = "50")]
    pub limit: i64,
}

/// Arguments for `legbook sessions crashed`.
#[derive(Args, Debug)]
pub struct CrashedArgs {
    /// Mark the detected sessions as CRASHED.
    #[arg(long)]
    pub mark: bool,

    /// Reason recorded in the session notes and crash event.
    #[arg(long, default_value = "process exited while session was running")]
    pub reason: String,

    /// Also flag their active legs as RECOVERED.
    #[arg(long)]
    pub recover: bool,
}

/// Arguments for `legbook timeline`.
#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// External session id.
    pub session_id: String,

    /// Write the timeline as CSV to this file instead of printing it.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

/// Arguments for `legbook performance`.
#[derive(Args, Debug)]
pub struct PerformanceArgs {
    /// Expiry date (YYYY-MM-DD).
    pub expiry: NaiveDate,
}

/// Shared confirmation flag for destructive commands.
#[derive(Args, Debug)]
pub struct ConfirmArg {
    /// Skip the interactive confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `legbook purge before`.
#[derive(Args, Debug)]
pub struct PurgeBeforeArgs {
    /// Cutoff as YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp.
    #[arg(value_parser = parse_cutoff)]
    pub cutoff: DateTime<Utc>,

    #[command(flatten)]
    pub confirm: ConfirmArg,
}

/// Arguments for `legbook purge keep-last`.
#[derive(Args, Debug)]
pub struct PurgeKeepLastArgs {
    /// Index symbol whose sessions are trimmed.
    pub index: String,

    /// Number of most recent sessions to keep (at least 1).
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub keep: u32,

    #[command(flatten)]
    pub confirm: ConfirmArg,
}

/// Arguments for `legbook purge session`.
#[derive(Args, Debug)]
pub struct PurgeSessionArgs {
    /// External session id.
    pub session_id: String,

    #[command(flatten)]
    pub confirm: ConfirmArg,
}

/// Parse a purge cutoff from a bare date or a full timestamp.
pub fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| format!("expected YYYY-MM-DD or RFC 3339 timestamp, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["legbook", "--json", "-vv", "sessions", "list"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(matches!(cli.color, ColorChoice::Auto));
        assert!(cli.db.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["legbook", "timeline", "s1", "--db", "/tmp/x.db", "-q"])
            .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        if let Commands::Timeline(args) = cli.command {
            assert_eq!(args.session_id, "s1");
            assert!(args.csv.is_none());
        } else {
            panic!("Expected Timeline command");
        }
    }

    #[test]
    fn sessions_list_filters() {
        let cli = Cli::try_parse_from([
            "legbook", "sessions", "list", "--index", "NIFTY", "--status", "completed", "--from",
            "2026-01-01",
        ])
        .unwrap();
        if let Commands::Sessions(SessionsCommand::List(args)) = cli.command {
            assert_eq!(args.index.as_deref(), Some("NIFTY"));
            assert_eq!(args.status, Some(SessionStatus::Completed));
            assert_eq!(args.from, NaiveDate::from_ymd_opt(2026, 1, 1));
            assert_eq!(args.limit, 50);
        } else {
            panic!("Expected Sessions List command");
        }
    }

    #[test]
    fn purge_keep_last_rejects_zero() {
        let result = Cli::try_parse_from(["legbook", "purge", "keep-last", "NIFTY", "0"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["legbook", "purge", "keep-last", "NIFTY", "3", "--yes"])
            .unwrap();
        if let Commands::Purge(PurgeCommand::KeepLast(args)) = cli.command {
            assert_eq!(args.keep, 3);
            assert!(args.confirm.yes);
        } else {
            panic!("Expected Purge KeepLast command");
        }
    }

    #[test]
    fn purge_before_accepts_date_or_timestamp() {
        let cli = Cli::try_parse_from(["legbook", "purge", "before", "2026-01-15"]).unwrap();
        if let Commands::Purge(PurgeCommand::Before(args)) = cli.command {
            assert_eq!(
                args.cutoff,
                Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()
            );
            assert!(!args.confirm.yes);
        } else {
            panic!("Expected Purge Before command");
        }

        assert_eq!(
            parse_cutoff("2026-01-15T09:15:00+05:30").unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 15, 3, 45, 0).unwrap()
        );
        assert!(parse_cutoff("last week").is_err());
    }

    #[test]
    fn init_force_requires_write_config() {
        assert!(Cli::try_parse_from(["legbook", "init", "--force"]).is_err());
        assert!(Cli::try_parse_from(["legbook", "init", "--write-config", "--force"]).is_ok());
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["legbook", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommand::Validate)));
    }
}
