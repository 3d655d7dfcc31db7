//! Handlers for the `purge` command group.
//!
//! Each policy runs as one transaction. Without `--yes` the operator is
//! asked to confirm; non-interactive callers must pass `--yes`.

use std::io::IsTerminal;

use chrono::Utc;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use serde_json::json;

use crate::adapter::inbound::cli::command::{
    ConfirmArg, PurgeBeforeArgs, PurgeKeepLastArgs, PurgeSessionArgs,
};
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::Database;
use crate::domain::{PurgeReport, RetentionPolicy, SessionId};
use crate::error::{Error, Result};
use crate::infrastructure::config::retention::RetentionConfig;
use crate::port::outbound::retention::RetentionStore;

/// Execute `purge before`.
pub async fn execute_before(db: &Database, args: &PurgeBeforeArgs) -> Result<()> {
    run(db, vec![RetentionPolicy::Before(args.cutoff)], &args.confirm).await
}

/// Execute `purge keep-last`.
pub async fn execute_keep_last(db: &Database, args: &PurgeKeepLastArgs) -> Result<()> {
    let policy = RetentionPolicy::keep_last(&args.index, args.keep)?;
    run(db, vec![policy], &args.confirm).await
}

/// Execute `purge session`.
pub async fn execute_session(db: &Database, args: &PurgeSessionArgs) -> Result<()> {
    let policy = RetentionPolicy::Session(SessionId::new(&args.session_id));
    run(db, vec![policy], &args.confirm).await
}

/// Execute `purge truncate`.
pub async fn execute_truncate(db: &Database, confirm: &ConfirmArg) -> Result<()> {
    run(db, vec![RetentionPolicy::Truncate], confirm).await
}

/// Execute `purge auto` with the configured policies.
pub async fn execute_auto(db: &Database, retention: &RetentionConfig, confirm: &ConfirmArg) -> Result<()> {
    if retention.is_empty() {
        output::warning("No [retention] policies configured");
        output::hint("set retention.max_age_days or retention.keep_last in the config file");
        return Ok(());
    }
    run(db, retention.policies(Utc::now()), confirm).await
}

async fn run(db: &Database, policies: Vec<RetentionPolicy>, confirm: &ConfirmArg) -> Result<()> {
    let described: Vec<String> = policies.iter().map(ToString::to_string).collect();
    if !confirmed(&described, confirm)? {
        output::note("Purge cancelled");
        return Ok(());
    }

    let retention = db.retention();
    let mut total = PurgeReport::default();
    let mut applied = Vec::with_capacity(policies.len());
    for policy in &policies {
        let pb = output::spinner(&format!("Deleting {policy}"));
        match retention.apply(policy).await {
            Ok(report) => {
                output::spinner_success(&pb, &format!("Deleted {policy}"));
                total += report;
                applied.push(json!({
                    "policy": policy.name(),
                    "description": policy.to_string(),
                    "deleted": report,
                }));
            }
            Err(err) => {
                output::spinner_fail(&pb, &format!("Rolled back {policy}"));
                return Err(err);
            }
        }
    }

    if output::is_json() {
        output::json_output(json!({
            "command": "purge",
            "policies": applied,
            "deleted": total,
        }));
        return Ok(());
    }

    output::section("Deleted");
    output::field("Sessions", total.sessions);
    output::field("Positions", total.positions);
    output::field("Snapshots", total.snapshots);
    output::field("Orders", total.orders);
    output::field("Events", total.events);
    if total.is_empty() {
        output::note("Nothing matched");
    }
    Ok(())
}

fn confirmed(policies: &[String], confirm: &ConfirmArg) -> Result<bool> {
    if confirm.yes {
        return Ok(true);
    }
    if output::is_json() || !std::io::stdin().is_terminal() {
        return Err(Error::Cancelled(
            "purge requires --yes when not running interactively".to_string(),
        ));
    }

    let prompt = format!("Permanently delete {}?", policies.join(", then "));
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
