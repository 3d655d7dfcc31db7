//! Handler for the `config` command group and config loading for the CLI.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::diagnostic::ConfigDiagnostic;
use crate::adapter::inbound::cli::{output, paths};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::{Config, DATABASE_URL_ENV};

/// Load the effective configuration for a command.
///
/// Precedence for the database path: `--db`, then `DATABASE_URL`, then the
/// config file, then `~/.legbook/legbook.db` when there is no config file.
/// Invalid files are reported as a diagnostic on stderr.
pub fn load(path: &Path, db_override: Option<&Path>) -> Result<Config> {
    let mut config = match Config::load_or_default(path) {
        Ok(config) => config,
        Err(Error::Config(err)) => {
            report(path, &err);
            return Err(Error::Config(err));
        }
        Err(err) => return Err(err),
    };

    if let Some(db) = db_override {
        config.database.path = db.to_string_lossy().into_owned();
    } else if !path.exists() && std::env::var_os(DATABASE_URL_ENV).is_none() {
        config.database.path = paths::default_database().to_string_lossy().into_owned();
    }
    Ok(config)
}

fn report(path: &Path, err: &crate::error::ConfigError) {
    if output::is_json() {
        return;
    }
    if let Ok(content) = std::fs::read_to_string(path) {
        let name = path.display().to_string();
        eprintln!("{}", ConfigDiagnostic::from_error(&name, &content, err).render());
    }
}

/// Execute `config show`.
pub fn execute_show(config: &Config, path: &Path) -> Result<()> {
    let keep_last: serde_json::Map<String, serde_json::Value> = config
        .retention
        .keep_last
        .iter()
        .map(|(index, keep)| (index.clone(), json!(keep)))
        .collect();

    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "path": path.display().to_string(),
            "file_exists": path.exists(),
            "database": {
                "path": config.database.path,
                "pool_size": config.database.pool_size,
                "busy_timeout_ms": config.database.busy_timeout_ms,
                "delete_chunk_size": config.database.delete_chunk_size,
            },
            "logging": {
                "level": config.logging.level,
                "format": config.logging.format,
            },
            "retention": {
                "max_age_days": config.retention.max_age_days,
                "keep_last": keep_last,
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Effective Configuration");
    if path.exists() {
        output::field("File", path.display());
    } else {
        output::field("File", output::muted(format!("{} (not found)", path.display())));
    }

    output::section("Database");
    output::field("Path", &config.database.path);
    output::field("Pool size", config.database.pool_size);
    output::field("Busy timeout", format!("{}ms", config.database.busy_timeout_ms));
    output::field("Delete chunk", config.database.delete_chunk_size);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);

    output::section("Retention");
    if config.retention.is_empty() {
        output::note("(no automatic policies)");
    }
    if let Some(days) = config.retention.max_age_days {
        output::field("Max age", format!("{days} days"));
    }
    for (index, keep) in &config.retention.keep_last {
        output::field(&format!("Keep {index}"), format!("last {keep}"));
    }
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound {
            entity: "config file",
            id: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    match Config::parse_toml(&content) {
        Ok(_) => {
            if output::is_json() {
                output::json_output(json!({
                    "command": "config.validate",
                    "path": path.display().to_string(),
                    "valid": true,
                }));
            } else {
                output::success(&format!("{} is valid", path.display()));
            }
            Ok(())
        }
        Err(Error::Config(err)) => {
            if output::is_json() {
                output::json_output(json!({
                    "command": "config.validate",
                    "path": path.display().to_string(),
                    "valid": false,
                    "error": err.to_string(),
                }));
            } else {
                let name = path.display().to_string();
                eprintln!("{}", ConfigDiagnostic::from_error(&name, &content, &err).render());
            }
            Err(Error::Config(err))
        }
        Err(err) => Err(err),
    }
}
