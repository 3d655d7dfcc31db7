//! Handler for `legbook init`.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::command::InitArgs;
use crate::adapter::inbound::cli::{output, paths};
use crate::adapter::outbound::sqlite::Database;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;

/// Commented configuration template.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Create the database (running migrations) and optionally a config file.
pub fn execute(config: &Config, config_path: &Path, args: &InitArgs) -> Result<()> {
    let wrote_config = if args.write_config {
        write_template(config_path, args.force)?;
        true
    } else {
        false
    };

    let db_path = Path::new(&config.database.path);
    if !config.database.is_memory() {
        paths::ensure_parent(db_path)?;
    }

    let pb = output::spinner("Migrating database");
    if let Err(err) = Database::open(&config.database) {
        output::spinner_fail(&pb, "Migration failed");
        return Err(err);
    }
    output::spinner_success(&pb, "Database ready");

    if output::is_json() {
        output::json_output(json!({
            "command": "init",
            "database": config.database.path,
            "config": wrote_config.then(|| config_path.display().to_string()),
        }));
        return Ok(());
    }

    output::field("Database", &config.database.path);
    if wrote_config {
        output::field("Config", config_path.display());
        output::hint(&format!("edit {} to set retention policies", config_path.display()));
    }
    Ok(())
}

fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        }
        .into());
    }
    paths::ensure_parent(path)?;
    fs::write(path, CONFIG_TEMPLATE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::parse_toml(CONFIG_TEMPLATE).unwrap();
        assert!(config.retention.is_empty());
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn template_is_not_overwritten_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# mine\n").unwrap();

        assert!(write_template(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

        write_template(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }
}
