//! Path utilities for legbook.
//!
//! Data lives under `~/.legbook/` unless overridden:
//! - `~/.legbook/config.toml` - optional configuration
//! - `~/.legbook/legbook.db` - session database

use std::path::{Path, PathBuf};

/// Returns the legbook home directory (`~/.legbook/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".legbook")
}

/// Returns the default config file path (`~/.legbook/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default database path (`~/.legbook/legbook.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("legbook.db")
}

/// Ensures the directory holding `path` exists.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_legbook_home() {
        let config = default_config();
        let db = default_database();

        assert!(home_dir().to_string_lossy().contains(".legbook"));
        assert!(config.ends_with(".legbook/config.toml"));
        assert!(db.ends_with(".legbook/legbook.db"));
    }

    #[test]
    fn ensure_parent_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/legbook.db");
        ensure_parent(&target).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        ensure_parent(Path::new("legbook.db")).unwrap();
    }
}
