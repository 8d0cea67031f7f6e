//! Data directory and configuration resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Data directory resolution priority order:
/// 1. Explicit argument (highest priority)
/// 2. `SHELFMARK_ROOT` environment variable
/// 3. TOML config file (`data_dir` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(explicit: Option<&str>) -> Result<PathBuf> {
    // Priority 1: explicit argument from the hosting process
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var("SHELFMARK_ROOT") {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Find the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/shelfmark/config.toml first, then /etc/shelfmark/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("shelfmark").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/shelfmark/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("shelfmark").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shelfmark"))
        .unwrap_or_else(|| PathBuf::from("./shelfmark_data"))
}

/// Path of the SQLite store inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("shelfmark.db")
}

/// Path of the deprecated flat blocklist carried over from pre-database
/// releases; read-only, consulted as a rating fallback
pub fn legacy_list_path(data_dir: &Path) -> PathBuf {
    data_dir.join("deleted_authors.txt")
}
