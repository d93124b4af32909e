use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OfxloadError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("ofxload")
        .join("ledger.db")
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ofxload")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_default()
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| OfxloadError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// `--db` when given, otherwise the configured database.
pub fn resolve_db_path(db: Option<&str>) -> PathBuf {
    match db {
        Some(path) => PathBuf::from(shellexpand_path(path)),
        None => PathBuf::from(load_settings().db_path),
    }
}

/// Expands `~` and makes the path absolute so it resolves from any directory.
pub fn shellexpand_path(path: &str) -> String {
    let expanded = match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => PathBuf::from(format!("{}{rest}", home.to_string_lossy())),
        _ => PathBuf::from(path),
    };
    std::fs::canonicalize(&expanded)
        .or_else(|_| std::path::absolute(&expanded))
        .unwrap_or(expanded)
        .to_string_lossy()
        .to_string()
}
