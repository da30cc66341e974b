mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, ConfigFile, DEFAULT_CATEGORIES};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/focustrack[-dev]/` based on FOCUSTRACK_ENV.
///
/// Set FOCUSTRACK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSTRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focustrack-dev")
    } else {
        base_dir.join("focustrack")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
