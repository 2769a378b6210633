mod config;
pub mod database;
pub mod migrations;
pub mod repository;

pub use config::{Config, EnforcementConfig};
pub use database::Database;
pub use repository::BudgetRepository;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `FOCUSGUARD_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/focusguard[-dev]/`, with the `-dev` suffix selected by
/// `FOCUSGUARD_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSGUARD_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSGUARD_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusguard-dev")
            } else {
                base_dir.join("focusguard")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
