mod config;

pub use config::{Config, Language, Preferences, SessionSettings};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding `config.toml`.
///
/// `BREATHWORK_CONFIG_DIR` wins when set; otherwise `~/.config/breathwork/`.
/// The directory is not created here; saving creates it.
///
/// # Errors
/// Returns an error if no home directory can be determined.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("BREATHWORK_CONFIG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = dirs::home_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(home.join(".config").join("breathwork"))
}
