//! TOML configuration loader with validation.
//!
//! Loads a [`StabilizerConfig`] from a TOML file. A partial file is valid —
//! every section falls back to the stock tuning — but whatever is present
//! must pass the bound and divisor checks before a core can be built.

use std::path::Path;

use strix_common::config::StabilizerConfig;
use strix_common::error::ConfigValidationError;

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// File I/O error.
    Io(String),
    /// TOML parse error.
    Parse(String),
    /// Bound or consistency violation.
    Validation(ConfigValidationError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Validation(e) => write!(f, "config validation: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigValidationError> for ConfigError {
    fn from(e: ConfigValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Load and validate the stabilizer configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StabilizerConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", path.display())))?;
    load_config_from_str(&raw)
}

/// Load config from a TOML string (testing and embedded defaults).
pub fn load_config_from_str(raw: &str) -> Result<StabilizerConfig, ConfigError> {
    let config: StabilizerConfig =
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
