pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::Path;

pub use types::Config;

/// Load configuration from a TOML file, or use defaults when no file is
/// given. An explicitly named file that cannot be read is an error; silent
/// defaults would hide a typoed path.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
    let config =
        toml::from_str(&text).map_err(|e| ConfigError::ParsingFailed(e.to_string()))?;
    Ok(config)
}
