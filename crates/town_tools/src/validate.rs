//! Layout configuration loading and validation.

use std::path::Path;

use thiserror::Error;
use town_core::config::{LayoutConfig, LayoutRules};
use town_core::error::LayoutError;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The layout core rejected the input.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Failed to write JSON output.
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a layout configuration from a RON file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or not valid RON.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LayoutConfig, ToolError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ToolError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config: LayoutConfig = ron::from_str(&contents)?;
    Ok(config)
}

/// Resolve the configuration a command runs on: the file if given, else
/// the built-in default town, with an optional seed override.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
pub fn resolve_config(path: Option<&Path>, seed: Option<u64>) -> Result<LayoutConfig, ToolError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Load and fully validate a configuration file.
///
/// # Errors
///
/// Returns an error if loading fails or the configuration is rejected.
pub fn validate_config_file<P: AsRef<Path>>(path: P) -> Result<LayoutRules, ToolError> {
    let config = load_config(path)?;
    let rules = config.validate()?;
    tracing::debug!(
        roads = rules.grid.roads.len(),
        districts = config.districts.len(),
        scatters = config.scatters.len(),
        "Config validated"
    );
    Ok(rules)
}
