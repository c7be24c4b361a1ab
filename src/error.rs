//! Errors for loading level descriptors and settings
//!
//! The simulation itself never returns errors; these only cover data coming
//! in from outside before a level starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to parse level descriptor: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
    #[error("campaign contains no levels")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("setting `{field}` out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}
