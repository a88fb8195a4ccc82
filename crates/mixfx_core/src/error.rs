//! Chain Error Types

use thiserror::Error;

/// Errors surfaced by the effect chain and its collaborators
///
/// Hardware failures during normal operation never reach callers: they are
/// logged and discarded by the chain. These variants come from construction,
/// configuration and persistence.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Platform error: {0}")]
    Platform(#[from] mixfx_platform::PlatformError),

    #[error("DSP error: {0}")]
    Dsp(#[from] mixfx_dsp::DspError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the settings store
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Setting '{key}' holds a {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type alias for chain operations
pub type ChainResult<T> = Result<T, ChainError>;
