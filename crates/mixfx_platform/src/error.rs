//! Platform Error Types

use thiserror::Error;

use crate::traits::EffectKind;

/// Unit name used in errors raised by capture units
pub const CAPTURE_UNIT: &str = "Visualizer";

/// Errors from hardware-backed effect and capture units
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Platform not supported")]
    UnsupportedPlatform,

    #[error("{0} is not available on this device")]
    ModuleUnavailable(EffectKind),

    #[error("Spectrum capture is not available on this device")]
    CaptureUnavailable,

    #[error("{unit} rejected {operation}: {reason}")]
    OperationFailed {
        unit: &'static str,
        operation: &'static str,
        reason: String,
    },

    #[error("Failed to release {unit}: {reason}")]
    ReleaseFailed { unit: &'static str, reason: String },

    #[error("Band index out of range: {0}")]
    InvalidBand(usize),

    #[error("{0} has already been released")]
    Released(&'static str),
}

impl PlatformError {
    /// Shorthand for a hardware call the unit refused
    pub fn rejected(unit: &'static str, operation: &'static str, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            unit,
            operation,
            reason: reason.into(),
        }
    }
}
