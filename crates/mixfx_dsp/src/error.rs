//! DSP Error Types

use thiserror::Error;

/// Errors from the numeric layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DspError {
    #[error("Invalid band level range: min {min} is above max {max}")]
    InvalidLevelRange { min: i16, max: i16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidLevelRange { min: 300, max: -300 };
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("-300"));
    }
}
