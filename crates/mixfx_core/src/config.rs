//! Effect Chain Configuration

use mixfx_dsp::BandLevelRange;
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, ChainResult};

/// Configuration for the effect chain and the spectrum capture pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Global DSP switch applied right after attach, unless the settings
    /// store holds a saved value
    pub start_enabled: bool,

    /// Level range used when the equalizer cannot report its own
    pub fallback_level_range: BandLevelRange,

    /// Frames buffered between the capture thread and the consumer.
    /// Frames arriving while the queue is full are dropped.
    pub frame_queue_depth: usize,

    /// Name of the thread that runs the spectrum consumer
    pub delivery_thread_name: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            start_enabled: true,
            fallback_level_range: BandLevelRange::default(),
            // Single frame in flight
            frame_queue_depth: 1,
            delivery_thread_name: "mixfx-spectrum".into(),
        }
    }
}

impl ChainConfig {
    /// Validate configuration
    pub fn validate(&self) -> ChainResult<()> {
        if self.frame_queue_depth == 0 {
            return Err(ChainError::Config("frame queue depth must be at least 1".into()));
        }
        if self.fallback_level_range.min > self.fallback_level_range.max {
            return Err(ChainError::Config(format!(
                "invalid fallback level range: [{}, {}]",
                self.fallback_level_range.min, self.fallback_level_range.max
            )));
        }
        if self.delivery_thread_name.is_empty() {
            return Err(ChainError::Config("delivery thread name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChainConfig::default();
        assert!(config.start_enabled);
        assert_eq!(config.frame_queue_depth, 1);
        assert_eq!(config.fallback_level_range, BandLevelRange { min: -1500, max: 1500 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let zero_depth = ChainConfig {
            frame_queue_depth: 0,
            ..Default::default()
        };
        assert!(zero_depth.validate().is_err());

        let inverted = ChainConfig {
            fallback_level_range: BandLevelRange { min: 10, max: -10 },
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let unnamed = ChainConfig {
            delivery_thread_name: String::new(),
            ..Default::default()
        };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ChainConfig {
            frame_queue_depth: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ChainConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.frame_queue_depth, 4);
        assert_eq!(deserialized.fallback_level_range, config.fallback_level_range);
    }
}
