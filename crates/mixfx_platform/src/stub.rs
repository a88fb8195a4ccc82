//! Stub Backend
//!
//! Used when no native effect bindings are compiled in. Every module reports
//! itself unavailable, which the effect chain treats as a normal outcome.

use crate::error::PlatformError;
use crate::traits::*;

/// Backend with no effect or capture hardware
pub struct StubBackend;

impl StubBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectBackend for StubBackend {
    fn name(&self) -> &'static str {
        "Stub (no effect hardware)"
    }

    fn open_equalizer(&self, _session: i32) -> Result<Box<dyn EqualizerUnit>, PlatformError> {
        Err(PlatformError::ModuleUnavailable(EffectKind::Equalizer))
    }

    fn open_bass_boost(&self, _session: i32) -> Result<Box<dyn BassBoostUnit>, PlatformError> {
        Err(PlatformError::ModuleUnavailable(EffectKind::BassBoost))
    }

    fn open_dynamics(&self, _session: i32) -> Result<Box<dyn DynamicsUnit>, PlatformError> {
        Err(PlatformError::ModuleUnavailable(EffectKind::Limiter))
    }

    fn open_loudness(&self, _session: i32) -> Result<Box<dyn LoudnessUnit>, PlatformError> {
        Err(PlatformError::ModuleUnavailable(EffectKind::Loudness))
    }

    fn open_virtualizer(&self, _session: i32) -> Result<Box<dyn VirtualizerUnit>, PlatformError> {
        Err(PlatformError::ModuleUnavailable(EffectKind::Virtualizer))
    }

    fn open_capture(&self, _session: i32) -> Result<Box<dyn CaptureUnit>, PlatformError> {
        Err(PlatformError::CaptureUnavailable)
    }

    fn list_output_devices(&self) -> Result<Vec<OutputDevice>, PlatformError> {
        Err(PlatformError::UnsupportedPlatform)
    }
}
