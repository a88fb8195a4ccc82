//! mixfx Core - Effect Chain and Spectrum Capture
//!
//! This crate drives the effects of a device's global output mix:
//! - `EffectChain`: lifecycle and parameters of the five effect units
//!   (equalizer, bass boost, dynamics/limiter, loudness, virtualizer),
//!   preset mapping and auto-headroom
//! - `SpectrumCapture`: frequency-domain capture delivered as magnitude frames
//! - Write-through settings persistence
//! - Output route diagnostics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │   EffectChain ──settings──▶ SettingsStore (write-through)   │
//! │        │                                                    │
//! │        └──▶ EffectBackend units (optional, isolated)        │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │   Capture Thread ──crossbeam (bounded)──▶ Delivery Thread   │
//! │   bytes → MagnitudeFrame      drop newest       consumer    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod capture;
mod chain;
mod config;
mod device;
mod error;
mod settings;

pub use capture::SpectrumCapture;
pub use chain::{EffectChain, EqualizerState, HeadroomState, LOUDNESS_GAIN_MAX_MB, STRENGTH_MAX};
pub use config::ChainConfig;
pub use device::{describe_output_routes, route_label, NO_OUTPUT_LINE};
pub use error::{ChainError, ChainResult, SettingsError};
pub use settings::{
    decode_band_levels, encode_band_levels, EffectSettings, JsonFileStore, MemoryStore,
    SettingKey, SettingValue, SettingsStore,
};

// Re-export the types callers need alongside the chain
pub use mixfx_dsp::{BandLevelRange, MagnitudeFrame, DEFAULT_PRESET, PRESETS};
pub use mixfx_platform::{EffectBackend, EffectKind, MemoryBackend, OutputDevice, StubBackend};
