//! mixfx Platform - Effect Hardware Seam
//!
//! This crate defines how the effect chain reaches device effect units:
//! - Effect unit traits (equalizer, bass boost, dynamics, loudness, virtualizer)
//! - Visualization capture unit trait
//! - Output device descriptors for route diagnostics
//!
//! # Backends
//!
//! | Backend         | Effect units     | Capture          |
//! |-----------------|------------------|------------------|
//! | `StubBackend`   | none             | none             |
//! | `MemoryBackend` | simulated (all)  | simulated        |
//!
//! Native bindings implement [`EffectBackend`] the same way; the chain
//! never assumes any unit exists.

mod error;
mod memory;
mod stub;
mod traits;

pub use error::{PlatformError, CAPTURE_UNIT};
pub use memory::{CaptureState, MemoryBackend, MemoryBackendConfig, MemoryState};
pub use stub::StubBackend;
pub use traits::{
    BassBoostUnit, CaptureUnit, DynamicsUnit, EffectBackend, EffectKind, EffectUnit,
    EqualizerUnit, FftListener, LoudnessUnit, OutputDevice, OutputDeviceKind, VirtualizerUnit,
    GLOBAL_SESSION,
};

/// Get the effect backend for the current build
///
/// No native effect bindings are compiled in, so this is the stub backend;
/// every module reports itself unavailable.
pub fn get_backend() -> Box<dyn EffectBackend> {
    Box::new(StubBackend::new())
}
