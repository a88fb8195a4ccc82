//! mixfx DSP - Numeric Layer
//!
//! Pure functions and tables behind the effect chain. Nothing here talks to
//! hardware:
//! - Built-in 10-band preset curves (centi-dB)
//! - Frequency quantizer mapping device bands onto preset buckets
//! - Band level clamping
//! - Auto-headroom pre-gain compensation
//! - Interleaved complex byte -> magnitude conversion for spectrum capture

mod bands;
mod error;
mod headroom;
mod presets;
mod spectrum;

pub use bands::{
    quantize, BandLevelRange, BUCKET_UPPER_BOUNDS_HZ, CANONICAL_CENTERS_HZ,
};
pub use error::DspError;
pub use headroom::{
    auto_pre_gain_db, clamp_post_gain_db, clamp_preamp_db, POST_GAIN_MAX_DB, POST_GAIN_MIN_DB,
    PREAMP_MAX_DB, PREAMP_MIN_DB,
};
pub use presets::{
    find_preset, preset_curve, preset_names, Preset, PresetCurve, DEFAULT_PRESET, PRESETS,
    PRESET_BANDS,
};
pub use spectrum::{fft_to_magnitudes, MagnitudeFrame};
