//! Platform Backend Traits
//!
//! Defines the interface every effect/capture backend must provide. Each
//! unit is an exclusive, device-wide hardware resource: it is acquired
//! once, driven through its setters and explicitly released.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Audio session that addresses the device's global output mix
pub const GLOBAL_SESSION: i32 = 0;

/// The five effect modules an output chain can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    Equalizer,
    BassBoost,
    /// Dynamics processing: input gain stage followed by a limiter
    Limiter,
    Loudness,
    Virtualizer,
}

impl EffectKind {
    /// All kinds, in chain order
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Equalizer,
        EffectKind::BassBoost,
        EffectKind::Limiter,
        EffectKind::Loudness,
        EffectKind::Virtualizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Equalizer => "Equalizer",
            EffectKind::BassBoost => "BassBoost",
            EffectKind::Limiter => "Limiter",
            EffectKind::Loudness => "Loudness",
            EffectKind::Virtualizer => "Virtualizer",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface of every acquired effect unit
pub trait EffectUnit: Send {
    fn kind(&self) -> EffectKind;

    /// Turn processing on or off without releasing the unit
    fn set_enabled(&mut self, enabled: bool) -> Result<(), PlatformError>;

    /// Give the hardware back. Further calls on the unit fail.
    fn release(&mut self) -> Result<(), PlatformError>;
}

/// Multi-band equalizer
pub trait EqualizerUnit: EffectUnit {
    /// Number of bands the device exposes
    fn band_count(&self) -> Result<usize, PlatformError>;

    /// Accepted level range `(min, max)` in centi-dB, shared by all bands
    fn band_level_range(&self) -> Result<(i16, i16), PlatformError>;

    /// Center frequency of a band in milli-hertz
    fn center_freq_millihz(&self, band: usize) -> Result<u32, PlatformError>;

    /// Set a band level in centi-dB
    fn set_band_level(&mut self, band: usize, level: i16) -> Result<(), PlatformError>;
}

/// Low-frequency boost, strength in `0..=1000`
pub trait BassBoostUnit: EffectUnit {
    fn set_strength(&mut self, strength: i16) -> Result<(), PlatformError>;
}

/// Dynamics processor with an input gain stage and an output limiter
pub trait DynamicsUnit: EffectUnit {
    /// Gain applied ahead of the processing chain (dB)
    fn set_input_gain_db(&mut self, db: f32) -> Result<(), PlatformError>;

    fn set_limiter_enabled(&mut self, enabled: bool) -> Result<(), PlatformError>;

    /// Gain applied after the limiter stage (dB)
    fn set_limiter_post_gain_db(&mut self, db: f32) -> Result<(), PlatformError>;
}

/// Loudness enhancer, target gain in millibels
pub trait LoudnessUnit: EffectUnit {
    fn set_target_gain_mb(&mut self, gain_mb: i32) -> Result<(), PlatformError>;
}

/// Stereo virtualizer, strength in `0..=1000`
pub trait VirtualizerUnit: EffectUnit {
    fn set_strength(&mut self, strength: i16) -> Result<(), PlatformError>;
}

/// Frequency-domain capture callback: `(interleaved re/im bytes, sampling rate mHz)`
pub type FftListener = Box<dyn FnMut(&[u8], u32) + Send>;

/// Visualization capture unit
pub trait CaptureUnit: Send {
    /// Supported capture sizes `(min, max)` in bytes
    fn capture_size_range(&self) -> Result<(usize, usize), PlatformError>;

    fn set_capture_size(&mut self, size: usize) -> Result<(), PlatformError>;

    /// Highest supported callback rate in milli-hertz
    fn max_capture_rate_mhz(&self) -> Result<u32, PlatformError>;

    /// Register the frequency-domain listener, replacing any previous one.
    /// The listener runs on a backend-owned thread.
    fn set_fft_listener(&mut self, listener: FftListener, rate_mhz: u32)
        -> Result<(), PlatformError>;

    /// Unregister the listener. Once this returns no new invocation starts
    /// and the listener has been dropped.
    fn clear_listener(&mut self) -> Result<(), PlatformError>;

    fn set_enabled(&mut self, enabled: bool) -> Result<(), PlatformError>;

    fn release(&mut self) -> Result<(), PlatformError>;
}

/// Output device category, as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputDeviceKind {
    Speaker,
    WiredHeadphones,
    WiredHeadset,
    UsbDevice,
    UsbHeadset,
    BluetoothA2dp,
    BluetoothSco,
    /// Platform type code with no dedicated variant
    Other(i32),
}

/// An output route the platform knows about (diagnostics only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDevice {
    pub kind: OutputDeviceKind,
    pub name: String,
    pub address: String,
}

/// Trait for platform-specific effect backends
///
/// Every `open_*` call attempts one acquisition against `session` and fails
/// fast with [`PlatformError::ModuleUnavailable`] when the module does not
/// exist or is already held.
pub trait EffectBackend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    fn open_equalizer(&self, session: i32) -> Result<Box<dyn EqualizerUnit>, PlatformError>;

    fn open_bass_boost(&self, session: i32) -> Result<Box<dyn BassBoostUnit>, PlatformError>;

    fn open_dynamics(&self, session: i32) -> Result<Box<dyn DynamicsUnit>, PlatformError>;

    fn open_loudness(&self, session: i32) -> Result<Box<dyn LoudnessUnit>, PlatformError>;

    fn open_virtualizer(&self, session: i32) -> Result<Box<dyn VirtualizerUnit>, PlatformError>;

    fn open_capture(&self, session: i32) -> Result<Box<dyn CaptureUnit>, PlatformError>;

    /// List the output devices currently known to the platform
    fn list_output_devices(&self) -> Result<Vec<OutputDevice>, PlatformError>;
}
