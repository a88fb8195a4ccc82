//! In-Memory Backend
//!
//! Simulates effect and capture hardware in process memory. Units behave
//! like exclusive device resources (a second acquisition of a held module
//! fails) and every value written is recorded in a [`MemoryState`] that can
//! be inspected through [`MemoryBackend::snapshot`].
//!
//! Faults can be injected per module, per band and per release to exercise
//! the effect chain's isolation behavior. Capture data is pushed with
//! [`MemoryBackend::emit_fft`] from whichever thread plays the driver.
//!
//! ```text
//! MemoryBackend (clone) ──┐
//!                         ├── Arc<Shared> ── state:    Mutex<MemoryState>
//! MemoryUnit / Capture ───┘                 behavior: Mutex<Behavior>
//!                                           listener: Mutex<Option<FftListener>>
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mixfx_dsp::CANONICAL_CENTERS_HZ;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{PlatformError, CAPTURE_UNIT};
use crate::traits::*;

/// Static description of the simulated device
#[derive(Debug, Clone)]
pub struct MemoryBackendConfig {
    /// Modules that cannot be acquired
    pub unavailable: Vec<EffectKind>,
    pub capture_available: bool,
    /// Equalizer band centers in milli-hertz
    pub band_centers_millihz: Vec<u32>,
    pub band_level_range: (i16, i16),
    pub capture_size_range: (usize, usize),
    pub max_capture_rate_mhz: u32,
    /// Sampling rate passed to capture listeners
    pub sampling_rate_mhz: u32,
    pub output_devices: Vec<OutputDevice>,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            unavailable: Vec::new(),
            capture_available: true,
            band_centers_millihz: CANONICAL_CENTERS_HZ
                .iter()
                .map(|hz| (hz * 1000.0) as u32)
                .collect(),
            band_level_range: (-1500, 1500),
            capture_size_range: (128, 1024),
            max_capture_rate_mhz: 20_000,
            sampling_rate_mhz: 44_100_000,
            output_devices: vec![OutputDevice {
                kind: OutputDeviceKind::Speaker,
                name: "Built-in speaker".to_string(),
                address: String::new(),
            }],
        }
    }
}

impl MemoryBackendConfig {
    /// Mark a module as missing on this device
    pub fn without(mut self, kind: EffectKind) -> Self {
        self.unavailable.push(kind);
        self
    }

    /// Replace the equalizer layout with the given centers (Hz)
    pub fn with_band_centers_hz(mut self, centers_hz: &[f32]) -> Self {
        self.band_centers_millihz = centers_hz.iter().map(|hz| (hz * 1000.0) as u32).collect();
        self
    }

    pub fn with_band_level_range(mut self, min: i16, max: i16) -> Self {
        self.band_level_range = (min, max);
        self
    }
}

/// Capture unit bookkeeping
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    pub live: bool,
    pub acquisitions: u32,
    pub enabled: bool,
    pub capture_size: usize,
    pub rate_mhz: u32,
    pub listening: bool,
}

/// Everything the simulated hardware currently holds
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    /// Modules currently acquired and not yet released
    pub live: HashSet<EffectKind>,
    /// Total successful acquisitions per module
    pub acquisitions: HashMap<EffectKind, u32>,
    pub enabled: HashMap<EffectKind, bool>,
    pub band_levels: Vec<i16>,
    pub bass_strength: i16,
    pub input_gain_db: f32,
    pub limiter_enabled: bool,
    pub limiter_post_gain_db: f32,
    pub loudness_gain_mb: i32,
    pub virtualizer_strength: i16,
    pub capture: CaptureState,
}

impl MemoryState {
    pub fn acquisitions_of(&self, kind: EffectKind) -> u32 {
        self.acquisitions.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        self.enabled.get(&kind).copied().unwrap_or(false)
    }
}

/// Injected faults
#[derive(Debug, Default)]
struct Behavior {
    unavailable: HashSet<EffectKind>,
    capture_unavailable: bool,
    failing_ops: HashSet<EffectKind>,
    failing_bands: HashSet<usize>,
    failing_releases: HashSet<EffectKind>,
    capture_release_fails: bool,
}

struct Shared {
    config: MemoryBackendConfig,
    state: Mutex<MemoryState>,
    behavior: Mutex<Behavior>,
    listener: Mutex<Option<FftListener>>,
}

/// Simulated effect hardware. Clones share the same device.
#[derive(Clone)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        let state = MemoryState {
            band_levels: vec![0; config.band_centers_millihz.len()],
            ..Default::default()
        };
        let behavior = Behavior {
            unavailable: config.unavailable.iter().copied().collect(),
            capture_unavailable: !config.capture_available,
            ..Default::default()
        };

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                behavior: Mutex::new(behavior),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Copy of the current hardware state
    pub fn snapshot(&self) -> MemoryState {
        self.shared.state.lock().clone()
    }

    /// Make a module (un)available for future acquisitions
    pub fn set_available(&self, kind: EffectKind, available: bool) {
        let mut behavior = self.shared.behavior.lock();
        if available {
            behavior.unavailable.remove(&kind);
        } else {
            behavior.unavailable.insert(kind);
        }
    }

    pub fn set_capture_available(&self, available: bool) {
        self.shared.behavior.lock().capture_unavailable = !available;
    }

    /// Make every setter of a module fail
    pub fn fail_operations(&self, kind: EffectKind) {
        self.shared.behavior.lock().failing_ops.insert(kind);
    }

    /// Make `set_band_level` fail for one band
    pub fn fail_band(&self, band: usize) {
        self.shared.behavior.lock().failing_bands.insert(band);
    }

    /// Make release of a module report failure (the unit is torn down anyway)
    pub fn fail_release(&self, kind: EffectKind) {
        self.shared.behavior.lock().failing_releases.insert(kind);
    }

    pub fn fail_capture_release(&self) {
        self.shared.behavior.lock().capture_release_fails = true;
    }

    /// Push one frequency-domain buffer to the registered listener
    ///
    /// Runs the listener on the calling thread. Returns whether a listener
    /// received the data.
    pub fn emit_fft(&self, data: &[u8]) -> bool {
        {
            let state = self.shared.state.lock();
            if !state.capture.live || !state.capture.enabled {
                return false;
            }
        }

        let mut listener = self.shared.listener.lock();
        match listener.as_mut() {
            Some(callback) => {
                callback(data, self.shared.config.sampling_rate_mhz);
                true
            }
            None => false,
        }
    }

    fn acquire(&self, kind: EffectKind) -> Result<MemoryUnit, PlatformError> {
        if self.shared.behavior.lock().unavailable.contains(&kind) {
            return Err(PlatformError::ModuleUnavailable(kind));
        }

        let mut state = self.shared.state.lock();
        if !state.live.insert(kind) {
            debug!("{} is already held", kind);
            return Err(PlatformError::ModuleUnavailable(kind));
        }
        *state.acquisitions.entry(kind).or_insert(0) += 1;
        state.enabled.insert(kind, false);

        Ok(MemoryUnit {
            kind,
            shared: Arc::clone(&self.shared),
            released: false,
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

impl EffectBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "Memory (simulated hardware)"
    }

    fn open_equalizer(&self, _session: i32) -> Result<Box<dyn EqualizerUnit>, PlatformError> {
        Ok(Box::new(self.acquire(EffectKind::Equalizer)?))
    }

    fn open_bass_boost(&self, _session: i32) -> Result<Box<dyn BassBoostUnit>, PlatformError> {
        Ok(Box::new(self.acquire(EffectKind::BassBoost)?))
    }

    fn open_dynamics(&self, _session: i32) -> Result<Box<dyn DynamicsUnit>, PlatformError> {
        Ok(Box::new(self.acquire(EffectKind::Limiter)?))
    }

    fn open_loudness(&self, _session: i32) -> Result<Box<dyn LoudnessUnit>, PlatformError> {
        Ok(Box::new(self.acquire(EffectKind::Loudness)?))
    }

    fn open_virtualizer(&self, _session: i32) -> Result<Box<dyn VirtualizerUnit>, PlatformError> {
        Ok(Box::new(self.acquire(EffectKind::Virtualizer)?))
    }

    fn open_capture(&self, _session: i32) -> Result<Box<dyn CaptureUnit>, PlatformError> {
        if self.shared.behavior.lock().capture_unavailable {
            return Err(PlatformError::CaptureUnavailable);
        }

        let mut state = self.shared.state.lock();
        if state.capture.live {
            return Err(PlatformError::CaptureUnavailable);
        }
        state.capture.live = true;
        state.capture.enabled = false;
        state.capture.acquisitions += 1;

        Ok(Box::new(MemoryCapture {
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }

    fn list_output_devices(&self) -> Result<Vec<OutputDevice>, PlatformError> {
        Ok(self.shared.config.output_devices.clone())
    }
}

/// One acquired effect module. Implements every unit trait; the backend
/// only ever hands it out behind the trait matching its kind.
struct MemoryUnit {
    kind: EffectKind,
    shared: Arc<Shared>,
    released: bool,
}

impl MemoryUnit {
    fn check(&self, operation: &'static str) -> Result<(), PlatformError> {
        if self.released {
            return Err(PlatformError::Released(self.kind.as_str()));
        }
        if self.shared.behavior.lock().failing_ops.contains(&self.kind) {
            return Err(PlatformError::rejected(
                self.kind.as_str(),
                operation,
                "simulated failure",
            ));
        }
        Ok(())
    }

    fn update(&self, operation: &'static str, f: impl FnOnce(&mut MemoryState)) -> Result<(), PlatformError> {
        self.check(operation)?;
        f(&mut self.shared.state.lock());
        Ok(())
    }
}

impl Drop for MemoryUnit {
    fn drop(&mut self) {
        if !self.released {
            self.shared.state.lock().live.remove(&self.kind);
        }
    }
}

impl EffectUnit for MemoryUnit {
    fn kind(&self) -> EffectKind {
        self.kind
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), PlatformError> {
        let kind = self.kind;
        self.update("set_enabled", |state| {
            state.enabled.insert(kind, enabled);
        })
    }

    fn release(&mut self) -> Result<(), PlatformError> {
        if self.released {
            return Err(PlatformError::Released(self.kind.as_str()));
        }
        self.released = true;
        {
            let mut state = self.shared.state.lock();
            state.live.remove(&self.kind);
            state.enabled.insert(self.kind, false);
        }

        if self.shared.behavior.lock().failing_releases.contains(&self.kind) {
            return Err(PlatformError::ReleaseFailed {
                unit: self.kind.as_str(),
                reason: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

impl EqualizerUnit for MemoryUnit {
    fn band_count(&self) -> Result<usize, PlatformError> {
        self.check("band_count")?;
        Ok(self.shared.config.band_centers_millihz.len())
    }

    fn band_level_range(&self) -> Result<(i16, i16), PlatformError> {
        self.check("band_level_range")?;
        Ok(self.shared.config.band_level_range)
    }

    fn center_freq_millihz(&self, band: usize) -> Result<u32, PlatformError> {
        self.check("center_freq")?;
        self.shared
            .config
            .band_centers_millihz
            .get(band)
            .copied()
            .ok_or(PlatformError::InvalidBand(band))
    }

    fn set_band_level(&mut self, band: usize, level: i16) -> Result<(), PlatformError> {
        self.check("set_band_level")?;
        if band >= self.shared.config.band_centers_millihz.len() {
            return Err(PlatformError::InvalidBand(band));
        }
        if self.shared.behavior.lock().failing_bands.contains(&band) {
            return Err(PlatformError::rejected(
                self.kind.as_str(),
                "set_band_level",
                format!("band {} failed", band),
            ));
        }
        let (min, max) = self.shared.config.band_level_range;
        if !(min..=max).contains(&level) {
            return Err(PlatformError::rejected(
                self.kind.as_str(),
                "set_band_level",
                format!("level {} outside [{}, {}]", level, min, max),
            ));
        }

        self.shared.state.lock().band_levels[band] = level;
        Ok(())
    }
}

impl BassBoostUnit for MemoryUnit {
    fn set_strength(&mut self, strength: i16) -> Result<(), PlatformError> {
        self.update("set_strength", |state| state.bass_strength = strength)
    }
}

impl DynamicsUnit for MemoryUnit {
    fn set_input_gain_db(&mut self, db: f32) -> Result<(), PlatformError> {
        self.update("set_input_gain", |state| state.input_gain_db = db)
    }

    fn set_limiter_enabled(&mut self, enabled: bool) -> Result<(), PlatformError> {
        self.update("set_limiter_enabled", |state| state.limiter_enabled = enabled)
    }

    fn set_limiter_post_gain_db(&mut self, db: f32) -> Result<(), PlatformError> {
        self.update("set_limiter_post_gain", |state| state.limiter_post_gain_db = db)
    }
}

impl LoudnessUnit for MemoryUnit {
    fn set_target_gain_mb(&mut self, gain_mb: i32) -> Result<(), PlatformError> {
        self.update("set_target_gain", |state| state.loudness_gain_mb = gain_mb)
    }
}

impl VirtualizerUnit for MemoryUnit {
    fn set_strength(&mut self, strength: i16) -> Result<(), PlatformError> {
        self.update("set_strength", |state| state.virtualizer_strength = strength)
    }
}

/// Acquired visualization capture unit
struct MemoryCapture {
    shared: Arc<Shared>,
    released: bool,
}

impl MemoryCapture {
    fn check(&self) -> Result<(), PlatformError> {
        if self.released {
            return Err(PlatformError::Released(CAPTURE_UNIT));
        }
        Ok(())
    }

    fn take_listener(&self) {
        // Waits for an in-flight callback, then drops the listener
        // outside the lock.
        let listener = self.shared.listener.lock().take();
        drop(listener);
        self.shared.state.lock().capture.listening = false;
    }
}

impl Drop for MemoryCapture {
    fn drop(&mut self) {
        if !self.released {
            self.take_listener();
            let mut state = self.shared.state.lock();
            state.capture.live = false;
            state.capture.enabled = false;
        }
    }
}

impl CaptureUnit for MemoryCapture {
    fn capture_size_range(&self) -> Result<(usize, usize), PlatformError> {
        self.check()?;
        Ok(self.shared.config.capture_size_range)
    }

    fn set_capture_size(&mut self, size: usize) -> Result<(), PlatformError> {
        self.check()?;
        let (min, max) = self.shared.config.capture_size_range;
        if !(min..=max).contains(&size) {
            return Err(PlatformError::rejected(
                CAPTURE_UNIT,
                "set_capture_size",
                format!("size {} outside [{}, {}]", size, min, max),
            ));
        }
        self.shared.state.lock().capture.capture_size = size;
        Ok(())
    }

    fn max_capture_rate_mhz(&self) -> Result<u32, PlatformError> {
        self.check()?;
        Ok(self.shared.config.max_capture_rate_mhz)
    }

    fn set_fft_listener(&mut self, listener: FftListener, rate_mhz: u32) -> Result<(), PlatformError> {
        self.check()?;
        let previous = self.shared.listener.lock().replace(listener);
        drop(previous);

        let mut state = self.shared.state.lock();
        state.capture.listening = true;
        state.capture.rate_mhz = rate_mhz;
        Ok(())
    }

    fn clear_listener(&mut self) -> Result<(), PlatformError> {
        self.check()?;
        self.take_listener();
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), PlatformError> {
        self.check()?;
        self.shared.state.lock().capture.enabled = enabled;
        Ok(())
    }

    fn release(&mut self) -> Result<(), PlatformError> {
        self.check()?;
        self.released = true;
        self.take_listener();
        {
            let mut state = self.shared.state.lock();
            state.capture.live = false;
            state.capture.enabled = false;
        }

        if self.shared.behavior.lock().capture_release_fails {
            return Err(PlatformError::ReleaseFailed {
                unit: CAPTURE_UNIT,
                reason: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_layout_is_canonical() {
        let backend = MemoryBackend::default();
        let eq = backend.open_equalizer(GLOBAL_SESSION).unwrap();
        assert_eq!(eq.band_count().unwrap(), 10);
        assert_eq!(eq.center_freq_millihz(0).unwrap(), 31_000);
        assert_eq!(eq.center_freq_millihz(9).unwrap(), 16_000_000);
        assert!(matches!(
            eq.center_freq_millihz(10),
            Err(PlatformError::InvalidBand(10))
        ));
    }

    #[test]
    fn test_module_is_exclusive() {
        let backend = MemoryBackend::default();
        let mut first = backend.open_bass_boost(GLOBAL_SESSION).unwrap();
        assert!(backend.open_bass_boost(GLOBAL_SESSION).is_err());

        first.release().unwrap();
        assert!(backend.open_bass_boost(GLOBAL_SESSION).is_ok());
        assert_eq!(backend.snapshot().acquisitions_of(EffectKind::BassBoost), 2);
    }

    #[test]
    fn test_drop_frees_module() {
        let backend = MemoryBackend::default();
        {
            let _unit = backend.open_loudness(GLOBAL_SESSION).unwrap();
            assert!(backend.snapshot().live.contains(&EffectKind::Loudness));
        }
        assert!(!backend.snapshot().live.contains(&EffectKind::Loudness));
    }

    #[test]
    fn test_unavailable_module() {
        let backend = MemoryBackend::new(MemoryBackendConfig::default().without(EffectKind::Virtualizer));
        assert!(matches!(
            backend.open_virtualizer(GLOBAL_SESSION),
            Err(PlatformError::ModuleUnavailable(EffectKind::Virtualizer))
        ));
        assert!(backend.open_equalizer(GLOBAL_SESSION).is_ok());
    }

    #[test]
    fn test_band_level_out_of_range_rejected() {
        let backend = MemoryBackend::default();
        let mut eq = backend.open_equalizer(GLOBAL_SESSION).unwrap();
        assert!(eq.set_band_level(0, 2000).is_err());
        assert!(eq.set_band_level(0, 1500).is_ok());
        assert_eq!(backend.snapshot().band_levels[0], 1500);
    }

    #[test]
    fn test_injected_faults() {
        let backend = MemoryBackend::default();
        backend.fail_band(2);
        backend.fail_release(EffectKind::Equalizer);

        let mut eq = backend.open_equalizer(GLOBAL_SESSION).unwrap();
        assert!(eq.set_band_level(2, 100).is_err());
        assert!(eq.set_band_level(3, 100).is_ok());

        assert!(matches!(eq.release(), Err(PlatformError::ReleaseFailed { .. })));
        // Torn down regardless
        assert!(!backend.snapshot().live.contains(&EffectKind::Equalizer));
        assert!(eq.set_band_level(3, 0).is_err());
    }

    #[test]
    fn test_capture_listener_lifecycle() {
        let backend = MemoryBackend::default();
        let mut capture = backend.open_capture(GLOBAL_SESSION).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        capture
            .set_fft_listener(
                Box::new(move |data, _rate| {
                    counter.fetch_add(data.len(), Ordering::SeqCst);
                }),
                20_000,
            )
            .unwrap();

        // Not enabled yet
        assert!(!backend.emit_fft(&[1, 2]));
        capture.set_enabled(true).unwrap();
        assert!(backend.emit_fft(&[1, 2, 3, 4]));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        capture.clear_listener().unwrap();
        assert!(!backend.emit_fft(&[1, 2]));

        capture.release().unwrap();
        assert!(!backend.snapshot().capture.live);
        assert!(capture.release().is_err());
    }

    #[test]
    fn test_capture_size_bounds() {
        let backend = MemoryBackend::default();
        let mut capture = backend.open_capture(GLOBAL_SESSION).unwrap();
        assert_eq!(capture.capture_size_range().unwrap(), (128, 1024));
        assert!(capture.set_capture_size(4096).is_err());
        assert!(capture.set_capture_size(1024).is_ok());
        assert!(backend.open_capture(GLOBAL_SESSION).is_err());
    }
}
