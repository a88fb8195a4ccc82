//! Effect Chain Controller
//!
//! Owns the five hardware effect units of the global output mix and keeps a
//! local, authoritative copy of every value written to them.
//!
//! # Isolation
//!
//! Every hardware call goes through one helper: a unit that was never
//! acquired turns the call into a logged no-op, and a unit that rejects the
//! call is logged and skipped. One failing unit (or one failing band) never
//! stops its siblings, and no hardware error ever reaches the caller.
//!
//! # Write-through
//!
//! Settings are read once at [`EffectChain::attach`] to seed the chain.
//! After that, every user-driven change that the hardware accepted is
//! written back to the store as one key. Values the chain wrote are never
//! read back from the hardware.

use std::sync::Arc;

use mixfx_dsp::{
    auto_pre_gain_db, clamp_post_gain_db, clamp_preamp_db, find_preset, preset_curve, quantize,
    BandLevelRange, DEFAULT_PRESET,
};
use mixfx_platform::{
    BassBoostUnit, DynamicsUnit, EffectBackend, EffectKind, EffectUnit, EqualizerUnit,
    LoudnessUnit, PlatformError, VirtualizerUnit, GLOBAL_SESSION,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::device::describe_output_routes;
use crate::error::ChainResult;
use crate::settings::{encode_band_levels, EffectSettings, SettingKey, SettingValue, SettingsStore};

/// Upper bound of bass boost and virtualizer strength
pub const STRENGTH_MAX: i16 = 1000;

/// Upper bound of the loudness target gain (millibels)
pub const LOUDNESS_GAIN_MAX_MB: i32 = 3000;

fn clamp_strength(strength: i32) -> i16 {
    strength.clamp(0, STRENGTH_MAX as i32) as i16
}

fn clamp_loudness_mb(gain_mb: i32) -> i32 {
    gain_mb.clamp(0, LOUDNESS_GAIN_MAX_MB)
}

/// Run one call against an optional unit
///
/// Absent unit: `debug!` and `None`. Rejected call: `warn!` and `None`.
fn drive<U, T>(
    slot: &mut Option<Box<U>>,
    kind: EffectKind,
    operation: &'static str,
    call: impl FnOnce(&mut U) -> Result<T, PlatformError>,
) -> Option<T>
where
    U: EffectUnit + ?Sized,
{
    let Some(unit) = slot.as_deref_mut() else {
        debug!("{} not present, skipping {}", kind, operation);
        return None;
    };

    match call(unit) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} {} failed: {}", kind, operation, e);
            None
        }
    }
}

/// Keep a freshly opened unit and switch it on
fn acquire<U>(kind: EffectKind, opened: Result<Box<U>, PlatformError>) -> Option<Box<U>>
where
    U: EffectUnit + ?Sized,
{
    match opened {
        Ok(mut unit) => {
            if let Err(e) = unit.set_enabled(true) {
                warn!("{} acquired but could not be enabled: {}", kind, e);
            }
            debug!("{} acquired", kind);
            Some(unit)
        }
        Err(e) => {
            info!("{} not available: {}", kind, e);
            None
        }
    }
}

fn release<U>(slot: &mut Option<Box<U>>, kind: EffectKind)
where
    U: EffectUnit + ?Sized,
{
    if let Some(mut unit) = slot.take() {
        match unit.release() {
            Ok(()) => debug!("{} released", kind),
            Err(e) => warn!("Ignoring {} release failure: {}", kind, e),
        }
    }
}

/// The acquired hardware, one optional slot per module
#[derive(Default)]
struct Units {
    equalizer: Option<Box<dyn EqualizerUnit>>,
    bass_boost: Option<Box<dyn BassBoostUnit>>,
    dynamics: Option<Box<dyn DynamicsUnit>>,
    loudness: Option<Box<dyn LoudnessUnit>>,
    virtualizer: Option<Box<dyn VirtualizerUnit>>,
}

impl Units {
    fn contains(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Equalizer => self.equalizer.is_some(),
            EffectKind::BassBoost => self.bass_boost.is_some(),
            EffectKind::Limiter => self.dynamics.is_some(),
            EffectKind::Loudness => self.loudness.is_some(),
            EffectKind::Virtualizer => self.virtualizer.is_some(),
        }
    }

    fn is_empty(&self) -> bool {
        !EffectKind::ALL.iter().any(|kind| self.contains(*kind))
    }

    /// Returns whether the equalizer accepted the flag
    fn set_all_enabled(&mut self, enabled: bool) -> bool {
        let equalizer = drive(&mut self.equalizer, EffectKind::Equalizer, "set_enabled", |u| {
            u.set_enabled(enabled)
        })
        .is_some();
        drive(&mut self.bass_boost, EffectKind::BassBoost, "set_enabled", |u| u.set_enabled(enabled));
        drive(&mut self.dynamics, EffectKind::Limiter, "set_enabled", |u| u.set_enabled(enabled));
        drive(&mut self.loudness, EffectKind::Loudness, "set_enabled", |u| u.set_enabled(enabled));
        drive(&mut self.virtualizer, EffectKind::Virtualizer, "set_enabled", |u| {
            u.set_enabled(enabled)
        });
        equalizer
    }

    fn release_all(&mut self) {
        release(&mut self.equalizer, EffectKind::Equalizer);
        release(&mut self.bass_boost, EffectKind::BassBoost);
        release(&mut self.dynamics, EffectKind::Limiter);
        release(&mut self.loudness, EffectKind::Loudness);
        release(&mut self.virtualizer, EffectKind::Virtualizer);
    }
}

/// Local mirror of the equalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizerState {
    /// Per-band level in centi-dB
    pub levels: Vec<i16>,
    pub range: BandLevelRange,
    /// Per-band center frequency in Hz
    pub centers_hz: Vec<f32>,
    pub preset: String,
}

impl EqualizerState {
    pub fn band_count(&self) -> usize {
        self.levels.len()
    }
}

/// Pre-gain ahead of the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadroomState {
    /// Pre-gain follows the largest band boost
    pub auto: bool,
    pub pre_gain_db: f32,
}

/// Cached values of the non-equalizer modules
#[derive(Debug, Clone, Default, PartialEq)]
struct EffectParams {
    globally_enabled: bool,
    equalizer_enabled: bool,
    /// Equalizer flag last chosen by the user, restored by the global switch
    equalizer_choice: bool,
    bass_strength: i16,
    limiter_enabled: bool,
    limiter_post_gain_db: f32,
    loudness_gain_mb: i32,
    virtualizer_strength: i16,
}

/// Set one band and mirror it locally when the hardware accepts it
fn write_band(
    unit: &mut Option<Box<dyn EqualizerUnit>>,
    state: &mut EqualizerState,
    band: usize,
    level: i32,
) -> bool {
    let level = state.range.clamp(level);
    let applied = drive(unit, EffectKind::Equalizer, "set_band_level", |eq| {
        eq.set_band_level(band, level)
    })
    .is_some();

    if applied {
        state.levels[band] = level;
    }
    applied
}

/// Controller for the global output effect chain
///
/// Constructed empty; [`attach`](Self::attach) acquires whatever the device
/// offers. All methods run on the owning thread.
pub struct EffectChain {
    backend: Arc<dyn EffectBackend>,
    store: Box<dyn SettingsStore>,
    config: ChainConfig,
    units: Units,
    equalizer: Option<EqualizerState>,
    headroom: HeadroomState,
    params: EffectParams,
}

impl EffectChain {
    /// Create an empty chain
    pub fn new(
        backend: Arc<dyn EffectBackend>,
        store: Box<dyn SettingsStore>,
        config: ChainConfig,
    ) -> ChainResult<Self> {
        config.validate()?;

        Ok(Self {
            backend,
            store,
            config,
            units: Units::default(),
            equalizer: None,
            headroom: HeadroomState::default(),
            params: EffectParams::default(),
        })
    }

    /// Acquire every available module, seed it from settings and enable it
    ///
    /// Each module is attempted independently. No-op while any module is
    /// held.
    pub fn attach(&mut self) {
        if !self.units.is_empty() {
            debug!("Effect chain already attached");
            return;
        }

        info!("Attaching effect chain via {}", self.backend.name());

        self.units.equalizer = acquire(
            EffectKind::Equalizer,
            self.backend.open_equalizer(GLOBAL_SESSION),
        );
        self.units.bass_boost = acquire(
            EffectKind::BassBoost,
            self.backend.open_bass_boost(GLOBAL_SESSION),
        );
        self.units.dynamics = acquire(
            EffectKind::Limiter,
            self.backend.open_dynamics(GLOBAL_SESSION),
        );
        self.units.loudness = acquire(
            EffectKind::Loudness,
            self.backend.open_loudness(GLOBAL_SESSION),
        );
        self.units.virtualizer = acquire(
            EffectKind::Virtualizer,
            self.backend.open_virtualizer(GLOBAL_SESSION),
        );

        if self.units.is_empty() {
            info!("No effect modules available on this device");
            return;
        }

        self.equalizer = self.read_equalizer_layout();
        let saved = EffectSettings::load(self.store.as_ref());
        self.seed(saved);

        info!("Effect chain attached: {:?}", self.available_effects());
    }

    /// Release every held module and forget all local state. Idempotent.
    pub fn detach(&mut self) {
        if self.units.is_empty() && self.equalizer.is_none() {
            return;
        }

        info!("Detaching effect chain");
        self.units.release_all();
        self.equalizer = None;
        self.headroom = HeadroomState::default();
        self.params = EffectParams::default();
    }

    fn read_equalizer_layout(&mut self) -> Option<EqualizerState> {
        if self.units.equalizer.is_none() {
            return None;
        }

        let slot = &mut self.units.equalizer;
        let kind = EffectKind::Equalizer;

        let band_count = drive(slot, kind, "band_count", |eq| eq.band_count()).unwrap_or(0);

        let range = match drive(slot, kind, "band_level_range", |eq| eq.band_level_range()) {
            Some((min, max)) => match BandLevelRange::new(min, max) {
                Ok(range) => range,
                Err(e) => {
                    warn!("Equalizer reported {}, using fallback", e);
                    self.config.fallback_level_range
                }
            },
            None => self.config.fallback_level_range,
        };

        let centers_hz = (0..band_count)
            .map(|band| {
                drive(slot, kind, "center_freq", |eq| eq.center_freq_millihz(band))
                    .map(|millihz| millihz as f32 / 1000.0)
                    .unwrap_or(0.0)
            })
            .collect::<Vec<_>>();

        debug!(
            "Equalizer layout: {} bands, range [{}, {}], centers {:?}",
            band_count, range.min, range.max, centers_hz
        );

        Some(EqualizerState {
            levels: vec![0; band_count],
            range,
            centers_hz,
            preset: DEFAULT_PRESET.to_string(),
        })
    }

    /// Push saved values to freshly acquired hardware, without persisting
    fn seed(&mut self, saved: EffectSettings) {
        let band_count = self.band_count();
        match saved.band_levels {
            Some(levels) if levels.len() == band_count => {
                self.write_levels(&levels);
                if let Some(eq) = self.equalizer.as_mut() {
                    eq.preset = saved.preset_name.clone();
                }
            }
            other => {
                if let Some(levels) = other {
                    warn!(
                        "Ignoring saved band list of {} entries for a {}-band equalizer",
                        levels.len(),
                        band_count
                    );
                }
                self.write_preset(&saved.preset_name);
            }
        }

        self.apply_bass_strength(clamp_strength(saved.bass_strength));
        self.apply_limiter_enabled(saved.limiter_enabled);
        self.apply_limiter_post_gain(clamp_post_gain_db(saved.limiter_post_gain_db));
        self.apply_loudness_gain(clamp_loudness_mb(saved.loudness_gain_mb));
        self.apply_virtualizer_strength(clamp_strength(saved.virtualizer_strength.round() as i32));

        self.headroom.auto = saved.auto_headroom;
        if saved.auto_headroom {
            self.apply_headroom();
        } else {
            self.apply_pre_gain(clamp_preamp_db(saved.preamp_db));
        }

        self.params.equalizer_choice = saved.equalizer_enabled;
        let enabled = saved.effects_enabled.unwrap_or(self.config.start_enabled);
        self.apply_globally_enabled(enabled);
    }

    fn persist(&mut self, key: SettingKey, value: SettingValue) {
        debug!("Persisting {} = {:?}", key.as_str(), value);
        if let Err(e) = self.store.put(key, value) {
            warn!("Failed to persist {}: {}", key.as_str(), e);
        }
    }

    fn persist_band_levels(&mut self) {
        let Some(eq) = self.equalizer.as_ref() else {
            return;
        };
        let levels = encode_band_levels(&eq.levels);
        self.persist(SettingKey::EqualizerBandLevels, SettingValue::Text(levels));
    }

    fn persist_equalizer(&mut self) {
        let Some(eq) = self.equalizer.as_ref() else {
            return;
        };
        let preset = eq.preset.clone();
        self.persist(SettingKey::EqualizerPresetName, SettingValue::Text(preset));
        self.persist_band_levels();
    }

    /// Read-only view of the settings store
    pub fn settings(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.units.contains(kind)
    }

    pub fn has_equalizer(&self) -> bool {
        self.units.equalizer.is_some()
    }

    pub fn has_bass_boost(&self) -> bool {
        self.units.bass_boost.is_some()
    }

    /// Dynamics unit (pre-gain stage and limiter)
    pub fn has_limiter(&self) -> bool {
        self.units.dynamics.is_some()
    }

    pub fn has_loudness(&self) -> bool {
        self.units.loudness.is_some()
    }

    pub fn has_virtualizer(&self) -> bool {
        self.units.virtualizer.is_some()
    }

    /// Modules currently held, in chain order
    pub fn available_effects(&self) -> Vec<EffectKind> {
        EffectKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.units.contains(*kind))
            .collect()
    }

    /// Switching on restores the user's equalizer flag
    fn apply_globally_enabled(&mut self, enabled: bool) {
        self.params.globally_enabled = enabled;
        if self.units.set_all_enabled(enabled) {
            self.params.equalizer_enabled = enabled;
        }
        if enabled && !self.params.equalizer_choice {
            self.apply_equalizer_enabled(false);
        }
    }

    /// Switch every present module on or off
    pub fn set_globally_enabled(&mut self, enabled: bool) {
        if self.units.is_empty() {
            debug!("No effect modules, ignoring global enable");
            return;
        }

        info!("Effects {}", if enabled { "enabled" } else { "disabled" });
        self.apply_globally_enabled(enabled);
        self.persist(SettingKey::EffectsEnabled, SettingValue::Bool(enabled));
    }

    /// Last global switch value; false when nothing is attached
    pub fn globally_enabled(&self) -> bool {
        !self.units.is_empty() && self.params.globally_enabled
    }

    fn apply_equalizer_enabled(&mut self, enabled: bool) -> bool {
        let applied = drive(
            &mut self.units.equalizer,
            EffectKind::Equalizer,
            "set_enabled",
            |eq| eq.set_enabled(enabled),
        )
        .is_some();

        if applied {
            self.params.equalizer_enabled = enabled;
        }
        applied
    }

    pub fn set_equalizer_enabled(&mut self, enabled: bool) {
        if self.apply_equalizer_enabled(enabled) {
            self.params.equalizer_choice = enabled;
            self.persist(SettingKey::EqualizerEnabled, SettingValue::Bool(enabled));
        }
    }

    pub fn equalizer_enabled(&self) -> bool {
        self.has_equalizer() && self.params.equalizer_enabled
    }

    /// Number of bands, 0 without an equalizer
    pub fn band_count(&self) -> usize {
        self.equalizer.as_ref().map_or(0, EqualizerState::band_count)
    }

    pub fn band_level_range(&self) -> Option<BandLevelRange> {
        self.equalizer.as_ref().map(|eq| eq.range)
    }

    pub fn center_freq_hz(&self, band: usize) -> Option<f32> {
        self.equalizer
            .as_ref()
            .and_then(|eq| eq.centers_hz.get(band).copied())
    }

    /// Locally cached level of a band, 0 when unknown
    pub fn band_level(&self, band: usize) -> i16 {
        self.equalizer
            .as_ref()
            .and_then(|eq| eq.levels.get(band).copied())
            .unwrap_or(0)
    }

    pub fn band_levels(&self) -> &[i16] {
        self.equalizer
            .as_ref()
            .map(|eq| eq.levels.as_slice())
            .unwrap_or(&[])
    }

    pub fn preset_name(&self) -> &str {
        self.equalizer
            .as_ref()
            .map(|eq| eq.preset.as_str())
            .unwrap_or(DEFAULT_PRESET)
    }

    pub fn equalizer_state(&self) -> Option<&EqualizerState> {
        self.equalizer.as_ref()
    }

    /// Set one band (centi-dB), clamped into the device range
    pub fn set_band_level(&mut self, band: usize, level: i32) {
        let Some(eq) = self.equalizer.as_mut() else {
            debug!("No equalizer, ignoring band {} level", band);
            return;
        };
        if band >= eq.band_count() {
            warn!("Band {} out of range ({} bands)", band, eq.band_count());
            return;
        }

        if !write_band(&mut self.units.equalizer, eq, band, level) {
            return;
        }

        self.persist_band_levels();
        self.apply_headroom();
    }

    fn write_levels(&mut self, levels: &[i16]) {
        let Some(eq) = self.equalizer.as_mut() else {
            return;
        };
        for (band, level) in levels.iter().enumerate().take(eq.band_count()) {
            write_band(&mut self.units.equalizer, eq, band, *level as i32);
        }
    }

    /// Map a preset curve onto the device bands; returns the resolved name
    fn write_preset(&mut self, name: &str) -> &'static str {
        let resolved = match find_preset(name) {
            Some((preset_name, _)) => *preset_name,
            None => {
                warn!("Unknown preset '{}', using {}", name, DEFAULT_PRESET);
                DEFAULT_PRESET
            }
        };
        let curve = preset_curve(resolved);

        let Some(eq) = self.equalizer.as_mut() else {
            return resolved;
        };
        for band in 0..eq.band_count() {
            let bucket = quantize(eq.centers_hz[band]);
            write_band(&mut self.units.equalizer, eq, band, curve[bucket] as i32);
        }
        eq.preset = resolved.to_string();
        resolved
    }

    /// Apply a named preset. Unknown names apply `Flat`.
    pub fn apply_preset(&mut self, name: &str) {
        if self.equalizer.is_none() {
            debug!("No equalizer, ignoring preset '{}'", name);
            return;
        }

        let resolved = self.write_preset(name);
        info!("Applied preset {}", resolved);
        self.persist_equalizer();
        self.apply_headroom();
    }

    /// All bands to 0 and preset back to `Flat`
    pub fn reset_equalizer(&mut self) {
        let Some(eq) = self.equalizer.as_mut() else {
            debug!("No equalizer, nothing to reset");
            return;
        };

        for band in 0..eq.band_count() {
            write_band(&mut self.units.equalizer, eq, band, 0);
        }
        eq.preset = DEFAULT_PRESET.to_string();

        self.persist_equalizer();
        self.apply_headroom();
    }

    fn apply_pre_gain(&mut self, db: f32) -> bool {
        let applied = drive(
            &mut self.units.dynamics,
            EffectKind::Limiter,
            "set_input_gain",
            |dynamics| dynamics.set_input_gain_db(db),
        )
        .is_some();

        if applied {
            self.headroom.pre_gain_db = db;
        }
        applied
    }

    /// Recompute pre-gain from the band levels when auto-headroom is on
    fn apply_headroom(&mut self) {
        if !self.headroom.auto {
            return;
        }
        let db = auto_pre_gain_db(self.band_levels());
        debug!("Auto-headroom pre-gain {:.2} dB", db);
        self.apply_pre_gain(db);
    }

    /// Let the largest band boost drive the pre-gain. Turning it off keeps
    /// the last pre-gain in place.
    pub fn set_auto_headroom(&mut self, enabled: bool) {
        if !self.has_limiter() {
            debug!("No dynamics unit, ignoring auto-headroom");
            return;
        }

        self.headroom.auto = enabled;
        self.persist(SettingKey::AutoHeadroomEnabled, SettingValue::Bool(enabled));
        self.apply_headroom();
    }

    pub fn auto_headroom(&self) -> bool {
        self.has_limiter() && self.headroom.auto
    }

    pub fn headroom(&self) -> HeadroomState {
        self.headroom
    }

    /// Manual pre-gain in `[-12, 6]` dB; ignored while auto-headroom is on
    pub fn set_preamp_db(&mut self, db: f32) {
        if self.headroom.auto {
            debug!("Auto-headroom active, ignoring manual pre-amp {:.2} dB", db);
            return;
        }

        let db = clamp_preamp_db(db);
        if self.apply_pre_gain(db) {
            self.persist(SettingKey::PreampDb, SettingValue::Float(db));
        }
    }

    pub fn preamp_db(&self) -> f32 {
        if self.has_limiter() {
            self.headroom.pre_gain_db
        } else {
            0.0
        }
    }

    fn apply_bass_strength(&mut self, strength: i16) -> bool {
        let applied = drive(
            &mut self.units.bass_boost,
            EffectKind::BassBoost,
            "set_strength",
            |bass| bass.set_strength(strength),
        )
        .is_some();

        if applied {
            self.params.bass_strength = strength;
        }
        applied
    }

    /// Strength in `0..=1000`
    pub fn set_bass_strength(&mut self, strength: i32) {
        let strength = clamp_strength(strength);
        if self.apply_bass_strength(strength) {
            self.persist(SettingKey::BassStrength, SettingValue::Int(strength as i32));
        }
    }

    pub fn bass_strength(&self) -> i16 {
        if self.has_bass_boost() {
            self.params.bass_strength
        } else {
            0
        }
    }

    fn apply_limiter_enabled(&mut self, enabled: bool) -> bool {
        let applied = drive(
            &mut self.units.dynamics,
            EffectKind::Limiter,
            "set_limiter_enabled",
            |dynamics| dynamics.set_limiter_enabled(enabled),
        )
        .is_some();

        if applied {
            self.params.limiter_enabled = enabled;
        }
        applied
    }

    pub fn set_limiter_enabled(&mut self, enabled: bool) {
        if self.apply_limiter_enabled(enabled) {
            self.persist(SettingKey::LimiterEnabled, SettingValue::Bool(enabled));
        }
    }

    pub fn limiter_enabled(&self) -> bool {
        self.has_limiter() && self.params.limiter_enabled
    }

    fn apply_limiter_post_gain(&mut self, db: f32) -> bool {
        let applied = drive(
            &mut self.units.dynamics,
            EffectKind::Limiter,
            "set_limiter_post_gain",
            |dynamics| dynamics.set_limiter_post_gain_db(db),
        )
        .is_some();

        if applied {
            self.params.limiter_post_gain_db = db;
        }
        applied
    }

    /// Gain after the limiter stage, `[-12, 12]` dB
    pub fn set_limiter_post_gain_db(&mut self, db: f32) {
        let db = clamp_post_gain_db(db);
        if self.apply_limiter_post_gain(db) {
            self.persist(SettingKey::LimiterPostGainDb, SettingValue::Float(db));
        }
    }

    pub fn limiter_post_gain_db(&self) -> f32 {
        if self.has_limiter() {
            self.params.limiter_post_gain_db
        } else {
            0.0
        }
    }

    fn apply_loudness_gain(&mut self, gain_mb: i32) -> bool {
        let applied = drive(
            &mut self.units.loudness,
            EffectKind::Loudness,
            "set_target_gain",
            |loudness| loudness.set_target_gain_mb(gain_mb),
        )
        .is_some();

        if applied {
            self.params.loudness_gain_mb = gain_mb;
        }
        applied
    }

    /// Target gain in `0..=3000` millibels
    pub fn set_loudness_gain_mb(&mut self, gain_mb: i32) {
        let gain_mb = clamp_loudness_mb(gain_mb);
        if self.apply_loudness_gain(gain_mb) {
            self.persist(SettingKey::LoudnessGainMillibels, SettingValue::Int(gain_mb));
        }
    }

    pub fn loudness_gain_mb(&self) -> i32 {
        if self.has_loudness() {
            self.params.loudness_gain_mb
        } else {
            0
        }
    }

    fn apply_virtualizer_strength(&mut self, strength: i16) -> bool {
        let applied = drive(
            &mut self.units.virtualizer,
            EffectKind::Virtualizer,
            "set_strength",
            |virtualizer| virtualizer.set_strength(strength),
        )
        .is_some();

        if applied {
            self.params.virtualizer_strength = strength;
        }
        applied
    }

    /// Strength in `0..=1000`
    pub fn set_virtualizer_strength(&mut self, strength: i32) {
        let strength = clamp_strength(strength);
        if self.apply_virtualizer_strength(strength) {
            self.persist(
                SettingKey::VirtualizerStrength,
                SettingValue::Float(strength as f32),
            );
        }
    }

    pub fn virtualizer_strength(&self) -> i16 {
        if self.has_virtualizer() {
            self.params.virtualizer_strength
        } else {
            0
        }
    }

    /// Human-readable list of the platform's output routes
    pub fn output_routes(&self) -> String {
        match self.backend.list_output_devices() {
            Ok(devices) => describe_output_routes(&devices),
            Err(e) => {
                warn!("Could not list output devices: {}", e);
                describe_output_routes(&[])
            }
        }
    }
}

impl Drop for EffectChain {
    fn drop(&mut self) {
        self.detach();
    }
}
