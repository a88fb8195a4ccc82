//! Persistent Settings
//!
//! The effect chain treats the store as a write-through target: values are
//! read once at attach time to seed the chain, and every user-driven change
//! writes exactly one key back. The chain never polls the store.
//!
//! # Storage Locations ([`JsonFileStore::open_default`])
//! - Linux: `~/.config/mixfx/settings.json`
//! - Windows: `%APPDATA%\mixfx\mixfx\config\settings.json`
//! - macOS: `~/Library/Application Support/com.mixfx.mixfx/settings.json`

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use mixfx_dsp::DEFAULT_PRESET;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::SettingsError;

/// Keys the effect chain reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Global DSP switch
    EffectsEnabled,
    EqualizerEnabled,
    EqualizerPresetName,
    /// Comma-delimited centi-dB list, see [`encode_band_levels`]
    EqualizerBandLevels,
    AutoHeadroomEnabled,
    PreampDb,
    LoudnessGainMillibels,
    VirtualizerStrength,
    BassStrength,
    LimiterEnabled,
    LimiterPostGainDb,
}

impl SettingKey {
    pub const ALL: [SettingKey; 11] = [
        SettingKey::EffectsEnabled,
        SettingKey::EqualizerEnabled,
        SettingKey::EqualizerPresetName,
        SettingKey::EqualizerBandLevels,
        SettingKey::AutoHeadroomEnabled,
        SettingKey::PreampDb,
        SettingKey::LoudnessGainMillibels,
        SettingKey::VirtualizerStrength,
        SettingKey::BassStrength,
        SettingKey::LimiterEnabled,
        SettingKey::LimiterPostGainDb,
    ];

    /// Stable on-disk name
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::EffectsEnabled => "effects-enabled",
            SettingKey::EqualizerEnabled => "equalizer-enabled",
            SettingKey::EqualizerPresetName => "equalizer-preset-name",
            SettingKey::EqualizerBandLevels => "equalizer-band-levels",
            SettingKey::AutoHeadroomEnabled => "auto-headroom-enabled",
            SettingKey::PreampDb => "preamp-db",
            SettingKey::LoudnessGainMillibels => "loudness-gain-millibels",
            SettingKey::VirtualizerStrength => "virtualizer-strength",
            SettingKey::BassStrength => "bass-strength",
            SettingKey::LimiterEnabled => "limiter-enabled",
            SettingKey::LimiterPostGainDb => "limiter-post-gain-db",
        }
    }
}

/// A typed setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "int",
            SettingValue::Float(_) => "float",
            SettingValue::Text(_) => "string",
        }
    }
}

fn mismatch(key: SettingKey, expected: &'static str, found: &SettingValue) -> SettingsError {
    SettingsError::TypeMismatch {
        key: key.as_str().to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Durable key-value store
pub trait SettingsStore: Send {
    fn get(&self, key: SettingKey) -> Option<SettingValue>;

    fn put(&mut self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError>;

    fn get_bool(&self, key: SettingKey) -> Result<Option<bool>, SettingsError> {
        match self.get(key) {
            None => Ok(None),
            Some(SettingValue::Bool(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "bool", &other)),
        }
    }

    fn get_i32(&self, key: SettingKey) -> Result<Option<i32>, SettingsError> {
        match self.get(key) {
            None => Ok(None),
            Some(SettingValue::Int(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "int", &other)),
        }
    }

    /// Integers are widened, since JSON does not keep `3.0` apart from `3`
    fn get_f32(&self, key: SettingKey) -> Result<Option<f32>, SettingsError> {
        match self.get(key) {
            None => Ok(None),
            Some(SettingValue::Float(v)) => Ok(Some(v)),
            Some(SettingValue::Int(v)) => Ok(Some(v as f32)),
            Some(other) => Err(mismatch(key, "float", &other)),
        }
    }

    fn get_string(&self, key: SettingKey) -> Result<Option<String>, SettingsError> {
        match self.get(key) {
            None => Ok(None),
            Some(SettingValue::Text(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "string", &other)),
        }
    }
}

/// Volatile store, for tests and for hosts without durable storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<SettingKey, SettingValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values.get(&key).cloned()
    }

    fn put(&mut self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError> {
        self.values.insert(key, value);
        Ok(())
    }
}

/// On-disk document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    values: BTreeMap<String, SettingValue>,
}

/// JSON file store, rewritten on every put
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: SettingsDocument,
}

impl JsonFileStore {
    /// Open a store at `path`. A missing file is an empty store; a malformed
    /// one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let document = if path.exists() {
            let file = fs::File::open(&path)?;
            let document = serde_json::from_reader(file)?;
            info!("Settings loaded from {:?}", path);
            document
        } else {
            SettingsDocument::default()
        };

        Ok(Self { path, document })
    }

    /// Open the store at the platform config location
    pub fn open_default() -> Result<Self, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        Self::open(path)
    }

    /// Open a store, starting empty when the file is missing or corrupt
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to load settings from {:?}: {}", path, e);
                info!("Using default settings");
                Self {
                    path,
                    document: SettingsDocument::default(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last successful write
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.document.updated_at
    }

    /// Get the platform-specific configuration file path
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "mixfx", "mixfx")
            .map(|proj| proj.config_dir().join("settings.json"))
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &self.document)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.document.values.get(key.as_str()).cloned()
    }

    fn put(&mut self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError> {
        self.document.values.insert(key.as_str().to_string(), value);
        self.document.updated_at = Some(Utc::now());
        self.save()
    }
}

/// Serialize band levels as comma-delimited text
pub fn encode_band_levels(levels: &[i16]) -> String {
    levels
        .iter()
        .map(|level| level.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-delimited band list
///
/// Accepts integer or decimal entries (rounded, saturated to `i16`).
/// Returns `None` when any entry is not a finite number.
pub fn decode_band_levels(text: &str) -> Option<Vec<i16>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Vec::new());
    }

    text.split(',')
        .map(|part| {
            let value: f32 = part.trim().parse().ok()?;
            if !value.is_finite() {
                return None;
            }
            Some(value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        })
        .collect()
}

/// Everything the chain seeds itself with at attach time
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSettings {
    /// `None` means the configured default applies
    pub effects_enabled: Option<bool>,
    pub equalizer_enabled: bool,
    pub preset_name: String,
    /// `None` when never saved or unreadable
    pub band_levels: Option<Vec<i16>>,
    pub auto_headroom: bool,
    pub preamp_db: f32,
    pub loudness_gain_mb: i32,
    pub virtualizer_strength: f32,
    pub bass_strength: i32,
    pub limiter_enabled: bool,
    pub limiter_post_gain_db: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            effects_enabled: None,
            equalizer_enabled: true,
            preset_name: DEFAULT_PRESET.to_string(),
            band_levels: None,
            auto_headroom: false,
            preamp_db: 0.0,
            loudness_gain_mb: 0,
            virtualizer_strength: 0.0,
            bass_strength: 0,
            limiter_enabled: true,
            limiter_post_gain_db: 0.0,
        }
    }
}

/// Unwrap a typed read, logging and dropping mistyped values
fn read<T>(result: Result<Option<T>, SettingsError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("Ignoring stored setting: {}", e);
        None
    })
}

impl EffectSettings {
    /// Read every key once, falling back to defaults
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();

        let band_levels = read(store.get_string(SettingKey::EqualizerBandLevels)).and_then(|text| {
            let decoded = decode_band_levels(&text);
            if decoded.is_none() {
                warn!("Ignoring malformed band list {:?}", text);
            }
            decoded
        });

        Self {
            effects_enabled: read(store.get_bool(SettingKey::EffectsEnabled)),
            equalizer_enabled: read(store.get_bool(SettingKey::EqualizerEnabled))
                .unwrap_or(defaults.equalizer_enabled),
            preset_name: read(store.get_string(SettingKey::EqualizerPresetName))
                .unwrap_or(defaults.preset_name),
            band_levels,
            auto_headroom: read(store.get_bool(SettingKey::AutoHeadroomEnabled))
                .unwrap_or(defaults.auto_headroom),
            preamp_db: read(store.get_f32(SettingKey::PreampDb)).unwrap_or(defaults.preamp_db),
            loudness_gain_mb: read(store.get_i32(SettingKey::LoudnessGainMillibels))
                .unwrap_or(defaults.loudness_gain_mb),
            virtualizer_strength: read(store.get_f32(SettingKey::VirtualizerStrength))
                .unwrap_or(defaults.virtualizer_strength),
            bass_strength: read(store.get_i32(SettingKey::BassStrength))
                .unwrap_or(defaults.bass_strength),
            limiter_enabled: read(store.get_bool(SettingKey::LimiterEnabled))
                .unwrap_or(defaults.limiter_enabled),
            limiter_post_gain_db: read(store.get_f32(SettingKey::LimiterPostGainDb))
                .unwrap_or(defaults.limiter_post_gain_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_names_are_unique() {
        for (i, key) in SettingKey::ALL.iter().enumerate() {
            for other in &SettingKey::ALL[i + 1..] {
                assert_ne!(key.as_str(), other.as_str());
            }
        }
        assert_eq!(SettingKey::EqualizerBandLevels.as_str(), "equalizer-band-levels");
    }

    #[test]
    fn test_band_level_codec() {
        assert_eq!(encode_band_levels(&[-150, 0, 350]), "-150,0,350");
        assert_eq!(decode_band_levels("-150, 0,350"), Some(vec![-150, 0, 350]));
        assert_eq!(decode_band_levels("200.4,-99.6"), Some(vec![200, -100]));
        assert_eq!(decode_band_levels(""), Some(vec![]));
        assert_eq!(decode_band_levels("1,abc,3"), None);
        assert_eq!(decode_band_levels("1,,3"), None);
        assert_eq!(decode_band_levels("NaN"), None);
    }

    #[test]
    fn test_typed_getters() {
        let mut store = MemoryStore::new();
        store.put(SettingKey::PreampDb, SettingValue::Int(-3)).unwrap();
        store.put(SettingKey::AutoHeadroomEnabled, SettingValue::Float(1.0)).unwrap();

        assert_eq!(store.get_f32(SettingKey::PreampDb).unwrap(), Some(-3.0));
        assert!(store.get_bool(SettingKey::AutoHeadroomEnabled).is_err());
        assert_eq!(store.get_string(SettingKey::EqualizerPresetName).unwrap(), None);
    }

    #[test]
    fn test_effect_settings_defaults() {
        let settings = EffectSettings::load(&MemoryStore::new());
        assert_eq!(settings, EffectSettings::default());
        assert_eq!(settings.preset_name, "Flat");
        assert!(settings.band_levels.is_none());
    }

    #[test]
    fn test_effect_settings_ignores_bad_values() {
        let mut store = MemoryStore::new();
        store
            .put(SettingKey::EqualizerBandLevels, SettingValue::Text("1,x".into()))
            .unwrap();
        store.put(SettingKey::BassStrength, SettingValue::Text("loud".into())).unwrap();
        store.put(SettingKey::EqualizerEnabled, SettingValue::Bool(false)).unwrap();

        let settings = EffectSettings::load(&store);
        assert!(settings.band_levels.is_none());
        assert_eq!(settings.bass_strength, 0);
        assert!(!settings.equalizer_enabled);
    }

    #[test]
    fn test_json_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.updated_at().is_none());
        store
            .put(SettingKey::EqualizerPresetName, SettingValue::Text("Vocal".into()))
            .unwrap();
        store.put(SettingKey::PreampDb, SettingValue::Float(-3.5)).unwrap();
        store
            .put(SettingKey::LoudnessGainMillibels, SettingValue::Int(600))
            .unwrap();
        assert!(store.updated_at().is_some());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_string(SettingKey::EqualizerPresetName).unwrap(),
            Some("Vocal".to_string())
        );
        assert_eq!(reopened.get_f32(SettingKey::PreampDb).unwrap(), Some(-3.5));
        assert_eq!(reopened.get_i32(SettingKey::LoudnessGainMillibels).unwrap(), Some(600));
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(SettingsError::Serialization(_))
        ));

        let store = JsonFileStore::open_or_empty(&path);
        assert!(store.get(SettingKey::PreampDb).is_none());
    }

    #[test]
    fn test_json_document_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store
            .put(SettingKey::EqualizerBandLevels, SettingValue::Text("0,100".into()))
            .unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["values"]["equalizer-band-levels"], "0,100");
        assert!(raw["updated_at"].is_string());
    }
}
