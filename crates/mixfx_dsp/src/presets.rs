//! Built-in EQ Presets
//!
//! Every preset is a 10-value curve in centi-decibels, one gain per
//! canonical frequency bucket (see [`crate::bands`]). Devices with a
//! different band layout get the curve through [`crate::quantize`].

/// Number of values in every preset curve
pub const PRESET_BANDS: usize = 10;

/// Name of the preset used for resets and unknown names
pub const DEFAULT_PRESET: &str = "Flat";

/// Canonical 10-band gain curve in centi-decibels
pub type PresetCurve = [i16; PRESET_BANDS];

/// Named EQ preset
pub type Preset = (&'static str, PresetCurve);

/// List of built-in presets. The first entry is the fallback.
pub const PRESETS: &[Preset] = &[
    ("Flat", [0; PRESET_BANDS]),
    ("BassBoost", [600, 500, 300, 100, 0, 0, 0, 0, 0, 0]),
    ("Treble", [0, 0, 0, 0, 0, 100, 300, 500, 600, 600]),
    ("Vocal", [-150, -100, 0, 200, 350, 350, 200, 0, -100, -150]),
    ("Gaming", [-200, -100, 0, 200, 400, 600, 400, 200, 0, -200]), // Emphasize footsteps
];

/// Look up a preset by exact name
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|(preset_name, _)| *preset_name == name)
}

/// Resolve a preset name to its curve, falling back to `Flat`
pub fn preset_curve(name: &str) -> &'static PresetCurve {
    match find_preset(name) {
        Some((_, curve)) => curve,
        None => &PRESETS[0].1,
    }
}

/// Names of all built-in presets, in display order
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_is_first_and_zero() {
        assert_eq!(PRESETS[0].0, DEFAULT_PRESET);
        assert_eq!(PRESETS[0].1, [0; PRESET_BANDS]);
    }

    #[test]
    fn test_vocal_curve() {
        assert_eq!(
            preset_curve("Vocal"),
            &[-150, -100, 0, 200, 350, 350, 200, 0, -100, -150]
        );
    }

    #[test]
    fn test_unknown_name_falls_back_to_flat() {
        assert!(find_preset("Disco").is_none());
        assert_eq!(preset_curve("Disco"), &[0; PRESET_BANDS]);
        // Lookup is case sensitive
        assert_eq!(preset_curve("vocal"), &[0; PRESET_BANDS]);
    }

    #[test]
    fn test_names_are_unique() {
        let names: Vec<_> = preset_names().collect();
        for (i, name) in names.iter().enumerate() {
            assert!(!names[i + 1..].contains(name), "duplicate preset {}", name);
        }
        assert_eq!(names.len(), 5);
    }
}
