//! Band Layout and Level Range
//!
//! Devices expose their own band count and center frequencies. Presets are
//! authored against a fixed 10-bucket partition of the audible range; this
//! module maps arbitrary band centers onto that partition and clamps levels
//! into the range a device accepts.

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::presets::PRESET_BANDS;

/// Reference band centers (Hz) - ISO octave centers, one per bucket
pub const CANONICAL_CENTERS_HZ: [f32; PRESET_BANDS] = [
    31.0,    // Sub-bass
    62.0,    // Bass
    125.0,   // Low-mid
    250.0,   // Mid
    500.0,   // Mid
    1000.0,  // Upper-mid
    2000.0,  // Presence
    4000.0,  // Brilliance
    8000.0,  // High
    16000.0, // Air
];

/// Inclusive upper bounds (Hz) of the first nine buckets.
/// The tenth bucket is unbounded.
pub const BUCKET_UPPER_BOUNDS_HZ: [f32; PRESET_BANDS - 1] = [
    45.0, 90.0, 180.0, 355.0, 710.0, 1400.0, 2800.0, 5600.0, 11000.0,
];

/// Map a band center frequency to its preset bucket (0-9)
///
/// Returns the first bucket whose upper bound is >= `freq_hz`. Total over
/// all inputs: negative values land in bucket 0, `+inf` and `NaN` in the
/// last bucket.
pub fn quantize(freq_hz: f32) -> usize {
    BUCKET_UPPER_BOUNDS_HZ
        .iter()
        .position(|&upper| freq_hz <= upper)
        .unwrap_or(PRESET_BANDS - 1)
}

/// Closed level range shared by all bands of an equalizer, in centi-dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandLevelRange {
    pub min: i16,
    pub max: i16,
}

impl BandLevelRange {
    /// Create a range, rejecting `min > max`
    pub fn new(min: i16, max: i16) -> Result<Self, DspError> {
        if min > max {
            return Err(DspError::InvalidLevelRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Clamp a requested level into the range
    #[inline]
    pub fn clamp(&self, level: i32) -> i16 {
        level.clamp(self.min as i32, self.max as i32) as i16
    }

    pub fn contains(&self, level: i16) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

impl Default for BandLevelRange {
    /// +/-15 dB, used when a device cannot report its own range
    fn default() -> Self {
        Self {
            min: -1500,
            max: 1500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(quantize(45.0), 0);
        assert_eq!(quantize(46.0), 1);
        assert_eq!(quantize(90.0), 1);
        assert_eq!(quantize(11000.0), 8);
        assert_eq!(quantize(11000.5), 9);
    }

    #[test]
    fn test_canonical_centers_map_to_own_bucket() {
        for (i, &center) in CANONICAL_CENTERS_HZ.iter().enumerate() {
            assert_eq!(quantize(center), i, "center {} Hz", center);
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(-20.0), 0);
        assert_eq!(quantize(f32::INFINITY), 9);
        assert_eq!(quantize(f32::NAN), 9);
    }

    #[test]
    fn test_five_band_device_layout() {
        // Typical 5-band hardware: 60, 230, 910, 3600, 14000 Hz
        let buckets: Vec<_> = [60.0, 230.0, 910.0, 3600.0, 14000.0]
            .iter()
            .map(|&f| quantize(f))
            .collect();
        assert_eq!(buckets, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_range_rejects_inverted() {
        assert!(BandLevelRange::new(100, -100).is_err());
        assert!(BandLevelRange::new(0, 0).is_ok());
    }

    #[test]
    fn test_default_range() {
        let range = BandLevelRange::default();
        assert_eq!(range.clamp(2000), 1500);
        assert_eq!(range.clamp(-2000), -1500);
        assert_eq!(range.clamp(350), 350);
    }

    proptest! {
        #[test]
        fn quantize_is_in_range(f in any::<f32>()) {
            prop_assert!(quantize(f) < PRESET_BANDS);
        }

        #[test]
        fn quantize_is_monotonic(a in 0.0f32..30000.0, b in 0.0f32..30000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(quantize(lo) <= quantize(hi));
        }

        #[test]
        fn clamp_matches_min_max(g in any::<i16>(), lo in -3000i16..0, hi in 0i16..3000) {
            let range = BandLevelRange::new(lo, hi).unwrap();
            prop_assert_eq!(range.clamp(g as i32), lo.max(hi.min(g)));
        }
    }
}
