//! Headroom / Pre-gain Compensation
//!
//! Boosting an EQ band raises the peak level of the whole mix and can push
//! it into clipping. Auto-headroom attenuates the signal ahead of the EQ by
//! the largest band boost, so the loudest band ends up near unity.
//!
//! # Algorithm
//!
//! ```text
//! pre_gain_db = clamp(-max(0, max_band_gain_centi_db) / 100, -12, 0)
//! ```
//!
//! Cuts never raise the pre-gain and the attenuation bottoms out at -12 dB.

/// Lowest pre-gain, manual or automatic (dB)
pub const PREAMP_MIN_DB: f32 = -12.0;

/// Highest manual pre-gain (dB). Auto-headroom never goes above 0.
pub const PREAMP_MAX_DB: f32 = 6.0;

/// Limiter post-gain range (dB)
pub const POST_GAIN_MIN_DB: f32 = -12.0;
pub const POST_GAIN_MAX_DB: f32 = 12.0;

/// Compute the compensating pre-gain for a set of band gains (centi-dB)
pub fn auto_pre_gain_db(band_gains: &[i16]) -> f32 {
    let max_boost = band_gains.iter().copied().max().unwrap_or(0).max(0);
    (-(max_boost as f32) / 100.0).clamp(PREAMP_MIN_DB, 0.0)
}

/// Clamp a user-chosen pre-gain into `[-12, 6]` dB. `NaN` becomes 0.
pub fn clamp_preamp_db(db: f32) -> f32 {
    clamp_or_zero(db, PREAMP_MIN_DB, PREAMP_MAX_DB)
}

/// Clamp a limiter post-gain into `[-12, 12]` dB. `NaN` becomes 0.
pub fn clamp_post_gain_db(db: f32) -> f32 {
    clamp_or_zero(db, POST_GAIN_MIN_DB, POST_GAIN_MAX_DB)
}

fn clamp_or_zero(db: f32, min: f32, max: f32) -> f32 {
    if db.is_nan() {
        return 0.0;
    }
    db.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cuts_only_give_zero() {
        assert_eq!(auto_pre_gain_db(&[0, -300, -1500]), 0.0);
        assert_eq!(auto_pre_gain_db(&[]), 0.0);
    }

    #[test]
    fn test_boost_is_compensated() {
        assert_eq!(auto_pre_gain_db(&[800, 200, -100]), -8.0);
        assert_eq!(auto_pre_gain_db(&[-150, -100, 0, 200, 350, 350, 200, 0, -100, -150]), -3.5);
    }

    #[test]
    fn test_compensation_bottoms_out() {
        assert_eq!(auto_pre_gain_db(&[2000]), -12.0);
        assert_eq!(auto_pre_gain_db(&[i16::MAX]), -12.0);
    }

    #[test]
    fn test_manual_clamps() {
        assert_eq!(clamp_preamp_db(10.0), 6.0);
        assert_eq!(clamp_preamp_db(-20.0), -12.0);
        assert_eq!(clamp_preamp_db(f32::NAN), 0.0);
        assert_eq!(clamp_post_gain_db(15.0), 12.0);
        assert_eq!(clamp_post_gain_db(-3.5), -3.5);
    }

    proptest! {
        #[test]
        fn auto_pre_gain_stays_in_range(gains in proptest::collection::vec(any::<i16>(), 0..16)) {
            let db = auto_pre_gain_db(&gains);
            prop_assert!((PREAMP_MIN_DB..=0.0).contains(&db));
        }
    }
}
