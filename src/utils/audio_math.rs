//! Audio mathematics utilities and conversion functions.
//!
//! Gain is specified in decibels but applied as a linear factor on the
//! decoded samples. These helpers do the conversion for both `f32` and
//! `f64` samples.
//!
//! # Examples
//!
//! ```rust
//! use audio_amplify::utils::audio_math::{amplitude_to_db, db_to_amplitude};
//!
//! let factor = db_to_amplitude(6.0_f64); // ≈ 1.995
//! let db = amplitude_to_db(0.5_f64); // ≈ -6.02 dB
//! ```

use num_traits::Float;

/// Floor returned by [`amplitude_to_db`] for silent or negative input.
pub const SILENCE_DB: f64 = -80.0;

#[inline]
fn constant<F: Float>(value: f64) -> F {
    F::from(value).unwrap_or_else(F::zero)
}

/// Converts linear amplitude to decibels.
///
/// Uses the formula: `dB = 20 * log10(amplitude)` for amplitude ratios.
/// Returns -80 dB for zero or negative amplitudes to avoid infinite values.
///
/// # Examples
///
/// ```rust
/// use audio_amplify::utils::audio_math::amplitude_to_db;
///
/// let db = amplitude_to_db(1.0_f64); // 0.0 dB
/// let db_tenth = amplitude_to_db(0.1_f64); // -20.0 dB
/// ```
pub fn amplitude_to_db<F: Float>(amplitude: F) -> F {
    if amplitude > F::zero() {
        constant::<F>(20.0) * amplitude.log10()
    } else {
        constant::<F>(SILENCE_DB)
    }
}

/// Converts decibels to linear amplitude.
///
/// Uses the formula: `amplitude = 10^(dB / 20)` for amplitude ratios.
///
/// # Examples
///
/// ```rust
/// use audio_amplify::utils::audio_math::db_to_amplitude;
///
/// let unity = db_to_amplitude(0.0_f32); // 1.0
/// let double = db_to_amplitude(6.0206_f64); // ≈ 2.0
/// ```
pub fn db_to_amplitude<F: Float>(db: F) -> F {
    constant::<F>(10.0).powf(db / constant::<F>(20.0))
}

/// Clamps a normalized sample to the `[-1.0, 1.0]` full-scale range.
///
/// NaN collapses to silence; infinities clip to full scale.
pub fn clamp_sample<F: Float>(sample: F) -> F {
    if sample.is_nan() {
        return F::zero();
    }
    sample.max(-F::one()).min(F::one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_db_amplitude_round_trip_points() {
        assert_approx_eq!(db_to_amplitude(0.0_f64), 1.0, 1e-12);
        assert_approx_eq!(db_to_amplitude(20.0_f64), 10.0, 1e-9);
        assert_approx_eq!(db_to_amplitude(-20.0_f64), 0.1, 1e-9);
        assert_approx_eq!(db_to_amplitude(6.0206_f64), 2.0, 1e-4);

        assert_approx_eq!(amplitude_to_db(1.0_f64), 0.0, 1e-12);
        assert_approx_eq!(amplitude_to_db(0.5_f64), -6.0206, 1e-4);
    }

    #[test]
    fn test_amplitude_to_db_floor() {
        assert_eq!(amplitude_to_db(0.0_f64), SILENCE_DB);
        assert_eq!(amplitude_to_db(-1.0_f32), SILENCE_DB as f32);
    }

    #[test]
    fn test_clamp_sample() {
        assert_eq!(clamp_sample(1.5_f32), 1.0);
        assert_eq!(clamp_sample(-3.0_f32), -1.0);
        assert_eq!(clamp_sample(0.25_f64), 0.25);
        assert_eq!(clamp_sample(f32::NAN), 0.0);
        assert_eq!(clamp_sample(f64::INFINITY), 1.0);
    }
}
