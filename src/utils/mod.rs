//! Utility functions for audio processing.
//!
//! # Modules
//!
//! - [`audio_math`] - Decibel/amplitude conversions and sample clamping

pub mod audio_math;

pub use audio_math::{amplitude_to_db, clamp_sample, db_to_amplitude};
