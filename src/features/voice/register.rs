//! Live register classification

use super::{Register, RegisterProfile};

/// Frequencies below this are treated as silence
pub const MIN_REGISTER_FREQUENCY_HZ: f64 = 50.0;

/// Upper bounds of the chest and mixed registers for a profile
fn thresholds(profile: RegisterProfile) -> (f64, f64) {
    match profile {
        RegisterProfile::Male => (330.0, 440.0),
        RegisterProfile::Female => (440.0, 587.0),
    }
}

/// Classify the register of a detected pitch
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::voice::{classify_register, Register, RegisterProfile};
///
/// assert_eq!(classify_register(Some(220.0), RegisterProfile::Male), Register::Chest);
/// assert_eq!(classify_register(Some(500.0), RegisterProfile::Female), Register::Mixed);
/// assert_eq!(classify_register(None, RegisterProfile::Male), Register::Silence);
/// ```
pub fn classify_register(frequency_hz: Option<f64>, profile: RegisterProfile) -> Register {
    let Some(f) = frequency_hz else {
        return Register::Silence;
    };
    if !f.is_finite() || f < MIN_REGISTER_FREQUENCY_HZ {
        return Register::Silence;
    }

    let (chest_max, mixed_max) = thresholds(profile);
    if f < chest_max {
        Register::Chest
    } else if f < mixed_max {
        Register::Mixed
    } else {
        Register::Head
    }
}
