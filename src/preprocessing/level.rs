//! Signal level measurements and gain
//!
//! RMS drives every silence decision in the engine (pitch gate, live noise
//! gate, adaptive scan threshold), so the measurement lives in one place.

/// Root-mean-square level of a block
///
/// Returns 0.0 for an empty block.
///
/// # Example
///
/// ```
/// use tessitura_dsp::preprocessing::level::rms;
///
/// assert_eq!(rms(&[]), 0.0);
/// assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
/// ```
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Scale samples in place by the input gain multiplier
///
/// A gain of exactly 1.0 is a no-op.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    log::debug!("Applying input gain x{:.2}", gain);
    for s in samples.iter_mut() {
        *s *= gain;
    }
}
