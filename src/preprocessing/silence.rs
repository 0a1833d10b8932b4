//! Noise gating
//!
//! Two flavours: a fixed RMS gate for the live microphone path, and an
//! adaptive threshold for offline scans that has to work on both dry vocals
//! and loud full mixes.

use super::level::rms;

/// Floor of the adaptive scan threshold
const ADAPTIVE_FLOOR: f32 = 0.005;

/// Fraction of the overall buffer RMS used as the adaptive threshold
const ADAPTIVE_RATIO: f32 = 0.1;

/// Fixed RMS noise gate
#[derive(Debug, Clone, Copy)]
pub struct NoiseGate {
    /// Windows at or below this RMS are silent
    pub threshold_rms: f32,
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self { threshold_rms: 0.01 }
    }
}

impl NoiseGate {
    /// Create a gate with the given RMS threshold
    pub fn new(threshold_rms: f32) -> Self {
        Self { threshold_rms }
    }

    /// True if a window with this RMS passes the gate
    pub fn is_open(&self, level_rms: f32) -> bool {
        level_rms > self.threshold_rms
    }

    /// Measure a window and report whether it passes
    pub fn passes(&self, window: &[f32]) -> bool {
        self.is_open(rms(window))
    }
}

/// Adaptive RMS threshold for an offline scan
///
/// `max(0.005, 0.1 * overall_rms)` of the buffer being scanned: quiet dry
/// vocals use the floor, loud mixes scale the gate with their level.
///
/// # Example
///
/// ```
/// use tessitura_dsp::preprocessing::silence::adaptive_threshold;
///
/// assert_eq!(adaptive_threshold(&[0.0; 64]), 0.005);
/// assert!((adaptive_threshold(&[0.5; 64]) - 0.05).abs() < 1e-6);
/// ```
pub fn adaptive_threshold(samples: &[f32]) -> f32 {
    let overall = rms(samples);
    let threshold = (ADAPTIVE_RATIO * overall).max(ADAPTIVE_FLOOR);
    log::debug!(
        "Adaptive scan threshold: {:.4} (overall RMS {:.4})",
        threshold,
        overall
    );
    threshold
}
