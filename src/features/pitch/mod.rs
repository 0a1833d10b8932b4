//! Monophonic pitch estimation
//!
//! Two interchangeable estimators behind one narrow interface:
//! - Autocorrelation: fast time-domain estimator for short live windows
//! - YIN: cumulative mean normalized difference, for accurate offline scans
//!
//! Both return [`PitchEstimate`] with `frequency_hz: None` for silent or
//! aperiodic windows. Plausibility bounds (vocal range) are applied by the
//! caller, not by the estimators.

pub mod autocorrelation;
pub mod stabilizer;
pub mod yin;

pub use autocorrelation::AutocorrelationEstimator;
pub use stabilizer::NoteStabilizer;
pub use yin::YinEstimator;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

/// Result of one pitch estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Fundamental frequency, `None` when the window is unvoiced
    pub frequency_hz: Option<f64>,

    /// Periodicity strength (0.0-1.0); 0.0 when unvoiced
    pub confidence: f64,
}

impl PitchEstimate {
    /// Estimate for a silent or aperiodic window
    pub fn unvoiced() -> Self {
        Self {
            frequency_hz: None,
            confidence: 0.0,
        }
    }

    /// Voiced estimate
    pub fn voiced(frequency_hz: f64, confidence: f64) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// True if a frequency was found
    pub fn is_voiced(&self) -> bool {
        self.frequency_hz.is_some()
    }

    /// Frequency if voiced and inside `[min_hz, max_hz]`
    pub fn within(&self, min_hz: f64, max_hz: f64) -> Option<f64> {
        self.frequency_hz.filter(|f| *f >= min_hz && *f <= max_hz)
    }
}

/// Pitch estimator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchAlgorithm {
    /// Normalized autocorrelation (O(n^2), short windows only)
    Autocorrelation,
    /// YIN difference function
    Yin,
}

/// Common interface of the pitch estimators
pub trait PitchEstimator {
    /// Estimate the fundamental frequency of one window
    ///
    /// Never fails: degenerate windows produce [`PitchEstimate::unvoiced`].
    fn estimate(&mut self, window: &[f32], sample_rate: u32) -> PitchEstimate;
}

/// Estimator chosen at session construction
#[derive(Debug)]
pub enum PitchTracker {
    /// Autocorrelation estimator
    Autocorrelation(AutocorrelationEstimator),
    /// YIN estimator
    Yin(YinEstimator),
}

impl PitchTracker {
    /// Build the estimator named by `algorithm` with thresholds from `config`
    pub fn new(algorithm: PitchAlgorithm, config: &AnalysisConfig) -> Self {
        match algorithm {
            PitchAlgorithm::Autocorrelation => {
                PitchTracker::Autocorrelation(AutocorrelationEstimator::new(config.silence_rms))
            }
            PitchAlgorithm::Yin => PitchTracker::Yin(YinEstimator::new(
                config.yin_threshold as f64,
                config.silence_rms,
            )),
        }
    }

    /// Which algorithm this tracker runs
    pub fn algorithm(&self) -> PitchAlgorithm {
        match self {
            PitchTracker::Autocorrelation(_) => PitchAlgorithm::Autocorrelation,
            PitchTracker::Yin(_) => PitchAlgorithm::Yin,
        }
    }
}

impl PitchEstimator for PitchTracker {
    fn estimate(&mut self, window: &[f32], sample_rate: u32) -> PitchEstimate {
        match self {
            PitchTracker::Autocorrelation(estimator) => estimator.estimate(window, sample_rate),
            PitchTracker::Yin(estimator) => estimator.estimate(window, sample_rate),
        }
    }
}
