//! Time-domain autocorrelation pitch estimator
//!
//! # Algorithm
//!
//! 1. RMS gate: windows below the silence threshold are unvoiced
//! 2. Trim the window to start and end near a quiet sample (threshold 0.2)
//! 3. Unnormalized autocorrelation `c[i] = sum_j buf[j] * buf[j + i]`
//! 4. Skip the initial downward slope from lag 0, then take the argmax lag
//! 5. Parabolic interpolation around the argmax for a sub-sample period
//!
//! The correlation is computed directly, which is O(n^2) in the window
//! length. Use it on live windows (2048 samples or less) only.

use super::{PitchEstimate, PitchEstimator};
use crate::preprocessing::level::rms;

const EPSILON: f64 = 1e-10;

/// Amplitude below which a sample counts as a quiet trim boundary
const TRIM_THRESHOLD: f32 = 0.2;

/// Autocorrelation pitch estimator
#[derive(Debug, Clone)]
pub struct AutocorrelationEstimator {
    silence_rms: f32,
    // Reused between calls to avoid per-frame allocation
    correlation: Vec<f64>,
}

impl AutocorrelationEstimator {
    /// Create an estimator that treats windows with RMS below `silence_rms` as unvoiced
    pub fn new(silence_rms: f32) -> Self {
        Self {
            silence_rms,
            correlation: Vec::new(),
        }
    }
}

impl Default for AutocorrelationEstimator {
    fn default() -> Self {
        Self::new(0.001)
    }
}

/// Trim bounds: first quiet sample in the leading half, last quiet sample in
/// the trailing half
fn trim_bounds(window: &[f32]) -> (usize, usize) {
    let n = window.len();
    let half = n / 2;

    let start = (0..half)
        .find(|&i| window[i].abs() < TRIM_THRESHOLD)
        .unwrap_or(0);
    let end = (1..half)
        .find(|&i| window[n - i].abs() < TRIM_THRESHOLD)
        .map(|i| n - i)
        .unwrap_or(n - 1);

    (start, end)
}

impl PitchEstimator for AutocorrelationEstimator {
    fn estimate(&mut self, window: &[f32], sample_rate: u32) -> PitchEstimate {
        if window.len() < 4 || sample_rate == 0 {
            return PitchEstimate::unvoiced();
        }
        if rms(window) < self.silence_rms {
            return PitchEstimate::unvoiced();
        }

        let (start, end) = trim_bounds(window);
        if end <= start + 3 {
            return PitchEstimate::unvoiced();
        }
        let buf = &window[start..end];
        let size = buf.len();

        self.correlation.clear();
        self.correlation.resize(size, 0.0);
        for lag in 0..size {
            let mut sum = 0.0f64;
            for j in 0..size - lag {
                sum += buf[j] as f64 * buf[j + lag] as f64;
            }
            self.correlation[lag] = sum;
        }
        let c = &self.correlation;

        if c[0] < EPSILON {
            return PitchEstimate::unvoiced();
        }

        // Walk down the lag-0 lobe
        let mut d = 0;
        while d + 1 < size && c[d] > c[d + 1] {
            d += 1;
        }

        let mut best_lag = 0usize;
        let mut best_value = f64::NEG_INFINITY;
        for (lag, &value) in c.iter().enumerate().skip(d) {
            if value > best_value {
                best_value = value;
                best_lag = lag;
            }
        }

        if best_lag == 0 || best_value <= 0.0 {
            return PitchEstimate::unvoiced();
        }

        let mut period = best_lag as f64;
        if best_lag + 1 < size {
            let x1 = c[best_lag - 1];
            let x2 = c[best_lag];
            let x3 = c[best_lag + 1];
            let a = (x1 + x3 - 2.0 * x2) / 2.0;
            let b = (x3 - x1) / 2.0;
            if a.abs() > EPSILON {
                period -= b / (2.0 * a);
            }
        }

        if period <= 0.0 || !period.is_finite() {
            return PitchEstimate::unvoiced();
        }

        let confidence = best_value / c[0];
        PitchEstimate::voiced(sample_rate as f64 / period, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, amplitude: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_sine_220() {
        let mut estimator = AutocorrelationEstimator::default();
        let window = sine(220.0, 0.5, 2048, 44100);
        let f = estimator.estimate(&window, 44100).frequency_hz.unwrap();
        assert!((f - 220.0).abs() / 220.0 < 0.01, "estimated {:.2} Hz", f);
    }

    #[test]
    fn test_sine_low_voice() {
        let mut estimator = AutocorrelationEstimator::default();
        let window = sine(110.0, 0.5, 2048, 44100);
        let f = estimator.estimate(&window, 44100).frequency_hz.unwrap();
        assert!((f - 110.0).abs() / 110.0 < 0.02, "estimated {:.2} Hz", f);
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let mut estimator = AutocorrelationEstimator::default();
        assert!(!estimator.estimate(&[0.0; 2048], 44100).is_voiced());

        // Below the RMS gate
        let quiet = sine(220.0, 0.0005, 2048, 44100);
        assert!(!estimator.estimate(&quiet, 44100).is_voiced());
    }

    #[test]
    fn test_trim_bounds() {
        let window = [0.9, 0.1, 0.5, 0.5, 0.5, 0.05, 0.9, 0.9];
        assert_eq!(trim_bounds(&window), (1, 5));
    }
}
