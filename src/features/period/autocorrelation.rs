//! Onset envelope autocorrelation
//!
//! Finds periodicity in the onset envelope. The raw autocorrelation is
//! computed with FFT acceleration, `ACF = IFFT(|FFT(signal)|²)`, then divided
//! by the number of overlapping terms so that long lags are not penalised:
//!
//! `corr[lag] = Σ e[i]·e[i+lag] / (n - lag)`
//!
//! # Example
//!
//! ```
//! use tessitura_dsp::features::period::autocorrelation::envelope_autocorrelation;
//!
//! let envelope = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
//! let corr = envelope_autocorrelation(&envelope, 3);
//! assert!(corr[2] > corr[1]);
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Overlap-normalised autocorrelation for lags `0..=max_lag`
///
/// # Arguments
///
/// * `envelope` - Onset envelope (one value per frame)
/// * `max_lag` - Largest lag computed; clamped to `envelope.len() - 1`
///
/// # Returns
///
/// Correlation values indexed by lag. Empty if the envelope is empty.
pub fn envelope_autocorrelation(envelope: &[f32], max_lag: usize) -> Vec<f32> {
    let n = envelope.len();
    if n == 0 {
        return vec![];
    }
    let max_lag = max_lag.min(n - 1);

    // Zero-pad to avoid circular wrap-around
    let fft_size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f32>> = envelope.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(fft_size).process(&mut buffer);
    for x in buffer.iter_mut() {
        *x = *x * x.conj();
    }
    planner.plan_fft_inverse(fft_size).process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..=max_lag]
        .iter()
        .enumerate()
        .map(|(lag, x)| (x.re * scale).max(0.0) / (n - lag) as f32)
        .collect()
}
