//! YIN pitch estimator
//!
//! # Algorithm
//!
//! 1. Difference function `d(tau) = sum_{i < W} (x[i] - x[i + tau])^2` for
//!    `tau` in `[0, W)`, with `W = N / 2`
//! 2. Cumulative mean normalized difference `d'(tau) = d(tau) * tau / sum_{k=1..tau} d(k)`,
//!    `d'(0) = 1`
//! 3. Absolute threshold: first `tau >= 2` with `d'(tau) < threshold`, then
//!    descend to the local minimum
//! 4. Parabolic interpolation around the chosen lag
//!
//! The difference function is expanded as `E0 + E(tau) - 2 r(tau)`, where the
//! energies come from prefix sums of `x^2` and the cross term `r` is computed
//! with an FFT cross-correlation. This keeps long offline scans at
//! O(N log N) per window.
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency
//! estimator for speech and music. *JASA*, 111(4), 1917-1930.

use std::fmt;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::{PitchEstimate, PitchEstimator};
use crate::preprocessing::level::rms;

const EPSILON: f64 = 1e-10;

/// YIN pitch estimator
///
/// Holds an FFT planner and scratch buffers, so one instance should be reused
/// across windows of the same size.
pub struct YinEstimator {
    threshold: f64,
    silence_rms: f32,
    planner: FftPlanner<f64>,
    spectrum_a: Vec<Complex<f64>>,
    spectrum_b: Vec<Complex<f64>>,
    prefix_energy: Vec<f64>,
    cmndf: Vec<f64>,
}

impl fmt::Debug for YinEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YinEstimator")
            .field("threshold", &self.threshold)
            .field("silence_rms", &self.silence_rms)
            .finish()
    }
}

impl Default for YinEstimator {
    fn default() -> Self {
        Self::new(0.15, 0.001)
    }
}

impl YinEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    ///
    /// * `threshold` - Absolute threshold on the normalized difference (standard: 0.15)
    /// * `silence_rms` - Windows with RMS below this are unvoiced without searching
    pub fn new(threshold: f64, silence_rms: f32) -> Self {
        Self {
            threshold,
            silence_rms,
            planner: FftPlanner::new(),
            spectrum_a: Vec::new(),
            spectrum_b: Vec::new(),
            prefix_energy: Vec::new(),
            cmndf: Vec::new(),
        }
    }

    /// Fill `self.cmndf` with the normalized difference function of `window`
    fn compute_cmndf(&mut self, window: &[f32]) {
        let n = window.len();
        let w = n / 2;
        let fft_len = n.next_power_of_two();

        // a = x[0..W], b = x[0..N], both zero-padded
        self.spectrum_a.clear();
        self.spectrum_a.resize(fft_len, Complex::new(0.0, 0.0));
        self.spectrum_b.clear();
        self.spectrum_b.resize(fft_len, Complex::new(0.0, 0.0));
        for (i, &x) in window.iter().enumerate() {
            let x = x as f64;
            if i < w {
                self.spectrum_a[i].re = x;
            }
            self.spectrum_b[i].re = x;
        }

        let forward = self.planner.plan_fft_forward(fft_len);
        forward.process(&mut self.spectrum_a);
        forward.process(&mut self.spectrum_b);

        // r(tau) = IFFT(conj(A) * B)(tau) / L; b[i + tau] never wraps since i + tau < N <= L
        for (a, b) in self.spectrum_a.iter_mut().zip(self.spectrum_b.iter()) {
            *a = a.conj() * *b;
        }
        let inverse = self.planner.plan_fft_inverse(fft_len);
        inverse.process(&mut self.spectrum_a);
        let scale = 1.0 / fft_len as f64;

        self.prefix_energy.clear();
        self.prefix_energy.reserve(n + 1);
        self.prefix_energy.push(0.0);
        let mut acc = 0.0f64;
        for &x in window {
            acc += x as f64 * x as f64;
            self.prefix_energy.push(acc);
        }
        let e0 = self.prefix_energy[w];

        self.cmndf.clear();
        self.cmndf.resize(w, 1.0);
        let mut running_sum = 0.0f64;
        for tau in 1..w {
            let e_tau = self.prefix_energy[tau + w] - self.prefix_energy[tau];
            let r = self.spectrum_a[tau].re * scale;
            let d = (e0 + e_tau - 2.0 * r).max(0.0);

            running_sum += d;
            self.cmndf[tau] = if running_sum > EPSILON {
                d * tau as f64 / running_sum
            } else {
                1.0
            };
        }
    }
}

impl PitchEstimator for YinEstimator {
    fn estimate(&mut self, window: &[f32], sample_rate: u32) -> PitchEstimate {
        if window.len() < 8 || sample_rate == 0 {
            return PitchEstimate::unvoiced();
        }
        if rms(window) < self.silence_rms {
            return PitchEstimate::unvoiced();
        }

        self.compute_cmndf(window);
        let cmndf = &self.cmndf;
        let w = cmndf.len();

        let mut chosen = None;
        let mut tau = 2;
        while tau < w {
            if cmndf[tau] < self.threshold {
                while tau + 1 < w && cmndf[tau + 1] < cmndf[tau] {
                    tau += 1;
                }
                chosen = Some(tau);
                break;
            }
            tau += 1;
        }

        let tau = match chosen {
            Some(tau) => tau,
            None => return PitchEstimate::unvoiced(),
        };

        let mut refined = tau as f64;
        if tau + 1 < w {
            let s0 = cmndf[tau - 1];
            let s1 = cmndf[tau];
            let s2 = cmndf[tau + 1];
            let denom = 2.0 * (2.0 * s1 - s2 - s0);
            if denom.abs() > EPSILON {
                let adjustment = (s2 - s0) / denom;
                if adjustment.abs() < 1.0 {
                    refined += adjustment;
                }
            }
        }

        PitchEstimate::voiced(sample_rate as f64 / refined, 1.0 - cmndf[tau])
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

    /// Direct O(N^2) difference function for cross-checking the FFT path
    fn direct_cmndf(window: &[f32]) -> Vec<f64> {
        let w = window.len() / 2;
        let mut out = vec![1.0; w];
        let mut running = 0.0;
        for tau in 1..w {
            let d: f64 = (0..w)
                .map(|i| {
                    let diff = window[i] as f64 - window[i + tau] as f64;
                    diff * diff
                })
                .sum();
            running += d;
            out[tau] = if running > EPSILON { d * tau as f64 / running } else { 1.0 };
        }
        out
    }

    #[test]
    fn test_sine_220() {
        let mut estimator = YinEstimator::default();
        let window = sine(220.0, 0.5, 2048, 44100);
        let estimate = estimator.estimate(&window, 44100);
        let f = estimate.frequency_hz.unwrap();
        assert!((f - 220.0).abs() / 220.0 < 0.01, "estimated {:.2} Hz", f);
        assert!(estimate.confidence > 0.8);
    }

    #[test]
    fn test_matches_direct_difference_function() {
        let window: Vec<f32> = sine(310.0, 0.4, 512, 44100)
            .iter()
            .zip(sine(620.0, 0.2, 512, 44100))
            .map(|(a, b)| a + b)
            .collect();

        let mut estimator = YinEstimator::default();
        estimator.compute_cmndf(&window);
        let expected = direct_cmndf(&window);

        for (tau, (fast, slow)) in estimator.cmndf.iter().zip(expected.iter()).enumerate() {
            assert!((fast - slow).abs() < 1e-6, "tau {}: {} vs {}", tau, fast, slow);
        }
    }

    #[test]
    fn test_harmonic_rich_tone() {
        // Sawtooth-like tone at 150 Hz: fundamental must win over harmonics
        let sample_rate = 44100;
        let window: Vec<f32> = (0..4096)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (1..=6)
                    .map(|h| (2.0 * std::f64::consts::PI * 150.0 * h as f64 * t).sin() / h as f64)
                    .sum::<f64>() as f32
                    * 0.3
            })
            .collect();

        let mut estimator = YinEstimator::default();
        let f = estimator.estimate(&window, sample_rate).frequency_hz.unwrap();
        assert!((f - 150.0).abs() / 150.0 < 0.01, "estimated {:.2} Hz", f);
    }

    #[test]
    fn test_silence_and_noise() {
        let mut estimator = YinEstimator::default();
        assert!(!estimator.estimate(&[0.0; 2048], 44100).is_voiced());

        // Deterministic white noise has no periodicity below the threshold
        let mut state = 12345u32;
        let noise: Vec<f32> = (0..2048)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
            })
            .collect();
        assert!(!estimator.estimate(&noise, 44100).is_voiced());
    }
}
