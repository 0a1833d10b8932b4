//! Goertzel spectral chroma
//!
//! For every analysis frame, probes the exact equal-tempered frequency of each
//! pitch class in a range of octaves with the Goertzel recurrence and adds the
//! magnitude to that pitch class's bin. A sparse set of 48 targets is cheaper
//! than a full FFT per frame and needs no bin-to-pitch mapping.
//!
//! # Algorithm
//!
//! For target angular frequency `w = 2*pi*f/fs`:
//!
//! ```text
//! s[n] = x[n] + 2*cos(w)*s[n-1] - s[n-2]
//! re   = s[N-1] - s[N-2]*cos(w)
//! im   = s[N-2]*sin(w)
//! |X|  = sqrt(re^2 + im^2)
//! ```
//!
//! Targets use the exact frequency (non-integer bin index).

use super::{Chroma, ChromaAccumulator};
use crate::error::AnalysisError;
use crate::features::note::frequency_from_midi;

#[derive(Debug, Clone, Copy)]
struct Target {
    pitch_class: usize,
    coeff: f64,
    cos_w: f64,
    sin_w: f64,
}

/// Goertzel chroma accumulator over fixed-size frames
#[derive(Debug, Clone)]
pub struct GoertzelChroma {
    targets: Vec<Target>,
    bins: [f64; 12],
    frames: usize,
}

impl GoertzelChroma {
    /// Build the target table for a sample rate and inclusive octave range
    ///
    /// Octave numbers are scientific (C4 = middle C); targets at or above
    /// Nyquist are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the sample rate is zero, the
    /// octave range is reversed, or no target lies below Nyquist.
    pub fn new(sample_rate: u32, octaves: (i32, i32)) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        if octaves.0 > octaves.1 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid octave range: [{}, {}]",
                octaves.0, octaves.1
            )));
        }

        let nyquist = sample_rate as f64 / 2.0;
        let mut targets = Vec::new();
        for octave in octaves.0..=octaves.1 {
            for pitch_class in 0..12 {
                let midi = (octave + 1) * 12 + pitch_class as i32;
                let frequency = frequency_from_midi(midi);
                if frequency >= nyquist {
                    continue;
                }
                let w = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
                targets.push(Target {
                    pitch_class,
                    coeff: 2.0 * w.cos(),
                    cos_w: w.cos(),
                    sin_w: w.sin(),
                });
            }
        }

        if targets.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "No chroma targets below Nyquist for octaves [{}, {}] at {} Hz",
                octaves.0, octaves.1, sample_rate
            )));
        }

        log::debug!(
            "Goertzel chroma: {} targets, octaves {}..={}",
            targets.len(),
            octaves.0,
            octaves.1
        );

        Ok(Self {
            targets,
            bins: [0.0; 12],
            frames: 0,
        })
    }

    /// Number of probed frequencies
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

fn goertzel_magnitude(frame: &[f32], target: &Target) -> f64 {
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    for &x in frame {
        let s = x as f64 + target.coeff * s1 - s2;
        s2 = s1;
        s1 = s;
    }
    let re = s1 - s2 * target.cos_w;
    let im = s2 * target.sin_w;
    (re * re + im * im).sqrt()
}

impl ChromaAccumulator for GoertzelChroma {
    type Frame = [f32];

    fn accumulate(&mut self, frame: &[f32]) {
        if frame.is_empty() {
            return;
        }
        for target in &self.targets {
            self.bins[target.pitch_class] += goertzel_magnitude(frame, target);
        }
        self.frames += 1;
    }

    fn chroma(&self) -> Chroma {
        let mut out = [0.0f32; 12];
        for (o, &b) in out.iter_mut().zip(self.bins.iter()) {
            *o = b as f32;
        }
        Chroma(out)
    }

    fn observations(&self) -> usize {
        self.frames
    }

    fn reset(&mut self) {
        self.bins = [0.0; 12];
        self.frames = 0;
    }
}
