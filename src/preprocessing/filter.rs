//! Second-order IIR filters
//!
//! RBJ cookbook high-pass and low-pass sections, run in Direct Form II
//! transposed. The offline pipeline uses them to isolate the vocal band
//! before the range scan and the kick/bass band before tempo detection.
//!
//! # Reference
//!
//! Bristow-Johnson, R. Cookbook formulae for audio EQ biquad filter coefficients.

use crate::error::AnalysisError;

/// Quality factor used by the band-limiting chains
pub const DEFAULT_Q: f32 = 0.7;

/// Biquad response type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Attenuate below the corner frequency
    HighPass,
    /// Attenuate above the corner frequency
    LowPass,
}

/// Single biquad section
#[derive(Debug, Clone)]
pub struct Biquad {
    // Direct Form II transposed only needs two state variables
    s1: f32,
    s2: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// Design a high-pass or low-pass section
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the corner frequency is not
    /// strictly between 0 and Nyquist or `q` is not positive.
    pub fn new(kind: FilterKind, corner_hz: f32, q: f32, sample_rate: u32) -> Result<Self, AnalysisError> {
        let nyquist = sample_rate as f32 / 2.0;
        if !(corner_hz > 0.0 && corner_hz < nyquist) {
            return Err(AnalysisError::InvalidInput(format!(
                "Filter corner {:.1} Hz outside (0, {:.1}) Hz",
                corner_hz, nyquist
            )));
        }
        if q <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!("Filter Q must be > 0, got {}", q)));
        }

        let w0 = 2.0 * std::f32::consts::PI * corner_hz / sample_rate as f32;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
            FilterKind::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Ok(Self {
            s1: 0.0,
            s2: 0.0,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        })
    }

    /// Filter one sample
    pub fn process(&mut self, sample: f32) -> f32 {
        let output = self.b0 * sample + self.s1;
        self.s1 = self.b1 * sample + self.s2 - self.a1 * output;
        self.s2 = self.b2 * sample - self.a2 * output;
        output
    }

    /// Clear the filter state
    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// High-pass followed by low-pass over a whole signal
///
/// Returns a new buffer; the input is left untouched.
///
/// # Arguments
///
/// * `samples` - Mono input
/// * `sample_rate` - Sample rate in Hz
/// * `band` - (high-pass corner, low-pass corner) in Hz
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if either corner is invalid for the sample rate.
pub fn band_limit(samples: &[f32], sample_rate: u32, band: (f32, f32)) -> Result<Vec<f32>, AnalysisError> {
    log::debug!(
        "Band-limiting {} samples to {:.0}-{:.0} Hz",
        samples.len(),
        band.0,
        band.1
    );
    let mut high_pass = Biquad::new(FilterKind::HighPass, band.0, DEFAULT_Q, sample_rate)?;
    let mut low_pass = Biquad::new(FilterKind::LowPass, band.1, DEFAULT_Q, sample_rate)?;

    Ok(samples
        .iter()
        .map(|&s| low_pass.process(high_pass.process(s)))
        .collect())
}
