//! Energy flux onset envelope
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute RMS energy per frame
//! 3. Compute energy derivative (flux): `E_flux[n] = max(0, E[n] - E[n-1])`,
//!    with `E[-1] = 0`
//! 4. Normalize the envelope by its maximum
//!
//! The result is one onset-strength value per frame in [0, 1], the input of
//! tempo autocorrelation.
//!
//! # Example
//!
//! ```
//! use tessitura_dsp::features::onset::energy_flux::onset_envelope;
//!
//! let samples = vec![0.0f32; 44100 * 3];
//! let envelope = onset_envelope(&samples, 1024, 512)?;
//! assert!(envelope.iter().all(|&v| v == 0.0));
//! # Ok::<(), tessitura_dsp::AnalysisError>(())
//! ```

use crate::error::AnalysisError;
use crate::io::sample_buffer::windows;
use crate::preprocessing::level::rms;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Incremental energy flux envelope
///
/// Frames are pushed one at a time so a caller can interleave checkpoints;
/// [`EnergyFluxEnvelope::finish`] normalizes the collected envelope.
#[derive(Debug, Clone, Default)]
pub struct EnergyFluxEnvelope {
    previous_energy: f32,
    flux: Vec<f32>,
}

impl EnergyFluxEnvelope {
    /// Empty envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty envelope with room for `frames` values
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            previous_energy: 0.0,
            flux: Vec::with_capacity(frames),
        }
    }

    /// Add one analysis frame
    pub fn push(&mut self, frame: &[f32]) {
        let energy = rms(frame);
        self.flux.push((energy - self.previous_energy).max(0.0));
        self.previous_energy = energy;
    }

    /// Frames pushed so far
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    /// True if no frame was pushed
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// Normalized envelope (max = 1.0, or all zeros for silence)
    pub fn finish(mut self) -> Vec<f32> {
        let max_flux = self.flux.iter().copied().fold(0.0f32, f32::max);
        if max_flux > EPSILON {
            for v in self.flux.iter_mut() {
                *v /= max_flux;
            }
        } else {
            log::debug!("All energy flux values are zero; envelope is flat");
        }
        self.flux
    }
}

/// Compute the normalized energy flux envelope of a whole signal
///
/// # Arguments
///
/// * `samples` - Audio samples (mono)
/// * `frame_size` - Frame size (typically 1024)
/// * `hop_size` - Hop size between frames (typically 512)
///
/// # Returns
///
/// One value per full frame; empty if the signal is shorter than one frame
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is zero
pub fn onset_envelope(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 {
        return Err(AnalysisError::InvalidInput("Frame size must be > 0".to_string()));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput("Hop size must be > 0".to_string()));
    }

    log::debug!(
        "Computing energy flux envelope: {} samples, frame={}, hop={}",
        samples.len(),
        frame_size,
        hop_size
    );

    let frames = windows(samples, frame_size, hop_size);
    let mut envelope = EnergyFluxEnvelope::with_capacity(frames.count_total());
    for (_, frame) in frames {
        envelope.push(frame);
    }
    Ok(envelope.finish())
}
