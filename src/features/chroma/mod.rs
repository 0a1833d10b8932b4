//! Chroma accumulation
//!
//! Two strategies build the same 12-bin pitch-class vector:
//! - [`histogram::PitchHistogram`]: one count per detected pitch, with
//!   optional exponential forgetting for live use
//! - [`goertzel::GoertzelChroma`]: single-frequency energy per pitch class and
//!   octave, summed across octaves; robust on full mixes
//!
//! Both implement [`ChromaAccumulator`]; key estimation only sees the
//! resulting [`Chroma`].

pub mod goertzel;
pub mod histogram;
pub mod normalization;

pub use goertzel::GoertzelChroma;
pub use histogram::PitchHistogram;

use serde::{Deserialize, Serialize};

/// 12-bin pitch-class energy vector, index 0 = C .. 11 = B
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Chroma(pub [f32; 12]);

impl Chroma {
    /// All-zero chroma
    pub fn zeros() -> Self {
        Self([0.0; 12])
    }

    /// Bin values
    pub fn values(&self) -> &[f32; 12] {
        &self.0
    }

    /// Largest bin value
    pub fn max(&self) -> f32 {
        self.0.iter().copied().fold(0.0f32, f32::max)
    }

    /// True if no energy was observed
    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|&v| v <= 0.0)
    }

    /// Rotate so that bin `k` of the result is bin `k - semitones` of `self`
    ///
    /// Rotating a C-rooted pattern by 2 yields the D-rooted pattern.
    pub fn rotated(&self, semitones: usize) -> Self {
        let mut out = [0.0f32; 12];
        for (i, &v) in self.0.iter().enumerate() {
            out[(i + semitones) % 12] = v;
        }
        Self(out)
    }
}

/// Common interface of the chroma strategies
pub trait ChromaAccumulator {
    /// Unit of input: a detected frequency or a block of samples
    type Frame: ?Sized;

    /// Add one frame of evidence
    fn accumulate(&mut self, frame: &Self::Frame);

    /// Accumulated (unnormalized) chroma
    fn chroma(&self) -> Chroma;

    /// Number of frames that contributed
    fn observations(&self) -> usize;

    /// Return to the freshly constructed state
    fn reset(&mut self);
}
