//! Pitch-class histogram from detected pitches

use super::{Chroma, ChromaAccumulator};
use crate::features::note::note_from_frequency;

/// Histogram of detected pitch classes
///
/// Each voiced frame adds 1.0 to the bin of its nearest note. With a decay
/// below 1.0 every bin is multiplied by the decay before the increment, so
/// recent material dominates (live mode). A decay of 1.0 gives a plain count
/// (offline mode).
#[derive(Debug, Clone, PartialEq)]
pub struct PitchHistogram {
    bins: [f32; 12],
    decay: f32,
    observations: usize,
}

impl PitchHistogram {
    /// Histogram with exponential forgetting (live default: 0.995)
    pub fn with_decay(decay: f32) -> Self {
        Self {
            bins: [0.0; 12],
            decay: decay.clamp(0.0, 1.0),
            observations: 0,
        }
    }

    /// Histogram without forgetting
    pub fn counting() -> Self {
        Self::with_decay(1.0)
    }

    /// Add one detected frequency
    ///
    /// Frequencies that do not map to a note (below 20 Hz) are ignored.
    pub fn add_frequency(&mut self, frequency_hz: f64) {
        let note = match note_from_frequency(frequency_hz) {
            Some(note) => note,
            None => return,
        };
        if self.decay < 1.0 {
            for bin in self.bins.iter_mut() {
                *bin *= self.decay;
            }
        }
        self.bins[note.pitch_class.index()] += 1.0;
        self.observations += 1;
    }
}

impl ChromaAccumulator for PitchHistogram {
    type Frame = f64;

    fn accumulate(&mut self, frequency_hz: &f64) {
        self.add_frequency(*frequency_hz);
    }

    fn chroma(&self) -> Chroma {
        Chroma(self.bins)
    }

    fn observations(&self) -> usize {
        self.observations
    }

    fn reset(&mut self) {
        self.bins = [0.0; 12];
        self.observations = 0;
    }
}
