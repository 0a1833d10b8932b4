//! Voice range and register modules
//!
//! - MIDI-note histogram with contiguous clustering (outlier rejection)
//! - Tessitura and voice-type bands for a whole buffer
//! - Live register (chest / mixed / head) from the current pitch

pub mod classifier;
pub mod histogram;
pub mod register;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use classifier::{classify_voice, VoiceRangeScanner};
pub use histogram::{MidiCluster, MidiHistogram};
pub use register::classify_register;

/// Sung register of the current pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    /// Lower register
    Chest,
    /// Passaggio
    Mixed,
    /// Upper register
    Head,
    /// No pitch, or the gate is closed
    Silence,
}

impl Register {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Register::Chest => "Chest Voice",
            Register::Mixed => "Mixed Voice",
            Register::Head => "Head Voice",
            Register::Silence => "Silence",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Register thresholds to use for live classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegisterProfile {
    /// Chest below 330 Hz, mixed below 440 Hz
    #[default]
    Male,
    /// Chest below 440 Hz, mixed below 587 Hz
    Female,
}
