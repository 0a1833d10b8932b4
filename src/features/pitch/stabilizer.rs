//! Live note stabilizer
//!
//! Raw per-frame pitch jitters by a few Hz even on a held note. A reading is
//! promoted to the displayed frequency only after it has stayed within
//! 2 Hz of the previous reading for more than three consecutive frames.

/// Maximum frame-to-frame drift of a held note
const TOLERANCE_HZ: f64 = 2.0;

/// Consecutive steady frames required (strictly more than this)
const REQUIRED_FRAMES: u32 = 3;

/// Holds the last stable frequency of a live session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteStabilizer {
    last_frequency: Option<f64>,
    steady_frames: u32,
    stable_frequency: Option<f64>,
}

impl NoteStabilizer {
    /// Fresh stabilizer with no stable note
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one voiced reading and return the current stable frequency
    pub fn update(&mut self, frequency_hz: f64) -> Option<f64> {
        match self.last_frequency {
            Some(last) if (frequency_hz - last).abs() < TOLERANCE_HZ => self.steady_frames += 1,
            _ => self.steady_frames = 0,
        }
        self.last_frequency = Some(frequency_hz);

        if self.steady_frames > REQUIRED_FRAMES {
            self.stable_frequency = Some(frequency_hz);
        }
        self.stable_frequency
    }

    /// Last promoted frequency
    pub fn stable_frequency(&self) -> Option<f64> {
        self.stable_frequency
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
