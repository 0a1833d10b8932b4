//! Live key tracking
//!
//! The histogram key can flip between neighbouring keys from one frame to the
//! next. [`KeyStabilizer`] only commits a new key once it has won a number of
//! consecutive updates; [`LiveKeyTracker`] combines it with a decaying pitch
//! histogram.

use super::detector::detect_key;
use crate::analysis::result::Key;
use crate::features::chroma::{ChromaAccumulator, PitchHistogram};

/// Debounces key candidates
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStabilizer {
    required_wins: u32,
    candidate: Option<Key>,
    streak: u32,
    committed: Option<Key>,
}

impl KeyStabilizer {
    /// Commit a key after `required_wins` consecutive wins (live default: 15)
    pub fn new(required_wins: u32) -> Self {
        Self {
            required_wins: required_wins.max(1),
            candidate: None,
            streak: 0,
            committed: None,
        }
    }

    /// Feed the latest winning key and return the committed key
    pub fn update(&mut self, winner: Key) -> Option<Key> {
        if self.candidate == Some(winner) {
            self.streak += 1;
        } else {
            self.candidate = Some(winner);
            self.streak = 1;
        }

        if self.streak >= self.required_wins && self.committed != Some(winner) {
            log::debug!(
                "Live key committed: {} after {} consecutive wins",
                winner.name(),
                self.streak
            );
            self.committed = Some(winner);
        }
        self.committed
    }

    /// Currently displayed key
    pub fn committed(&self) -> Option<Key> {
        self.committed
    }

    /// Forget candidate and committed key
    pub fn reset(&mut self) {
        *self = Self::new(self.required_wins);
    }
}

/// Streaming key estimator for live sessions
#[derive(Debug, Clone, PartialEq)]
pub struct LiveKeyTracker {
    histogram: PitchHistogram,
    stabilizer: KeyStabilizer,
    min_observations: usize,
}

impl LiveKeyTracker {
    /// Create a tracker
    ///
    /// # Arguments
    ///
    /// * `decay` - Per-update histogram decay (default: 0.995)
    /// * `required_wins` - Consecutive wins before a key is shown (default: 15)
    /// * `min_observations` - Voiced frames needed before estimating (default: 10)
    pub fn new(decay: f32, required_wins: u32, min_observations: usize) -> Self {
        Self {
            histogram: PitchHistogram::with_decay(decay),
            stabilizer: KeyStabilizer::new(required_wins),
            min_observations,
        }
    }

    /// Add a voiced frequency and return the committed key
    ///
    /// Returns `None` while detecting (too few observations, or no key has
    /// won enough consecutive updates yet).
    pub fn observe(&mut self, frequency_hz: f64) -> Option<Key> {
        self.histogram.add_frequency(frequency_hz);
        if self.histogram.observations() < self.min_observations {
            return self.stabilizer.committed();
        }
        match detect_key(&self.histogram.chroma()) {
            Some(estimate) => self.stabilizer.update(estimate.key),
            None => self.stabilizer.committed(),
        }
    }

    /// Currently displayed key
    pub fn current(&self) -> Option<Key> {
        self.stabilizer.committed()
    }

    /// Clear histogram and stability state
    pub fn reset(&mut self) {
        self.histogram.reset();
        self.stabilizer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::note::{frequency_from_midi, PitchClass};

    #[test]
    fn test_commits_after_streak() {
        let mut stabilizer = KeyStabilizer::new(15);
        let c = Key::major(PitchClass::C);
        for _ in 0..14 {
            assert_eq!(stabilizer.update(c), None);
        }
        assert_eq!(stabilizer.update(c), Some(c));
    }

    #[test]
    fn test_interrupted_streak_keeps_previous() {
        let mut stabilizer = KeyStabilizer::new(3);
        let c = Key::major(PitchClass::C);
        let g = Key::major(PitchClass::G);
        for _ in 0..3 {
            stabilizer.update(c);
        }
        assert_eq!(stabilizer.update(g), Some(c));
        assert_eq!(stabilizer.update(g), Some(c));
        assert_eq!(stabilizer.update(c), Some(c));
        for _ in 0..3 {
            stabilizer.update(g);
        }
        assert_eq!(stabilizer.committed(), Some(g));
    }

    #[test]
    fn test_live_tracker_finds_sung_triad() {
        let mut tracker = LiveKeyTracker::new(0.995, 15, 10);
        // A minor arpeggio: A3, C4, E4
        let notes = [57, 60, 64];
        let mut key = None;
        for i in 0..120 {
            key = tracker.observe(frequency_from_midi(notes[i % 3]));
        }
        assert_eq!(key, Some(Key::minor(PitchClass::A)));
    }

    #[test]
    fn test_detecting_until_enough_observations() {
        let mut tracker = LiveKeyTracker::new(0.995, 1, 10);
        for _ in 0..9 {
            assert_eq!(tracker.observe(440.0), None);
        }
        assert!(tracker.observe(440.0).is_some());
    }

    #[test]
    fn test_reset_matches_new() {
        let mut tracker = LiveKeyTracker::new(0.995, 15, 10);
        for _ in 0..50 {
            tracker.observe(440.0);
        }
        tracker.reset();
        assert_eq!(tracker, LiveKeyTracker::new(0.995, 15, 10));
        assert_eq!(tracker.current(), None);
    }
}
