//! Streaming vibrato detection
//!
//! Consumes one `(frequency, timestamp)` pair per voiced frame and reports
//! the oscillation rate, depth and a quality grade over the last 1.5 seconds.
//!
//! # Algorithm
//!
//! 1. Deviation from the nearest equal-tempered note, in cents, unwrapped
//!    across semitone boundaries so a note sung a quarter tone off does not
//!    flip sign
//! 2. Exponential smoothing: `s = 0.15 * s_prev + 0.85 * deviation`
//! 3. Linear detrend over the window (removes slow pitch drift / scoops)
//! 4. Zero crossings of the residual with linear interpolation give the
//!    rate; peak-to-peak of the residual gives the depth
//! 5. Half-period intervals give a regularity measure (coefficient of variation)

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::features::note::midi_from_frequency;

/// Retained-history weight of the exponential smoother
const SMOOTHING: f64 = 0.15;

/// Sliding analysis window in seconds
const WINDOW_SECONDS: f64 = 1.5;

/// A gap longer than this between updates starts a new phrase
const MAX_GAP_SECONDS: f64 = 0.25;

/// Plausible vibrato rates (Hz)
const MIN_RATE_HZ: f64 = 3.0;
const MAX_RATE_HZ: f64 = 10.0;

/// Plausible vibrato depths (cents, peak to peak)
const MIN_DEPTH_CENTS: f64 = 10.0;
const MAX_DEPTH_CENTS: f64 = 300.0;

/// Half-period coefficient of variation below which the vibrato is regular
const REGULARITY_CV: f64 = 0.3;

/// Vibrato grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibratoQuality {
    /// Rate 4.5-7.5 Hz, depth >= 20 cents, regular over three or more cycles
    Excellent,
    /// Rate 4-8 Hz, depth >= 15 cents
    Good,
    /// Detected, but outside the ideal bounds
    Weak,
}

impl VibratoQuality {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            VibratoQuality::Excellent => "Excellent",
            VibratoQuality::Good => "Good",
            VibratoQuality::Weak => "Weak",
        }
    }
}

/// Detector lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibratoPhase {
    /// No history (fresh, reset, or after silence)
    Idle,
    /// Accumulating voiced samples
    Tracking,
}

/// Current vibrato measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibratoReport {
    /// True if an oscillation within vibrato bounds is present
    pub is_vibrato: bool,
    /// Oscillation rate in Hz (0.0 if none)
    pub rate_hz: f64,
    /// Peak-to-peak depth in cents (0.0 if none)
    pub depth_cents: f64,
    /// Grade, `None` unless `is_vibrato`
    pub quality: Option<VibratoQuality>,
}

impl Default for VibratoReport {
    fn default() -> Self {
        Self {
            is_vibrato: false,
            rate_hz: 0.0,
            depth_cents: 0.0,
            quality: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    time: f64,
    cents: f64,
}

/// Streaming vibrato analyzer
///
/// One instance per session; call [`VibratoDetector::reset`] on silence or
/// when the session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct VibratoDetector {
    history: VecDeque<Sample>,
    last_raw_cents: Option<f64>,
    unwrapped_cents: f64,
    smoothed_cents: f64,
    report: VibratoReport,
}

impl Default for VibratoDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl VibratoDetector {
    /// Fresh detector in the `Idle` phase
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            last_raw_cents: None,
            unwrapped_cents: 0.0,
            smoothed_cents: 0.0,
            report: VibratoReport::default(),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> VibratoPhase {
        if self.history.is_empty() {
            VibratoPhase::Idle
        } else {
            VibratoPhase::Tracking
        }
    }

    /// Latest measurement
    pub fn report(&self) -> VibratoReport {
        self.report
    }

    /// Clear all history
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Ingest one voiced pitch sample
    ///
    /// Non-positive or non-finite frequencies are ignored. A timestamp that
    /// goes backwards or jumps by more than 0.25 s restarts the history.
    pub fn update(&mut self, frequency_hz: f64, timestamp_seconds: f64) -> VibratoReport {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0 && timestamp_seconds.is_finite()) {
            return self.report;
        }

        if let Some(last) = self.history.back() {
            let gap = timestamp_seconds - last.time;
            if !(0.0..=MAX_GAP_SECONDS).contains(&gap) {
                log::debug!("Vibrato history restarted after {:.3}s gap", gap);
                self.reset();
            }
        }

        let exact = midi_from_frequency(frequency_hz);
        let raw = (exact - exact.round()) * 100.0;

        match self.last_raw_cents {
            None => {
                self.unwrapped_cents = raw;
                self.smoothed_cents = raw;
            }
            Some(previous) => {
                let diff = raw - previous;
                self.unwrapped_cents += diff - 100.0 * (diff / 100.0).round();
                self.smoothed_cents =
                    SMOOTHING * self.smoothed_cents + (1.0 - SMOOTHING) * self.unwrapped_cents;
            }
        }
        self.last_raw_cents = Some(raw);

        self.history.push_back(Sample {
            time: timestamp_seconds,
            cents: self.smoothed_cents,
        });
        while let Some(front) = self.history.front() {
            if timestamp_seconds - front.time > WINDOW_SECONDS {
                self.history.pop_front();
            } else {
                break;
            }
        }

        self.report = analyze(&self.history);
        self.report
    }
}

fn analyze(history: &VecDeque<Sample>) -> VibratoReport {
    if history.len() < 8 {
        return VibratoReport::default();
    }

    // Linear detrend
    let n = history.len() as f64;
    let mean_t = history.iter().map(|s| s.time).sum::<f64>() / n;
    let mean_c = history.iter().map(|s| s.cents).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for s in history {
        cov += (s.time - mean_t) * (s.cents - mean_c);
        var += (s.time - mean_t) * (s.time - mean_t);
    }
    let slope = if var > 1e-12 { cov / var } else { 0.0 };
    let residual: Vec<(f64, f64)> = history
        .iter()
        .map(|s| (s.time, s.cents - (mean_c + slope * (s.time - mean_t))))
        .collect();

    let mut crossings = Vec::new();
    for pair in residual.windows(2) {
        let (t0, r0) = pair[0];
        let (t1, r1) = pair[1];
        if (r0 < 0.0) != (r1 < 0.0) {
            crossings.push(t0 + (t1 - t0) * r0 / (r0 - r1));
        }
    }
    if crossings.len() < 3 {
        return VibratoReport::default();
    }

    let span = crossings[crossings.len() - 1] - crossings[0];
    if span <= 0.0 {
        return VibratoReport::default();
    }
    let half_cycles = (crossings.len() - 1) as f64;
    let cycles = half_cycles / 2.0;
    let rate_hz = half_cycles / (2.0 * span);

    let max = residual.iter().map(|r| r.1).fold(f64::NEG_INFINITY, f64::max);
    let min = residual.iter().map(|r| r.1).fold(f64::INFINITY, f64::min);
    let depth_cents = max - min;

    let intervals: Vec<f64> = crossings.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let std_interval = (intervals
        .iter()
        .map(|i| (i - mean_interval) * (i - mean_interval))
        .sum::<f64>()
        / intervals.len() as f64)
        .sqrt();
    let regular = mean_interval > 0.0 && std_interval / mean_interval < REGULARITY_CV;

    let detected = (MIN_RATE_HZ..=MAX_RATE_HZ).contains(&rate_hz)
        && (MIN_DEPTH_CENTS..=MAX_DEPTH_CENTS).contains(&depth_cents)
        && cycles >= 2.0;
    if !detected {
        return VibratoReport {
            is_vibrato: false,
            rate_hz,
            depth_cents,
            quality: None,
        };
    }

    let quality = if (4.5..=7.5).contains(&rate_hz) && depth_cents >= 20.0 && regular && cycles >= 3.0 {
        VibratoQuality::Excellent
    } else if (4.0..=8.0).contains(&rate_hz) && depth_cents >= 15.0 {
        VibratoQuality::Good
    } else {
        VibratoQuality::Weak
    };

    VibratoReport {
        is_vibrato: true,
        rate_hz,
        depth_cents,
        quality: Some(quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `seconds` of a pitch oscillating around `center_hz` at 60 updates/s
    fn feed(detector: &mut VibratoDetector, center_hz: f64, rate: f64, cents: f64, seconds: f64) -> VibratoReport {
        let mut report = VibratoReport::default();
        let steps = (seconds * 60.0) as usize;
        for i in 0..steps {
            let t = i as f64 / 60.0;
            let dev = cents * (2.0 * std::f64::consts::PI * rate * t).sin();
            let f = center_hz * 2f64.powf(dev / 1200.0);
            report = detector.update(f, t);
        }
        report
    }

    #[test]
    fn test_six_hz_vibrato() {
        let mut detector = VibratoDetector::new();
        let report = feed(&mut detector, 440.0, 6.0, 30.0, 2.0);

        assert!(report.is_vibrato);
        assert!(report.rate_hz >= 5.0 && report.rate_hz <= 7.0, "rate {}", report.rate_hz);
        assert!(report.depth_cents > 40.0 && report.depth_cents < 70.0, "depth {}", report.depth_cents);
        assert!(matches!(
            report.quality,
            Some(VibratoQuality::Excellent) | Some(VibratoQuality::Good)
        ));
    }

    #[test]
    fn test_off_center_note_unwraps() {
        // Center a quarter tone sharp of A4: raw deviation crosses +/-50 cents
        let mut detector = VibratoDetector::new();
        let center = 440.0 * 2f64.powf(45.0 / 1200.0);
        let report = feed(&mut detector, center, 5.5, 30.0, 2.0);
        assert!(report.is_vibrato);
        assert!(report.depth_cents < 80.0, "depth {}", report.depth_cents);
    }

    #[test]
    fn test_steady_note_is_not_vibrato() {
        let mut detector = VibratoDetector::new();
        let report = feed(&mut detector, 330.0, 6.0, 0.0, 2.0);
        assert!(!report.is_vibrato);
        assert_eq!(report.quality, None);
    }

    #[test]
    fn test_slow_wobble_rejected() {
        let mut detector = VibratoDetector::new();
        let report = feed(&mut detector, 330.0, 1.0, 40.0, 2.0);
        assert!(!report.is_vibrato);
    }

    #[test]
    fn test_gap_restarts_history() {
        let mut detector = VibratoDetector::new();
        feed(&mut detector, 440.0, 6.0, 30.0, 2.0);
        let report = detector.update(440.0, 10.0);
        assert!(!report.is_vibrato);
        assert_eq!(detector.phase(), VibratoPhase::Tracking);
    }

    #[test]
    fn test_reset_matches_new() {
        let mut detector = VibratoDetector::new();
        feed(&mut detector, 440.0, 6.0, 30.0, 1.0);
        detector.reset();
        assert_eq!(detector, VibratoDetector::new());
        assert_eq!(detector.phase(), VibratoPhase::Idle);
        assert_eq!(detector.report(), VibratoReport::default());
    }
}
