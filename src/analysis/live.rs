//! Live (per-frame) analysis session
//!
//! A host pushes microphone blocks with [`LiveAnalyzer::push_samples`] and
//! polls [`LiveAnalyzer::process_frame`] from its render/timer loop. Each
//! call analyses the most recent window:
//!
//! 1. RMS noise gate and pitch estimation (autocorrelation or YIN)
//! 2. Frequencies outside the live range are dropped
//! 3. Voiced frames feed the vibrato detector, note stabilizer and decaying
//!    key histogram; gated frames reset the vibrato history and the note
//!    stabilizer, while the key persists until [`LiveAnalyzer::reset`]
//! 4. Snapshots are throttled to the UI update interval
//!
//! # Example
//!
//! ```
//! use tessitura_dsp::analysis::live::LiveAnalyzer;
//! use tessitura_dsp::AnalysisConfig;
//!
//! let mut live = LiveAnalyzer::new(&AnalysisConfig::default(), 44100)?;
//! let tone: Vec<f32> = (0..4096)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! live.push_samples(&tone);
//! let snapshot = live.process_frame(0.0).unwrap();
//! assert_eq!(snapshot.note.unwrap().name(), "A3");
//! # Ok::<(), tessitura_dsp::AnalysisError>(())
//! ```

use crate::analysis::result::LiveSnapshot;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::key::LiveKeyTracker;
use crate::features::note::note_from_frequency;
use crate::features::pitch::stabilizer::NoteStabilizer;
use crate::features::pitch::{PitchEstimator, PitchTracker};
use crate::features::vibrato::VibratoDetector;
use crate::features::voice::{classify_register, RegisterProfile};
use crate::io::ring_buffer::RingBuffer;
use crate::io::sample_buffer::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use crate::preprocessing::level::{apply_gain, rms};
use crate::preprocessing::silence::NoiseGate;

/// Ring capacity in windows
const RING_WINDOWS: usize = 4;

/// Live-mode session state
#[derive(Debug)]
pub struct LiveAnalyzer {
    sample_rate: u32,
    input_gain: f32,
    min_frequency_hz: f64,
    max_frequency_hz: f64,
    register_profile: RegisterProfile,
    ui_interval_seconds: f64,
    gate: NoiseGate,
    ring: RingBuffer,
    window: Vec<f32>,
    scratch: Vec<f32>,
    tracker: PitchTracker,
    stabilizer: NoteStabilizer,
    vibrato: VibratoDetector,
    key: LiveKeyTracker,
    last_emit: Option<f64>,
}

impl LiveAnalyzer {
    /// Create a session
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for an invalid configuration or
    /// a sample rate outside 8 kHz - 384 kHz
    pub fn new(config: &AnalysisConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        config.validate()?;
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(AnalysisError::InvalidInput(format!(
                "Sample rate {} Hz outside supported range {}-{} Hz",
                sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        log::debug!(
            "Live session: {} Hz, window {}, {:?} pitch, gate {:.4}",
            sample_rate,
            config.live_window_size,
            config.pitch_algorithm,
            config.noise_gate_rms
        );

        Ok(Self {
            sample_rate,
            input_gain: config.input_gain,
            min_frequency_hz: config.live_min_frequency_hz,
            max_frequency_hz: config.live_max_frequency_hz,
            register_profile: config.register_profile,
            ui_interval_seconds: config.ui_update_interval_ms as f64 / 1000.0,
            gate: NoiseGate::new(config.noise_gate_rms),
            ring: RingBuffer::new(config.live_window_size * RING_WINDOWS),
            window: vec![0.0; config.live_window_size],
            scratch: Vec::new(),
            tracker: PitchTracker::new(config.pitch_algorithm, config),
            stabilizer: NoteStabilizer::new(),
            vibrato: VibratoDetector::new(),
            key: LiveKeyTracker::new(
                config.key_decay,
                config.key_stability_updates,
                config.min_key_observations,
            ),
            last_emit: None,
        })
    }

    /// Session sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append mono microphone samples (input gain is applied here)
    pub fn push_samples(&mut self, samples: &[f32]) {
        if (self.input_gain - 1.0).abs() > f32::EPSILON {
            self.scratch.clear();
            self.scratch.extend_from_slice(samples);
            apply_gain(&mut self.scratch, self.input_gain);
            self.ring.push(&self.scratch);
        } else {
            self.ring.push(samples);
        }
    }

    /// Analyse the latest window
    ///
    /// State is updated on every call; a snapshot is returned only if at
    /// least the UI interval has passed since the previous one (the first
    /// frame always emits). Returns `None` until a full window is buffered.
    ///
    /// # Arguments
    ///
    /// * `timestamp_seconds` - Host clock of this frame, used for vibrato
    ///   timing and UI throttling
    pub fn process_frame(&mut self, timestamp_seconds: f64) -> Option<LiveSnapshot> {
        if !self.ring.latest_into(&mut self.window) {
            return None;
        }
        let snapshot = self.analyze_latest(timestamp_seconds);

        let due = self
            .last_emit
            .map_or(true, |last| timestamp_seconds - last >= self.ui_interval_seconds);
        if !due {
            return None;
        }
        self.last_emit = Some(timestamp_seconds);
        Some(snapshot)
    }

    fn analyze_latest(&mut self, timestamp_seconds: f64) -> LiveSnapshot {
        let volume = rms(&self.window);

        let frequency = if self.gate.is_open(volume) {
            self.tracker
                .estimate(&self.window, self.sample_rate)
                .within(self.min_frequency_hz, self.max_frequency_hz)
        } else {
            None
        };

        let (displayed, key) = match frequency {
            Some(f) => {
                self.vibrato.update(f, timestamp_seconds);
                let stable = self.stabilizer.update(f);
                let key = self.key.observe(f);
                (Some(stable.unwrap_or(f)), key)
            }
            None => {
                self.vibrato.reset();
                self.stabilizer.reset();
                (None, self.key.current())
            }
        };

        let note = displayed.and_then(note_from_frequency);
        LiveSnapshot {
            timestamp_seconds,
            frequency_hz: displayed,
            note,
            cents: note.map(|n| n.cents),
            volume,
            voice_type: classify_register(displayed, self.register_profile),
            key,
            vibrato: self.vibrato.report(),
        }
    }

    /// End the session state: clears audio, stabilizer, vibrato and key
    pub fn reset(&mut self) {
        log::debug!("Live session reset");
        self.ring.clear();
        self.window.iter_mut().for_each(|x| *x = 0.0);
        self.stabilizer.reset();
        self.vibrato.reset();
        self.key.reset();
        self.last_emit = None;
    }
}
