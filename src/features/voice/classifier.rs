//! Vocal range scan and voice-type classification
//!
//! # Algorithm
//!
//! 1. Slide a window over the (band-limited) buffer; skip windows whose RMS
//!    does not exceed the adaptive gate
//! 2. Run YIN on the rest; keep pitches strictly inside the vocal range
//! 3. Add the nearest MIDI note (count + RMS energy) to a [`MidiHistogram`]
//! 4. Take the dominant contiguous cluster: its extremes are the range, its
//!    count-weighted mean MIDI is the tessitura
//! 5. Map the tessitura to a voice type

use super::histogram::MidiHistogram;
use crate::analysis::result::{VoiceRange, VoiceType};
use crate::config::AnalysisConfig;
use crate::features::note::{note_from_frequency, Note};
use crate::features::pitch::yin::YinEstimator;
use crate::features::pitch::PitchEstimator;
use crate::preprocessing::level::rms;
use crate::preprocessing::silence::NoiseGate;

/// Voiced frames needed before a voice type is reported
pub const MIN_VOICED_FRAMES: usize = 10;

/// Map a tessitura (MIDI) to a voice type
///
/// Bands: below 48 Bass, below 55 Baritone, below 63 Tenor, below 69
/// Alto / Countertenor, otherwise Soprano.
///
/// # Example
///
/// ```
/// use tessitura_dsp::analysis::result::VoiceType;
/// use tessitura_dsp::features::voice::classify_voice;
///
/// assert_eq!(classify_voice(66.0), VoiceType::AltoCountertenor);
/// assert_eq!(classify_voice(50.0), VoiceType::Baritone);
/// ```
pub fn classify_voice(tessitura_midi: f64) -> VoiceType {
    if tessitura_midi < 48.0 {
        VoiceType::Bass
    } else if tessitura_midi < 55.0 {
        VoiceType::Baritone
    } else if tessitura_midi < 63.0 {
        VoiceType::Tenor
    } else if tessitura_midi < 69.0 {
        VoiceType::AltoCountertenor
    } else {
        VoiceType::Soprano
    }
}

/// Incremental vocal range scanner
///
/// Frames are pushed by the caller so long buffers can be interleaved with
/// checkpoints; [`VoiceRangeScanner::finish`] can be called at any point and
/// classifies whatever was scanned so far.
#[derive(Debug)]
pub struct VoiceRangeScanner {
    estimator: YinEstimator,
    gate: NoiseGate,
    min_frequency_hz: f64,
    max_frequency_hz: f64,
    tail_energy_ratio: f64,
    histogram: MidiHistogram,
    frames_scanned: usize,
}

impl VoiceRangeScanner {
    /// Create a scanner
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the YIN threshold, vocal frequency bounds and tail trim ratio
    /// * `gate_rms` - Windows with RMS at or below this are skipped (usually
    ///   [`adaptive_threshold`](crate::preprocessing::silence::adaptive_threshold) of the buffer)
    pub fn new(config: &AnalysisConfig, gate_rms: f32) -> Self {
        Self {
            estimator: YinEstimator::new(config.yin_threshold as f64, config.silence_rms),
            gate: NoiseGate::new(gate_rms),
            min_frequency_hz: config.vocal_min_frequency_hz,
            max_frequency_hz: config.vocal_max_frequency_hz,
            tail_energy_ratio: config.range_tail_energy_ratio as f64,
            histogram: MidiHistogram::new(),
            frames_scanned: 0,
        }
    }

    /// Scan one window; returns the MIDI note if the window was voiced
    pub fn push_frame(&mut self, window: &[f32], sample_rate: u32) -> Option<i32> {
        self.frames_scanned += 1;

        let level = rms(window);
        if !self.gate.is_open(level) {
            return None;
        }

        let frequency = self.estimator.estimate(window, sample_rate).frequency_hz?;
        if frequency <= self.min_frequency_hz || frequency >= self.max_frequency_hz {
            return None;
        }

        let note = note_from_frequency(frequency)?;
        self.histogram.add(note.midi, level);
        Some(note.midi)
    }

    /// Record a frequency detected elsewhere (e.g. by a shared pitch pass)
    pub fn push_frequency(&mut self, frequency_hz: f64, energy: f32) -> Option<i32> {
        self.frames_scanned += 1;
        if frequency_hz <= self.min_frequency_hz || frequency_hz >= self.max_frequency_hz {
            return None;
        }
        let note = note_from_frequency(frequency_hz)?;
        self.histogram.add(note.midi, energy);
        Some(note.midi)
    }

    /// Windows scanned so far
    pub fn frames_scanned(&self) -> usize {
        self.frames_scanned
    }

    /// Voiced frames recorded so far
    pub fn voiced_frames(&self) -> usize {
        self.histogram.voiced_frames()
    }

    /// Underlying histogram
    pub fn histogram(&self) -> &MidiHistogram {
        &self.histogram
    }

    /// Classify everything scanned so far
    pub fn finish(&self) -> VoiceRange {
        let voiced = self.histogram.voiced_frames();
        if voiced < MIN_VOICED_FRAMES {
            log::debug!(
                "Only {} voiced frames out of {} (need {}); reporting instrumental",
                voiced,
                self.frames_scanned,
                MIN_VOICED_FRAMES
            );
            return VoiceRange::instrumental(voiced);
        }

        let Some(cluster) = self.histogram.dominant_cluster() else {
            log::debug!("No MIDI bin above the noise floor; reporting instrumental");
            return VoiceRange::instrumental(voiced);
        };

        let (Some(tessitura), Some((low, high))) =
            (cluster.tessitura(), cluster.trimmed_extent(self.tail_energy_ratio))
        else {
            return VoiceRange::instrumental(voiced);
        };

        let voice_type = classify_voice(tessitura);
        let min_note = Note::from_midi(low);
        let max_note = Note::from_midi(high);

        log::debug!(
            "Voice range {}-{} ({} notes in cluster), tessitura {:.2}, {} from {} voiced frames",
            min_note.name(),
            max_note.name(),
            cluster.members.len(),
            tessitura,
            voice_type,
            voiced
        );

        VoiceRange {
            min_note: Some(min_note),
            max_note: Some(max_note),
            tessitura_midi: Some(tessitura),
            voice_type,
            is_instrumental: false,
            voiced_frames: voiced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::note::frequency_from_midi;

    fn sine(freq: f64, amplitude: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_voice_bands() {
        assert_eq!(classify_voice(40.0), VoiceType::Bass);
        assert_eq!(classify_voice(47.9), VoiceType::Bass);
        assert_eq!(classify_voice(48.0), VoiceType::Baritone);
        assert_eq!(classify_voice(55.0), VoiceType::Tenor);
        assert_eq!(classify_voice(63.0), VoiceType::AltoCountertenor);
        assert_eq!(classify_voice(69.0), VoiceType::Soprano);
    }

    #[test]
    fn test_scale_c4_to_c5() {
        let config = AnalysisConfig::default();
        let mut scanner = VoiceRangeScanner::new(&config, 0.005);
        for midi in 60..=72 {
            for _ in 0..5 {
                scanner.push_frequency(frequency_from_midi(midi), 0.1);
            }
        }
        let range = scanner.finish();
        assert!(!range.is_instrumental);
        assert_eq!(range.min_note.unwrap().midi, 60);
        assert_eq!(range.max_note.unwrap().midi, 72);
        assert!((range.tessitura_midi.unwrap() - 66.0).abs() < 1e-9);
        assert_eq!(range.voice_type, VoiceType::AltoCountertenor);
    }

    #[test]
    fn test_scan_sine_frames() {
        let sample_rate = 44100;
        let config = AnalysisConfig::default();
        let mut scanner = VoiceRangeScanner::new(&config, 0.005);
        let tone = sine(220.0, 0.5, 2048, sample_rate);
        for _ in 0..12 {
            assert_eq!(scanner.push_frame(&tone, sample_rate), Some(57));
        }
        let range = scanner.finish();
        assert_eq!(range.voiced_frames, 12);
        assert_eq!(range.voice_type, VoiceType::Tenor);
    }

    #[test]
    fn test_quiet_and_out_of_range_frames_skipped() {
        let sample_rate = 44100;
        let config = AnalysisConfig::default();
        let mut scanner = VoiceRangeScanner::new(&config, 0.05);
        let quiet = sine(220.0, 0.01, 2048, sample_rate);
        assert_eq!(scanner.push_frame(&quiet, sample_rate), None);
        assert_eq!(scanner.push_frequency(60.0, 0.2), None);
        assert_eq!(scanner.push_frequency(1500.0, 0.2), None);
        assert_eq!(scanner.frames_scanned(), 3);
        assert_eq!(scanner.voiced_frames(), 0);
    }

    #[test]
    fn test_too_few_frames_is_instrumental() {
        let config = AnalysisConfig::default();
        let mut scanner = VoiceRangeScanner::new(&config, 0.005);
        for _ in 0..9 {
            scanner.push_frequency(440.0, 0.1);
        }
        let range = scanner.finish();
        assert!(range.is_instrumental);
        assert_eq!(range.voice_type, VoiceType::Instrumental);
        assert!(range.min_note.is_none());
    }
}
