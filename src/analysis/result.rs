//! Analysis result types
//!
//! Everything the engine hands back to a host: the offline [`AnalysisReport`]
//! and the per-frame [`LiveSnapshot`]. All types serialize with serde.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use super::checkpoint::Stage;
pub use super::metadata::AnalysisMetadata;
use crate::features::note::{Note, PitchClass};
use crate::features::vibrato::VibratoReport;
pub use crate::features::voice::Register;

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major (Ionian)
    Major,
    /// Natural minor (Aeolian)
    Minor,
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Tonic pitch class
    pub tonic: PitchClass,
    /// Major or minor
    pub mode: Mode,
}

impl Key {
    /// Major key on `tonic`
    pub fn major(tonic: PitchClass) -> Self {
        Self {
            tonic,
            mode: Mode::Major,
        }
    }

    /// Minor key on `tonic`
    pub fn minor(tonic: PitchClass) -> Self {
        Self {
            tonic,
            mode: Mode::Minor,
        }
    }

    /// Full key name (e.g., "C Major", "F# Minor")
    ///
    /// # Example
    ///
    /// ```
    /// use tessitura_dsp::analysis::result::Key;
    /// use tessitura_dsp::features::note::PitchClass;
    ///
    /// assert_eq!(Key::major(PitchClass::C).name(), "C Major");
    /// assert_eq!(Key::minor(PitchClass::FSharp).name(), "F# Minor");
    /// ```
    pub fn name(&self) -> String {
        match self.mode {
            Mode::Major => format!("{} Major", self.tonic.name()),
            Mode::Minor => format!("{} Minor", self.tonic.name()),
        }
    }

    /// Short key name (e.g., "C", "Am", "C#m")
    ///
    /// # Example
    ///
    /// ```
    /// use tessitura_dsp::analysis::result::Key;
    /// use tessitura_dsp::features::note::PitchClass;
    ///
    /// assert_eq!(Key::major(PitchClass::D).short_name(), "D");
    /// assert_eq!(Key::minor(PitchClass::A).short_name(), "Am");
    /// ```
    pub fn short_name(&self) -> String {
        match self.mode {
            Mode::Major => self.tonic.name().to_string(),
            Mode::Minor => format!("{}m", self.tonic.name()),
        }
    }

    /// Relative major/minor (C Major <-> A Minor)
    pub fn relative(&self) -> Key {
        match self.mode {
            Mode::Major => Key::minor(self.tonic.transpose(-3)),
            Mode::Minor => Key::major(self.tonic.transpose(3)),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Key estimate from chroma correlation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Best-fitting key
    pub key: Key,

    /// Ordinal confidence, 0-100
    ///
    /// A relative quality indicator, not a probability.
    pub confidence: u8,

    /// Winning correlation score
    pub score: f32,

    /// How far the winner stands above the average of all 24 candidates (0.0-1.0)
    ///
    /// - High (>0.3): Strong tonality
    /// - Low (<0.1): Flat chroma (noise, atonal, percussive)
    pub clarity: f32,
}

/// Tempo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Rounded BPM within the configured range (default 60-200)
    pub bpm: u32,

    /// Unrounded BPM after sub-frame interpolation
    pub bpm_precise: f32,

    /// Confidence (0.0-1.0): winning correlation relative to envelope energy
    pub confidence: f32,
}

/// Voice classification by tessitura
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceType {
    /// Tessitura below C3 (MIDI 48)
    Bass,
    /// MIDI 48-54
    Baritone,
    /// MIDI 55-62
    Tenor,
    /// MIDI 63-68
    AltoCountertenor,
    /// MIDI 69 and above
    Soprano,
    /// Too few voiced frames to classify
    Instrumental,
}

impl VoiceType {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            VoiceType::Bass => "Bass",
            VoiceType::Baritone => "Baritone",
            VoiceType::Tenor => "Tenor",
            VoiceType::AltoCountertenor => "Alto / Countertenor",
            VoiceType::Soprano => "Soprano",
            VoiceType::Instrumental => "Instrumental",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vocal range and voice classification of a whole buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRange {
    /// Lowest note of the dominant cluster
    pub min_note: Option<Note>,

    /// Highest note of the dominant cluster
    pub max_note: Option<Note>,

    /// Count-weighted mean MIDI of the dominant cluster
    pub tessitura_midi: Option<f64>,

    /// Voice type from the tessitura
    pub voice_type: VoiceType,

    /// True when there was not enough voiced material to classify
    pub is_instrumental: bool,

    /// Frames that passed the gate and produced an in-range pitch
    pub voiced_frames: usize,
}

impl VoiceRange {
    /// Result for material with too little voice
    pub fn instrumental(voiced_frames: usize) -> Self {
        Self {
            min_note: None,
            max_note: None,
            tessitura_midi: None,
            voice_type: VoiceType::Instrumental,
            is_instrumental: true,
            voiced_frames,
        }
    }
}

/// Analysis flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// Key unknown or confidence below 30
    WeakTonality,
    /// No tempo could be estimated
    TempoUndetected,
    /// Fewer voiced frames than needed for classification
    InsufficientVoicedFrames,
    /// A stage hit its wall-clock cap and returned a partial result
    StageTimedOut(Stage),
}

/// Complete offline analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Detected key, `None` when unknown
    pub key: Option<KeyEstimate>,

    /// Detected tempo, `None` when undetected
    pub tempo: Option<TempoEstimate>,

    /// Vocal range and voice type
    pub voice: VoiceRange,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Per-frame live result for the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// Host timestamp of the frame (seconds)
    pub timestamp_seconds: f64,

    /// Stable frequency if one exists, otherwise the raw detection
    pub frequency_hz: Option<f64>,

    /// Nearest note of `frequency_hz`
    pub note: Option<Note>,

    /// Deviation of `frequency_hz` from `note`, in cents
    pub cents: Option<i32>,

    /// RMS level of the analysed window (after input gain)
    pub volume: f32,

    /// Sung register of the current pitch
    pub voice_type: Register,

    /// Committed key, `None` while still detecting
    pub key: Option<Key>,

    /// Current vibrato measurement
    pub vibrato: VibratoReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::major(PitchClass::C).name(), "C Major");
        assert_eq!(Key::minor(PitchClass::A).name(), "A Minor");
        assert_eq!(Key::minor(PitchClass::CSharp).short_name(), "C#m");
        assert_eq!(Key::major(PitchClass::B).to_string(), "B Major");
    }

    #[test]
    fn test_relative_keys() {
        assert_eq!(Key::major(PitchClass::C).relative(), Key::minor(PitchClass::A));
        assert_eq!(Key::minor(PitchClass::E).relative(), Key::major(PitchClass::G));
        for pc in PitchClass::ALL {
            let key = Key::major(pc);
            assert_eq!(key.relative().relative(), key);
        }
    }

    #[test]
    fn test_voice_labels() {
        assert_eq!(VoiceType::AltoCountertenor.label(), "Alto / Countertenor");
        assert_eq!(VoiceType::Instrumental.to_string(), "Instrumental");
    }

    #[test]
    fn test_report_serializes() {
        let report = AnalysisReport {
            key: Some(KeyEstimate {
                key: Key::minor(PitchClass::D),
                confidence: 72,
                score: 36.1,
                clarity: 0.4,
            }),
            tempo: None,
            voice: VoiceRange::instrumental(3),
            metadata: AnalysisMetadata::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"Minor\""));
        assert!(json.contains("\"Instrumental\""));
    }
}
