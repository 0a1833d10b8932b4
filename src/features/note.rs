//! Note and frequency mapping
//!
//! Twelve-tone equal temperament with A4 = 440 Hz (MIDI 69).

use serde::{Deserialize, Serialize};

/// Reference pitch of A4 in Hz
pub const A4_HZ: f64 = 440.0;

/// MIDI number of A4
pub const A4_MIDI: i32 = 69;

/// Frequencies below this are not mapped to notes
pub const MIN_NOTE_FREQUENCY_HZ: f64 = 20.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the 12 pitch classes, index 0 = C .. 11 = B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    /// C
    C,
    /// C sharp / D flat
    CSharp,
    /// D
    D,
    /// D sharp / E flat
    DSharp,
    /// E
    E,
    /// F
    F,
    /// F sharp / G flat
    FSharp,
    /// G
    G,
    /// G sharp / A flat
    GSharp,
    /// A
    A,
    /// A sharp / B flat
    ASharp,
    /// B
    B,
}

impl PitchClass {
    /// All pitch classes in chroma order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for a chroma index (wraps modulo 12)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Pitch class of a MIDI note number
    pub fn from_midi(midi: i32) -> Self {
        Self::ALL[midi.rem_euclid(12) as usize]
    }

    /// Chroma index (0 = C)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Sharp-spelled note name ("C", "C#", ...)
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// Transpose by a number of semitones (either direction)
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_midi(self.index() as i32 + semitones)
    }
}

/// A frequency resolved to the nearest equal-tempered note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Pitch class of the nearest note
    pub pitch_class: PitchClass,
    /// Scientific octave number (C4 = middle C)
    pub octave: i32,
    /// MIDI number of the nearest note
    pub midi: i32,
    /// Deviation from the nearest note in cents, in [-50, 50]
    pub cents: i32,
    /// The frequency that was mapped
    pub frequency_hz: f64,
}

impl Note {
    /// Note exactly at a MIDI number (zero cents)
    pub fn from_midi(midi: i32) -> Self {
        Self {
            pitch_class: PitchClass::from_midi(midi),
            octave: octave_of(midi),
            midi,
            cents: 0,
            frequency_hz: frequency_from_midi(midi),
        }
    }

    /// Note name with octave, e.g. "A4" or "C#3"
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_class.name(), self.octave)
    }
}

fn octave_of(midi: i32) -> i32 {
    midi.div_euclid(12) - 1
}

/// Fractional MIDI number of a frequency
///
/// `69 + 12 * log2(f / 440)`; the caller is responsible for `f > 0`.
pub fn midi_from_frequency(frequency_hz: f64) -> f64 {
    A4_MIDI as f64 + 12.0 * (frequency_hz / A4_HZ).log2()
}

/// Frequency of a MIDI note number: `440 * 2^((midi - 69) / 12)`
pub fn frequency_from_midi(midi: i32) -> f64 {
    frequency_from_fractional_midi(midi as f64)
}

/// Frequency of a fractional MIDI value (e.g. a weighted tessitura)
pub fn frequency_from_fractional_midi(midi: f64) -> f64 {
    A4_HZ * 2f64.powf((midi - A4_MIDI as f64) / 12.0)
}

/// Map a frequency to the nearest note
///
/// Returns `None` for non-finite input and for anything below 20 Hz.
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::note::{note_from_frequency, PitchClass};
///
/// let note = note_from_frequency(440.0).unwrap();
/// assert_eq!(note.pitch_class, PitchClass::A);
/// assert_eq!(note.octave, 4);
/// assert_eq!(note.midi, 69);
/// assert_eq!(note.cents, 0);
///
/// assert!(note_from_frequency(0.0).is_none());
/// ```
pub fn note_from_frequency(frequency_hz: f64) -> Option<Note> {
    if !frequency_hz.is_finite() || frequency_hz < MIN_NOTE_FREQUENCY_HZ {
        return None;
    }
    let exact = midi_from_frequency(frequency_hz);
    let midi = exact.round() as i32;
    let cents = ((exact - midi as f64) * 100.0).round() as i32;

    Some(Note {
        pitch_class: PitchClass::from_midi(midi),
        octave: octave_of(midi),
        midi,
        cents,
        frequency_hz,
    })
}

/// Note name with octave for a MIDI number, e.g. `60 -> "C4"`
pub fn midi_to_name(midi: i32) -> String {
    Note::from_midi(midi).name()
}
