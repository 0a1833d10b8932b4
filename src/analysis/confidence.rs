//! Confidence flags and scoring
//!
//! Turns the individual stage results into report flags, human-readable
//! warnings and an overall trust score.
//!
//! # Confidence Components
//!
//! 1. **Key Confidence**: the 0-100 key confidence scaled to 0.0-1.0
//! 2. **Tempo Confidence**: autocorrelation strength of the winning lag
//! 3. **Overall Confidence**: weighted combination, penalised when a stage
//!    produced nothing
//!
//! # Example
//!
//! ```no_run
//! use tessitura_dsp::{analyze_audio, AnalysisConfig};
//! use tessitura_dsp::analysis::confidence::compute_confidence;
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let report = analyze_audio(&samples, 44100, AnalysisConfig::default())?;
//! let confidence = compute_confidence(&report);
//!
//! println!("Overall confidence: {:.2}", confidence.overall_confidence);
//! # Ok::<(), tessitura_dsp::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::result::{AnalysisFlag, AnalysisReport, KeyEstimate, Stage, TempoEstimate, VoiceRange};

/// Key confidence below which tonality is flagged as weak
pub const WEAK_TONALITY_CONFIDENCE: u8 = 30;

/// Analysis confidence scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfidence {
    /// Key confidence (0.0-1.0), 0.0 when the key is unknown
    pub key_confidence: f32,

    /// Tempo confidence (0.0-1.0), 0.0 when no tempo was found
    pub tempo_confidence: f32,

    /// Overall confidence
    ///
    /// - Key: 50% weight
    /// - Tempo: 50% weight
    pub overall_confidence: f32,

    /// Flags carried over from the report
    pub flags: Vec<AnalysisFlag>,
}

impl AnalysisConfidence {
    /// Check if overall confidence is high (>= 0.7)
    pub fn is_high_confidence(&self) -> bool {
        self.overall_confidence >= 0.7
    }

    /// Check if overall confidence is low (< 0.5)
    pub fn is_low_confidence(&self) -> bool {
        self.overall_confidence < 0.5
    }

    /// "High", "Medium" or "Low"
    pub fn confidence_level(&self) -> &'static str {
        if self.is_high_confidence() {
            "High"
        } else if self.is_low_confidence() {
            "Low"
        } else {
            "Medium"
        }
    }
}

/// Derive report flags and warnings from the stage results
///
/// # Arguments
///
/// * `key` - Key estimate, `None` if unknown or timed out
/// * `tempo` - Tempo estimate, `None` if undetected or timed out
/// * `voice` - Voice range result
/// * `timed_out` - Stages that hit their wall-clock cap
///
/// # Returns
///
/// `(flags, warnings)` in stage order
pub fn assess(
    key: Option<&KeyEstimate>,
    tempo: Option<&TempoEstimate>,
    voice: &VoiceRange,
    timed_out: &[Stage],
) -> (Vec<AnalysisFlag>, Vec<String>) {
    let mut flags = Vec::new();
    let mut warnings = Vec::new();

    for &stage in timed_out {
        flags.push(AnalysisFlag::StageTimedOut(stage));
        warnings.push(format!("{} timed out; result is partial", stage.label()));
    }

    match key {
        None => {
            flags.push(AnalysisFlag::WeakTonality);
            warnings.push("Key could not be determined".to_string());
        }
        Some(estimate) if estimate.confidence < WEAK_TONALITY_CONFIDENCE => {
            flags.push(AnalysisFlag::WeakTonality);
            warnings.push(format!(
                "Weak tonality: {} at confidence {}",
                estimate.key.name(),
                estimate.confidence
            ));
        }
        Some(_) => {}
    }

    if tempo.is_none() {
        flags.push(AnalysisFlag::TempoUndetected);
        warnings.push("Tempo could not be detected".to_string());
    }

    if voice.is_instrumental {
        flags.push(AnalysisFlag::InsufficientVoicedFrames);
        warnings.push(format!(
            "Only {} voiced frames; voice type unavailable",
            voice.voiced_frames
        ));
    }

    log::debug!("Assessment: {} flags, {} warnings", flags.len(), warnings.len());
    (flags, warnings)
}

/// Compute confidence scores for a report
///
/// Weighted average of key and tempo confidence when both exist; a single
/// surviving component is used at 60% of its value; nothing detected gives
/// 0.0.
pub fn compute_confidence(report: &AnalysisReport) -> AnalysisConfidence {
    let key_confidence = report
        .key
        .map_or(0.0, |k| k.confidence as f32 / 100.0)
        .clamp(0.0, 1.0);
    let tempo_confidence = report.tempo.map_or(0.0, |t| t.confidence).clamp(0.0, 1.0);

    let overall_confidence = if key_confidence > 0.0 && tempo_confidence > 0.0 {
        (key_confidence * 0.5 + tempo_confidence * 0.5).clamp(0.0, 1.0)
    } else if key_confidence > 0.0 {
        key_confidence * 0.6
    } else if tempo_confidence > 0.0 {
        tempo_confidence * 0.6
    } else {
        0.0
    };

    log::debug!(
        "Confidence scores: Key={:.3}, Tempo={:.3}, Overall={:.3}",
        key_confidence,
        tempo_confidence,
        overall_confidence
    );

    AnalysisConfidence {
        key_confidence,
        tempo_confidence,
        overall_confidence,
        flags: report.metadata.flags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{AnalysisMetadata, Key, VoiceType};
    use crate::features::note::{Note, PitchClass};

    fn key(confidence: u8) -> KeyEstimate {
        KeyEstimate {
            key: Key::major(PitchClass::G),
            confidence,
            score: 30.0,
            clarity: 0.4,
        }
    }

    fn tempo(confidence: f32) -> TempoEstimate {
        TempoEstimate {
            bpm: 120,
            bpm_precise: 120.2,
            confidence,
        }
    }

    fn voiced() -> VoiceRange {
        VoiceRange {
            min_note: Some(Note::from_midi(55)),
            max_note: Some(Note::from_midi(67)),
            tessitura_midi: Some(61.0),
            voice_type: VoiceType::Tenor,
            is_instrumental: false,
            voiced_frames: 400,
        }
    }

    fn report(key: Option<KeyEstimate>, tempo: Option<TempoEstimate>) -> AnalysisReport {
        AnalysisReport {
            key,
            tempo,
            voice: voiced(),
            metadata: AnalysisMetadata::default(),
        }
    }

    #[test]
    fn test_clean_result_has_no_flags() {
        let (flags, warnings) = assess(Some(&key(80)), Some(&tempo(0.6)), &voiced(), &[]);
        assert!(flags.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_everything_missing() {
        let (flags, warnings) = assess(None, None, &VoiceRange::instrumental(3), &[]);
        assert_eq!(
            flags,
            vec![
                AnalysisFlag::WeakTonality,
                AnalysisFlag::TempoUndetected,
                AnalysisFlag::InsufficientVoicedFrames
            ]
        );
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_weak_key_and_timeout() {
        let (flags, warnings) = assess(
            Some(&key(12)),
            None,
            &voiced(),
            &[Stage::DetectingTempo],
        );
        assert_eq!(flags[0], AnalysisFlag::StageTimedOut(Stage::DetectingTempo));
        assert!(flags.contains(&AnalysisFlag::WeakTonality));
        assert!(warnings[0].contains("Detecting tempo"));
    }

    #[test]
    fn test_compute_confidence_all_good() {
        let confidence = compute_confidence(&report(Some(key(80)), Some(tempo(0.8))));
        assert!((confidence.overall_confidence - 0.8).abs() < 1e-6);
        assert!(confidence.is_high_confidence());
    }

    #[test]
    fn test_compute_confidence_tempo_failed() {
        let confidence = compute_confidence(&report(Some(key(80)), None));
        assert_eq!(confidence.tempo_confidence, 0.0);
        assert!((confidence.overall_confidence - 0.48).abs() < 1e-6);
        assert_eq!(confidence.confidence_level(), "Low");
    }

    #[test]
    fn test_compute_confidence_nothing() {
        let confidence = compute_confidence(&report(None, None));
        assert_eq!(confidence.overall_confidence, 0.0);
    }
}
