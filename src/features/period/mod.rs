//! Period estimation modules
//!
//! Convert an onset envelope to one BPM value using:
//! - Overlap-normalised envelope autocorrelation
//! - Strict local-maximum peak picking
//! - Half/double tempo disambiguation
//! - Parabolic sub-frame refinement and folding into the BPM range

pub mod autocorrelation;
pub mod peak_picking;

use crate::analysis::result::TempoEstimate;
use crate::error::AnalysisError;
use autocorrelation::envelope_autocorrelation;
use peak_picking::{find_local_maxima, parabolic_offset};

/// Envelopes shorter than this are not trusted
pub const MIN_ENVELOPE_FRAMES: usize = 100;

/// Number of strongest peaks evaluated for octave errors
const MAX_CANDIDATES: usize = 5;

/// Half-lag correlation ratio above which the faster tempo is preferred
const HALF_LAG_RATIO: f32 = 0.5;

/// Score multiplier for a preferred half-lag
const HALF_LAG_BOOST: f32 = 1.5;

/// Score multiplier when the double lag is at least as strong
const DOUBLE_LAG_PENALTY: f32 = 0.7;

/// Winning score relative to envelope energy below which no tempo is reported
pub const MIN_TEMPO_CONFIDENCE: f32 = 0.1;

const EPSILON: f32 = 1e-10;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    lag: usize,
    score: f32,
}

/// Estimate tempo from an onset envelope
///
/// # Arguments
///
/// * `envelope` - Normalized onset envelope (one value per frame)
/// * `sample_rate` - Sample rate in Hz
/// * `hop_size` - Hop size of the envelope frames in samples
/// * `min_bpm` - Minimum BPM (default: 60.0)
/// * `max_bpm` - Maximum BPM (default: 200.0)
///
/// # Returns
///
/// `Ok(None)` if the envelope is shorter than [`MIN_ENVELOPE_FRAMES`], shorter
/// than two periods of `min_bpm`, has no periodic peak, or the winning peak is
/// weaker than [`MIN_TEMPO_CONFIDENCE`]. Otherwise the BPM folded into
/// `[min_bpm, max_bpm]`.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or hop size,
/// or an empty/inverted BPM range, and `AnalysisError::NumericalError` if the
/// envelope contains non-finite values
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::period::estimate_tempo;
///
/// // 120 BPM at 44.1 kHz with hop 512: one pulse every ~43 frames
/// let mut envelope = vec![0.0f32; 860];
/// let mut t = 0.0f64;
/// while (t as usize) < envelope.len() {
///     envelope[t as usize] = 1.0;
///     t += 44100.0 * 0.5 / 512.0;
/// }
/// let tempo = estimate_tempo(&envelope, 44100, 512, 60.0, 200.0)?.unwrap();
/// assert_eq!(tempo.bpm, 120);
/// # Ok::<(), tessitura_dsp::AnalysisError>(())
/// ```
pub fn estimate_tempo(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Option<TempoEstimate>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput("Invalid hop size: 0".to_string()));
    }
    if min_bpm <= 0.0 || max_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    if let Some(pos) = envelope.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalError(format!(
            "Non-finite onset envelope value at frame {}",
            pos
        )));
    }

    let n = envelope.len();
    if n < MIN_ENVELOPE_FRAMES {
        log::debug!("Onset envelope too short for tempo: {} frames", n);
        return Ok(None);
    }

    let seconds_per_frame = hop_size as f32 / sample_rate as f32;
    let lag_to_bpm = |lag: f32| 60.0 / (lag * seconds_per_frame);
    let min_lag = ((60.0 / (max_bpm * seconds_per_frame)).floor() as usize).max(1);
    let max_lag = (60.0 / (min_bpm * seconds_per_frame)).ceil() as usize;

    if n < 2 * max_lag {
        log::debug!(
            "Onset envelope too short for lag range: {} frames < 2 x {}",
            n,
            max_lag
        );
        return Ok(None);
    }

    log::debug!(
        "Estimating tempo: {} frames, lag range [{}, {}], {:.1}-{:.1} BPM",
        n,
        min_lag,
        max_lag,
        min_bpm,
        max_bpm
    );

    // Extended range covers the double lag of every candidate
    let corr = envelope_autocorrelation(envelope, 2 * max_lag);
    let energy = corr[0];
    if energy <= EPSILON {
        log::debug!("Onset envelope is silent; no tempo");
        return Ok(None);
    }

    let peaks = find_local_maxima(&corr, min_lag + 1, max_lag.saturating_sub(1));
    if peaks.is_empty() {
        log::debug!("No autocorrelation peak in BPM range");
        return Ok(None);
    }

    let mut best: Option<Candidate> = None;
    for &(lag, value) in peaks.iter().take(MAX_CANDIDATES) {
        let candidate = resolve_octave(&corr, lag, value, min_lag, min_bpm, max_bpm, &lag_to_bpm);
        log::debug!(
            "Tempo candidate: lag {} ({:.1} BPM, r={:.4}) -> lag {} score {:.4}",
            lag,
            lag_to_bpm(lag as f32),
            value,
            candidate.lag,
            candidate.score
        );
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    let Some(best) = best else {
        return Ok(None);
    };

    let mut refined_lag = best.lag as f32;
    if best.lag > 1 && best.lag + 1 < corr.len() {
        if let Some(offset) = parabolic_offset(corr[best.lag - 1], corr[best.lag], corr[best.lag + 1]) {
            refined_lag += offset;
        }
    }

    let confidence = (best.score / energy).clamp(0.0, 1.0);
    if confidence < MIN_TEMPO_CONFIDENCE {
        log::debug!(
            "Periodicity too weak for a tempo: confidence {:.4} at lag {}",
            confidence,
            best.lag
        );
        return Ok(None);
    }
    let bpm_precise = fold_bpm(lag_to_bpm(refined_lag), min_bpm, max_bpm);

    log::debug!(
        "Tempo: {:.2} BPM (lag {:.2}), confidence {:.3}",
        bpm_precise,
        refined_lag,
        confidence
    );

    Ok(Some(TempoEstimate {
        bpm: bpm_precise.round() as u32,
        bpm_precise,
        confidence,
    }))
}

/// Apply the half/double lag rules to one correlation peak
fn resolve_octave(
    corr: &[f32],
    lag: usize,
    value: f32,
    min_lag: usize,
    min_bpm: f32,
    max_bpm: f32,
    lag_to_bpm: &impl Fn(f32) -> f32,
) -> Candidate {
    let half_lag = (lag as f32 / 2.0).round() as usize;
    if half_lag >= min_lag {
        let half_corr = corr.get(half_lag).copied().unwrap_or(0.0);
        let half_bpm = lag_to_bpm(half_lag as f32);
        if half_corr > value * HALF_LAG_RATIO && (min_bpm..=max_bpm).contains(&half_bpm) {
            return Candidate {
                lag: half_lag,
                score: half_corr * HALF_LAG_BOOST,
            };
        }
    }

    let mut score = value;
    if let Some(&double_corr) = corr.get(2 * lag) {
        if double_corr >= value {
            score *= DOUBLE_LAG_PENALTY;
        }
    }
    Candidate { lag, score }
}

/// Fold a BPM into `[min_bpm, max_bpm]` by octave doubling or halving
pub fn fold_bpm(mut bpm: f32, min_bpm: f32, max_bpm: f32) -> f32 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return bpm;
    }
    while bpm < min_bpm {
        bpm *= 2.0;
    }
    while bpm > max_bpm {
        bpm /= 2.0;
    }
    bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_envelope(frames: usize, period_frames: f64) -> Vec<f32> {
        let mut envelope = vec![0.0f32; frames];
        let mut t = 0.0f64;
        while (t.round() as usize) < frames {
            envelope[t.round() as usize] = 1.0;
            t += period_frames;
        }
        envelope
    }

    #[test]
    fn test_120_bpm_pulses() {
        let period = 44100.0 * 0.5 / 512.0;
        let envelope = pulse_envelope(861, period);
        let tempo = estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().unwrap();
        assert!((118..=122).contains(&tempo.bpm), "bpm {}", tempo.bpm);
        assert!(tempo.confidence > 0.0 && tempo.confidence <= 1.0);
    }

    #[test]
    fn test_90_bpm_pulses() {
        let period = 44100.0 * (60.0 / 90.0) / 512.0;
        let envelope = pulse_envelope(1300, period);
        let tempo = estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().unwrap();
        assert!((88..=92).contains(&tempo.bpm), "bpm {}", tempo.bpm);
    }

    #[test]
    fn test_short_envelope_is_unknown() {
        let envelope = pulse_envelope(99, 43.0);
        assert!(estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().is_none());
        // Long enough for the frame minimum but not two slow periods
        let envelope = pulse_envelope(150, 43.0);
        assert!(estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().is_none());
    }

    #[test]
    fn test_flat_envelope_is_unknown() {
        let envelope = vec![0.0f32; 1000];
        assert!(estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().is_none());
    }

    #[test]
    fn test_ripple_is_not_a_tempo() {
        // One attack followed by tiny periodic ripple
        let mut envelope: Vec<f32> = (0..600).map(|i| 0.001 * (i % 3) as f32).collect();
        envelope[0] = 1.0;
        assert!(estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        let envelope = vec![0.0f32; 1000];
        assert!(estimate_tempo(&envelope, 0, 512, 60.0, 200.0).is_err());
        assert!(estimate_tempo(&envelope, 44100, 0, 60.0, 200.0).is_err());
        assert!(estimate_tempo(&envelope, 44100, 512, 200.0, 60.0).is_err());
    }

    #[test]
    fn test_non_finite_envelope_is_numerical_error() {
        for bad in [f32::NAN, f32::INFINITY] {
            let mut envelope = pulse_envelope(1000, 43.0);
            envelope[10] = bad;
            assert!(matches!(
                estimate_tempo(&envelope, 44100, 512, 60.0, 200.0),
                Err(AnalysisError::NumericalError(_))
            ));
        }
        // Checked before the length gate
        let envelope = vec![f32::NAN; 10];
        assert!(estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).is_err());
    }

    #[test]
    fn test_half_lag_preferred_when_strong() {
        // Strong pulses every 60 frames with slightly weaker ones halfway:
        // the sub-beat is strong enough to prefer the faster tempo.
        let mut envelope = vec![0.0f32; 1200];
        for i in (0..1200).step_by(60) {
            envelope[i] = 1.0;
            if i + 30 < 1200 {
                envelope[i + 30] = 0.8;
            }
        }
        let tempo = estimate_tempo(&envelope, 44100, 512, 60.0, 200.0).unwrap().unwrap();
        let slow = 60.0 / (60.0 * 512.0 / 44100.0);
        assert!(
            (tempo.bpm_precise - 2.0 * slow).abs() < 3.0,
            "expected ~{:.1}, got {:.1}",
            2.0 * slow,
            tempo.bpm_precise
        );
    }

    #[test]
    fn test_fold_bpm() {
        assert_eq!(fold_bpm(50.0, 60.0, 200.0), 100.0);
        assert_eq!(fold_bpm(240.0, 60.0, 200.0), 120.0);
        assert_eq!(fold_bpm(120.0, 60.0, 200.0), 120.0);
    }
}
