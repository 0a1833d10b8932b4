//! Key detection by profile correlation
//!
//! Correlates a chroma vector against the 24 rotated Krumhansl-Schmuckler
//! profiles and picks the single best-scoring key.
//!
//! # Algorithm
//!
//! 1. Normalize chroma by its maximum (all-zero chroma: key unknown)
//! 2. `score(mode, k) = sum_i chroma[(i + k) % 12] * profile[mode][i]`
//! 3. Scan major keys (k ascending) then minor keys; the first strict
//!    maximum wins
//! 4. Confidence: `round(best / 50 * 100 * min(1, clarity / 0.3))`, clamped
//!    to 0-100, where `clarity = (best - mean of all 24 scores) / best`
//!
//! The clarity factor keeps flat chroma (noise) from scoring high just because
//! every bin is large.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.

use super::templates::profile;
use crate::analysis::result::{Key, KeyEstimate, Mode};
use crate::features::chroma::normalization::normalize_max;
use crate::features::chroma::Chroma;
use crate::features::note::PitchClass;

/// Correlation score that maps to 100% before the clarity factor
const CONFIDENCE_SCALE: f32 = 50.0;

/// Clarity at which the confidence is no longer discounted
const FULL_CLARITY: f32 = 0.3;

/// Correlation of a chroma vector with a profile rotated to tonic `offset`
pub fn correlate(chroma: &[f32; 12], profile: &[f32; 12], offset: usize) -> f32 {
    (0..12).map(|i| chroma[(i + offset) % 12] * profile[i]).sum()
}

/// Scores of all 24 keys in scan order (major C..B, then minor C..B)
pub fn score_keys(chroma: &Chroma) -> Vec<(Key, f32)> {
    let mut scores = Vec::with_capacity(24);
    for mode in [Mode::Major, Mode::Minor] {
        let p = profile(mode);
        for offset in 0..12 {
            let key = Key {
                tonic: PitchClass::from_index(offset),
                mode,
            };
            scores.push((key, correlate(&chroma.0, p, offset)));
        }
    }
    scores
}

/// Estimate the key of a chroma vector
///
/// # Returns
///
/// `None` if the chroma carries no energy; otherwise the best of 24 keys.
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::chroma::Chroma;
/// use tessitura_dsp::features::key::detect_key;
///
/// // C, E and G
/// let mut bins = [0.0f32; 12];
/// bins[0] = 1.0;
/// bins[4] = 1.0;
/// bins[7] = 1.0;
/// let estimate = detect_key(&Chroma(bins)).unwrap();
/// assert_eq!(estimate.key.name(), "C Major");
///
/// assert!(detect_key(&Chroma::zeros()).is_none());
/// ```
pub fn detect_key(chroma: &Chroma) -> Option<KeyEstimate> {
    let normalized = normalize_max(chroma)?;
    let scores = score_keys(&normalized);

    let mut best = scores[0];
    for &(key, score) in scores.iter().skip(1) {
        if score > best.1 {
            best = (key, score);
        }
    }
    let (key, best_score) = best;
    if !(best_score > 0.0) {
        return None;
    }

    let mean = scores.iter().map(|(_, s)| s).sum::<f32>() / scores.len() as f32;
    let clarity = ((best_score - mean) / best_score).clamp(0.0, 1.0);
    let clarity_factor = (clarity / FULL_CLARITY).min(1.0);
    let confidence = (best_score / CONFIDENCE_SCALE * 100.0 * clarity_factor)
        .round()
        .clamp(0.0, 100.0) as u8;

    log::debug!(
        "Key: {} (score {:.2}, clarity {:.3}, confidence {})",
        key.name(),
        best_score,
        clarity,
        confidence
    );

    Some(KeyEstimate {
        key,
        confidence,
        score: best_score,
        clarity,
    })
}
