//! Peak detection utilities
//!
//! Local maxima and sub-sample peak refinement for correlation functions.

/// Minimum parabola curvature for interpolation to be trusted
const MIN_CURVATURE: f32 = 1e-4;

/// Find strict local maxima inside `start..end`
///
/// An index `i` is a peak if `signal[i] > signal[i - 1]` and
/// `signal[i] > signal[i + 1]`. The range is clamped so that both neighbours
/// exist.
///
/// # Arguments
///
/// * `signal` - Signal to search
/// * `start` - First index considered (inclusive)
/// * `end` - Last index considered (exclusive)
///
/// # Returns
///
/// Vector of (index, value) pairs, sorted by value (highest first)
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::period::peak_picking::find_local_maxima;
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// let peaks = find_local_maxima(&signal, 0, signal.len());
/// assert_eq!(peaks, vec![(2, 1.0), (5, 0.9)]);
/// ```
pub fn find_local_maxima(signal: &[f32], start: usize, end: usize) -> Vec<(usize, f32)> {
    if signal.len() < 3 {
        return vec![];
    }

    let first = start.max(1);
    let last = end.min(signal.len() - 1);

    let mut peaks: Vec<(usize, f32)> = (first..last)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] > signal[i + 1])
        .map(|i| (i, signal[i]))
        .collect();

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks
}

/// Sub-sample offset of a peak from its two neighbours
///
/// Fits a parabola through `(y0, y1, y2)` at positions -1, 0, +1 and returns
/// the vertex offset. Returns `None` if the parabola is nearly flat or the
/// vertex falls outside (-1, 1).
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::period::peak_picking::parabolic_offset;
///
/// assert_eq!(parabolic_offset(1.0, 2.0, 1.0), Some(0.0));
/// assert!(parabolic_offset(1.0, 1.0, 1.0).is_none());
/// ```
pub fn parabolic_offset(y0: f32, y1: f32, y2: f32) -> Option<f32> {
    let denom = 2.0 * (y0 - 2.0 * y1 + y2);
    if denom.abs() <= MIN_CURVATURE {
        return None;
    }
    let offset = (y0 - y2) / denom;
    if offset.abs() < 1.0 {
        Some(offset)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plateau_is_not_a_peak() {
        let signal = vec![0.0, 1.0, 1.0, 0.0];
        assert!(find_local_maxima(&signal, 0, signal.len()).is_empty());
    }

    #[test]
    fn test_range_is_respected() {
        let signal = vec![0.0, 0.9, 0.0, 0.5, 0.0, 0.7, 0.0];
        let peaks = find_local_maxima(&signal, 2, 5);
        assert_eq!(peaks, vec![(3, 0.5)]);
    }

    #[test]
    fn test_short_signal() {
        assert!(find_local_maxima(&[1.0, 0.0], 0, 2).is_empty());
    }

    #[test]
    fn test_parabolic_offset_direction() {
        // Right neighbour higher: vertex lies to the right
        let offset = parabolic_offset(0.2, 1.0, 0.6).unwrap();
        assert!(offset > 0.0 && offset < 0.5);
        let offset = parabolic_offset(0.6, 1.0, 0.2).unwrap();
        assert!(offset < 0.0 && offset > -0.5);
    }
}
