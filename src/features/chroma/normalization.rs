//! Chroma normalization

use super::Chroma;

/// Scale a chroma vector so its largest bin is 1.0
///
/// Returns `None` when no energy was observed; callers report the key as
/// unknown in that case.
///
/// # Example
///
/// ```
/// use tessitura_dsp::features::chroma::{normalization::normalize_max, Chroma};
///
/// let mut bins = [0.0f32; 12];
/// bins[9] = 4.0;
/// bins[0] = 2.0;
/// let normalized = normalize_max(&Chroma(bins)).unwrap();
/// assert_eq!(normalized.0[9], 1.0);
/// assert_eq!(normalized.0[0], 0.5);
///
/// assert!(normalize_max(&Chroma::zeros()).is_none());
/// ```
pub fn normalize_max(chroma: &Chroma) -> Option<Chroma> {
    let max = chroma.max();
    if !(max > 0.0) || !max.is_finite() {
        log::debug!("Chroma has no energy; cannot normalize");
        return None;
    }
    let mut out = [0.0f32; 12];
    for (o, &v) in out.iter_mut().zip(chroma.0.iter()) {
        *o = v.max(0.0) / max;
    }
    Some(Chroma(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_is_one() {
        let chroma = Chroma([3.0, 1.0, 0.0, 2.0, 6.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.2]);
        let normalized = normalize_max(&chroma).unwrap();
        assert_eq!(normalized.max(), 1.0);
        assert!(normalized.0.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
