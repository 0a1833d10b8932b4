//! Krumhansl-Schmuckler key profiles
//!
//! Probe-tone ratings for the 12 scale degrees of a major and a minor key,
//! index 0 = tonic. Rotating a profile by `k` gives the profile of the key
//! whose tonic is pitch class `k`.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.
//! Oxford University Press.

use crate::analysis::result::Mode;

/// Major key profile (tonic first)
pub const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Minor key profile (tonic first)
pub const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Profile for a mode
pub fn profile(mode: Mode) -> &'static [f32; 12] {
    match mode {
        Mode::Major => &MAJOR_PROFILE,
        Mode::Minor => &MINOR_PROFILE,
    }
}

/// Profile of the key with tonic `tonic`, laid out in chroma order (index 0 = C)
pub fn rotated_profile(mode: Mode, tonic: usize) -> [f32; 12] {
    let base = profile(mode);
    let mut out = [0.0f32; 12];
    for (degree, &weight) in base.iter().enumerate() {
        out[(degree + tonic) % 12] = weight;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tonic_is_strongest() {
        for mode in [Mode::Major, Mode::Minor] {
            let p = profile(mode);
            let max = p.iter().copied().fold(0.0f32, f32::max);
            assert_eq!(p[0], max);
        }
    }

    #[test]
    fn test_rotation_places_tonic() {
        let g_major = rotated_profile(Mode::Major, 7);
        assert_eq!(g_major[7], MAJOR_PROFILE[0]);
        // D (index 2) is the dominant of G
        assert_eq!(g_major[2], MAJOR_PROFILE[7]);
    }
}
