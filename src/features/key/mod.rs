//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Schmuckler profiles (24 keys)
//! - Chroma correlation with confidence and clarity
//! - A stability filter for live display

pub mod detector;
pub mod stability;
pub mod templates;

pub use detector::{correlate, detect_key, score_keys};
pub use stability::{KeyStabilizer, LiveKeyTracker};
