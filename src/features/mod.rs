//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - Note/frequency mapping
//! - Pitch detection (autocorrelation, YIN) and note stabilization
//! - Vibrato analysis
//! - Chroma accumulation (pitch histogram, Goertzel)
//! - Key detection
//! - Onset envelope and period estimation (BPM detection)
//! - Vocal range, voice type and register

pub mod chroma;
pub mod key;
pub mod note;
pub mod onset;
pub mod period;
pub mod pitch;
pub mod vibrato;
pub mod voice;
