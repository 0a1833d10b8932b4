//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Level measurement and input gain
//! - Biquad band-limiting (vocal band, rhythm band)
//! - Noise gating (fixed and adaptive)
//! - Channel mixing (multi-channel to mono)

pub mod channel_mixer;
pub mod filter;
pub mod level;
pub mod silence;
