//! Analysis orchestration and result aggregation modules
//!
//! - Offline whole-buffer analysis (key, voice range, tempo)
//! - Live per-frame session
//! - Cooperative checkpoints: cancellation, deadlines, progress
//! - Confidence flags and scoring
//! - Result types and metadata

pub mod checkpoint;
pub mod confidence;
pub mod live;
pub mod metadata;
pub mod offline;
pub mod result;
