//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use super::result::AnalysisFlag;

/// Analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Full input duration in seconds
    pub duration_seconds: f32,

    /// Duration actually analysed (after the analysis window cap)
    pub analyzed_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count of the input
    pub channels: u16,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Methods used (e.g. "yin", "goertzel_chroma", "energy_flux")
    pub methods_used: Vec<String>,

    /// Analysis flags
    pub flags: Vec<AnalysisFlag>,

    /// Confidence warnings (low confidence, timeouts, insufficient data)
    pub confidence_warnings: Vec<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            analyzed_seconds: 0.0,
            sample_rate: 0,
            channels: 1,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            methods_used: vec![],
            flags: vec![],
            confidence_warnings: vec![],
        }
    }
}
