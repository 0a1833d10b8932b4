//! Configuration parameters for live and offline analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::pitch::PitchAlgorithm;
use crate::features::voice::RegisterProfile;

/// Analysis configuration parameters
///
/// One configuration drives both operating modes. Fields are grouped by the
/// stage that reads them; every field has a default, so partial JSON configs
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Host-facing options
    /// Multiplier applied to every sample before analysis (default: 1.0)
    pub input_gain: f32,

    /// Live noise gate: windows with RMS at or below this are treated as silence (default: 0.01)
    pub noise_gate_rms: f32,

    /// Offline analysis cap in seconds; 0.0 analyses the full buffer (default: 0.0)
    pub analysis_window_seconds: f32,

    /// Pitch estimator used by live mode (default: Autocorrelation)
    ///
    /// Offline scans always use YIN; the autocorrelation estimator is
    /// quadratic in window length and only suitable for short live windows.
    pub pitch_algorithm: PitchAlgorithm,

    /// Offline key strategy: Goertzel chroma (true) or pitch histogram (false) (default: true)
    pub use_spectral_key_detection: bool,

    // Pitch estimation
    /// RMS below which a window is unvoiced before any periodicity search (default: 0.001)
    pub silence_rms: f32,

    /// YIN absolute threshold on the normalized difference function (default: 0.15)
    pub yin_threshold: f32,

    // Live mode
    /// Window pulled from the ring buffer per frame (default: 2048)
    pub live_window_size: usize,

    /// Lowest frequency accepted as a live pitch (default: 60.0 Hz)
    pub live_min_frequency_hz: f64,

    /// Highest frequency accepted as a live pitch (default: 1400.0 Hz)
    pub live_max_frequency_hz: f64,

    /// Minimum time between emitted live snapshots (default: 50 ms, i.e. 20 Hz)
    pub ui_update_interval_ms: u32,

    /// Per-update decay of the live pitch-class histogram (default: 0.995)
    pub key_decay: f32,

    /// Consecutive wins a new live key needs before it is displayed (default: 15)
    pub key_stability_updates: u32,

    /// Observations the histogram key needs before estimating (default: 10)
    pub min_key_observations: usize,

    /// Register thresholds used for the live voice label (default: Male)
    pub register_profile: RegisterProfile,

    // Offline vocal scan
    /// Band-pass the buffer before the vocal range scan (default: true)
    pub vocal_band_filter: bool,

    /// Vocal band (high-pass, low-pass) corner frequencies (default: 150-1200 Hz)
    pub vocal_band_hz: (f32, f32),

    /// Range scan window (default: 2048)
    pub scan_window_size: usize,

    /// Range scan hop (default: 1024)
    pub scan_hop_size: usize,

    /// Lowest detected pitch counted as voice (default: 80.0 Hz)
    pub vocal_min_frequency_hz: f64,

    /// Highest detected pitch counted as voice (default: 1100.0 Hz)
    pub vocal_max_frequency_hz: f64,

    /// Drop cluster edge notes whose energy is below this fraction of the
    /// cluster's peak energy; 0.0 disables trimming (default: 0.0)
    pub range_tail_energy_ratio: f32,

    // Offline key
    /// Goertzel frame size (default: 4096)
    pub key_frame_size: usize,

    /// Goertzel hop size (default: 2048)
    pub key_hop_size: usize,

    /// Octaves probed per pitch class, inclusive (default: 2..=5)
    pub chroma_octaves: (i32, i32),

    // Tempo
    /// Rhythm band (high-pass, low-pass) corner frequencies (default: 30-200 Hz)
    pub tempo_band_hz: (f32, f32),

    /// Onset envelope frame size (default: 1024)
    pub tempo_frame_size: usize,

    /// Onset envelope hop size (default: 512)
    pub tempo_hop_size: usize,

    /// Minimum BPM (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM (default: 200.0)
    pub max_bpm: f32,

    // Scheduling
    /// Wall-clock cap per offline stage in seconds (default: 30.0)
    pub stage_timeout_seconds: f32,

    /// Frames processed between checkpoints (default: 256)
    pub checkpoint_every_frames: usize,

    /// Wall-clock work allowed between checkpoints (default: 16 ms)
    pub checkpoint_interval_ms: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_gain: 1.0,
            noise_gate_rms: 0.01,
            analysis_window_seconds: 0.0,
            pitch_algorithm: PitchAlgorithm::Autocorrelation,
            use_spectral_key_detection: true,
            silence_rms: 0.001,
            yin_threshold: 0.15,
            live_window_size: 2048,
            live_min_frequency_hz: 60.0,
            live_max_frequency_hz: 1400.0,
            ui_update_interval_ms: 50,
            key_decay: 0.995,
            key_stability_updates: 15,
            min_key_observations: 10,
            register_profile: RegisterProfile::Male,
            vocal_band_filter: true,
            vocal_band_hz: (150.0, 1200.0),
            scan_window_size: 2048,
            scan_hop_size: 1024,
            vocal_min_frequency_hz: 80.0,
            vocal_max_frequency_hz: 1100.0,
            range_tail_energy_ratio: 0.0,
            key_frame_size: 4096,
            key_hop_size: 2048,
            chroma_octaves: (2, 5),
            tempo_band_hz: (30.0, 200.0),
            tempo_frame_size: 1024,
            tempo_hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            stage_timeout_seconds: 30.0,
            checkpoint_every_frames: 256,
            checkpoint_interval_ms: 16,
        }
    }
}

impl AnalysisConfig {
    /// Reject configurations no stage can work with
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidInput(msg));

        if !self.input_gain.is_finite() || self.input_gain <= 0.0 {
            return invalid(format!("input_gain must be > 0, got {}", self.input_gain));
        }
        if !self.noise_gate_rms.is_finite() || self.noise_gate_rms < 0.0 {
            return invalid(format!("noise_gate_rms must be >= 0, got {}", self.noise_gate_rms));
        }
        if !self.silence_rms.is_finite() || self.silence_rms < 0.0 {
            return invalid(format!("silence_rms must be >= 0, got {}", self.silence_rms));
        }
        if !self.analysis_window_seconds.is_finite() || self.analysis_window_seconds < 0.0 {
            return invalid(format!(
                "analysis_window_seconds must be >= 0, got {}",
                self.analysis_window_seconds
            ));
        }
        if !(0.0..1.0).contains(&self.yin_threshold) || self.yin_threshold == 0.0 {
            return invalid(format!("yin_threshold must be in (0, 1), got {}", self.yin_threshold));
        }
        if !(0.0..=1.0).contains(&self.key_decay) || self.key_decay == 0.0 {
            return invalid(format!("key_decay must be in (0, 1], got {}", self.key_decay));
        }
        for (name, size) in [
            ("live_window_size", self.live_window_size),
            ("scan_window_size", self.scan_window_size),
            ("scan_hop_size", self.scan_hop_size),
            ("key_frame_size", self.key_frame_size),
            ("key_hop_size", self.key_hop_size),
            ("tempo_frame_size", self.tempo_frame_size),
            ("tempo_hop_size", self.tempo_hop_size),
            ("checkpoint_every_frames", self.checkpoint_every_frames),
        ] {
            if size == 0 {
                return invalid(format!("{} must be > 0", name));
            }
        }
        if self.live_window_size < 64 || self.scan_window_size < 64 {
            return invalid("pitch windows must hold at least 64 samples".to_string());
        }
        // Bounds must be finite with 0 < low < high; NaN fails every comparison
        let bad_range = |low: f64, high: f64| !(low.is_finite() && high.is_finite() && low > 0.0 && low < high);

        if bad_range(self.live_min_frequency_hz, self.live_max_frequency_hz) {
            return invalid(format!(
                "Invalid live frequency range: [{:.1}, {:.1}]",
                self.live_min_frequency_hz, self.live_max_frequency_hz
            ));
        }
        if bad_range(self.vocal_min_frequency_hz, self.vocal_max_frequency_hz) {
            return invalid(format!(
                "Invalid vocal frequency range: [{:.1}, {:.1}]",
                self.vocal_min_frequency_hz, self.vocal_max_frequency_hz
            ));
        }
        for (name, (low, high)) in [
            ("vocal_band_hz", self.vocal_band_hz),
            ("tempo_band_hz", self.tempo_band_hz),
        ] {
            if bad_range(low as f64, high as f64) {
                return invalid(format!("Invalid {}: [{:.1}, {:.1}]", name, low, high));
            }
        }
        if self.chroma_octaves.0 > self.chroma_octaves.1 {
            return invalid(format!(
                "Invalid chroma octave range: [{}, {}]",
                self.chroma_octaves.0, self.chroma_octaves.1
            ));
        }
        if bad_range(self.min_bpm as f64, self.max_bpm as f64) {
            return invalid(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            ));
        }
        if !(0.0..1.0).contains(&self.range_tail_energy_ratio) {
            return invalid(format!(
                "range_tail_energy_ratio must be in [0, 1), got {}",
                self.range_tail_energy_ratio
            ));
        }
        if !self.stage_timeout_seconds.is_finite() || self.stage_timeout_seconds <= 0.0 {
            return invalid(format!(
                "stage_timeout_seconds must be > 0, got {}",
                self.stage_timeout_seconds
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_bpm_range() {
        let config = AnalysisConfig {
            min_bpm: 200.0,
            max_bpm: 60.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_hop_rejected() {
        let config = AnalysisConfig {
            tempo_hop_size: 0,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tempo_hop_size"));
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        let cases = [
            AnalysisConfig { vocal_min_frequency_hz: f64::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { vocal_max_frequency_hz: f64::INFINITY, ..AnalysisConfig::default() },
            AnalysisConfig { live_min_frequency_hz: f64::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { live_max_frequency_hz: f64::INFINITY, ..AnalysisConfig::default() },
            AnalysisConfig { vocal_band_hz: (f32::NAN, 1000.0), ..AnalysisConfig::default() },
            AnalysisConfig { tempo_band_hz: (40.0, f32::INFINITY), ..AnalysisConfig::default() },
            AnalysisConfig { min_bpm: f32::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { max_bpm: f32::INFINITY, ..AnalysisConfig::default() },
            AnalysisConfig { silence_rms: f32::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { yin_threshold: f32::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { key_decay: f32::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { range_tail_energy_ratio: f32::NAN, ..AnalysisConfig::default() },
            AnalysisConfig { stage_timeout_seconds: f32::INFINITY, ..AnalysisConfig::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "input_gain": 2.0, "pitch_algorithm": "Yin" }"#).unwrap();
        assert_eq!(config.input_gain, 2.0);
        assert_eq!(config.pitch_algorithm, PitchAlgorithm::Yin);
        assert_eq!(config.scan_hop_size, 1024);
    }
}
