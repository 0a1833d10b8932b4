//! # Tessitura DSP
//!
//! An audio analysis engine for singers, providing real-time pitch and
//! vibrato feedback and offline key, tempo and vocal range detection.
//!
//! ## Features
//!
//! - **Live Pitch**: autocorrelation or YIN pitch with note stabilization,
//!   vibrato rate/extent and sung register per frame
//! - **Key Detection**: Goertzel chroma or pitch-class histogram with
//!   Krumhansl-Schmuckler template correlation
//! - **Tempo Detection**: energy-flux onset envelope with autocorrelation and
//!   half/double tempo disambiguation
//! - **Vocal Range**: YIN scan, MIDI clustering, tessitura and voice type
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessitura_dsp::{analyze_audio, AnalysisConfig};
//!
//! // Mono f32 samples in [-1.0, 1.0]
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let report = analyze_audio(&samples, sample_rate, AnalysisConfig::default())?;
//!
//! if let Some(key) = report.key {
//!     println!("Key: {} (confidence: {})", key.key.name(), key.confidence);
//! }
//! if let Some(tempo) = report.tempo {
//!     println!("BPM: {}", tempo.bpm);
//! }
//! println!("Voice: {}", report.voice.voice_type);
//! # Ok::<(), tessitura_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Offline: Samples → Preparing → Key → Voice Range → Tempo → Report
//! Live:    Mic blocks → Ring buffer → Gate → Pitch → Stabilizer/Vibrato/Key → Snapshot
//! ```
//!
//! Offline stages run through a [`Scheduler`] that yields, reports progress,
//! honours a [`CancellationToken`] and caps each stage's wall-clock time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::checkpoint::{CancellationToken, Progress, Scheduler, Stage};
pub use analysis::live::LiveAnalyzer;
pub use analysis::result::{
    AnalysisFlag, AnalysisMetadata, AnalysisReport, Key, KeyEstimate, LiveSnapshot, Mode,
    Register, TempoEstimate, VoiceRange, VoiceType,
};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use io::sample_buffer::SampleBuffer;

/// Main analysis function
///
/// Analyzes a mono buffer with a fresh, untriggered cancellation token and
/// the configured stage timeout. Use [`analyze_buffer`] to analyse
/// multi-channel audio, cancel from another thread or observe progress.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (8000-384000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `AnalysisReport` with key, tempo, vocal range and metadata. Results that
/// could not be determined are `None` (or instrumental) and flagged.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty or non-finite samples, an
/// unsupported sample rate or an invalid configuration
///
/// # Example
///
/// ```no_run
/// use tessitura_dsp::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100 * 30]; // 30 seconds of silence
/// let report = analyze_audio(&samples, 44100, AnalysisConfig::default())?;
/// assert!(report.voice.is_instrumental);
/// # Ok::<(), tessitura_dsp::AnalysisError>(())
/// ```
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    log::debug!("Starting audio analysis: {} samples at {} Hz", samples.len(), sample_rate);

    config.validate()?;
    let buffer = SampleBuffer::mono(samples, sample_rate)?;
    let mut scheduler = Scheduler::from_config(&config, CancellationToken::new());
    analysis::offline::analyze_buffer(&buffer, &config, &mut scheduler)
}

/// Analyse a validated buffer under a caller-provided scheduler
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration and
/// `AnalysisError::Cancelled` if the scheduler's token is triggered
///
/// # Example
///
/// ```no_run
/// use tessitura_dsp::{analyze_buffer, AnalysisConfig, CancellationToken, SampleBuffer, Scheduler};
///
/// let interleaved = vec![0.0f32; 48000 * 2 * 10];
/// let buffer = SampleBuffer::new(&interleaved, 48000, 2)?;
/// let config = AnalysisConfig::default();
/// let token = CancellationToken::new();
/// let mut scheduler = Scheduler::from_config(&config, token.clone())
///     .with_progress(|p| println!("{}: {:.0}%", p.label, p.fraction * 100.0));
///
/// let report = analyze_buffer(&buffer, &config, &mut scheduler)?;
/// # Ok::<(), tessitura_dsp::AnalysisError>(())
/// ```
pub fn analyze_buffer(
    buffer: &SampleBuffer<'_>,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<AnalysisReport, AnalysisError> {
    analysis::offline::analyze_buffer(buffer, config, scheduler)
}
