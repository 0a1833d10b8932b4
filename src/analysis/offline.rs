//! Offline (whole-buffer) analysis
//!
//! Pipeline:
//!
//! 1. **Preparing**: validate, apply the analysis window cap, downmix to mono,
//!    apply input gain
//! 2. **DetectingKey**: Goertzel chroma over the unfiltered mix (or a YIN
//!    pitch histogram when spectral detection is disabled), then
//!    Krumhansl-Schmuckler correlation
//! 3. **AnalyzingVoice**: vocal band-pass, adaptive gate, YIN range scan,
//!    MIDI clustering and voice type
//! 4. **DetectingTempo**: rhythm band-pass, energy flux envelope,
//!    autocorrelation tempo; retried once with doubled frame/hop sizes
//! 5. **Finalizing**: flags, warnings and metadata
//!
//! Every frame loop runs through the [`Scheduler`], which yields, reports
//! progress, honours cancellation and enforces the per-stage deadline. A
//! stage that times out keeps its partial result: the key and tempo become
//! unknown, the voice range is classified from the frames scanned so far.

use std::borrow::Cow;
use std::time::Instant;

use super::checkpoint::{Flow, Scheduler, Stage};
use super::confidence::assess;
use super::metadata::AnalysisMetadata;
use super::result::{AnalysisReport, KeyEstimate, TempoEstimate, VoiceRange};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chroma::{ChromaAccumulator, GoertzelChroma, PitchHistogram};
use crate::features::key::detect_key;
use crate::features::onset::EnergyFluxEnvelope;
use crate::features::period::estimate_tempo;
use crate::features::pitch::yin::YinEstimator;
use crate::features::pitch::PitchEstimator;
use crate::features::voice::VoiceRangeScanner;
use crate::io::sample_buffer::{windows, SampleBuffer};
use crate::preprocessing::filter::band_limit;
use crate::preprocessing::level::{apply_gain, rms};
use crate::preprocessing::silence::adaptive_threshold;

/// Windows quieter than this are skipped by the pitch-histogram key path
const HISTOGRAM_KEY_MIN_RMS: f32 = 0.005;

/// Pitch range accepted by the pitch-histogram key path (Hz)
const HISTOGRAM_KEY_RANGE_HZ: (f64, f64) = (60.0, 2000.0);

/// Result of one checkpointed stage
enum Outcome<T> {
    Done(T),
    TimedOut(T),
}

impl<T> Outcome<T> {
    fn timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut(_))
    }

    fn into_inner(self) -> T {
        match self {
            Outcome::Done(value) | Outcome::TimedOut(value) => value,
        }
    }
}

/// Analyse a whole buffer
///
/// # Arguments
///
/// * `buffer` - Validated sample buffer (any channel count)
/// * `config` - Analysis configuration
/// * `scheduler` - Checkpoint scheduler (cancellation, deadlines, progress)
///
/// # Returns
///
/// `AnalysisReport` with key, tempo, voice range and metadata. Unknown
/// results are `None` / instrumental and flagged, never errors.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration and
/// `AnalysisError::Cancelled` if the scheduler's token is triggered
pub fn analyze_buffer(
    buffer: &SampleBuffer<'_>,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<AnalysisReport, AnalysisError> {
    let start_time = Instant::now();
    config.validate()?;

    // Stage 1: preparation
    scheduler.begin_stage(Stage::Preparing, 1)?;
    let analyzed = buffer.capped(config.analysis_window_seconds);
    let sample_rate = analyzed.sample_rate();
    let mut mono = analyzed.to_mono();
    if (config.input_gain - 1.0).abs() > f32::EPSILON {
        apply_gain(&mut mono, config.input_gain);
    }
    log::debug!(
        "Offline analysis: {:.2}s of {:.2}s, {} Hz, {} channel(s), {} mono samples",
        analyzed.duration_seconds(),
        buffer.duration_seconds(),
        sample_rate,
        buffer.channels(),
        mono.len()
    );
    scheduler.finish_stage();

    let mut methods_used = Vec::new();
    let mut timed_out = Vec::new();

    // Stage 2: key (unfiltered mix)
    let key_outcome = if config.use_spectral_key_detection {
        methods_used.push("goertzel_chroma".to_string());
        detect_key_spectral(&mono, sample_rate, config, scheduler)?
    } else {
        methods_used.push("pitch_histogram".to_string());
        detect_key_histogram(&mono, sample_rate, config, scheduler)?
    };
    let key = if key_outcome.timed_out() {
        timed_out.push(Stage::DetectingKey);
        None
    } else {
        key_outcome.into_inner()
    };

    // Stage 3: vocal range
    methods_used.push("yin".to_string());
    let voice_outcome = scan_voice(&mono, sample_rate, config, scheduler)?;
    if voice_outcome.timed_out() {
        timed_out.push(Stage::AnalyzingVoice);
    }
    let voice = voice_outcome.into_inner();

    // Stage 4: tempo
    methods_used.push("energy_flux".to_string());
    let tempo_outcome = detect_tempo(&mono, sample_rate, config, scheduler)?;
    let tempo = if tempo_outcome.timed_out() {
        timed_out.push(Stage::DetectingTempo);
        None
    } else {
        tempo_outcome.into_inner()
    };

    // Stage 5: report
    scheduler.begin_stage(Stage::Finalizing, 1)?;
    let (flags, confidence_warnings) = assess(key.as_ref(), tempo.as_ref(), &voice, &timed_out);

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Analysis complete in {:.1} ms: key={}, tempo={}, voice={} ({} voiced frames)",
        processing_time_ms,
        key.map_or_else(|| "unknown".to_string(), |k| k.key.name()),
        tempo.map_or_else(|| "unknown".to_string(), |t| t.bpm.to_string()),
        voice.voice_type,
        voice.voiced_frames
    );

    let report = AnalysisReport {
        key,
        tempo,
        voice,
        metadata: AnalysisMetadata {
            duration_seconds: buffer.duration_seconds(),
            analyzed_seconds: analyzed.duration_seconds(),
            sample_rate,
            channels: buffer.channels(),
            processing_time_ms,
            methods_used,
            flags,
            confidence_warnings,
            ..AnalysisMetadata::default()
        },
    };
    scheduler.finish_stage();
    Ok(report)
}

/// Goertzel chroma over the whole mix
fn detect_key_spectral(
    mono: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<Outcome<Option<KeyEstimate>>, AnalysisError> {
    let frames = windows(mono, config.key_frame_size, config.key_hop_size);
    scheduler.begin_stage(Stage::DetectingKey, frames.count_total())?;

    let mut chroma = GoertzelChroma::new(sample_rate, config.chroma_octaves)?;
    for (done, (_, frame)) in frames.enumerate() {
        chroma.accumulate(frame);
        if scheduler.tick(done + 1)? == Flow::TimedOut {
            return Ok(Outcome::TimedOut(None));
        }
    }
    scheduler.finish_stage();

    log::debug!("Key chroma from {} frames", chroma.observations());
    Ok(Outcome::Done(detect_key(&chroma.chroma())))
}

/// YIN pitches of sparse windows accumulated into a pitch-class histogram
fn detect_key_histogram(
    mono: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<Outcome<Option<KeyEstimate>>, AnalysisError> {
    // Every other window: the histogram needs coverage, not overlap
    let hop = config.key_frame_size * 2;
    let frames = windows(mono, config.key_frame_size, hop);
    scheduler.begin_stage(Stage::DetectingKey, frames.count_total())?;

    let mut yin = YinEstimator::new(config.yin_threshold as f64, config.silence_rms);
    let mut histogram = PitchHistogram::counting();
    let (min_hz, max_hz) = HISTOGRAM_KEY_RANGE_HZ;

    for (done, (_, frame)) in frames.enumerate() {
        if rms(frame) > HISTOGRAM_KEY_MIN_RMS {
            if let Some(f) = yin.estimate(frame, sample_rate).frequency_hz {
                if f > min_hz && f < max_hz {
                    histogram.accumulate(&f);
                }
            }
        }
        if scheduler.tick(done + 1)? == Flow::TimedOut {
            return Ok(Outcome::TimedOut(None));
        }
    }
    scheduler.finish_stage();

    if histogram.observations() < config.min_key_observations {
        log::debug!(
            "Pitch histogram key: only {} observations (need {})",
            histogram.observations(),
            config.min_key_observations
        );
        return Ok(Outcome::Done(None));
    }
    Ok(Outcome::Done(detect_key(&histogram.chroma())))
}

/// Vocal range scan over the band-limited buffer
fn scan_voice(
    mono: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<Outcome<VoiceRange>, AnalysisError> {
    let total = windows(mono, config.scan_window_size, config.scan_hop_size).count_total();
    scheduler.begin_stage(Stage::AnalyzingVoice, total)?;

    let filtered: Cow<'_, [f32]> = if config.vocal_band_filter {
        Cow::Owned(band_limit(mono, sample_rate, config.vocal_band_hz)?)
    } else {
        Cow::Borrowed(mono)
    };
    if scheduler.checkpoint_now(0)? == Flow::TimedOut {
        return Ok(Outcome::TimedOut(VoiceRange::instrumental(0)));
    }

    let gate = adaptive_threshold(&filtered);
    let frames = windows(&filtered, config.scan_window_size, config.scan_hop_size);
    log::debug!("Vocal range scan: gate {:.4}, {} windows", gate, total);

    let mut scanner = VoiceRangeScanner::new(config, gate);
    for (done, (_, frame)) in frames.enumerate() {
        scanner.push_frame(frame, sample_rate);
        if scheduler.tick(done + 1)? == Flow::TimedOut {
            log::warn!(
                "Vocal range scan stopped after {} windows; classifying partial scan",
                scanner.frames_scanned()
            );
            return Ok(Outcome::TimedOut(scanner.finish()));
        }
    }
    scheduler.finish_stage();
    Ok(Outcome::Done(scanner.finish()))
}

/// Tempo with one fallback pass at doubled frame and hop sizes
///
/// Both passes share one stage deadline.
fn detect_tempo(
    mono: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    scheduler: &mut Scheduler,
) -> Result<Outcome<Option<TempoEstimate>>, AnalysisError> {
    let passes = [
        (config.tempo_frame_size, config.tempo_hop_size),
        (config.tempo_frame_size * 2, config.tempo_hop_size * 2),
    ];
    // Sized for both passes; a primary hit skips straight to 1.0
    let total = passes
        .iter()
        .map(|&(frame_size, hop_size)| windows(mono, frame_size, hop_size).count_total())
        .sum();
    scheduler.begin_stage(Stage::DetectingTempo, total)?;

    let rhythm = band_limit(mono, sample_rate, config.tempo_band_hz)?;
    if scheduler.checkpoint_now(0)? == Flow::TimedOut {
        return Ok(Outcome::TimedOut(None));
    }

    let mut done = 0;
    for (attempt, &(frame_size, hop_size)) in passes.iter().enumerate() {
        let frames = windows(&rhythm, frame_size, hop_size);
        if attempt > 0 {
            log::debug!(
                "No tempo at {}/{}; retrying with frame {} hop {}",
                passes[0].0,
                passes[0].1,
                frame_size,
                hop_size
            );
        }

        let mut envelope = EnergyFluxEnvelope::with_capacity(frames.count_total());
        for (_, frame) in frames {
            envelope.push(frame);
            done += 1;
            if scheduler.tick(done)? == Flow::TimedOut {
                return Ok(Outcome::TimedOut(None));
            }
        }

        let tempo = estimate_tempo(
            &envelope.finish(),
            sample_rate,
            hop_size,
            config.min_bpm,
            config.max_bpm,
        )?;
        if tempo.is_some() {
            scheduler.finish_stage();
            return Ok(Outcome::Done(tempo));
        }
        if scheduler.checkpoint_now(done)? == Flow::TimedOut {
            return Ok(Outcome::TimedOut(None));
        }
    }

    scheduler.finish_stage();
    log::debug!("Tempo undetected after fallback");
    Ok(Outcome::Done(None))
}
