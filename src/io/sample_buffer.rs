//! Borrowed PCM sample buffers and overlapping analysis windows

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Lowest sample rate accepted by the engine
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest sample rate accepted by the engine
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Read-only view of caller-owned PCM samples
///
/// Samples are interleaved when `channels > 1`. The engine never mutates
/// the caller's data; every stage that needs to transform samples works on
/// its own copy.
#[derive(Debug, Clone, Copy)]
pub struct SampleBuffer<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    channels: u16,
}

impl<'a> SampleBuffer<'a> {
    /// Wrap and validate a caller buffer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the buffer is empty, the sample
    /// rate is outside 8 kHz to 384 kHz, the channel count is zero, the
    /// sample count is not a whole number of frames, or any sample is not finite.
    pub fn new(samples: &'a [f32], sample_rate: u32, channels: u16) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(AnalysisError::InvalidInput(format!(
                "Unsupported sample rate: {} Hz (expected {}-{} Hz)",
                sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }
        if channels == 0 {
            return Err(AnalysisError::InvalidInput("Channel count must be > 0".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Non-finite sample at index {}",
                pos
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Wrap a mono buffer
    pub fn mono(samples: &'a [f32], sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Raw (possibly interleaved) samples
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Restrict the view to the leading `seconds` of audio
    ///
    /// `seconds <= 0.0` keeps the whole buffer, as does a cap longer than the
    /// buffer itself.
    pub fn capped(&self, seconds: f32) -> SampleBuffer<'a> {
        if seconds <= 0.0 {
            return *self;
        }
        let max_frames = (seconds as f64 * self.sample_rate as f64) as usize;
        if max_frames >= self.frames() {
            return *self;
        }
        log::debug!(
            "Capping analysis to {:.1}s ({} of {} frames)",
            seconds,
            max_frames,
            self.frames()
        );
        SampleBuffer {
            samples: &self.samples[..max_frames.max(1) * self.channels as usize],
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Mono copy of the buffer (channel average)
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.to_vec();
        }
        downmix_interleaved(self.samples, self.channels as usize)
    }
}

/// Overlapping fixed-size windows over a mono signal
///
/// Yields `(start_index, window)` for every full window; a trailing partial
/// window is dropped.
///
/// # Example
///
/// ```
/// use tessitura_dsp::io::sample_buffer::windows;
///
/// let samples = vec![0.0f32; 10];
/// let starts: Vec<usize> = windows(&samples, 4, 2).map(|(start, _)| start).collect();
/// assert_eq!(starts, vec![0, 2, 4, 6]);
/// ```
pub fn windows(samples: &[f32], window_size: usize, hop_size: usize) -> Windows<'_> {
    Windows {
        samples,
        window_size,
        hop_size: hop_size.max(1),
        position: 0,
    }
}

/// Iterator returned by [`windows`]
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    samples: &'a [f32],
    window_size: usize,
    hop_size: usize,
    position: usize,
}

impl<'a> Windows<'a> {
    /// Total number of windows this iterator yields from the start
    pub fn count_total(&self) -> usize {
        if self.window_size == 0 || self.samples.len() < self.window_size {
            0
        } else {
            (self.samples.len() - self.window_size) / self.hop_size + 1
        }
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = (usize, &'a [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.window_size == 0 || self.position + self.window_size > self.samples.len() {
            return None;
        }
        let start = self.position;
        self.position += self.hop_size;
        Some((start, &self.samples[start..start + self.window_size]))
    }
}
