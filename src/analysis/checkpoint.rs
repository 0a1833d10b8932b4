//! Cooperative checkpoints for long offline runs
//!
//! The offline stages are plain frame loops. Each loop calls
//! [`Scheduler::tick`] once per frame; every `checkpoint_every_frames` frames
//! (or once `checkpoint_interval_ms` of work has elapsed) the scheduler
//!
//! 1. checks the [`CancellationToken`] and aborts with
//!    [`AnalysisError::Cancelled`] if it was triggered
//! 2. runs the yield hook (by default [`std::thread::yield_now`]) so the
//!    caller's thread is never monopolised for more than a bounded slice
//! 3. reports [`Progress`] through the optional progress hook
//! 4. checks the per-stage wall-clock deadline and answers
//!    [`Flow::TimedOut`] once it has passed
//!
//! A timed-out stage is not an error: the orchestrator keeps whatever the
//! stage accumulated so far and flags the report.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Shared flag a host sets to stop an offline analysis
///
/// Clones share the same flag, so one clone can be moved to a UI thread while
/// the analysis holds another.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// New, untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`CancellationToken::cancel`] was called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-stage cap; saturates instead of panicking on huge or non-finite values
fn stage_timeout(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds).unwrap_or(if seconds > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Offline analysis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Validation, gain, mono downmix and filtering
    Preparing,
    /// Chroma accumulation and key correlation
    DetectingKey,
    /// Vocal range scan
    AnalyzingVoice,
    /// Onset envelope and tempo estimation
    DetectingTempo,
    /// Flags and report assembly
    Finalizing,
}

impl Stage {
    /// Human-readable progress label
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preparing => "Preparing audio",
            Stage::DetectingKey => "Detecting key",
            Stage::AnalyzingVoice => "Analyzing voice",
            Stage::DetectingTempo => "Detecting tempo",
            Stage::Finalizing => "Finalizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress side channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Current stage
    pub stage: Stage,
    /// Completed fraction of the stage (0.0-1.0)
    pub fraction: f32,
    /// Display label of the stage
    pub label: &'static str,
}

/// Answer of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// The stage deadline has passed; stop and keep the partial result
    TimedOut,
}

type ProgressHook = Box<dyn FnMut(&Progress) + Send>;
type YieldHook = Box<dyn FnMut() + Send>;

/// Checkpoint scheduler for one offline run
pub struct Scheduler {
    token: CancellationToken,
    stage_timeout: Duration,
    every_frames: usize,
    interval: Duration,
    on_progress: Option<ProgressHook>,
    on_yield: YieldHook,
    stage: Stage,
    total: usize,
    stage_start: Instant,
    last_checkpoint: Instant,
    frames_since: usize,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("token", &self.token)
            .field("stage_timeout", &self.stage_timeout)
            .field("every_frames", &self.every_frames)
            .field("interval", &self.interval)
            .field("stage", &self.stage)
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default(), CancellationToken::new())
    }
}

impl Scheduler {
    /// Scheduler with the timeout and checkpoint cadence of `config`
    pub fn from_config(config: &AnalysisConfig, token: CancellationToken) -> Self {
        let now = Instant::now();
        Self {
            token,
            stage_timeout: stage_timeout(config.stage_timeout_seconds),
            every_frames: config.checkpoint_every_frames.max(1),
            interval: Duration::from_millis(config.checkpoint_interval_ms as u64),
            on_progress: None,
            on_yield: Box::new(std::thread::yield_now),
            stage: Stage::Preparing,
            total: 0,
            stage_start: now,
            last_checkpoint: now,
            frames_since: 0,
        }
    }

    /// Install a progress hook
    pub fn with_progress(mut self, hook: impl FnMut(&Progress) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }

    /// Replace the yield hook (e.g. to hand control to a host event loop)
    pub fn with_yield(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_yield = Box::new(hook);
        self
    }

    /// Override the per-stage wall-clock cap
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// The token this scheduler checks
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Time spent in the current stage
    pub fn stage_elapsed(&self) -> Duration {
        self.stage_start.elapsed()
    }

    /// Fail with `Cancelled` if the token was triggered
    pub fn check_cancelled(&self) -> Result<(), AnalysisError> {
        if self.token.is_cancelled() {
            log::debug!("Analysis cancelled during stage {:?}", self.stage);
            return Err(AnalysisError::Cancelled(self.stage.label().to_string()));
        }
        Ok(())
    }

    /// Enter a stage of `total` frames and restart its deadline
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token was already triggered
    pub fn begin_stage(&mut self, stage: Stage, total: usize) -> Result<(), AnalysisError> {
        self.stage = stage;
        self.total = total;
        self.frames_since = 0;
        let now = Instant::now();
        self.stage_start = now;
        self.last_checkpoint = now;

        log::debug!("Stage {:?} started ({} frames)", stage, total);
        self.check_cancelled()?;
        self.report(0.0);
        Ok(())
    }

    /// Account for one processed frame; `done` is the number of frames finished
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if a checkpoint finds the token triggered
    pub fn tick(&mut self, done: usize) -> Result<Flow, AnalysisError> {
        self.frames_since += 1;
        if self.frames_since < self.every_frames && self.last_checkpoint.elapsed() < self.interval {
            return Ok(Flow::Continue);
        }
        self.checkpoint(done)
    }

    /// Run a checkpoint immediately, regardless of cadence
    ///
    /// For bulk steps (whole-buffer filtering, correlation) that do not go
    /// through the per-frame [`Scheduler::tick`].
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token was triggered
    pub fn checkpoint_now(&mut self, done: usize) -> Result<Flow, AnalysisError> {
        self.checkpoint(done)
    }

    /// Mark the current stage complete
    pub fn finish_stage(&mut self) {
        log::debug!(
            "Stage {:?} finished in {:.1} ms",
            self.stage,
            self.stage_start.elapsed().as_secs_f64() * 1000.0
        );
        self.report(1.0);
    }

    fn checkpoint(&mut self, done: usize) -> Result<Flow, AnalysisError> {
        self.frames_since = 0;
        self.check_cancelled()?;

        (self.on_yield)();
        self.last_checkpoint = Instant::now();

        let fraction = if self.total > 0 {
            (done as f32 / self.total as f32).min(1.0)
        } else {
            0.0
        };
        self.report(fraction);

        if self.stage_start.elapsed() >= self.stage_timeout {
            log::warn!(
                "Stage {:?} exceeded its {:.1} s cap after {} of {} frames",
                self.stage,
                self.stage_timeout.as_secs_f32(),
                done,
                self.total
            );
            return Ok(Flow::TimedOut);
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, fraction: f32) {
        if let Some(hook) = self.on_progress.as_mut() {
            hook(&Progress {
                stage: self.stage,
                fraction,
                label: self.stage.label(),
            });
        }
    }
}
