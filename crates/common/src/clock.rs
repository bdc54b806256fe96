//! Timing utilities for cue scheduling and audio/video synchronization.
//!
//! Narrated scenes do not run in real time: the renderer decides how long
//! each animation lasts, so the scene keeps its own running total of
//! animation seconds. This module provides:
//! - The animation timer used to stamp cue start times
//! - Second/millisecond conversions used when placing clips
//! - Duration drift between the rendered video and the assembled audio
//! - A wall-clock anchored run clock for pipeline stage timing

use std::time::Instant;

use crate::error::{NarratorError, NarratorResult};

/// Running total of animation seconds for one scene run.
///
/// The timer only moves forward. Callers advance it after every visual
/// action and every wait; new cues are stamped with [`AnimationTimer::elapsed_secs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationTimer {
    elapsed_secs: f64,
}

impl AnimationTimer {
    /// Create a timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of animation elapsed so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Advance the timer by `secs` and return the new total.
    ///
    /// Negative and non-finite amounts are rejected and leave the timer
    /// untouched.
    pub fn advance(&mut self, secs: f64) -> NarratorResult<f64> {
        if !secs.is_finite() {
            return Err(NarratorError::timer(format!(
                "cannot advance animation timer by non-finite amount {secs}"
            )));
        }
        if secs < 0.0 {
            return Err(NarratorError::timer(format!(
                "cannot advance animation timer backwards by {secs}s"
            )));
        }
        self.elapsed_secs += secs;
        Ok(self.elapsed_secs)
    }
}

/// Convert seconds to whole milliseconds, rounding to nearest.
pub fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

/// Drift between the rendered video and the assembled voiceover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationDrift {
    /// Duration of the rendered video (reference stream), seconds.
    pub video_secs: f64,
    /// Duration of the assembled audio (measured stream), seconds.
    pub audio_secs: f64,
}

impl DurationDrift {
    /// Signed drift in seconds (positive = audio is longer).
    pub fn drift_secs(&self) -> f64 {
        self.audio_secs - self.video_secs
    }

    /// Absolute difference in seconds.
    pub fn abs_diff_secs(&self) -> f64 {
        self.drift_secs().abs()
    }

    /// Whether drift exceeds an acceptable tolerance.
    pub fn exceeds_tolerance(&self, tolerance_secs: f64) -> bool {
        self.abs_diff_secs() > tolerance_secs
    }
}

/// Clock for timing a pipeline run, anchored to a wall-clock start.
#[derive(Debug, Clone)]
pub struct RunClock {
    epoch: Instant,
    started_at: String,
}

impl RunClock {
    /// Start a run clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock start time (RFC 3339).
    pub fn started_at(&self) -> &str {
        &self.started_at
    }
}
