//! Duration agreement between the rendered video and its voiceover.

use std::fmt;

use narrator_common::clock::DurationDrift;

/// Largest video/audio duration difference still considered in sync.
pub const DEFAULT_TOLERANCE_SECS: f64 = 0.5;

/// Non-fatal warning: the voiceover and video lengths disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationMismatch {
    pub video_secs: f64,
    pub audio_secs: f64,
    pub tolerance_secs: f64,
}

impl DurationMismatch {
    /// Audio minus video, in seconds.
    pub fn drift_secs(&self) -> f64 {
        self.audio_secs - self.video_secs
    }
}

impl fmt::Display for DurationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "audio is {:.3}s, video is {:.3}s (off by {:.3}s, tolerance {:.3}s)",
            self.audio_secs,
            self.video_secs,
            self.drift_secs().abs(),
            self.tolerance_secs
        )
    }
}

/// Result of comparing durations.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncVerdict {
    Synced { drift_secs: f64 },
    Mismatch(DurationMismatch),
}

impl SyncVerdict {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }

    pub fn mismatch(&self) -> Option<&DurationMismatch> {
        match self {
            Self::Mismatch(m) => Some(m),
            Self::Synced { .. } => None,
        }
    }
}

/// Compare `video_secs` and `audio_secs`; synced when they differ by at
/// most `tolerance_secs`.
pub fn verify(video_secs: f64, audio_secs: f64, tolerance_secs: f64) -> SyncVerdict {
    let drift = DurationDrift {
        video_secs,
        audio_secs,
    };
    if drift.exceeds_tolerance(tolerance_secs) {
        SyncVerdict::Mismatch(DurationMismatch {
            video_secs,
            audio_secs,
            tolerance_secs,
        })
    } else {
        SyncVerdict::Synced {
            drift_secs: drift.drift_secs(),
        }
    }
}
