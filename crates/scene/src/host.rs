//! Hooks into the animation engine driving a scene.

use narrator_common::error::NarratorResult;

/// The part of the animation engine a narration timeline talks to.
///
/// A host replaces the on-screen caption when a cue is narrated and holds
/// the scene still while the voice line plays. The host never touches the
/// animation timer; the timeline advances it after the host returns.
pub trait SceneHost {
    /// Replace the current caption (if any) with `caption`.
    fn show_caption(&mut self, caption: &str) -> NarratorResult<()>;

    /// Hold the current frame for `secs` seconds of animation time.
    fn wait(&mut self, secs: f64) -> NarratorResult<()>;
}

/// One call received by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Caption(String),
    Wait(f64),
}

/// Host that records every call instead of drawing anything.
///
/// Used when planning a narration timeline without a renderer, and in tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Vec<HostEvent>,
    caption: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order.
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Caption currently on screen.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Total seconds the host was asked to wait.
    pub fn waited_secs(&self) -> f64 {
        self.events
            .iter()
            .map(|e| match e {
                HostEvent::Wait(secs) => *secs,
                HostEvent::Caption(_) => 0.0,
            })
            .sum()
    }
}

impl SceneHost for RecordingHost {
    fn show_caption(&mut self, caption: &str) -> NarratorResult<()> {
        tracing::trace!(caption, "Caption replaced");
        self.caption = Some(caption.to_string());
        self.events.push(HostEvent::Caption(caption.to_string()));
        Ok(())
    }

    fn wait(&mut self, secs: f64) -> NarratorResult<()> {
        self.events.push(HostEvent::Wait(secs));
        Ok(())
    }
}
