//! Declarative narration scripts.
//!
//! A script lists the narrated lines and timed actions of a scene so its cue
//! ledger can be produced without running the animation engine:
//!
//! ```json
//! {
//!   "scene": "RiemannSphere",
//!   "steps": [
//!     {"narrate": {"caption": "z \\mapsto P", "voice": "Project the plane onto the sphere"}},
//!     {"play": {"label": "trace real axis", "run_time": 1.2}},
//!     {"narrate": {"caption": "Thanks!", "voice": "Thanks for watching!", "wait": 3.0}},
//!     {"wait": {"secs": 1.0}}
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use narrator_common::error::{NarratorError, NarratorResult};

use crate::host::SceneHost;
use crate::timeline::TimelineContext;

/// A scene's narration plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationScript {
    /// Scene class name; names the ledger file.
    pub scene: String,

    /// Overrides the configured seconds-per-character estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_per_char: Option<f64>,

    pub steps: Vec<ScriptStep>,
}

/// One entry of a narration script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Show a caption and narrate a voice line.
    Narrate {
        caption: String,
        /// Spoken text; defaults to the caption.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wait: Option<f64>,
    },

    /// A visual action of known duration.
    Play {
        #[serde(default)]
        label: String,
        run_time: f64,
    },

    /// Hold the scene still.
    Wait { secs: f64 },
}

impl NarrationScript {
    /// Load a script from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> NarratorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NarratorError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let script: Self = serde_json::from_str(&content)?;
        if script.scene.trim().is_empty() {
            return Err(NarratorError::scene(format!(
                "script {} has an empty scene name",
                path.display()
            )));
        }
        Ok(script)
    }

    /// Number of narrated steps.
    pub fn narration_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ScriptStep::Narrate { .. }))
            .count()
    }
}

/// Replay every step of `script` through `ctx`.
pub fn run_script<H: SceneHost>(
    script: &NarrationScript,
    ctx: &mut TimelineContext<H>,
) -> NarratorResult<()> {
    for (index, step) in script.steps.iter().enumerate() {
        let result = match step {
            ScriptStep::Narrate {
                caption,
                voice,
                wait,
            } => {
                let voice = voice.as_deref().unwrap_or(caption);
                ctx.narrate(caption, voice, *wait).map(|_| ())
            }
            ScriptStep::Play { label, run_time } => {
                tracing::trace!(label = %label, run_time, "Scripted action");
                ctx.play(*run_time).map(|_| ())
            }
            ScriptStep::Wait { secs } => ctx.wait(*secs).map(|_| ()),
        };
        result.map_err(|e| {
            NarratorError::scene(format!("step {} of scene {}: {e}", index + 1, script.scene))
        })?;
    }
    Ok(())
}
