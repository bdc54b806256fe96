//! Invoking the animation renderer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use narrator_common::error::{NarratorError, NarratorResult};

/// Output root the renderer uses when no `--media_dir` is given.
pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Render quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "l")]
    Low,
    #[serde(rename = "m")]
    Medium,
    #[serde(rename = "h")]
    High,
    #[serde(rename = "k")]
    FourK,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Self::Low, Self::Medium, Self::High, Self::FourK];

    /// Single-letter flag value passed to the renderer.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Low => "l",
            Self::Medium => "m",
            Self::High => "h",
            Self::FourK => "k",
        }
    }

    /// Output directory name the renderer uses for this preset.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
            Self::FourK => "2160p60",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

impl FromStr for Quality {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.flag() == s.trim())
            .ok_or_else(|| {
                NarratorError::config(format!("unknown quality '{s}', expected l, m, h or k"))
            })
    }
}

/// One scene render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub script: PathBuf,
    pub scene_class: String,
    pub quality: Quality,
    /// Open the result when done.
    pub preview: bool,
    /// Re-render even when cached output exists.
    pub force: bool,
    pub media_dir: PathBuf,
}

impl RenderRequest {
    pub fn new(script: impl Into<PathBuf>, scene_class: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            scene_class: scene_class.into(),
            quality: Quality::default(),
            preview: false,
            force: false,
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
        }
    }

    /// Renderer arguments:
    /// `-q<quality> [-p] [-f] [--media_dir <dir>] <script> <SceneClass>`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![format!("-q{}", self.quality.flag())];
        if self.preview {
            args.push("-p".to_string());
        }
        if self.force {
            args.push("-f".to_string());
        }
        if self.media_dir.as_path() != Path::new(DEFAULT_MEDIA_DIR) {
            args.push("--media_dir".to_string());
            args.push(self.media_dir.to_string_lossy().into_owned());
        }
        args.push(self.script.to_string_lossy().into_owned());
        args.push(self.scene_class.clone());
        args
    }

    /// Where the renderer writes the video:
    /// `<media_dir>/videos/<script_stem>/<quality_tag>/<SceneClass>.mp4`.
    pub fn expected_video_path(&self) -> PathBuf {
        let stem = self
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.media_dir
            .join("videos")
            .join(stem)
            .join(self.quality.tag())
            .join(format!("{}.mp4", self.scene_class))
    }
}

/// What a render run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    /// Renderer exit code; `None` when it was killed by a signal.
    pub exit_code: Option<i32>,
    pub video_path: PathBuf,
}

impl RenderOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit status to propagate from the CLI.
    pub fn process_exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(1)
    }
}

/// Runs the animation renderer for a scene.
pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> NarratorResult<RenderOutcome>;

    fn name(&self) -> &str;
}

/// Renderer backed by the `manim` command line.
#[derive(Debug, Clone)]
pub struct ManimRenderer {
    program: PathBuf,
}

impl Default for ManimRenderer {
    fn default() -> Self {
        Self::new("manim")
    }
}

impl ManimRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Renderer for ManimRenderer {
    fn render(&self, request: &RenderRequest) -> NarratorResult<RenderOutcome> {
        if !request.script.exists() {
            return Err(NarratorError::FileNotFound {
                path: request.script.clone(),
            });
        }

        let args = request.args();
        tracing::info!(
            program = %self.program.display(),
            ?args,
            scene = %request.scene_class,
            "Rendering scene"
        );

        // Renderer progress goes straight to the terminal.
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| {
                NarratorError::render(format!("failed to start {}: {e}", self.program.display()))
            })?;

        let outcome = RenderOutcome {
            exit_code: status.code(),
            video_path: request.expected_video_path(),
        };
        if outcome.success() {
            tracing::info!(video = %outcome.video_path.display(), "Render finished");
        } else {
            tracing::error!(status = %status, "Renderer exited with failure");
        }
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "manim"
    }
}
