//! Combining the rendered video with the voiceover track.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use narrator_common::error::{NarratorError, NarratorResult};

/// Suffix inserted before the extension of a muxed video.
pub const MUX_SUFFIX: &str = "_WithAudio";

/// Combines one video stream with one audio stream.
pub trait Muxer: Send + Sync {
    /// Write `<video>_WithAudio.<ext>` and return its path.
    fn mux(&self, video: &Path, audio: &Path) -> NarratorResult<PathBuf>;
}

/// Output path for muxing `video`: `_WithAudio` inserted before the extension.
pub fn mux_output_path(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match video.extension() {
        Some(ext) => format!("{stem}{MUX_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{MUX_SUFFIX}"),
    };
    video.with_file_name(name)
}

/// ffmpeg arguments: copy video, encode audio to AAC, exactly one stream of each.
pub fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into()];
    args.push(video.as_os_str().to_owned());
    args.push("-i".into());
    args.push(audio.as_os_str().to_owned());
    for arg in [
        "-c:v", "copy", "-c:a", "aac", "-map", "0:v:0", "-map", "1:a:0", "-shortest",
    ] {
        args.push(arg.into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

/// Muxer running the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: PathBuf,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&self, video: &Path, audio: &Path) -> NarratorResult<PathBuf> {
        for input in [video, audio] {
            if !input.exists() {
                return Err(NarratorError::FileNotFound {
                    path: input.to_path_buf(),
                });
            }
        }

        let output = mux_output_path(video);
        let args = mux_args(video, audio, &output);
        tracing::debug!(?args, "Running ffmpeg mux");

        let out = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| NarratorError::Mux {
                exit_code: None,
                stderr: format!("failed to start {}: {e}", self.program.display()),
            })?;

        if !out.status.success() {
            return Err(NarratorError::Mux {
                exit_code: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        tracing::info!(output = %output.display(), "Muxed video and voiceover");
        Ok(output)
    }
}
