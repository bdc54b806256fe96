//! ffmpeg/ffprobe backed media tools.
//!
//! Every tool is invoked with an explicit argument list; nothing goes
//! through a shell.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use narrator_common::config::RenderDefaults;
use narrator_common::error::{NarratorError, NarratorResult};
use narrator_voice::mix::AudioBuffer;
use narrator_voice::synth::ClipDecoder;

/// Reads the duration of a media file.
pub trait MediaProbe: Send + Sync {
    fn duration_secs(&self, path: &Path) -> NarratorResult<f64>;
}

/// Encodes a PCM track to a compressed audio file.
pub trait AudioEncoder: Send + Sync {
    fn encode(&self, track: &AudioBuffer, output: &Path) -> NarratorResult<()>;
}

/// Media tools backed by the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(render: &RenderDefaults) -> Self {
        Self::new(&render.ffmpeg, &render.ffprobe)
    }
}

impl MediaProbe for FfmpegTools {
    fn duration_secs(&self, path: &Path) -> NarratorResult<f64> {
        if !path.exists() {
            return Err(NarratorError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let out = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| NarratorError::media(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(NarratorError::media(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        let secs = parse_probe_duration(&out.stdout)?;
        tracing::debug!(path = %path.display(), duration_secs = secs, "Probed duration");
        Ok(secs)
    }
}

impl ClipDecoder for FfmpegTools {
    fn decode(&self, path: &Path, sample_rate: u32, channels: u16) -> NarratorResult<AudioBuffer> {
        let out = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vn", "-f", "f32le", "-acodec", "pcm_f32le", "-ac"])
            .arg(channels.to_string())
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg("pipe:1")
            .output()
            .map_err(|e| {
                NarratorError::media(format!("failed to run ffmpeg for audio decode: {e}"))
            })?;

        if !out.status.success() {
            return Err(NarratorError::media(format!(
                "ffmpeg audio decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        AudioBuffer::from_f32le_bytes(sample_rate, channels, &out.stdout)
    }
}

impl AudioEncoder for FfmpegTools {
    fn encode(&self, track: &AudioBuffer, output: &Path) -> NarratorResult<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut child = Command::new(&self.ffmpeg)
            .args(encode_args(track.sample_rate, track.channels, output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NarratorError::media(format!("failed to start ffmpeg: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| NarratorError::media("failed to capture ffmpeg stderr"))?;
        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = std::io::BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&track.to_f32le_bytes()),
            None => Err(std::io::Error::other("ffmpeg stdin unavailable")),
        };

        let status = child
            .wait()
            .map_err(|e| NarratorError::media(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(NarratorError::media(format!(
                "ffmpeg audio encode failed (status {status}): {}",
                stderr_output.trim()
            )));
        }
        write_result
            .map_err(|e| NarratorError::media(format!("failed to stream PCM to ffmpeg: {e}")))?;

        tracing::info!(
            path = %output.display(),
            duration_secs = track.duration_secs(),
            "Encoded voiceover track"
        );
        Ok(())
    }
}

/// ffmpeg arguments that read raw f32le PCM from stdin and write `output`.
pub fn encode_args(sample_rate: u32, channels: u16, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "f32le".to_string(),
        "-ar".to_string(),
        sample_rate.to_string(),
        "-ac".to_string(),
        channels.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Extract `format.duration` from `ffprobe -print_format json -show_format`.
pub fn parse_probe_duration(stdout: &[u8]) -> NarratorResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| NarratorError::media(format!("ffprobe json parse failed: {e}")))?;
    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| NarratorError::media("missing duration from ffprobe"))?;
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| NarratorError::media(format!("invalid duration from ffprobe: {raw}")))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(NarratorError::media(format!("invalid duration from ffprobe: {raw}")));
    }
    Ok(secs)
}

/// Whether `binary` resolves to an executable, either as a path or on `PATH`.
pub fn command_exists(binary: impl AsRef<Path>) -> bool {
    let binary = binary.as_ref();
    if binary.components().count() > 1 {
        return binary.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = br#"{"format": {"filename": "a.mp4", "duration": "6.000000"}}"#;
        assert_eq!(parse_probe_duration(json).unwrap(), 6.0);
    }

    #[test]
    fn test_parse_probe_duration_missing_or_bad() {
        assert!(parse_probe_duration(br#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration(br#"{}"#).is_err());
        assert!(parse_probe_duration(br#"{"format": {"duration": "N/A"}}"#).is_err());
        assert!(parse_probe_duration(b"not json").is_err());
    }

    #[test]
    fn test_encode_args_read_pcm_from_stdin() {
        let args = encode_args(44_100, 1, Path::new("media/audio/full_audio.mp3"));
        let joined = args.join(" ");
        assert!(joined.contains("-f f32le -ar 44100 -ac 1 -i pipe:0"));
        assert_eq!(args.last().map(String::as_str), Some("media/audio/full_audio.mp3"));
        assert_eq!(args[0], "-y");
    }

    #[test]
    fn test_command_exists_for_missing_binary() {
        assert!(!command_exists("narrator-definitely-not-a-real-binary"));
        assert!(!command_exists("/nonexistent/dir/ffmpeg"));
    }

    #[test]
    fn test_probe_missing_file() {
        let err = FfmpegTools::default()
            .duration_secs(Path::new("/nonexistent/narrator/video.mp4"))
            .unwrap_err();
        assert!(matches!(err, NarratorError::FileNotFound { .. }));
    }
}
