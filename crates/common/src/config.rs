//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    /// Renderer output root; ledgers, videos and the audio cache live here.
    pub media_dir: PathBuf,

    /// Speech synthesis settings.
    pub voice: VoiceDefaults,

    /// Renderer invocation settings.
    pub render: RenderDefaults,

    /// Audio assembly and verification settings.
    pub sync: SyncDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default speech synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceDefaults {
    /// Voice identifier written into new ledger headers.
    pub voice_name: String,

    /// Provider model name.
    pub model: String,

    /// HTTP endpoint of the speech service.
    pub endpoint: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Audio container requested from the provider (also the cache extension).
    pub format: String,

    /// Seconds of narration per character when a cue has no explicit wait.
    pub time_per_char: f64,

    /// Total attempts per cue, including the first.
    pub max_attempts: u32,

    /// Backoff before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,

    /// Upper bound on backoff, in milliseconds.
    pub max_backoff_ms: u64,

    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,

    /// Synthesis requests allowed in flight at once.
    pub concurrency: usize,
}

/// Default renderer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Renderer executable.
    pub program: String,

    /// Default quality flag (l, m, h, k).
    pub quality: String,

    /// ffmpeg executable.
    pub ffmpeg: String,

    /// ffprobe executable.
    pub ffprobe: String,
}

/// Voiceover assembly parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncDefaults {
    /// Allowed |video - audio| difference before a mismatch is reported.
    pub tolerance_secs: f64,

    /// Sample rate of the assembled track.
    pub sample_rate: u32,

    /// Channel count of the assembled track.
    pub channels: u16,

    /// Write an SRT file next to the muxed output.
    pub write_subtitles: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "narrator=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            voice: VoiceDefaults::default(),
            render: RenderDefaults::default(),
            sync: SyncDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            voice_name: "longlaotie".to_string(),
            model: "cosyvoice-v1".to_string(),
            endpoint: "https://dashscope.aliyuncs.com/api/v1/services/audio/tts/SpeechSynthesizer"
                .to_string(),
            api_key_env: "ALIYUNAPI".to_string(),
            format: "mp3".to_string(),
            time_per_char: 0.28,
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            request_timeout_secs: 60,
            concurrency: 1,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            program: "manim".to_string(),
            quality: "l".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Default for SyncDefaults {
    fn default() -> Self {
        Self {
            tolerance_secs: 0.5,
            sample_rate: 44_100,
            channels: 1,
            write_subtitles: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl NarratorConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Per-scene ledger path: `<media_dir>/subtitles_<SceneClass>.jsonl`.
    pub fn ledger_path(&self, scene_class: &str) -> PathBuf {
        self.media_dir.join(format!("subtitles_{scene_class}.jsonl"))
    }

    /// Directory for synthesized clips and the assembled track.
    pub fn audio_cache_dir(&self) -> PathBuf {
        self.media_dir.join("audio")
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("narrator").join("config.json")
}
