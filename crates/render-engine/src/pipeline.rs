//! The post-render voiceover pipeline.
//!
//! Runs once per stamped ledger: synthesize every cue, lay the clips onto a
//! silent track as long as the rendered video, encode it, check the two
//! durations agree, and mux the result next to the original video.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use narrator_common::clock::RunClock;
use narrator_common::config::NarratorConfig;
use narrator_common::error::{NarratorError, NarratorResult};
use narrator_cue_model::cue::{Cue, CueId};
use narrator_cue_model::ledger::{LedgerError, LoadedLedger};
use narrator_voice::mix::{assemble, AudioBuffer, CueOverlap};
use narrator_voice::retry::RetryPolicy;
use narrator_voice::subtitles::{save_subtitles, segments_from_clips};
use narrator_voice::synth::{ClipDecoder, SpeechAdapter, SpeechSynthesizer};

use crate::cache::clean_audio_cache;
use crate::media::{AudioEncoder, MediaProbe};
use crate::mux::Muxer;
use crate::renderer::DEFAULT_MEDIA_DIR;
use crate::verify::{verify, SyncVerdict, DEFAULT_TOLERANCE_SECS};

/// File name of the assembled track inside the audio cache.
pub const FULL_AUDIO_FILE: &str = "full_audio.mp3";

/// External collaborators of the pipeline.
pub struct PipelineTools<'a> {
    pub synthesizer: &'a dyn SpeechSynthesizer,
    pub decoder: &'a dyn ClipDecoder,
    pub probe: &'a dyn MediaProbe,
    pub encoder: &'a dyn AudioEncoder,
    pub muxer: &'a dyn Muxer,
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Where clips and the assembled track are written.
    pub cache_dir: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub tolerance_secs: f64,
    pub retry: RetryPolicy,
    pub concurrency: usize,
    /// Write `<video>_WithAudio.srt` next to the muxed video.
    pub write_subtitles: bool,
    /// Leave the audio cache on disk after a successful run.
    pub keep_cache: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_MEDIA_DIR).join("audio"),
            sample_rate: 44_100,
            channels: 1,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            retry: RetryPolicy::default(),
            concurrency: 1,
            write_subtitles: true,
            keep_cache: false,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &NarratorConfig) -> Self {
        Self {
            cache_dir: config.audio_cache_dir(),
            sample_rate: config.sync.sample_rate,
            channels: config.sync.channels,
            tolerance_secs: config.sync.tolerance_secs,
            retry: RetryPolicy::from_config(&config.voice),
            concurrency: config.voice.concurrency,
            write_subtitles: config.sync.write_subtitles,
            keep_cache: false,
        }
    }
}

/// Everything a finished run produced and measured.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub ledger_path: PathBuf,
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub subtitles_path: Option<PathBuf>,
    pub voice_name: String,
    pub cue_count: usize,
    /// Measured clip durations in ledger order.
    pub clip_secs: Vec<f64>,
    pub video_secs: f64,
    pub audio_secs: f64,
    pub verdict: SyncVerdict,
    pub overlaps: Vec<CueOverlap>,
    pub truncated: Vec<CueId>,
    pub elapsed_secs: f64,
}

/// Turns a stamped ledger and its rendered video into a narrated video.
pub struct VoiceoverPipeline<'a> {
    tools: PipelineTools<'a>,
    options: PipelineOptions,
}

impl<'a> VoiceoverPipeline<'a> {
    pub fn new(tools: PipelineTools<'a>, options: PipelineOptions) -> Self {
        Self { tools, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the whole pipeline for the ledger at `ledger_path`.
    pub async fn run(&self, ledger_path: &Path) -> NarratorResult<PipelineReport> {
        let clock = RunClock::start();
        let ledger = load_ledger(ledger_path)?;
        let video_path = ledger.header.video_file.clone();
        let voice = ledger.header.voice_name.as_str();
        if ledger.cues.is_empty() {
            tracing::warn!(
                ledger = %ledger_path.display(),
                "Ledger has no cues; voiceover will be silent"
            );
        }
        tracing::info!(
            ledger = %ledger_path.display(),
            video = %video_path.display(),
            voice,
            cues = ledger.cues.len(),
            started_at = clock.started_at(),
            "Voiceover pipeline started"
        );

        std::fs::create_dir_all(&self.options.cache_dir)?;
        let adapter = SpeechAdapter::new(
            self.tools.synthesizer,
            self.tools.decoder,
            &self.options.cache_dir,
        )
        .with_retry(self.options.retry.clone())
        .with_format(self.options.sample_rate, self.options.channels)
        .with_concurrency(self.options.concurrency);
        let clips = adapter.synthesize_all(&ledger.cues, voice).await?;

        let video_secs = self.tools.probe.duration_secs(&video_path)?;
        tracing::info!(video_secs, "Rendered video measured");

        let placements: Vec<(&Cue, &AudioBuffer)> =
            clips.iter().map(|clip| (&clip.cue, &clip.pcm)).collect();
        let assembly = assemble(
            &placements,
            video_secs,
            self.options.sample_rate,
            self.options.channels,
        )?;
        for overlap in &assembly.overlaps {
            tracing::warn!(
                earlier = overlap.earlier,
                later = overlap.later,
                overlap_secs = overlap.overlap_secs,
                "Voice clips overlap; mixing both"
            );
        }
        for &id in &assembly.truncated {
            tracing::warn!(id, video_secs, "Voice clip runs past the end of the video; truncated");
        }

        let full_audio = self.options.cache_dir.join(FULL_AUDIO_FILE);
        self.tools.encoder.encode(&assembly.track, &full_audio)?;

        let audio_secs = self.tools.probe.duration_secs(&full_audio)?;
        let verdict = verify(video_secs, audio_secs, self.options.tolerance_secs);
        match &verdict {
            SyncVerdict::Synced { drift_secs } => {
                tracing::info!(video_secs, audio_secs, drift_secs, "Durations agree");
            }
            SyncVerdict::Mismatch(mismatch) => {
                tracing::warn!(%mismatch, "Voiceover and video durations disagree");
            }
        }

        let output_path = self.tools.muxer.mux(&video_path, &full_audio)?;

        let subtitles_path = if self.options.write_subtitles {
            let path = output_path.with_extension("srt");
            save_subtitles(&segments_from_clips(&clips, Some(video_secs)), &path)?;
            tracing::info!(path = %path.display(), "Subtitles written");
            Some(path)
        } else {
            None
        };

        if self.options.keep_cache {
            tracing::debug!(cache = %self.options.cache_dir.display(), "Keeping audio cache");
        } else {
            clean_audio_cache(&self.options.cache_dir)?;
        }

        let report = PipelineReport {
            ledger_path: ledger_path.to_path_buf(),
            video_path,
            output_path,
            subtitles_path,
            voice_name: voice.to_string(),
            cue_count: clips.len(),
            clip_secs: clips.iter().map(|c| c.duration_secs()).collect(),
            video_secs,
            audio_secs,
            verdict,
            overlaps: assembly.overlaps,
            truncated: assembly.truncated,
            elapsed_secs: clock.elapsed_secs(),
        };
        tracing::info!(
            output = %report.output_path.display(),
            elapsed_secs = report.elapsed_secs,
            "Voiceover pipeline finished"
        );
        Ok(report)
    }
}

/// Load a stamped ledger and enforce its invariants.
pub fn load_ledger(path: &Path) -> NarratorResult<LoadedLedger> {
    let ledger = LoadedLedger::load(path).map_err(ledger_error)?;
    ledger.ensure_valid().map_err(ledger_error)?;
    Ok(ledger)
}

/// Map a ledger failure onto the shared error type.
pub fn ledger_error(err: LedgerError) -> NarratorError {
    match err {
        LedgerError::FormatError {
            path,
            line,
            message,
        } => NarratorError::ledger_format(line, format!("{}: {message}", path.display())),
        LedgerError::IoError { path, source } if source.kind() == ErrorKind::NotFound => {
            NarratorError::FileNotFound { path }
        }
        LedgerError::IoError { source, .. } => NarratorError::Io(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_mapping() {
        let format = ledger_error(LedgerError::FormatError {
            path: PathBuf::from("subtitles_A.jsonl"),
            line: 1,
            message: "not JSON".to_string(),
        });
        assert!(matches!(format, NarratorError::LedgerFormat { line: 1, .. }));
        assert!(format.to_string().contains("subtitles_A.jsonl"));

        let missing = ledger_error(LedgerError::IoError {
            path: PathBuf::from("gone.jsonl"),
            source: std::io::Error::from(ErrorKind::NotFound),
        });
        assert!(matches!(missing, NarratorError::FileNotFound { .. }));
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = NarratorConfig::default();
        config.media_dir = PathBuf::from("out/media");
        config.sync.tolerance_secs = 0.25;
        config.voice.max_attempts = 5;
        let options = PipelineOptions::from_config(&config);
        assert_eq!(options.cache_dir, PathBuf::from("out/media/audio"));
        assert_eq!(options.tolerance_secs, 0.25);
        assert_eq!(options.retry.max_attempts, 5);
        assert!(!options.keep_cache);
    }

    #[test]
    fn test_load_ledger_rejects_out_of_order_cues() {
        let dir = std::env::temp_dir().join("narrator_test_pipeline_order");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("subtitles_X.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"video_file\":\"x.mp4\",\"voice_name\":\"v\"}\n",
                "{\"id\":1,\"text\":\"a\",\"start_time\":2.0}\n",
                "{\"id\":2,\"text\":\"b\",\"start_time\":1.0}\n",
            ),
        )
        .unwrap();
        let err = load_ledger(&path).unwrap_err();
        assert!(matches!(err, NarratorError::LedgerFormat { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
