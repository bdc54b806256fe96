//! Speech synthesis seam and the per-cue voiceover adapter.
//!
//! A [`SpeechSynthesizer`] turns text into encoded audio bytes. The
//! [`SpeechAdapter`] drives it for every cue of a ledger: it retries
//! transient failures, writes each clip to the audio cache as
//! `audio_NNN.<ext>`, and decodes it back to PCM so the clip's duration is
//! measured from the audio itself rather than estimated.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};

use narrator_common::error::{NarratorError, NarratorResult};
use narrator_cue_model::cue::Cue;

use crate::mix::AudioBuffer;
use crate::retry::RetryPolicy;

/// A text-to-speech provider.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice`, returning encoded audio.
    async fn synthesize(&self, text: &str, voice: &str) -> NarratorResult<Vec<u8>>;

    /// Provider name for logs.
    fn name(&self) -> &str;

    /// File extension of the encoded audio.
    fn clip_extension(&self) -> &str {
        "mp3"
    }
}

/// Decodes an encoded clip on disk to PCM.
pub trait ClipDecoder: Send + Sync {
    fn decode(&self, path: &Path, sample_rate: u32, channels: u16) -> NarratorResult<AudioBuffer>;
}

/// Cache file name for the clip of the cue at `index` (0-based).
pub fn clip_file_name(index: usize, extension: &str) -> String {
    format!("audio_{index:03}.{extension}")
}

/// One cue's synthesized audio.
#[derive(Debug, Clone)]
pub struct SynthesizedClip {
    pub cue: Cue,
    /// Encoded clip in the audio cache.
    pub path: PathBuf,
    pub encoded_len: usize,
    pub pcm: AudioBuffer,
}

impl SynthesizedClip {
    pub fn duration_secs(&self) -> f64 {
        self.pcm.duration_secs()
    }

    pub fn end_secs(&self) -> f64 {
        self.cue.start_time + self.duration_secs()
    }
}

/// Synthesizes, caches and measures the clips of a ledger.
pub struct SpeechAdapter<'a> {
    synthesizer: &'a dyn SpeechSynthesizer,
    decoder: &'a dyn ClipDecoder,
    retry: RetryPolicy,
    cache_dir: PathBuf,
    sample_rate: u32,
    channels: u16,
    concurrency: usize,
}

impl<'a> SpeechAdapter<'a> {
    pub fn new(
        synthesizer: &'a dyn SpeechSynthesizer,
        decoder: &'a dyn ClipDecoder,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            decoder,
            retry: RetryPolicy::default(),
            cache_dir: cache_dir.into(),
            sample_rate: 44_100,
            channels: 1,
            concurrency: 1,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// PCM format clips are decoded to.
    pub fn with_format(mut self, sample_rate: u32, channels: u16) -> Self {
        self.sample_rate = sample_rate;
        self.channels = channels;
        self
    }

    /// Requests allowed in flight at once. Output order never changes.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Synthesize one line, retrying transient failures.
    pub async fn synthesize(&self, text: &str, voice: &str) -> NarratorResult<Vec<u8>> {
        let label = format!("{}: {}", self.synthesizer.name(), preview(text));
        let bytes = self
            .retry
            .run(&label, |_| self.synthesizer.synthesize(text, voice))
            .await?;
        if bytes.is_empty() {
            return Err(NarratorError::synthesis(format!(
                "{} returned no audio for \"{}\"",
                self.synthesizer.name(),
                preview(text)
            )));
        }
        Ok(bytes)
    }

    /// Synthesize, cache and decode the clip for the cue at `index`.
    pub async fn synthesize_cue(
        &self,
        index: usize,
        cue: &Cue,
        voice: &str,
    ) -> NarratorResult<SynthesizedClip> {
        let bytes = self.synthesize(&cue.text, voice).await?;
        self.store(index, cue, &bytes)
    }

    /// Synthesize every cue, returning clips in ledger order.
    ///
    /// The first failure aborts the batch; clips already written stay in the
    /// cache until it is cleaned.
    pub async fn synthesize_all(
        &self,
        cues: &[Cue],
        voice: &str,
    ) -> NarratorResult<Vec<SynthesizedClip>> {
        std::fs::create_dir_all(&self.cache_dir)?;
        tracing::info!(
            provider = self.synthesizer.name(),
            cues = cues.len(),
            voice,
            concurrency = self.concurrency,
            "Synthesizing voiceover"
        );

        let encoded: Vec<(usize, &Cue, Vec<u8>)> = stream::iter(cues.iter().enumerate())
            .map(|(index, cue)| async move {
                let bytes = self.synthesize(&cue.text, voice).await.map_err(|e| {
                    tracing::error!(id = cue.id, error = %e, "Synthesis failed");
                    e
                })?;
                Ok::<_, NarratorError>((index, cue, bytes))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        encoded
            .into_iter()
            .map(|(index, cue, bytes)| self.store(index, cue, &bytes))
            .collect()
    }

    fn store(&self, index: usize, cue: &Cue, bytes: &[u8]) -> NarratorResult<SynthesizedClip> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self
            .cache_dir
            .join(clip_file_name(index, self.synthesizer.clip_extension()));
        std::fs::write(&path, bytes)?;

        let pcm = self.decoder.decode(&path, self.sample_rate, self.channels)?;
        let clip = SynthesizedClip {
            cue: cue.clone(),
            path,
            encoded_len: bytes.len(),
            pcm,
        };
        tracing::info!(
            id = cue.id,
            start_time = cue.start_time,
            duration_secs = clip.duration_secs(),
            "Clip ready"
        );
        Ok(clip)
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 32;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    }
}
