//! The narration timeline owned by one scene run.
//!
//! A [`TimelineContext`] bundles the animation timer, the cue ledger writer
//! and the scene host. It is fully initialized on construction: the ledger is
//! reset, the timer sits at zero and the next cue id is 1. Scenes hold one
//! context per run and route every wait, every visual action, and every
//! narrated line through it so cue start times track animation time.

use std::path::{Path, PathBuf};

use narrator_common::clock::AnimationTimer;
use narrator_common::error::{NarratorError, NarratorResult};
use narrator_cue_model::cue::Cue;

use crate::host::SceneHost;
use crate::writer::CueWriter;

/// Seconds of narration per character when no explicit wait is given.
pub const DEFAULT_TIME_PER_CHAR: f64 = 0.28;

/// Estimated narration time for `voice_text`.
pub fn default_wait_secs(voice_text: &str, time_per_char: f64) -> f64 {
    voice_text.chars().count() as f64 * time_per_char
}

/// Per-run narration state for a scene.
pub struct TimelineContext<H: SceneHost> {
    timer: AnimationTimer,
    writer: CueWriter,
    host: H,
    time_per_char: f64,
}

/// What a finished scene run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSummary {
    pub ledger_path: PathBuf,
    pub cues_written: u32,
    pub elapsed_secs: f64,
}

impl<H: SceneHost> TimelineContext<H> {
    /// Start a run writing to `ledger_path`, truncating any previous ledger.
    pub fn create(
        ledger_path: impl Into<PathBuf>,
        host: H,
        time_per_char: f64,
    ) -> NarratorResult<Self> {
        if !time_per_char.is_finite() || time_per_char < 0.0 {
            return Err(NarratorError::config(format!(
                "time_per_char must be a non-negative number, got {time_per_char}"
            )));
        }

        let writer = CueWriter::create(ledger_path)?;
        tracing::info!(
            ledger = %writer.path().display(),
            time_per_char,
            "Narration timeline started"
        );

        Ok(Self {
            timer: AnimationTimer::new(),
            writer,
            host,
            time_per_char,
        })
    }

    /// Record a cue at the current animation time without touching the host.
    pub fn emit(&mut self, text: &str) -> NarratorResult<Cue> {
        self.writer.emit(text, self.timer.elapsed_secs())
    }

    /// Show `caption`, record `voice` as a cue, then hold for the narration.
    ///
    /// The hold is `wait` seconds, or the per-character estimate of the
    /// trimmed `voice` when `wait` is `None` or `Some(0.0)`. Blank voice
    /// text is rejected before the host is touched.
    pub fn narrate(
        &mut self,
        caption: &str,
        voice: &str,
        wait: Option<f64>,
    ) -> NarratorResult<Cue> {
        let voice = voice.trim();
        if voice.is_empty() {
            return Err(NarratorError::scene("cue text must not be empty"));
        }
        let hold = self.resolve_wait(voice, wait)?;

        self.host.show_caption(caption)?;
        let cue = self.emit(voice)?;
        self.host.wait(hold)?;
        self.timer.advance(hold)?;

        tracing::debug!(
            id = cue.id,
            start_time = cue.start_time,
            hold_secs = hold,
            "Cue narrated"
        );
        Ok(cue)
    }

    /// Narrate a line whose caption and voice text are the same.
    pub fn say(&mut self, text: &str, wait: Option<f64>) -> NarratorResult<Cue> {
        self.narrate(text, text, wait)
    }

    /// Account for a visual action the host already played.
    pub fn play(&mut self, run_time: f64) -> NarratorResult<f64> {
        self.timer.advance(run_time)
    }

    /// Hold the scene still for `secs` seconds.
    pub fn wait(&mut self, secs: f64) -> NarratorResult<f64> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(NarratorError::timer(format!("invalid wait of {secs}s")));
        }
        self.host.wait(secs)?;
        self.timer.advance(secs)
    }

    /// Seconds of animation elapsed so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.timer.elapsed_secs()
    }

    pub fn cues_written(&self) -> u32 {
        self.writer.cues_written()
    }

    pub fn ledger_path(&self) -> &Path {
        self.writer.path()
    }

    pub fn time_per_char(&self) -> f64 {
        self.time_per_char
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Flush the ledger and report what this run produced.
    pub fn finish(mut self) -> NarratorResult<TimelineSummary> {
        self.writer.flush()?;
        let summary = TimelineSummary {
            ledger_path: self.writer.path().to_path_buf(),
            cues_written: self.writer.cues_written(),
            elapsed_secs: self.timer.elapsed_secs(),
        };
        tracing::info!(
            ledger = %summary.ledger_path.display(),
            cues = summary.cues_written,
            elapsed_secs = summary.elapsed_secs,
            "Narration timeline finished"
        );
        Ok(summary)
    }

    fn resolve_wait(&self, voice: &str, wait: Option<f64>) -> NarratorResult<f64> {
        match wait {
            None => Ok(default_wait_secs(voice, self.time_per_char)),
            Some(secs) if secs == 0.0 => Ok(default_wait_secs(voice, self.time_per_char)),
            Some(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
            Some(secs) => Err(NarratorError::timer(format!("invalid wait of {secs}s"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEvent, RecordingHost};
    use narrator_cue_model::ledger::LedgerContents;
    use proptest::prelude::*;

    fn temp_ledger(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("subtitles_Test.jsonl")
    }

    #[test]
    fn test_default_wait_is_chars_times_rate() {
        let text = "abcdefghijklmnopqrst";
        assert_eq!(text.chars().count(), 20);
        assert!((default_wait_secs(text, 0.28) - 5.6).abs() < 1e-9);
        // Counted in characters, not bytes.
        assert!((default_wait_secs("谢谢观看！", 1.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_narrate_stamps_timer_then_advances() {
        let path = temp_ledger("narrator_test_timeline_narrate");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.28).unwrap();

        ctx.play(1.0).unwrap();
        let first = ctx.narrate("y=x^2", "Hello, World!", None).unwrap();
        assert_eq!(first.start_time, 1.0);
        let expected_hold = 13.0 * 0.28;
        assert!((ctx.elapsed_secs() - (1.0 + expected_hold)).abs() < 1e-9);

        let second = ctx.say("Next", Some(6.0)).unwrap();
        assert!((second.start_time - (1.0 + expected_hold)).abs() < 1e-9);
        assert!((ctx.elapsed_secs() - (7.0 + expected_hold)).abs() < 1e-9);

        let events = ctx.host().events();
        assert_eq!(events[0], HostEvent::Caption("y=x^2".to_string()));
        assert_eq!(ctx.host().caption(), Some("Next"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_zero_wait_uses_default() {
        let path = temp_ledger("narrator_test_timeline_zero_wait");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.5).unwrap();
        ctx.say("four", Some(0.0)).unwrap();
        assert!((ctx.elapsed_secs() - 2.0).abs() < 1e-9);
        assert!((ctx.host().waited_secs() - 2.0).abs() < 1e-9);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_rejected_wait_leaves_no_cue() {
        let path = temp_ledger("narrator_test_timeline_bad_wait");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.28).unwrap();
        assert!(ctx.say("text", Some(-1.0)).is_err());
        assert_eq!(ctx.cues_written(), 0);
        assert!(ctx.host().events().is_empty());
        assert!(ctx.wait(f64::NAN).is_err());
        assert_eq!(ctx.elapsed_secs(), 0.0);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_blank_voice_leaves_caption_untouched() {
        let path = temp_ledger("narrator_test_timeline_blank_voice");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.28).unwrap();
        assert!(ctx.narrate("Caption", "   ", None).is_err());
        assert_eq!(ctx.cues_written(), 0);
        assert!(ctx.host().events().is_empty());
        assert_eq!(ctx.elapsed_secs(), 0.0);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_default_wait_ignores_padding() {
        let path = temp_ledger("narrator_test_timeline_padding");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.5).unwrap();
        let cue = ctx.say("   four    ", None).unwrap();
        assert_eq!(cue.text, "four");
        assert!((ctx.elapsed_secs() - 2.0).abs() < 1e-9);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_invalid_time_per_char_rejected() {
        let path = temp_ledger("narrator_test_timeline_rate");
        assert!(TimelineContext::create(&path, RecordingHost::new(), -0.1).is_err());
    }

    #[test]
    fn test_finish_reports_summary() {
        let path = temp_ledger("narrator_test_timeline_finish");
        let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.28).unwrap();
        ctx.say("a", Some(2.0)).unwrap();
        ctx.wait(1.0).unwrap();
        let summary = ctx.finish().unwrap();
        assert_eq!(summary.cues_written, 1);
        assert_eq!(summary.elapsed_secs, 3.0);
        assert_eq!(summary.ledger_path, path);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[derive(Debug, Clone)]
    enum Step {
        Emit(String),
        Play(f64),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            "[a-z ]{0,12}[a-z]".prop_map(Step::Emit),
            (0.0f64..10.0).prop_map(Step::Play),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_ids_are_dense_and_start_times_track_timer(
            steps in prop::collection::vec(step_strategy(), 1..40)
        ) {
            let path = temp_ledger("narrator_test_timeline_prop");
            let mut ctx = TimelineContext::create(&path, RecordingHost::new(), 0.28).unwrap();

            let mut expected_starts = Vec::new();
            for step in &steps {
                match step {
                    Step::Emit(text) => {
                        let at = ctx.elapsed_secs();
                        let cue = ctx.emit(text).unwrap();
                        prop_assert_eq!(cue.start_time, at);
                        expected_starts.push(at);
                    }
                    Step::Play(secs) => {
                        ctx.play(*secs).unwrap();
                    }
                }
            }
            ctx.finish().unwrap();

            let contents = LedgerContents::read(&path).unwrap();
            prop_assert_eq!(contents.cues.len(), expected_starts.len());
            for (index, cue) in contents.cues.iter().enumerate() {
                prop_assert_eq!(cue.id as usize, index + 1);
                prop_assert_eq!(cue.start_time, expected_starts[index]);
            }
            prop_assert!(contents.validate().is_empty());

            std::fs::remove_dir_all(path.parent().unwrap()).ok();
        }
    }
}
