//! Append-only cue ledger writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use narrator_common::error::{NarratorError, NarratorResult};
use narrator_cue_model::cue::{cue_to_line, Cue, CueId};

/// Writes cues to a per-scene JSONL ledger.
///
/// Creating the writer truncates (or creates) the target file, so cues left
/// over from a previous run of the same scene never mix with the new run.
/// Every cue is flushed as soon as it is written; a scene that crashes
/// half-way still leaves a readable ledger.
pub struct CueWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    next_id: CueId,
}

impl CueWriter {
    /// Open the ledger at `path`, discarding any previous contents.
    pub fn create(path: impl Into<PathBuf>) -> NarratorResult<Self> {
        let path = path.into();
        let file = truncate_ledger(&path)?;
        tracing::debug!(path = %path.display(), "Cue ledger reset");

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            next_id: 1,
        })
    }

    /// Truncate the ledger again before any cue has been written.
    ///
    /// Calling this repeatedly is harmless. Once a cue has been appended the
    /// run is committed to this ledger and a reset is refused.
    pub fn reset(&mut self) -> NarratorResult<()> {
        if self.cues_written() > 0 {
            return Err(NarratorError::scene(format!(
                "cannot reset {} after {} cue(s) were written",
                self.path.display(),
                self.cues_written()
            )));
        }
        self.writer = BufWriter::new(truncate_ledger(&self.path)?);
        Ok(())
    }

    /// Assign the next id, append the cue as one JSON line, and return it.
    pub fn emit(&mut self, text: &str, start_time: f64) -> NarratorResult<Cue> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NarratorError::scene("cue text must not be empty"));
        }
        if !start_time.is_finite() || start_time < 0.0 {
            return Err(NarratorError::scene(format!(
                "cue start time must be a non-negative number, got {start_time}"
            )));
        }

        let cue = Cue::new(self.next_id, text, start_time);
        let line = cue_to_line(&cue)?;
        writeln!(self.writer, "{line}")
            .map_err(|e| NarratorError::scene(format!("Failed to write cue: {e}")))?;
        self.flush()?;

        self.next_id += 1;
        Ok(cue)
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> NarratorResult<()> {
        self.writer
            .flush()
            .map_err(|e| NarratorError::scene(format!("Failed to flush cues: {e}")))?;
        Ok(())
    }

    /// Number of cues written in this run.
    pub fn cues_written(&self) -> u32 {
        self.next_id - 1
    }

    /// Path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CueWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn truncate_ledger(path: &Path) -> NarratorResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(file)
}
