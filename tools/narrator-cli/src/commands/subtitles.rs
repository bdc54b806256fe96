//! Export subtitles from a cue ledger.

use std::path::PathBuf;

use narrator_common::config::NarratorConfig;
use narrator_cue_model::ledger::LedgerContents;
use narrator_scene::default_wait_secs;
use narrator_voice::subtitles::{save_subtitles, segments_from_cues};

pub fn run(config: &NarratorConfig, ledger: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let contents =
        LedgerContents::read(&ledger).map_err(|e| anyhow::anyhow!("Failed to load ledger: {e}"))?;
    if contents.cues.is_empty() {
        anyhow::bail!("Ledger {} has no cues", ledger.display());
    }

    let last_secs = contents
        .cues
        .last()
        .map(|cue| default_wait_secs(&cue.text, config.voice.time_per_char))
        .unwrap_or_default();
    let segments = segments_from_cues(&contents.cues, last_secs);
    save_subtitles(&segments, &output)?;

    println!(
        "Wrote {} subtitle(s) to {}",
        segments.len(),
        output.display()
    );
    Ok(())
}
