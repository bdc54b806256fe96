//! Write a cue ledger from a narration script.

use std::path::PathBuf;

use narrator_common::config::NarratorConfig;
use narrator_scene::{run_script, NarrationScript, RecordingHost, TimelineContext};

pub fn run(
    config: &NarratorConfig,
    script: PathBuf,
    media_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let plan = NarrationScript::load(&script)
        .map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;

    let media_dir = media_dir.unwrap_or_else(|| config.media_dir.clone());
    let ledger = media_dir.join(format!("subtitles_{}.jsonl", plan.scene));
    let time_per_char = plan.time_per_char.unwrap_or(config.voice.time_per_char);

    println!("Planning scene: {}", plan.scene);
    println!("  Steps: {}", plan.steps.len());
    println!("  Time per char: {time_per_char}s");

    let mut ctx = TimelineContext::create(&ledger, RecordingHost::new(), time_per_char)?;
    run_script(&plan, &mut ctx)?;
    let summary = ctx.finish()?;

    println!("  Cues written: {}", summary.cues_written);
    println!("  Timeline length: {:.2}s", summary.elapsed_secs);
    println!("\nLedger written: {}", summary.ledger_path.display());
    Ok(())
}
