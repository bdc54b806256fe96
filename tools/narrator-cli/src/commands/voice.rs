//! Add a voiceover to a rendered video from its stamped ledger.

use std::path::{Path, PathBuf};

use narrator_common::config::NarratorConfig;
use narrator_render_engine::{
    FfmpegMuxer, FfmpegTools, PipelineOptions, PipelineReport, PipelineTools, SyncVerdict,
    VoiceoverPipeline,
};
use narrator_voice::cloud::CloudSynthesizer;

pub async fn run(config: &NarratorConfig, ledger: PathBuf, keep_cache: bool) -> anyhow::Result<()> {
    println!("Adding voiceover from: {}", ledger.display());
    let report = run_pipeline(config, &ledger, keep_cache).await?;
    print_report(&report);
    Ok(())
}

/// Run the voiceover pipeline with the production synthesizer and ffmpeg tools.
pub async fn run_pipeline(
    config: &NarratorConfig,
    ledger: &Path,
    keep_cache: bool,
) -> anyhow::Result<PipelineReport> {
    let synthesizer = CloudSynthesizer::from_config(&config.voice)?;
    let media = FfmpegTools::from_config(&config.render);
    let muxer = FfmpegMuxer::new(&config.render.ffmpeg);

    let options = PipelineOptions {
        keep_cache,
        ..PipelineOptions::from_config(config)
    };
    let pipeline = VoiceoverPipeline::new(
        PipelineTools {
            synthesizer: &synthesizer,
            decoder: &media,
            probe: &media,
            encoder: &media,
            muxer: &muxer,
        },
        options,
    );

    pipeline
        .run(ledger)
        .await
        .map_err(|e| anyhow::anyhow!("Voiceover failed: {e}"))
}

pub fn print_report(report: &PipelineReport) {
    println!("  Voice: {}", report.voice_name);
    println!("  Cues: {}", report.cue_count);
    println!("  Video: {} ({:.2}s)", report.video_path.display(), report.video_secs);
    println!("  Audio: {:.2}s", report.audio_secs);
    match &report.verdict {
        SyncVerdict::Synced { drift_secs } => println!("  Sync: OK (drift {drift_secs:+.3}s)"),
        SyncVerdict::Mismatch(mismatch) => println!("  Sync: WARNING, {mismatch}"),
    }
    for overlap in &report.overlaps {
        println!(
            "  Overlap: cue {} still speaking when cue {} starts ({:.2}s)",
            overlap.earlier, overlap.later, overlap.overlap_secs
        );
    }
    if !report.truncated.is_empty() {
        println!("  Truncated at video end: cues {:?}", report.truncated);
    }
    if let Some(path) = &report.subtitles_path {
        println!("  Subtitles: {}", path.display());
    }
    println!("\nVoiceover complete: {}", report.output_path.display());
}
