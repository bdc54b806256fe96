//! Render a scene, then add its voiceover.

use std::path::PathBuf;

use narrator_common::config::NarratorConfig;
use narrator_cue_model::cue::LedgerHeader;
use narrator_cue_model::ledger::stamp_header;
use narrator_render_engine::{
    clean_render_cache, ledger_error, ManimRenderer, Quality, RenderRequest, Renderer,
};

pub struct RenderArgs {
    pub script: PathBuf,
    pub scene: String,
    pub quality: Quality,
    pub preview: bool,
    pub force: bool,
    pub keep_cache: bool,
    pub voice: Option<String>,
    pub no_voice: bool,
}

/// Returns the renderer's exit code.
pub async fn run(config: &NarratorConfig, args: RenderArgs) -> anyhow::Result<i32> {
    let request = RenderRequest {
        script: args.script,
        scene_class: args.scene,
        quality: args.quality,
        preview: args.preview,
        force: args.force,
        media_dir: config.media_dir.clone(),
    };

    println!(
        "Rendering {} from {} ({})",
        request.scene_class,
        request.script.display(),
        request.quality.tag()
    );

    let renderer = ManimRenderer::new(&config.render.program);
    let outcome = renderer.render(&request)?;
    if !outcome.success() {
        println!(
            "Render failed (exit code {}); skipping voiceover.",
            outcome.process_exit_code()
        );
        return Ok(outcome.process_exit_code());
    }
    println!("  Video: {}", outcome.video_path.display());

    if !args.keep_cache && clean_render_cache(&outcome.video_path)? {
        println!("  Removed partial movie files");
    }

    if args.no_voice {
        return Ok(0);
    }

    let ledger = config.ledger_path(&request.scene_class);
    if !ledger.exists() {
        tracing::warn!(ledger = %ledger.display(), "Scene wrote no cue ledger");
        println!("No narration ledger at {}; nothing to voice.", ledger.display());
        return Ok(0);
    }

    let voice = args
        .voice
        .unwrap_or_else(|| config.voice.voice_name.clone());
    stamp_header(&ledger, &LedgerHeader::new(&outcome.video_path, voice)).map_err(ledger_error)?;
    tracing::debug!(ledger = %ledger.display(), "Ledger stamped");

    let report = super::voice::run_pipeline(config, &ledger, args.keep_cache).await?;
    super::voice::print_report(&report);
    Ok(0)
}
