//! Narrator CLI: render narrated scenes and add synthesized voiceovers.
//!
//! Usage:
//!   narrator render <SCRIPT> <SCENE>   Render a scene, then add its voiceover
//!   narrator voice <LEDGER>            Add a voiceover from a stamped ledger
//!   narrator plan <SCRIPT.json>        Write a cue ledger from a narration script
//!   narrator info <LEDGER>             Show ledger contents
//!   narrator validate <LEDGER>         Check ledger invariants
//!   narrator subtitles <LEDGER> -o F   Export SRT/VTT subtitles from a ledger
//!   narrator check                     Check external tools and credentials

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use narrator_common::config::NarratorConfig;
use narrator_render_engine::Quality;

mod commands;

#[derive(Parser)]
#[command(
    name = "narrator",
    about = "Narrated animation scenes with timed voiceover and subtitles",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Render quality flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QualityArg {
    /// 480p15
    L,
    /// 720p30
    M,
    /// 1080p60
    H,
    /// 2160p60
    K,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::L => Quality::Low,
            QualityArg::M => Quality::Medium,
            QualityArg::H => Quality::High,
            QualityArg::K => Quality::FourK,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene and add its voiceover
    Render {
        /// Scene source file passed to the renderer
        script: PathBuf,

        /// Scene class to render
        scene: String,

        /// Render quality
        #[arg(short, long, value_enum)]
        quality: Option<QualityArg>,

        /// Open the video when rendering finishes
        #[arg(short, long)]
        preview: bool,

        /// Re-render even if cached output exists
        #[arg(short, long)]
        force: bool,

        /// Keep partial movie files and the audio cache
        #[arg(short = 'k', long)]
        keep_cache: bool,

        /// Voice to synthesize with (defaults to the configured voice)
        #[arg(long)]
        voice: Option<String>,

        /// Render only; skip the voiceover
        #[arg(long)]
        no_voice: bool,
    },

    /// Add a voiceover to a rendered video using its stamped ledger
    Voice {
        /// Path to the ledger (subtitles_<Scene>.jsonl)
        ledger: PathBuf,

        /// Keep synthesized clips and the assembled track
        #[arg(short = 'k', long)]
        keep_cache: bool,
    },

    /// Write a cue ledger from a narration script without rendering
    Plan {
        /// Narration script (JSON)
        script: PathBuf,

        /// Media directory the ledger is written to
        #[arg(long)]
        media_dir: Option<PathBuf>,
    },

    /// Show ledger information
    Info {
        /// Path to the ledger
        ledger: PathBuf,
    },

    /// Validate a ledger
    Validate {
        /// Path to the ledger
        ledger: PathBuf,
    },

    /// Export subtitles from a ledger
    Subtitles {
        /// Path to the ledger
        ledger: PathBuf,

        /// Output file; `.vtt` writes WebVTT, anything else SRT
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check external tools and credentials
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NarratorConfig::load_from(path),
        None => NarratorConfig::load(),
    };
    narrator_common::logging::init_cli_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Render {
            script,
            scene,
            quality,
            preview,
            force,
            keep_cache,
            voice,
            no_voice,
        } => {
            let quality = match quality {
                Some(q) => Quality::from(q),
                None => config.render.quality.parse()?,
            };
            let code = commands::render::run(
                &config,
                commands::render::RenderArgs {
                    script,
                    scene,
                    quality,
                    preview,
                    force,
                    keep_cache,
                    voice,
                    no_voice,
                },
            )
            .await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Voice { ledger, keep_cache } => {
            commands::voice::run(&config, ledger, keep_cache).await
        }
        Commands::Plan { script, media_dir } => commands::plan::run(&config, script, media_dir),
        Commands::Info { ledger } => commands::info::run(ledger),
        Commands::Validate { ledger } => commands::validate::run(ledger),
        Commands::Subtitles { ledger, output } => {
            commands::subtitles::run(&config, ledger, output)
        }
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
    }
}
