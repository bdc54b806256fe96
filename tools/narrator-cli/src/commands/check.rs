//! Check external tools and credentials.

use std::path::Path;

use narrator_common::config::{config_file_path, NarratorConfig};
use narrator_render_engine::command_exists;

pub fn run(config: &NarratorConfig, config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Narrator System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[--] Config: {} (using defaults)", config_path.display());
    }
    println!("     Media dir: {}", config.media_dir.display());

    let tools = [
        ("Renderer", config.render.program.as_str()),
        ("ffmpeg", config.render.ffmpeg.as_str()),
        ("ffprobe", config.render.ffprobe.as_str()),
    ];
    let mut all_required_ok = true;
    for (label, program) in tools {
        if command_exists(program) {
            println!("[OK] {label}: {program}");
        } else {
            all_required_ok = false;
            println!("[MISSING] {label}: {program} not found on PATH");
        }
    }

    let key_env = &config.voice.api_key_env;
    let key_set = std::env::var(key_env)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);
    if key_set {
        println!("[OK] Speech API key: ${key_env} is set");
    } else {
        all_required_ok = false;
        println!("[MISSING] Speech API key: set ${key_env}");
    }
    println!(
        "     Voice: {} (model {})",
        config.voice.voice_name, config.voice.model
    );

    println!();
    if all_required_ok {
        println!("All required tools are available. Narrator is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}
