//! Validate a cue ledger.

use std::path::PathBuf;

use narrator_cue_model::ledger::LedgerContents;

pub fn run(ledger: PathBuf) -> anyhow::Result<()> {
    println!("Validating ledger at: {}", ledger.display());

    let contents =
        LedgerContents::read(&ledger).map_err(|e| anyhow::anyhow!("Failed to load ledger: {e}"))?;

    match &contents.header {
        Some(header) => println!(
            "  Header: video={} voice={}",
            header.video_file.display(),
            header.voice_name
        ),
        None => println!("  Header: missing (stamped after rendering)"),
    }
    println!("  Cues: {}", contents.cues.len());

    let errors = contents.validate();
    if errors.is_empty() {
        println!("\nLedger is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for error in &errors {
        println!("  - {error}");
    }
    anyhow::bail!("{} issue(s) found in {}", errors.len(), ledger.display())
}
