//! Show ledger information.

use std::path::PathBuf;

use narrator_cue_model::ledger::LedgerContents;

pub fn run(ledger: PathBuf) -> anyhow::Result<()> {
    let contents =
        LedgerContents::read(&ledger).map_err(|e| anyhow::anyhow!("Failed to load ledger: {e}"))?;

    println!("Ledger: {}", ledger.display());
    match &contents.header {
        Some(header) => {
            println!("  Video: {}", header.video_file.display());
            println!("  Voice: {}", header.voice_name);
        }
        None => println!("  Header: not stamped yet"),
    }
    println!();

    println!("Cues: {}", contents.cues.len());
    for cue in &contents.cues {
        println!("  #{:<3} {:>8.2}s  {}", cue.id, cue.start_time, cue.text);
    }
    if let Some(last) = contents.cues.last() {
        println!();
        println!("Last cue starts at {:.2}s", last.start_time);
    }

    Ok(())
}
