use std::path::PathBuf;

use narrator_cue_model::ledger::{stamp_header, LedgerContents, LoadedLedger};
use narrator_cue_model::LedgerHeader;
use narrator_scene::{run_script, NarrationScript, RecordingHost, TimelineContext};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join(name)
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn rerunning_a_scene_replaces_the_previous_ledger() {
    let dir = scratch("narrator_it_rerun");
    let ledger = dir.join("subtitles_Template.jsonl");

    let mut first = TimelineContext::create(&ledger, RecordingHost::new(), 0.28).unwrap();
    for line in ["one", "two", "three", "four", "five"] {
        first.say(line, Some(1.0)).unwrap();
    }
    first.finish().unwrap();
    assert_eq!(LedgerContents::read(&ledger).unwrap().cues.len(), 5);

    let mut second = TimelineContext::create(&ledger, RecordingHost::new(), 0.28).unwrap();
    second.say("Hello, World!", None).unwrap();
    second.finish().unwrap();

    let contents = LedgerContents::read(&ledger).unwrap();
    assert_eq!(contents.cues.len(), 1);
    assert_eq!(contents.cues[0].id, 1);
    assert_eq!(contents.cues[0].start_time, 0.0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fixture_script_produces_a_stampable_ledger() {
    let script = NarrationScript::load(fixture("scripts/riemann_sphere.json")).unwrap();
    let dir = scratch("narrator_it_fixture_script");
    let ledger = dir.join(format!("subtitles_{}.jsonl", script.scene));

    let rate = script.time_per_char.unwrap_or(0.28);
    let mut ctx = TimelineContext::create(&ledger, RecordingHost::new(), rate).unwrap();
    run_script(&script, &mut ctx).unwrap();
    let summary = ctx.finish().unwrap();
    assert_eq!(summary.cues_written as usize, script.narration_count());

    stamp_header(
        &ledger,
        &LedgerHeader::new("media/videos/riemann/480p15/RiemannSphere.mp4", "longlaotie"),
    )
    .unwrap();

    let loaded = LoadedLedger::load(&ledger).unwrap();
    loaded.ensure_valid().unwrap();
    assert_eq!(loaded.cues.len(), script.narration_count());
    assert!(loaded.last_start_secs() < summary.elapsed_secs);

    std::fs::remove_dir_all(&dir).ok();
}
