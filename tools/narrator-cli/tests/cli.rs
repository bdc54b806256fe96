use std::path::PathBuf;
use std::process::{Command, Output};

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

fn narrator(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_narrator"))
        .args(["--config", "/nonexistent/narrator/config.json"])
        .args(args)
        .output()
        .expect("run narrator")
}

#[test]
fn plan_then_validate_and_export_subtitles() {
    let dir = scratch("narrator_it_cli_plan");
    let script = fixture("scripts/riemann_sphere.json");

    let out = narrator(&[
        "plan",
        script.to_str().unwrap(),
        "--media-dir",
        dir.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let ledger = dir.join("subtitles_RiemannSphere.jsonl");
    assert!(ledger.exists());

    let out = narrator(&["validate", ledger.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Ledger is valid."));

    let srt = dir.join("RiemannSphere.srt");
    let out = narrator(&[
        "subtitles",
        ledger.to_str().unwrap(),
        "-o",
        srt.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let content = std::fs::read_to_string(&srt).unwrap();
    assert!(content.starts_with("1\n00:00:"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn info_reports_header_and_cues() {
    let out = narrator(&["info", fixture("ledgers/two_cues.jsonl").to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Voice: v1"));
    assert!(stdout.contains("Cues: 2"));
    assert!(stdout.contains("World"));
}

#[test]
fn validate_fails_on_bad_header() {
    let out = narrator(&["validate", fixture("ledgers/bad_header.jsonl").to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn render_with_missing_script_fails() {
    let out = narrator(&["render", "/nonexistent/narrator/scene.py", "Demo", "--no-voice"]);
    assert!(!out.status.success());
}

#[cfg(unix)]
#[test]
fn render_propagates_renderer_exit_code() {
    use std::os::unix::fs::PermissionsExt;

    let dir = scratch("narrator_it_cli_render_exit");
    let renderer = dir.join("fake_manim");
    std::fs::write(&renderer, "#!/bin/sh\nexit 3\n").unwrap();
    std::fs::set_permissions(&renderer, std::fs::Permissions::from_mode(0o755)).unwrap();
    let scene = dir.join("scene.py");
    std::fs::write(&scene, "").unwrap();

    let config = dir.join("config.json");
    let body = serde_json::json!({
        "media_dir": dir.join("media"),
        "render": { "program": renderer },
    });
    std::fs::write(&config, body.to_string()).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_narrator"))
        .args(["--config", config.to_str().unwrap()])
        .args(["render", scene.to_str().unwrap(), "Demo"])
        .output()
        .expect("run narrator");
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stdout).contains("exit code 3"));
    assert!(!dir.join("media").join("subtitles_Demo.jsonl").exists());

    std::fs::remove_dir_all(&dir).ok();
}
