//! Cue and ledger header types.
//!
//! Cues are written as compact JSON objects, one per line, in the order
//! the scene emitted them:
//!
//! ```text
//! {"video_file":"media/videos/demo/480p15/Demo.mp4","voice_name":"longlaotie"}
//! {"id":1,"text":"Hello","start_time":0.0}
//! {"id":2,"text":"World","start_time":3.0}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use narrator_common::clock::secs_to_ms;

/// Sequential cue identifier, starting at 1.
pub type CueId = u32;

/// One narrated line scheduled on the animation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Position in emission order, 1-based.
    pub id: CueId,

    /// Voice line sent to speech synthesis.
    pub text: String,

    /// Animation-timer value at emission, in seconds.
    pub start_time: f64,
}

impl Cue {
    pub fn new(id: CueId, text: impl Into<String>, start_time: f64) -> Self {
        Self {
            id,
            text: text.into(),
            start_time,
        }
    }

    /// Offset of this cue in the assembled track, in whole milliseconds.
    pub fn start_ms(&self) -> u64 {
        secs_to_ms(self.start_time)
    }
}

/// First record of a stamped ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerHeader {
    /// Rendered video the voiceover belongs to.
    pub video_file: PathBuf,

    /// Voice identifier passed to speech synthesis.
    pub voice_name: String,
}

impl LedgerHeader {
    pub fn new(video_file: impl Into<PathBuf>, voice_name: impl Into<String>) -> Self {
        Self {
            video_file: video_file.into(),
            voice_name: voice_name.into(),
        }
    }
}

/// Whether a raw JSON line looks like a ledger header rather than a cue.
pub fn is_header_line(line: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(line.trim()) {
        Ok(serde_json::Value::Object(map)) => map.contains_key("video_file"),
        _ => false,
    }
}

/// Serialize one cue as a single JSONL line (without trailing newline).
pub fn cue_to_line(cue: &Cue) -> Result<String, serde_json::Error> {
    serde_json::to_string(cue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_json_format() {
        let cue = Cue::new(1, "Hello", 0.0);
        let json = cue_to_line(&cue).unwrap();
        assert_eq!(json, r#"{"id":1,"text":"Hello","start_time":0.0}"#);
    }

    #[test]
    fn test_header_json_format() {
        let header = LedgerHeader::new("out.mp4", "v1");
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"video_file":"out.mp4","voice_name":"v1"}"#);
    }

    #[test]
    fn test_non_ascii_text_is_written_verbatim() {
        let cue = Cue::new(3, "谢谢观看！", 12.5);
        let json = cue_to_line(&cue).unwrap();
        assert!(json.contains("谢谢观看！"));
        let parsed: Cue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cue);
    }

    #[test]
    fn test_start_ms_rounds() {
        assert_eq!(Cue::new(1, "a", 3.0).start_ms(), 3000);
        assert_eq!(Cue::new(1, "a", 1.2346).start_ms(), 1235);
        assert_eq!(Cue::new(1, "a", 0.0).start_ms(), 0);
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header_line(r#"{"video_file":"a.mp4","voice_name":"v"}"#));
        assert!(!is_header_line(r#"{"id":1,"text":"x","start_time":0.0}"#));
        assert!(!is_header_line("not json"));
        assert!(!is_header_line(""));
    }
}
