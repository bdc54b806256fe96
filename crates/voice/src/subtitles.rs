//! Subtitle generation in SRT and VTT formats.

use std::path::Path;

use narrator_common::error::NarratorResult;
use narrator_cue_model::cue::Cue;

use crate::synth::SynthesizedClip;

/// One timed subtitle line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Segments timed by the synthesized clips: each line lasts as long as its
/// audio, cut at `track_secs` when given.
pub fn segments_from_clips(
    clips: &[SynthesizedClip],
    track_secs: Option<f64>,
) -> Vec<SubtitleSegment> {
    clips
        .iter()
        .filter_map(|clip| {
            let start_secs = clip.cue.start_time;
            let mut end_secs = clip.end_secs();
            if let Some(limit) = track_secs {
                if start_secs >= limit {
                    return None;
                }
                end_secs = end_secs.min(limit);
            }
            Some(SubtitleSegment {
                start_secs,
                end_secs,
                text: clip.cue.text.clone(),
            })
        })
        .collect()
}

/// Segments from a bare ledger: each line runs until the next cue starts.
/// The last line runs for `last_secs`.
pub fn segments_from_cues(cues: &[Cue], last_secs: f64) -> Vec<SubtitleSegment> {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            let end_secs = match cues.get(i + 1) {
                Some(next) => next.start_time.max(cue.start_time),
                None => cue.start_time + last_secs.max(0.0),
            };
            SubtitleSegment {
                start_secs: cue.start_time,
                end_secs,
                text: cue.text.clone(),
            }
        })
        .collect()
}

/// Generate SRT subtitle content.
pub fn generate_srt(segments: &[SubtitleSegment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(segment.start_secs),
            format_srt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content.
pub fn generate_vtt(segments: &[SubtitleSegment]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for segment in segments {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(segment.start_secs),
            format_vtt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

fn split_ms(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save subtitles to a file; `.vtt` selects WebVTT, anything else SRT.
pub fn save_subtitles(segments: &[SubtitleSegment], path: &Path) -> NarratorResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(segments),
        _ => generate_srt(segments),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::AudioBuffer;
    use std::path::PathBuf;

    fn clip(id: u32, text: &str, start: f64, secs: f64) -> SynthesizedClip {
        let frames = (secs * 1000.0).round() as usize;
        SynthesizedClip {
            cue: Cue::new(id, text, start),
            path: PathBuf::from(format!("audio_{:03}.mp3", id - 1)),
            encoded_len: 0,
            pcm: AudioBuffer::from_interleaved(1000, 1, vec![0.0; frames]).unwrap(),
        }
    }

    #[test]
    fn test_srt_generation() {
        let segments = vec![
            SubtitleSegment {
                start_secs: 0.0,
                end_secs: 2.5,
                text: "Hello world".to_string(),
            },
            SubtitleSegment {
                start_secs: 3.0,
                end_secs: 5.0,
                text: "This is a test".to_string(),
            },
        ];

        let srt = generate_srt(&segments);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500\nHello world"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test"));
    }

    #[test]
    fn test_vtt_generation() {
        let segments = vec![SubtitleSegment {
            start_secs: 61.5,
            end_secs: 63.0,
            text: "One minute in".to_string(),
        }];

        let vtt = generate_vtt(&segments);
        assert!(vtt.starts_with("WEBVTT\n"));
        assert!(vtt.contains("00:01:01.500 --> 00:01:03.000"));
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
        assert_eq!(format_vtt_time(3661.5), "01:01:01.500");
        assert_eq!(format_srt_time(4.2), "00:00:04,200");
    }

    #[test]
    fn test_clip_segments_use_audio_length() {
        let clips = vec![clip(1, "Hello", 0.0, 1.0), clip(2, "World", 3.0, 1.2)];
        let segments = segments_from_clips(&clips, None);
        assert_eq!(segments[0].end_secs, 1.0);
        assert!((segments[1].end_secs - 4.2).abs() < 1e-9);

        let srt = generate_srt(&segments);
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:04,200\nWorld"));
    }

    #[test]
    fn test_clip_segments_cut_at_track_end() {
        let clips = vec![clip(1, "a", 0.0, 3.0), clip(2, "b", 5.0, 1.0)];
        let segments = segments_from_clips(&clips, Some(2.0));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end_secs, 2.0);
    }

    #[test]
    fn test_cue_segments_run_to_next_cue() {
        let cues = vec![Cue::new(1, "Hello", 0.0), Cue::new(2, "World", 3.0)];
        let segments = segments_from_cues(&cues, 2.0);
        assert_eq!(segments[0].end_secs, 3.0);
        assert_eq!(segments[1].end_secs, 5.0);
    }

    #[test]
    fn test_save_picks_format_from_extension() {
        let dir = std::env::temp_dir().join("narrator_test_subtitles_save");
        let _ = std::fs::remove_dir_all(&dir);
        let segments = segments_from_cues(&[Cue::new(1, "Hi", 0.0)], 1.0);

        save_subtitles(&segments, &dir.join("out.vtt")).unwrap();
        save_subtitles(&segments, &dir.join("out.srt")).unwrap();
        assert!(std::fs::read_to_string(dir.join("out.vtt"))
            .unwrap()
            .starts_with("WEBVTT"));
        assert!(std::fs::read_to_string(dir.join("out.srt"))
            .unwrap()
            .starts_with("1\n"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
