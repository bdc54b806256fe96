//! PCM buffers and voiceover assembly.
//!
//! The assembled track always spans the rendered video: it starts as silence
//! of exactly the video's duration and each synthesized clip is added on top
//! at its cue's millisecond offset. Clips that overlap are summed, so both
//! remain audible; the sum is clamped to `[-1, 1]` once at the end. Samples
//! that would land past the end of the track are dropped.

use narrator_common::error::{NarratorError, NarratorResult};
use narrator_cue_model::cue::{Cue, CueId};

/// Interleaved 32-bit float PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Silence lasting `duration_secs`, rounded to the nearest frame.
    pub fn silent(duration_secs: f64, sample_rate: u32, channels: u16) -> NarratorResult<Self> {
        check_format(sample_rate, channels)?;
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(NarratorError::assembly(format!(
                "track duration must be a non-negative number, got {duration_secs}"
            )));
        }
        let frames = (duration_secs * f64::from(sample_rate)).round() as usize;
        Ok(Self {
            sample_rate,
            channels,
            samples: vec![0.0; frames * usize::from(channels)],
        })
    }

    /// Wrap interleaved samples. The sample count must be a whole number of frames.
    pub fn from_interleaved(
        sample_rate: u32,
        channels: u16,
        samples: Vec<f32>,
    ) -> NarratorResult<Self> {
        check_format(sample_rate, channels)?;
        if samples.len() % usize::from(channels) != 0 {
            return Err(NarratorError::assembly(format!(
                "{} samples do not divide into {channels} channel(s)",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Decode raw little-endian f32 PCM, as produced by `ffmpeg -f f32le`.
    pub fn from_f32le_bytes(sample_rate: u32, channels: u16, bytes: &[u8]) -> NarratorResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(NarratorError::assembly(
                "decoded audio byte length is not aligned to f32 samples",
            ));
        }
        let samples = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_interleaved(sample_rate, channels, samples)
    }

    /// Raw little-endian f32 PCM, suitable for `ffmpeg -f f32le -i pipe:0`.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 4);
        for &sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index at a millisecond offset.
    pub fn frame_at_ms(&self, ms: u64) -> usize {
        (ms * u64::from(self.sample_rate) / 1000) as usize
    }

    /// Largest absolute sample value in `[start_secs, end_secs)`.
    pub fn peak_between(&self, start_secs: f64, end_secs: f64) -> f32 {
        let rate = f64::from(self.sample_rate);
        let start = ((start_secs.max(0.0) * rate).round() as usize).min(self.frames());
        let end = ((end_secs.max(0.0) * rate).round() as usize).min(self.frames());
        if start >= end {
            return 0.0;
        }
        let ch = usize::from(self.channels);
        self.samples[start * ch..end * ch]
            .iter()
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    fn same_format(&self, other: &AudioBuffer) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }
}

fn check_format(sample_rate: u32, channels: u16) -> NarratorResult<()> {
    if sample_rate == 0 || channels == 0 {
        return Err(NarratorError::assembly(format!(
            "invalid audio format: {sample_rate} Hz, {channels} channel(s)"
        )));
    }
    Ok(())
}

/// Two cues whose clips play at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct CueOverlap {
    /// Cue whose clip was still playing.
    pub earlier: CueId,
    /// Cue whose clip started during it.
    pub later: CueId,
    pub overlap_secs: f64,
}

/// The assembled track plus timing events worth reporting.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub track: AudioBuffer,
    pub overlaps: Vec<CueOverlap>,
    /// Cues whose clip ran past the end of the track (or started after it).
    pub truncated: Vec<CueId>,
}

/// Overlay every clip onto silence lasting `total_duration_secs`.
///
/// Clips are placed at `round(start_time * 1000)` ms in the order given and
/// must already match the track's sample rate and channel count.
pub fn assemble(
    clips: &[(&Cue, &AudioBuffer)],
    total_duration_secs: f64,
    sample_rate: u32,
    channels: u16,
) -> NarratorResult<Assembly> {
    let mut track = AudioBuffer::silent(total_duration_secs, sample_rate, channels)?;
    let track_frames = track.frames();
    let ch = usize::from(channels);

    let mut overlaps = Vec::new();
    let mut truncated = Vec::new();
    // Latest clip end seen so far, with the cue that owns it.
    let mut latest_end: Option<(f64, CueId)> = None;

    for (cue, clip) in clips {
        if !track.same_format(clip) {
            return Err(NarratorError::assembly(format!(
                "clip for cue {} is {} Hz/{}ch, track is {} Hz/{}ch",
                cue.id, clip.sample_rate, clip.channels, sample_rate, channels
            )));
        }

        let start_ms = cue.start_ms();
        let start_secs = start_ms as f64 / 1000.0;
        let end_secs = start_secs + clip.duration_secs();

        if let Some((prev_end, prev_id)) = latest_end {
            if start_secs < prev_end - 1e-9 {
                overlaps.push(CueOverlap {
                    earlier: prev_id,
                    later: cue.id,
                    overlap_secs: prev_end.min(end_secs) - start_secs,
                });
            }
        }
        if latest_end.map_or(true, |(prev_end, _)| end_secs > prev_end) {
            latest_end = Some((end_secs, cue.id));
        }

        let start_frame = track.frame_at_ms(start_ms);
        let clip_frames = clip.frames();
        if start_frame + clip_frames > track_frames {
            truncated.push(cue.id);
        }
        let copy_frames = clip_frames.min(track_frames.saturating_sub(start_frame));
        if copy_frames == 0 {
            continue;
        }

        let dst = &mut track.samples[start_frame * ch..(start_frame + copy_frames) * ch];
        for (out, sample) in dst.iter_mut().zip(&clip.samples[..copy_frames * ch]) {
            *out += *sample;
        }
    }

    for sample in &mut track.samples {
        *sample = sample.clamp(-1.0, 1.0);
    }

    Ok(Assembly {
        track,
        overlaps,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RATE: u32 = 8_000;

    fn tone(secs: f64, level: f32) -> AudioBuffer {
        let frames = (secs * f64::from(RATE)).round() as usize;
        AudioBuffer::from_interleaved(RATE, 1, vec![level; frames]).unwrap()
    }

    #[test]
    fn test_track_length_follows_video_not_clips() {
        let cues = [
            Cue::new(1, "a", 0.0),
            Cue::new(2, "b", 4.0),
            Cue::new(3, "c", 8.0),
        ];
        let clip = tone(2.0, 0.25);
        let clips: Vec<(&Cue, &AudioBuffer)> = cues.iter().map(|c| (c, &clip)).collect();

        let assembly = assemble(&clips, 10.0, RATE, 1).unwrap();
        assert_eq!(assembly.track.duration_secs(), 10.0);
        assert!(assembly.overlaps.is_empty());
        assert!(assembly.truncated.is_empty());

        let short = assemble(&clips, 5.0, RATE, 1).unwrap();
        assert_eq!(short.track.duration_secs(), 5.0);
        assert_eq!(short.truncated, vec![3]);
    }

    #[test]
    fn test_clips_land_at_cue_offsets() {
        let hello = Cue::new(1, "Hello", 0.0);
        let world = Cue::new(2, "World", 3.0);
        let a = tone(1.0, 0.5);
        let b = tone(1.2, 0.5);

        let assembly = assemble(&[(&hello, &a), (&world, &b)], 6.0, RATE, 1).unwrap();
        let track = &assembly.track;
        assert_eq!(track.duration_secs(), 6.0);
        assert!(track.peak_between(0.0, 1.0) > 0.4);
        assert_eq!(track.peak_between(1.0, 3.0), 0.0);
        assert!(track.peak_between(3.0, 4.2) > 0.4);
        assert_eq!(track.peak_between(4.2, 6.0), 0.0);
    }

    #[test]
    fn test_overlapping_clips_are_mixed_and_reported() {
        let first = Cue::new(1, "long", 0.0);
        let second = Cue::new(2, "short", 1.0);
        let a = tone(2.0, 0.3);
        let b = tone(0.5, 0.4);

        let assembly = assemble(&[(&first, &a), (&second, &b)], 3.0, RATE, 1).unwrap();
        assert_eq!(assembly.overlaps.len(), 1);
        let overlap = &assembly.overlaps[0];
        assert_eq!((overlap.earlier, overlap.later), (1, 2));
        assert!((overlap.overlap_secs - 0.5).abs() < 1e-9);

        // Both clips audible where they overlap.
        let mixed = assembly.track.samples[(1.2 * f64::from(RATE)) as usize];
        assert!((mixed - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_mix_is_clamped() {
        let first = Cue::new(1, "a", 0.0);
        let second = Cue::new(2, "b", 0.0);
        let loud = tone(1.0, 0.8);
        let assembly = assemble(&[(&first, &loud), (&second, &loud)], 1.0, RATE, 1).unwrap();
        assert_eq!(assembly.track.peak_between(0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clip_starting_past_end_is_truncated_not_error() {
        let late = Cue::new(1, "late", 9.0);
        let clip = tone(1.0, 0.5);
        let assembly = assemble(&[(&late, &clip)], 4.0, RATE, 1).unwrap();
        assert_eq!(assembly.truncated, vec![1]);
        assert_eq!(assembly.track.peak_between(0.0, 4.0), 0.0);
    }

    #[test]
    fn test_format_mismatch_is_rejected() {
        let cue = Cue::new(1, "a", 0.0);
        let stereo = AudioBuffer::from_interleaved(RATE, 2, vec![0.1; 200]).unwrap();
        assert!(assemble(&[(&cue, &stereo)], 1.0, RATE, 1).is_err());
    }

    #[test]
    fn test_stereo_frames_and_offsets() {
        let cue = Cue::new(1, "a", 0.5);
        let clip = AudioBuffer::from_interleaved(RATE, 2, vec![0.2; 2 * 800]).unwrap();
        let assembly = assemble(&[(&cue, &clip)], 1.0, RATE, 2).unwrap();
        assert_eq!(assembly.track.frames(), RATE as usize);
        assert_eq!(assembly.track.peak_between(0.0, 0.5), 0.0);
        assert!(assembly.track.peak_between(0.5, 0.6) > 0.1);
    }

    #[test]
    fn test_f32le_roundtrip_and_alignment() {
        let buffer = AudioBuffer::from_interleaved(RATE, 1, vec![0.0, 0.5, -0.25]).unwrap();
        let bytes = buffer.to_f32le_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(AudioBuffer::from_f32le_bytes(RATE, 1, &bytes).unwrap(), buffer);
        assert!(AudioBuffer::from_f32le_bytes(RATE, 1, &bytes[..5]).is_err());
        assert!(AudioBuffer::from_f32le_bytes(RATE, 2, &bytes).is_err());
    }

    #[test]
    fn test_invalid_silence_rejected() {
        assert!(AudioBuffer::silent(-1.0, RATE, 1).is_err());
        assert!(AudioBuffer::silent(f64::NAN, RATE, 1).is_err());
        assert!(AudioBuffer::silent(1.0, 0, 1).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_track_length_and_range_hold(
            total in 0.0f64..20.0,
            placements in prop::collection::vec((0.0f64..25.0, 0.0f64..4.0, -1.0f32..1.0), 0..8)
        ) {
            let rate = 1_000;
            let mut starts: Vec<f64> = placements.iter().map(|p| p.0).collect();
            starts.sort_by(|a, b| a.total_cmp(b));
            let cues: Vec<Cue> = starts
                .iter()
                .enumerate()
                .map(|(i, start)| Cue::new(i as u32 + 1, "x", *start))
                .collect();
            let clips: Vec<AudioBuffer> = placements
                .iter()
                .map(|(_, secs, level)| {
                    let frames = (secs * f64::from(rate)).round() as usize;
                    AudioBuffer::from_interleaved(rate, 1, vec![*level; frames]).unwrap()
                })
                .collect();
            let pairs: Vec<(&Cue, &AudioBuffer)> = cues.iter().zip(clips.iter()).collect();

            let assembly = assemble(&pairs, total, rate, 1).unwrap();
            prop_assert_eq!(
                assembly.track.frames(),
                (total * f64::from(rate)).round() as usize
            );
            prop_assert!(assembly.track.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
    }
}
