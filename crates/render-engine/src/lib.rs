//! Narrator Render Engine
//!
//! Drives the animation renderer and turns its output plus a cue ledger
//! into a narrated video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! subtitles_<Scene>.jsonl ──┐
//!                           ├── Synthesize cues ── audio/audio_NNN.mp3
//!                           │          │
//! <Scene>.mp4 ── probe ─────┴── Assemble (silence + clips at cue offsets)
//!                                      │
//!                                      ├── Encode ── audio/full_audio.mp3
//!                                      │
//!                                      ├── Verify durations (warn only)
//!                                      │
//!                                      ▼
//!                          Mux ── <Scene>_WithAudio.mp4 (+ .srt)
//! ```

pub mod cache;
pub mod media;
pub mod mux;
pub mod pipeline;
pub mod renderer;
pub mod verify;

pub use cache::*;
pub use media::*;
pub use mux::*;
pub use pipeline::*;
pub use renderer::*;
pub use verify::*;
