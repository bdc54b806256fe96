//! Narrator Voice
//!
//! Turns a cue ledger into a voiceover track:
//! - **Synthesis:** Pluggable speech synthesizers, a cloud HTTP client, and retries
//! - **Mixing:** PCM buffers and additive assembly of clips at cue offsets
//! - **Subtitles:** SRT/VTT output from cue timings

pub mod cloud;
pub mod mix;
pub mod retry;
pub mod subtitles;
pub mod synth;

pub use mix::*;
pub use retry::*;
pub use subtitles::*;
pub use synth::*;
