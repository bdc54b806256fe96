//! Narrator Cue Model
//!
//! Defines the data contracts shared by scenes and the voiceover pipeline:
//! - **Cues:** One narrated line with an id, voice text, and start time
//! - **Ledger header:** The rendered video and the voice to synthesize with
//! - **Ledger:** The JSON-lines file holding the header followed by every cue
//!
//! Cue start times are seconds of animation time, measured by the scene's
//! animation timer rather than by a wall clock.

pub mod cue;
pub mod ledger;

pub use cue::*;
pub use ledger::*;
