//! Narrator Scene Timeline
//!
//! Everything a scene needs while it is being constructed:
//! - **Writer:** Truncate-on-first-use, append-only cue ledger writer
//! - **Timeline:** The per-run context owning the animation timer and writer
//! - **Host:** Hooks into the animation engine for captions and waits
//! - **Script:** Declarative narration scripts replayed through a timeline

pub mod host;
pub mod script;
pub mod timeline;
pub mod writer;

pub use host::*;
pub use script::*;
pub use timeline::*;
pub use writer::*;
