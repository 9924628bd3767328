//! Headless evolution
//!
//! This module drives evolution without any rendering:
//! - The generational loop as a tick-driven state machine
//! - Selection and breeding with shared elites
//! - Slow-motion playback snapshots for external renderers
//! - Per-generation reports and RON checkpoints

mod breeding;
mod evolution_run;
mod playback;
mod report;

pub use breeding::{breed, rank, ScoredGenome};
pub use evolution_run::{Champion, EvolutionRun, RunError, RunPhase, TickOutcome};
pub use playback::{FrameSnapshot, IndividualSnapshot, Playback};
pub use report::{save_history, Checkpoint, GenerationReport};
