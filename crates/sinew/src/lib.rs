//! Sinew: evolve neural controllers for soft-body walkers
//!
//! The creature model lives in `sinew-creature`; this crate runs the
//! genetic algorithm around it and provides configuration, demo
//! blueprints and the `sinew` command-line driver.

pub mod config;
pub mod headless;
pub mod presets;

// Re-export main types for convenience
pub use config::{EvolutionConfig, OutputConfig, PlaybackConfig, SinewConfig};
pub use headless::{EvolutionRun, GenerationReport, RunError, RunPhase, TickOutcome};
pub use presets::Preset;
pub use sinew_creature as creature;
