//! Soft-body creatures for Sinew
//!
//! This crate implements:
//! - Blueprints of point-mass nodes joined by muscles and bones
//! - A fixed-timestep mass-spring integrator with ground contact
//! - Neural controllers driven by per-node sensors
//! - Genomes with He initialization and non-destructive mutation
//! - Fitness evaluation over a fixed course

pub mod blueprint;
pub mod creature;
pub mod fitness;
pub mod genome;
pub mod neural;
pub mod params;
pub mod physics;
pub mod rng;
pub mod sensors;
pub mod terrain;

// Re-export main types for convenience
pub use blueprint::{
    Blueprint, BlueprintBuilder, BlueprintError, BuilderError, Link, LinkKind, NodeSpec, Spring,
    MAX_NODES,
};
pub use creature::{Creature, MuscleState, NodeState};
pub use fitness::{evaluate, Fitness, Simulation};
pub use genome::{Genome, MutationConfig, NetworkShape};
pub use neural::NeuralController;
pub use params::{EvaluationParams, ParamsError, PhysicsParams, SimParams, SpawnParams};
pub use rng::EvolutionRng;
pub use sensors::SensorLayout;
pub use terrain::{CourseTerrain, FlatTerrain, Terrain};
