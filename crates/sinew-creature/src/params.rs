//! Tunable constants for physics, instantiation and evaluation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensors::SensorLayout;

/// Mass-spring integrator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Downward acceleration (simulation units/sec^2)
    pub gravity: f32,
    /// Muscle spring stiffness
    pub stiffness: f32,
    /// Bone stiffness multiplier relative to muscles
    pub bone_rigidity: f32,
    /// Target length factor of a contracted muscle
    pub contract_ratio: f32,
    /// Target length factor of a relaxed muscle
    pub relax_ratio: f32,
    /// Per-step velocity damping
    pub damping: f32,
    /// Horizontal velocity factor on ground contact
    pub ground_friction: f32,
    /// Nodes are not allowed left of this x
    pub min_x: f32,
    /// Floor for spring length to avoid dividing by zero
    pub epsilon: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            dt: 0.018,
            gravity: 820.0,
            stiffness: 240.0,
            bone_rigidity: 8.0,
            contract_ratio: 0.6,
            relax_ratio: 1.12,
            damping: 0.985,
            ground_friction: 0.82,
            min_x: 40.0,
            epsilon: 1e-6,
        }
    }
}

impl PhysicsParams {
    pub fn bone_stiffness(&self) -> f32 {
        self.stiffness * self.bone_rigidity
    }
}

/// Where and how a blueprint is placed on the course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Course x where the creature's leftmost point lands
    pub spawn_x: f32,
    /// Gap between the creature's lowest point and the ground
    pub clearance: f32,
    /// Design-to-simulation scale factor
    pub scale: f32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            spawn_x: 140.0,
            clearance: 4.0,
            scale: 0.2,
        }
    }
}

/// Fitness evaluation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// Simulated seconds per evaluation
    pub duration: f32,
    /// Physics steps between controller invocations
    pub control_interval: usize,
    /// Simulation units per reported meter
    pub pixels_per_meter: f32,
    /// Vertical distance that still counts as ground contact
    pub contact_tolerance: f32,
    /// Penalty added for every step with no node touching the ground
    pub airborne_penalty: f32,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            duration: 16.0,
            control_interval: 5,
            pixels_per_meter: 90.0,
            contact_tolerance: 2.0,
            airborne_penalty: 0.002,
        }
    }
}

/// Everything a single simulation needs besides blueprint, genome and terrain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub physics: PhysicsParams,
    pub spawn: SpawnParams,
    pub evaluation: EvaluationParams,
    pub sensors: SensorLayout,
}

/// Parameter values that would make a simulation meaningless or unbounded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("{name} must be finite and greater than zero (got {value})")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite and not negative (got {value})")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be finite (got {value})")]
    NotFinite { name: &'static str, value: f32 },
}

fn positive(name: &'static str, value: f32) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ParamsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParamsError::Negative { name, value })
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ParamsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamsError::NotFinite { name, value })
    }
}

impl SimParams {
    /// Reject values loaded from config files or the environment that the
    /// integrator cannot run with
    pub fn validate(&self) -> Result<(), ParamsError> {
        let physics = &self.physics;
        positive("physics.dt", physics.dt)?;
        positive("physics.epsilon", physics.epsilon)?;
        non_negative("physics.stiffness", physics.stiffness)?;
        non_negative("physics.bone_rigidity", physics.bone_rigidity)?;
        non_negative("physics.contract_ratio", physics.contract_ratio)?;
        non_negative("physics.relax_ratio", physics.relax_ratio)?;
        non_negative("physics.damping", physics.damping)?;
        non_negative("physics.ground_friction", physics.ground_friction)?;
        finite("physics.gravity", physics.gravity)?;
        finite("physics.min_x", physics.min_x)?;

        positive("spawn.scale", self.spawn.scale)?;
        finite("spawn.spawn_x", self.spawn.spawn_x)?;
        finite("spawn.clearance", self.spawn.clearance)?;

        let evaluation = &self.evaluation;
        non_negative("evaluation.duration", evaluation.duration)?;
        positive("evaluation.pixels_per_meter", evaluation.pixels_per_meter)?;
        non_negative("evaluation.contact_tolerance", evaluation.contact_tolerance)?;
        non_negative("evaluation.airborne_penalty", evaluation.airborne_penalty)?;
        Ok(())
    }

    /// Number of physics steps in one evaluation
    pub fn total_steps(&self) -> usize {
        (self.evaluation.duration / self.physics.dt).floor() as usize
    }

    /// Physics steps between controller invocations (never zero)
    pub fn control_interval(&self) -> usize {
        self.evaluation.control_interval.max(1)
    }
}
