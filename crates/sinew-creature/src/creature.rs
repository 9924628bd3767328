//! Simulated creature state
//!
//! A [`Creature`] is the runtime counterpart of a [`Blueprint`]: node
//! positions and velocities in simulation space plus the muscle and bone
//! springs connecting them. A fresh creature is built for every evaluation
//! and dropped afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::blueprint::{Blueprint, Spring};
use crate::params::SpawnParams;
use crate::terrain::Terrain;

/// Runtime state of a single point mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub fixed: bool,
}

impl NodeState {
    pub fn at(pos: Vec2, fixed: bool) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            fixed,
        }
    }
}

/// Muscle spring with its current contraction decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuscleState {
    pub spring: Spring,
    pub contracted: bool,
}

/// Nodes, muscles and bones of one simulated creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub nodes: Vec<NodeState>,
    pub muscles: Vec<MuscleState>,
    pub bones: Vec<Spring>,
}

impl Creature {
    /// Place a blueprint on the terrain, ready for step 0
    ///
    /// The leftmost design point lands on `spawn.spawn_x`, the lowest design
    /// point sits `spawn.clearance` above the ground there, and every
    /// coordinate and rest length is shrunk by `spawn.scale`.
    pub fn from_blueprint<T: Terrain + ?Sized>(
        blueprint: &Blueprint,
        terrain: &T,
        spawn: &SpawnParams,
    ) -> Self {
        let bounds = blueprint.bounds();
        let ground_y = terrain.height(spawn.spawn_x) - spawn.clearance;

        let nodes = blueprint
            .nodes()
            .iter()
            .map(|n| {
                let pos = Vec2::new(
                    spawn.spawn_x + (n.x - bounds.min_x) * spawn.scale,
                    ground_y - (bounds.max_y - n.y) * spawn.scale,
                );
                NodeState::at(pos, n.fixed)
            })
            .collect();

        let muscles = blueprint
            .muscles()
            .map(|m| MuscleState {
                spring: m.scaled(spawn.scale),
                contracted: false,
            })
            .collect();

        let bones = blueprint.bones().map(|b| b.scaled(spawn.scale)).collect();

        Self {
            nodes,
            muscles,
            bones,
        }
    }

    /// Mean node position
    pub fn center(&self) -> Vec2 {
        if self.nodes.is_empty() {
            return Vec2::ZERO;
        }
        let sum: Vec2 = self.nodes.iter().map(|n| n.pos).sum();
        sum / self.nodes.len() as f32
    }

    /// Mean node x (used to measure progress)
    pub fn mean_x(&self) -> f32 {
        self.center().x
    }

    /// True if any node is within `tolerance` of the ground
    pub fn is_grounded<T: Terrain + ?Sized>(&self, terrain: &T, tolerance: f32) -> bool {
        self.nodes
            .iter()
            .any(|n| (n.pos.y - terrain.height(n.pos.x)).abs() < tolerance)
    }

    /// Apply controller outputs: a muscle contracts iff its output is above 0.5
    pub fn set_contractions(&mut self, outputs: &[f32]) {
        for (muscle, &output) in self.muscles.iter_mut().zip(outputs) {
            muscle.contracted = output > 0.5;
        }
    }
}
