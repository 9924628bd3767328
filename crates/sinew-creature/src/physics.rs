//! Mass-spring physics
//!
//! One fixed-timestep integrator shared by fitness evaluation and playback.
//! Muscles and bones are Hookean springs; muscles change their target length
//! with the contraction flag, bones keep their rest length and are
//! `bone_rigidity` times stiffer. No external physics engine is involved.

use glam::Vec2;

use crate::blueprint::Spring;
use crate::creature::{Creature, MuscleState, NodeState};
use crate::params::PhysicsParams;
use crate::terrain::Terrain;

/// Add the force of one spring to the endpoint accelerations
fn accumulate_spring(
    nodes: &[NodeState],
    accel: &mut [Vec2],
    spring: &Spring,
    target: f32,
    stiffness: f32,
    epsilon: f32,
) {
    let a = &nodes[spring.a];
    let b = &nodes[spring.b];
    let delta = b.pos - a.pos;
    let dist = delta.length().max(epsilon);
    let stretch = dist - target;
    let force = delta * (stretch / dist * stiffness);

    if !a.fixed {
        accel[spring.a] += force;
    }
    if !b.fixed {
        accel[spring.b] -= force;
    }
}

/// Advance every free node by one timestep and resolve ground contact
///
/// Fixed nodes keep their position and velocity. After the step every free
/// node satisfies `pos.y <= terrain.height(pos.x)` and `pos.x >= params.min_x`.
pub fn step<T: Terrain + ?Sized>(
    nodes: &mut [NodeState],
    muscles: &[MuscleState],
    bones: &[Spring],
    terrain: &T,
    params: &PhysicsParams,
) {
    let mut accel = vec![Vec2::new(0.0, params.gravity); nodes.len()];

    for muscle in muscles {
        let ratio = if muscle.contracted {
            params.contract_ratio
        } else {
            params.relax_ratio
        };
        accumulate_spring(
            nodes,
            &mut accel,
            &muscle.spring,
            muscle.spring.rest * ratio,
            params.stiffness,
            params.epsilon,
        );
    }

    let bone_stiffness = params.bone_stiffness();
    for bone in bones {
        accumulate_spring(
            nodes,
            &mut accel,
            bone,
            bone.rest,
            bone_stiffness,
            params.epsilon,
        );
    }

    for (node, a) in nodes.iter_mut().zip(&accel) {
        if node.fixed {
            continue;
        }
        node.vel = (node.vel + *a * params.dt) * params.damping;
        node.pos += node.vel * params.dt;

        if node.pos.x < params.min_x {
            node.pos.x = params.min_x;
            node.vel.x = node.vel.x.max(0.0);
        }

        let ground = terrain.height(node.pos.x);
        if node.pos.y > ground {
            node.pos.y = ground;
            if node.vel.y > 0.0 {
                node.vel.y = 0.0;
            }
            node.vel.x *= params.ground_friction;
        }
    }
}

impl Creature {
    /// Advance this creature by one physics step
    pub fn step<T: Terrain + ?Sized>(&mut self, terrain: &T, params: &PhysicsParams) {
        step(&mut self.nodes, &self.muscles, &self.bones, terrain, params);
    }
}
