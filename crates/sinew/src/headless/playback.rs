//! Slow-motion replay of a generation's leaders
//!
//! After a generation has been scored, its top genomes are spawned again and
//! stepped side by side. Every call to [`Playback::next_frame`] yields one
//! rendered frame; physics only advances every `frames_per_step` frames.

use serde::{Deserialize, Serialize};
use sinew_creature::{Blueprint, MuscleState, NodeState, SimParams, Simulation, Spring, Terrain};

use super::breeding::ScoredGenome;

/// One replayed creature at one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSnapshot {
    /// 0 is the generation's best
    pub rank: usize,
    /// Distance the genome scored during evaluation
    pub distance: f32,
    pub nodes: Vec<NodeState>,
    pub muscles: Vec<MuscleState>,
    pub bones: Vec<Spring>,
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub generation: usize,
    pub frame: usize,
    /// Physics steps taken so far
    pub step: usize,
    pub individuals: Vec<IndividualSnapshot>,
}

#[derive(Debug)]
struct Replay {
    rank: usize,
    distance: f32,
    sim: Simulation,
}

/// Replay of the top genomes of one generation
#[derive(Debug)]
pub struct Playback {
    generation: usize,
    replays: Vec<Replay>,
    frame: usize,
    frames_per_step: usize,
    total_frames: usize,
}

impl Playback {
    /// Spawn the first `count` genomes of a ranked generation
    pub fn new<T: Terrain + ?Sized>(
        generation: usize,
        blueprint: &Blueprint,
        ranked: &[ScoredGenome],
        count: usize,
        frames_per_step: usize,
        terrain: &T,
        params: &SimParams,
    ) -> Self {
        let frames_per_step = frames_per_step.max(1);
        let replays = ranked
            .iter()
            .take(count)
            .enumerate()
            .map(|(rank, scored)| Replay {
                rank,
                distance: scored.fitness.distance,
                sim: Simulation::new(blueprint, scored.genome.clone(), terrain, params),
            })
            .collect();

        Self {
            generation,
            replays,
            frame: 0,
            frames_per_step,
            total_frames: params.total_steps() * frames_per_step,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Frames emitted so far
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Number of frames a complete replay produces
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn individual_count(&self) -> usize {
        self.replays.len()
    }

    pub fn is_finished(&self) -> bool {
        self.replays.is_empty() || self.frame >= self.total_frames
    }

    /// Produce the next frame, stepping physics on every `frames_per_step`-th frame
    ///
    /// Returns `None` once the replay is over.
    pub fn next_frame<T: Terrain + ?Sized>(
        &mut self,
        terrain: &T,
        params: &SimParams,
    ) -> Option<FrameSnapshot> {
        if self.is_finished() {
            return None;
        }

        if self.frame % self.frames_per_step == 0 {
            for replay in &mut self.replays {
                replay.sim.advance(terrain, params);
            }
        }
        self.frame += 1;

        Some(self.snapshot())
    }

    fn snapshot(&self) -> FrameSnapshot {
        let individuals = self
            .replays
            .iter()
            .map(|replay| {
                let creature = replay.sim.creature();
                IndividualSnapshot {
                    rank: replay.rank,
                    distance: replay.distance,
                    nodes: creature.nodes.clone(),
                    muscles: creature.muscles.clone(),
                    bones: creature.bones.clone(),
                }
            })
            .collect();

        FrameSnapshot {
            generation: self.generation,
            frame: self.frame,
            step: self.replays.first().map_or(0, |r| r.sim.steps()),
            individuals,
        }
    }
}
