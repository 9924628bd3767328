//! Sensor feature extraction
//!
//! Turns the current creature state into the controller's input vector.
//! Layout for `span = min(node_count, max_nodes)`:
//!
//! | index            | feature                                   |
//! |------------------|-------------------------------------------|
//! | `4i .. 4i+4`     | node `i`: x offset, height above ground, vx, vy |
//! | `4*span`         | `sin(2t)`                                 |
//! | `4*span + 1`     | `cos(2t)`                                 |
//! | `4*span + 2`     | terrain slope under the centre            |
//! | `4*span + 3`     | centre height above ground                |
//! | `4*span + 4`     | bias (1.0)                                |
//!
//! The remaining slots up to [`SensorLayout::input_size`] stay zero, so
//! creatures with fewer than `max_nodes` nodes leave a zero-padded tail.

use serde::{Deserialize, Serialize};

use crate::creature::NodeState;
use crate::terrain::Terrain;

/// Features contributed by each sensed node
pub const FEATURES_PER_NODE: usize = 4;

/// Global features appended after the node features
pub const GLOBAL_FEATURES: usize = 5;

const OFFSET_SCALE: f32 = 400.0;
const HEIGHT_SCALE: f32 = 220.0;
const VELOCITY_SCALE: f32 = 220.0;
const CENTER_HEIGHT_SCALE: f32 = 200.0;
const PHASE_RATE: f32 = 2.0;
const SLOPE_HALF_WIDTH: f32 = 4.0;

/// How many nodes feed the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorLayout {
    pub max_nodes: usize,
}

impl Default for SensorLayout {
    fn default() -> Self {
        Self { max_nodes: 8 }
    }
}

impl SensorLayout {
    /// Length of the controller input vector: `4 * max_nodes + 5`
    pub fn input_size(&self) -> usize {
        FEATURES_PER_NODE * self.max_nodes + GLOBAL_FEATURES
    }

    /// Fill `inputs` from the current node states
    ///
    /// `time` is the elapsed simulation time and `origin_x` the creature's
    /// starting mean x.
    pub fn fill<T: Terrain + ?Sized>(
        &self,
        inputs: &mut [f32],
        nodes: &[NodeState],
        terrain: &T,
        time: f32,
        origin_x: f32,
    ) {
        debug_assert_eq!(inputs.len(), self.input_size());
        inputs.fill(0.0);
        if nodes.is_empty() {
            return;
        }

        let span = nodes.len().min(self.max_nodes);
        for (features, node) in inputs
            .chunks_exact_mut(FEATURES_PER_NODE)
            .zip(&nodes[..span])
        {
            features[0] = (node.pos.x - origin_x) / OFFSET_SCALE;
            features[1] = (node.pos.y - terrain.height(node.pos.x)) / HEIGHT_SCALE;
            features[2] = node.vel.x / VELOCITY_SCALE;
            features[3] = node.vel.y / VELOCITY_SCALE;
        }

        let count = nodes.len() as f32;
        let center_x = nodes.iter().map(|n| n.pos.x).sum::<f32>() / count;
        let center_y = nodes.iter().map(|n| n.pos.y).sum::<f32>() / count;

        let start = span * FEATURES_PER_NODE;
        let globals = &mut inputs[start..start + GLOBAL_FEATURES];
        globals[0] = (time * PHASE_RATE).sin();
        globals[1] = (time * PHASE_RATE).cos();
        globals[2] = terrain.slope(center_x, SLOPE_HALF_WIDTH);
        globals[3] = (center_y - terrain.height(center_x)) / CENTER_HEIGHT_SCALE;
        globals[4] = 1.0;
    }
}
