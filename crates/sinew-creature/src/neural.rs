//! Neural muscle controller
//!
//! Feed-forward network: input -> hidden (tanh) -> output (sigmoid).
//! Each output is the probability-like activation of one muscle; a muscle
//! contracts for the next control interval iff its output exceeds 0.5.

use std::sync::Arc;

use ndarray::ArrayView1;

use crate::creature::Creature;
use crate::genome::Genome;
use crate::sensors::SensorLayout;
use crate::terrain::Terrain;

/// Logistic function
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Genome {
    /// Forward pass: sensor features -> per-muscle activations in [0, 1]
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(input.len(), self.w1.ncols(), "Input dimension mismatch");

        let input = ArrayView1::from(input);
        let hidden = (self.w1.dot(&input) + &self.b1).mapv(f32::tanh);
        let output = (self.w2.dot(&hidden) + &self.b2).mapv(sigmoid);
        output.to_vec()
    }
}

/// Drives a creature's muscles from a genome
///
/// Owns the reusable input buffer so repeated control ticks do not allocate
/// sensor vectors.
#[derive(Debug, Clone)]
pub struct NeuralController {
    genome: Arc<Genome>,
    layout: SensorLayout,
    inputs: Vec<f32>,
}

impl NeuralController {
    pub fn new(genome: Arc<Genome>, layout: SensorLayout) -> Self {
        assert_eq!(
            genome.shape().input,
            layout.input_size(),
            "Genome input size does not match the sensor layout"
        );
        Self {
            inputs: vec![0.0; layout.input_size()],
            genome,
            layout,
        }
    }

    pub fn genome(&self) -> &Arc<Genome> {
        &self.genome
    }

    /// Last sensor vector fed to the network
    pub fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    /// Sense, think, and set the muscle contraction flags
    ///
    /// Returns the raw network outputs.
    pub fn control<T: Terrain + ?Sized>(
        &mut self,
        creature: &mut Creature,
        terrain: &T,
        time: f32,
        origin_x: f32,
    ) -> Vec<f32> {
        self.layout
            .fill(&mut self.inputs, &creature.nodes, terrain, time, origin_x);
        let outputs = self.genome.forward(&self.inputs);
        creature.set_contractions(&outputs);
        outputs
    }
}
