//! Controller genome
//!
//! A genome is the full parameter set of a two-layer feed-forward network.
//! Genomes are never edited once created: [`Genome::mutate`] returns a fresh
//! child and leaves the parent untouched, so a scored genome can be shared
//! (`Arc<Genome>`) with the next generation without copying.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::rng::EvolutionRng;

/// Layer sizes of a controller network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkShape {
    pub input: usize,
    pub hidden: usize,
    pub output: usize,
}

impl NetworkShape {
    /// Smallest hidden layer used for any creature
    pub const MIN_HIDDEN: usize = 12;

    /// Shape for a creature with `muscle_count` muscles and `input` sensor features
    ///
    /// The hidden layer grows with the muscle count: `max(12, round(1.5 * muscles))`.
    pub fn for_muscles(input: usize, muscle_count: usize) -> Self {
        let hidden = ((muscle_count as f32 * 1.5).round() as usize).max(Self::MIN_HIDDEN);
        Self {
            input,
            hidden,
            output: muscle_count,
        }
    }

    /// Total number of weights and biases
    pub fn parameter_count(&self) -> usize {
        self.hidden * self.input + self.hidden + self.output * self.hidden + self.output
    }
}

/// Per-parameter mutation probabilities and scales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Chance that a given weight receives noise
    pub weight_rate: f32,
    /// Chance that a given bias receives noise
    pub bias_rate: f32,
    /// Bias noise is `amount * bias_scale`
    pub bias_scale: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            weight_rate: 0.9,
            bias_rate: 0.7,
            bias_scale: 0.25,
        }
    }
}

/// Weights and biases of a controller network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Input -> hidden weights (hidden x input)
    pub w1: Array2<f32>,
    /// Hidden biases
    pub b1: Array1<f32>,
    /// Hidden -> output weights (output x hidden)
    pub w2: Array2<f32>,
    /// Output biases
    pub b2: Array1<f32>,
}

impl Genome {
    /// He-initialized genome: weights ~ N(0, 2 / fan_in), zero biases
    pub fn random<R: EvolutionRng + ?Sized>(shape: NetworkShape, rng: &mut R) -> Self {
        let scale1 = (2.0 / shape.input as f32).sqrt();
        let scale2 = (2.0 / shape.hidden as f32).sqrt();

        let w1 = Array2::from_shape_fn((shape.hidden, shape.input), |_| {
            rng.next_gaussian() * scale1
        });
        let w2 = Array2::from_shape_fn((shape.output, shape.hidden), |_| {
            rng.next_gaussian() * scale2
        });

        Self {
            w1,
            b1: Array1::zeros(shape.hidden),
            w2,
            b2: Array1::zeros(shape.output),
        }
    }

    /// Genome with every parameter set to zero
    ///
    /// Every output of such a network is exactly 0.5, so no muscle ever
    /// contracts.
    pub fn zeros(shape: NetworkShape) -> Self {
        Self {
            w1: Array2::zeros((shape.hidden, shape.input)),
            b1: Array1::zeros(shape.hidden),
            w2: Array2::zeros((shape.output, shape.hidden)),
            b2: Array1::zeros(shape.output),
        }
    }

    pub fn shape(&self) -> NetworkShape {
        let (hidden, input) = self.w1.dim();
        NetworkShape {
            input,
            hidden,
            output: self.w2.nrows(),
        }
    }

    /// True if every matrix and bias vector has the dimensions of `shape`
    ///
    /// Deserialized genomes are not checked on load, so callers that read
    /// one from disk should compare it against the shape they expect.
    pub fn matches(&self, shape: NetworkShape) -> bool {
        self.w1.dim() == (shape.hidden, shape.input)
            && self.b1.len() == shape.hidden
            && self.w2.dim() == (shape.output, shape.hidden)
            && self.b2.len() == shape.output
    }

    /// Produce a mutated child; `self` is left unchanged
    ///
    /// Each weight gets Gaussian noise scaled by `amount / sqrt(fan_in)` with
    /// probability `config.weight_rate`; each bias gets noise scaled by
    /// `amount * config.bias_scale` with probability `config.bias_rate`.
    pub fn mutate<R: EvolutionRng + ?Sized>(
        &self,
        amount: f32,
        config: &MutationConfig,
        rng: &mut R,
    ) -> Self {
        let shape = self.shape();
        let mut child = self.clone();

        let noise1 = amount / (shape.input as f32).sqrt();
        let noise2 = amount / (shape.hidden as f32).sqrt();
        let bias_noise = amount * config.bias_scale;

        let mut perturb = |value: f32, rate: f32, scale: f32| {
            if rng.check_probability(rate) {
                value + rng.next_gaussian() * scale
            } else {
                value
            }
        };

        child
            .w1
            .mapv_inplace(|w| perturb(w, config.weight_rate, noise1));
        child
            .w2
            .mapv_inplace(|w| perturb(w, config.weight_rate, noise2));
        child
            .b1
            .mapv_inplace(|b| perturb(b, config.bias_rate, bias_noise));
        child
            .b2
            .mapv_inplace(|b| perturb(b, config.bias_rate, bias_noise));

        child
    }
}
