//! Fitness evaluation
//!
//! A [`Simulation`] couples a freshly spawned creature with its controller
//! and clock. Evaluation and playback both drive the same type, so a replayed
//! genome moves exactly as it did when it was scored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::creature::Creature;
use crate::genome::Genome;
use crate::neural::NeuralController;
use crate::params::SimParams;
use crate::terrain::Terrain;

/// Score of one genome on one blueprint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fitness {
    /// Stability-weighted progress in meters (the selection key)
    pub distance: f32,
    /// Best forward progress of the centre in meters
    pub raw_distance: f32,
    /// `1 - airborne penalty`, floored at zero
    pub stability: f32,
}

/// One creature being simulated under neural control
#[derive(Debug, Clone)]
pub struct Simulation {
    creature: Creature,
    controller: NeuralController,
    step: usize,
    start_x: f32,
    best_x: f32,
    penalty: f32,
}

impl Simulation {
    pub fn new<T: Terrain + ?Sized>(
        blueprint: &Blueprint,
        genome: Arc<Genome>,
        terrain: &T,
        params: &SimParams,
    ) -> Self {
        let creature = Creature::from_blueprint(blueprint, terrain, &params.spawn);
        let start_x = creature.mean_x();
        Self {
            controller: NeuralController::new(genome, params.sensors),
            creature,
            step: 0,
            start_x,
            best_x: start_x,
            penalty: 0.0,
        }
    }

    pub fn creature(&self) -> &Creature {
        &self.creature
    }

    pub fn genome(&self) -> &Arc<Genome> {
        self.controller.genome()
    }

    /// Physics steps taken so far
    pub fn steps(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self, params: &SimParams) -> bool {
        self.step >= params.total_steps()
    }

    /// Run one physics step, consulting the controller first on control ticks
    pub fn advance<T: Terrain + ?Sized>(&mut self, terrain: &T, params: &SimParams) {
        if self.step % params.control_interval() == 0 {
            let time = self.step as f32 * params.physics.dt;
            self.controller
                .control(&mut self.creature, terrain, time, self.start_x);
        }
        self.creature.step(terrain, &params.physics);
        self.step += 1;

        let mean_x = self.creature.mean_x();
        if mean_x > self.best_x {
            self.best_x = mean_x;
        }
        if !self
            .creature
            .is_grounded(terrain, params.evaluation.contact_tolerance)
        {
            self.penalty += params.evaluation.airborne_penalty;
        }
    }

    /// Score accumulated so far
    pub fn fitness(&self, params: &SimParams) -> Fitness {
        let raw_distance = (self.best_x - self.start_x) / params.evaluation.pixels_per_meter;
        let stability = (1.0 - self.penalty).max(0.0);
        Fitness {
            distance: raw_distance * stability,
            raw_distance,
            stability,
        }
    }
}

/// Simulate `genome` driving `blueprint` for the full evaluation window
pub fn evaluate<T: Terrain + ?Sized>(
    blueprint: &Blueprint,
    genome: &Arc<Genome>,
    terrain: &T,
    params: &SimParams,
) -> Fitness {
    let mut sim = Simulation::new(blueprint, Arc::clone(genome), terrain, params);
    while !sim.is_finished(params) {
        sim.advance(terrain, params);
    }
    let fitness = sim.fitness(params);
    log::trace!(
        "evaluated genome: distance={:.3}m raw={:.3}m stability={:.3}",
        fitness.distance,
        fitness.raw_distance,
        fitness.stability
    );
    fitness
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::BlueprintBuilder;
    use crate::genome::NetworkShape;
    use crate::terrain::{CourseTerrain, FlatTerrain};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn pair() -> Blueprint {
        let mut builder = BlueprintBuilder::new();
        builder.add_node(-25.0, 0.0).unwrap();
        builder.add_node(25.0, 0.0).unwrap();
        builder.add_muscle(0, 1).unwrap();
        builder.build().unwrap()
    }

    fn zero_genome(blueprint: &Blueprint, params: &SimParams) -> Arc<Genome> {
        Arc::new(Genome::zeros(NetworkShape::for_muscles(
            params.sensors.input_size(),
            blueprint.muscle_count(),
        )))
    }

    #[test]
    fn test_idle_pair_goes_nowhere() {
        let params = SimParams::default();
        let blueprint = pair();
        assert_eq!(blueprint.muscles().next().map(|m| m.rest), Some(50.0));
        let genome = zero_genome(&blueprint, &params);

        let fitness = evaluate(&blueprint, &genome, &CourseTerrain::default(), &params);

        assert!(fitness.distance.abs() < 0.05, "distance {}", fitness.distance);
        assert!(fitness.distance >= 0.0);
        assert!(fitness.stability > 0.95, "stability {}", fitness.stability);
    }

    #[test]
    fn test_fitness_relationships() {
        let params = SimParams::default();
        let blueprint = pair();
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        let shape = NetworkShape::for_muscles(params.sensors.input_size(), 1);
        let genome = Arc::new(Genome::random(shape, &mut rng));

        let fitness = evaluate(&blueprint, &genome, &CourseTerrain::default(), &params);

        assert!(fitness.raw_distance >= 0.0);
        assert!((0.0..=1.0).contains(&fitness.stability));
        assert!((fitness.distance - fitness.raw_distance * fitness.stability).abs() < 1e-6);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let params = SimParams::default();
        let blueprint = pair();
        let mut rng = Xoshiro256StarStar::seed_from_u64(10);
        let shape = NetworkShape::for_muscles(params.sensors.input_size(), 1);
        let genome = Arc::new(Genome::random(shape, &mut rng));
        let terrain = CourseTerrain::default();

        assert_eq!(
            evaluate(&blueprint, &genome, &terrain, &params),
            evaluate(&blueprint, &genome, &terrain, &params)
        );
    }

    #[test]
    fn test_airborne_penalty_accumulates() {
        let mut params = SimParams::default();
        params.physics.gravity = 0.0;
        params.evaluation.duration = 1.0;
        let blueprint = pair();
        let genome = zero_genome(&blueprint, &params);

        // Spawned above a flat floor with no gravity: never touches down
        let fitness = evaluate(&blueprint, &genome, &FlatTerrain::new(440.0), &params);

        let expected = 1.0 - params.total_steps() as f32 * params.evaluation.airborne_penalty;
        assert!(expected > 0.5);
        assert!((fitness.stability - expected).abs() < 1e-3);
    }

    #[test]
    fn test_stability_floors_at_zero() {
        let mut params = SimParams::default();
        params.physics.gravity = 0.0;
        params.evaluation.airborne_penalty = 0.01;
        let blueprint = pair();
        let genome = zero_genome(&blueprint, &params);

        let fitness = evaluate(&blueprint, &genome, &FlatTerrain::new(440.0), &params);

        assert_eq!(fitness.stability, 0.0);
        assert_eq!(fitness.distance, 0.0);
    }

    #[test]
    fn test_simulation_step_count() {
        let params = SimParams::default();
        let blueprint = pair();
        let genome = zero_genome(&blueprint, &params);
        let terrain = CourseTerrain::default();
        let mut sim = Simulation::new(&blueprint, genome, &terrain, &params);

        while !sim.is_finished(&params) {
            sim.advance(&terrain, &params);
        }
        assert_eq!(sim.steps(), 888);
    }

    #[test]
    fn test_controller_runs_on_interval() {
        let params = SimParams::default();
        let blueprint = pair();
        let mut genome = Genome::zeros(NetworkShape::for_muscles(params.sensors.input_size(), 1));
        // Output bias alone decides: always contract
        genome.b2[0] = 5.0;
        let terrain = FlatTerrain::new(440.0);
        let mut sim = Simulation::new(&blueprint, Arc::new(genome), &terrain, &params);

        assert!(!sim.creature().muscles[0].contracted);
        sim.advance(&terrain, &params);
        assert!(sim.creature().muscles[0].contracted);
    }
}
