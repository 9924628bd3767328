//! Generational evolution loop
//!
//! [`EvolutionRun`] owns everything a run needs (population, RNG, config,
//! blueprint, terrain) and advances one unit of work per [`EvolutionRun::tick`]:
//! a whole generation's evaluation, or a single playback frame.
//!
//! ```text
//! Idle --start--> Evaluating --tick--> Visualizing --tick*--> Evaluating
//!                     |                     |
//!                     +--> Capped           +--> Stopped
//!                     +--> Stopped
//! ```
//!
//! Stop requests are honoured before a generation is evaluated and when a
//! playback ends; the generation cap is checked before evaluation. The
//! generation in progress always completes.

use std::sync::Arc;

use sinew_creature::{
    evaluate, Blueprint, BlueprintError, CourseTerrain, EvolutionRng, Genome, NetworkShape,
    ParamsError, SimParams, Terrain,
};
use thiserror::Error;
use web_time::Instant;

use super::breeding::{breed, rank, ScoredGenome};
use super::playback::{FrameSnapshot, Playback};
use super::report::{Checkpoint, GenerationReport};
use crate::config::{EvolutionConfig, PlaybackConfig, SinewConfig};

/// Why a run could not be started
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(#[from] BlueprintError),
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("an evolution run is already in progress")]
    AlreadyRunning,
    #[error("population size must be at least 1")]
    EmptyPopulation,
}

/// Where the run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Never started
    Idle,
    /// Next tick evaluates a generation
    Evaluating,
    /// Next tick emits a playback frame
    Visualizing,
    /// Ended on a stop request
    Stopped,
    /// Ended at the generation cap
    Capped,
}

impl RunPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, RunPhase::Evaluating | RunPhase::Visualizing)
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to do (not running)
    Idle,
    /// A generation was evaluated
    Generation(GenerationReport),
    /// A playback frame was produced
    Frame(FrameSnapshot),
    /// Playback ended and the next generation was bred
    PlaybackFinished,
    /// The run ended on a stop request
    Stopped,
    /// The run ended at the generation cap
    Capped,
}

/// Best individual seen so far in a run
#[derive(Debug, Clone)]
pub struct Champion {
    pub generation: usize,
    pub scored: ScoredGenome,
}

/// A generational evolution run over one blueprint
pub struct EvolutionRun<R: EvolutionRng, T: Terrain = CourseTerrain> {
    evolution: EvolutionConfig,
    playback_config: PlaybackConfig,
    sim: SimParams,
    terrain: T,
    rng: R,

    phase: RunPhase,
    blueprint: Option<Blueprint>,
    population: Vec<Arc<Genome>>,
    ranked: Vec<ScoredGenome>,
    playback: Option<Playback>,
    generation: usize,
    evaluations: usize,
    best_ever_distance: f32,
    champion: Option<Champion>,
    stop_requested: bool,
}

impl<R: EvolutionRng> EvolutionRun<R, CourseTerrain> {
    /// Create an idle run on the configured course
    pub fn new(config: &SinewConfig, rng: R) -> Self {
        Self::with_terrain(config, config.terrain, rng)
    }
}

impl<R: EvolutionRng, T: Terrain> EvolutionRun<R, T> {
    /// Create an idle run on a custom terrain
    pub fn with_terrain(config: &SinewConfig, terrain: T, rng: R) -> Self {
        Self {
            evolution: config.evolution.clone(),
            playback_config: config.playback.clone(),
            sim: config.sim,
            terrain,
            rng,
            phase: RunPhase::Idle,
            blueprint: None,
            population: Vec::new(),
            ranked: Vec::new(),
            playback: None,
            generation: 0,
            evaluations: 0,
            best_ever_distance: 0.0,
            champion: None,
            stop_requested: false,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Generations evaluated since the last start
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Genome evaluations performed since the last start
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn best_ever_distance(&self) -> f32 {
        self.best_ever_distance
    }

    pub fn champion(&self) -> Option<&Champion> {
        self.champion.as_ref()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    /// Genomes awaiting evaluation (or the bred next generation)
    pub fn population(&self) -> &[Arc<Genome>] {
        &self.population
    }

    /// Last evaluated generation, best first
    pub fn ranked(&self) -> &[ScoredGenome] {
        &self.ranked
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn sim_params(&self) -> &SimParams {
        &self.sim
    }

    /// Validate the blueprint and seed a fresh random population
    ///
    /// Nothing is evaluated until the next [`EvolutionRun::tick`]. A finished
    /// run may be started again; counters and the best-ever distance reset.
    pub fn start(&mut self, blueprint: Blueprint) -> Result<(), RunError> {
        if self.is_running() {
            return Err(RunError::AlreadyRunning);
        }
        blueprint.validate()?;
        self.sim.validate()?;
        if self.evolution.population_size == 0 {
            return Err(RunError::EmptyPopulation);
        }

        let shape =
            NetworkShape::for_muscles(self.sim.sensors.input_size(), blueprint.muscle_count());
        self.population = (0..self.evolution.population_size)
            .map(|_| Arc::new(Genome::random(shape, &mut self.rng)))
            .collect();

        log::info!(
            "Starting evolution: {} nodes, {} muscles, {} bones; network {}-{}-{}; population {}, cap {} generations",
            blueprint.node_count(),
            blueprint.muscle_count(),
            blueprint.bone_count(),
            shape.input,
            shape.hidden,
            shape.output,
            self.evolution.population_size,
            self.evolution.max_generations
        );

        self.blueprint = Some(blueprint);
        self.ranked.clear();
        self.playback = None;
        self.generation = 0;
        self.evaluations = 0;
        self.best_ever_distance = 0.0;
        self.champion = None;
        self.stop_requested = false;
        self.phase = RunPhase::Evaluating;
        Ok(())
    }

    /// Ask a running evolution to stop at the next boundary
    ///
    /// Returns `false` (and changes nothing) if no run is in progress.
    pub fn request_stop(&mut self) -> bool {
        if !self.is_running() {
            log::warn!("Stop requested but no evolution is running");
            return false;
        }
        if !self.stop_requested {
            log::info!("Stop requested; finishing generation {}", self.generation);
        }
        self.stop_requested = true;
        true
    }

    /// Advance the run by one unit of work
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            RunPhase::Idle | RunPhase::Stopped | RunPhase::Capped => TickOutcome::Idle,
            RunPhase::Evaluating => self.tick_evaluating(),
            RunPhase::Visualizing => self.tick_visualizing(),
        }
    }

    /// Tick until the run ends, handing every generation report to `on_report`
    ///
    /// Playback frames are produced and discarded.
    pub fn run_to_completion<F>(&mut self, mut on_report: F) -> RunPhase
    where
        F: FnMut(&GenerationReport),
    {
        while self.is_running() {
            if let TickOutcome::Generation(report) = self.tick() {
                on_report(&report);
            }
        }
        self.phase
    }

    /// Best genome so far packaged for writing to disk
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        let blueprint = self.blueprint.as_ref()?;
        let champion = self.champion.as_ref()?;
        Some(Checkpoint {
            generation: champion.generation,
            fitness: champion.scored.fitness,
            blueprint: blueprint.clone(),
            sensors: self.sim.sensors,
            genome: Genome::clone(&champion.scored.genome),
        })
    }

    fn finish(&mut self, phase: RunPhase) -> TickOutcome {
        self.phase = phase;
        self.playback = None;
        match phase {
            RunPhase::Stopped => {
                log::info!("Evolution stopped after {} generations", self.generation);
                TickOutcome::Stopped
            }
            _ => {
                log::info!(
                    "Generation cap reached ({}); best distance {:.2} m",
                    self.generation,
                    self.best_ever_distance
                );
                TickOutcome::Capped
            }
        }
    }

    fn tick_evaluating(&mut self) -> TickOutcome {
        if self.stop_requested {
            return self.finish(RunPhase::Stopped);
        }
        if self.generation >= self.evolution.max_generations {
            return self.finish(RunPhase::Capped);
        }
        let Some(blueprint) = self.blueprint.as_ref() else {
            self.phase = RunPhase::Idle;
            return TickOutcome::Idle;
        };

        self.generation += 1;
        let started = Instant::now();
        let mut ranked: Vec<ScoredGenome> = self
            .population
            .iter()
            .map(|genome| ScoredGenome {
                fitness: evaluate(blueprint, genome, &self.terrain, &self.sim),
                genome: Arc::clone(genome),
            })
            .collect();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.evaluations += ranked.len();
        rank(&mut ranked);

        if let Some(best) = ranked.first() {
            if best.fitness.distance > self.best_ever_distance {
                self.best_ever_distance = best.fitness.distance;
            }
            let improved = self
                .champion
                .as_ref()
                .map_or(true, |c| best.fitness.distance > c.scored.fitness.distance);
            if improved {
                self.champion = Some(Champion {
                    generation: self.generation,
                    scored: best.clone(),
                });
            }
        }

        let report = GenerationReport::new(
            self.generation,
            &ranked,
            self.best_ever_distance,
            elapsed_ms,
        );
        log::info!("{}", report);
        log::debug!(
            "Gen {}: mean {:.3} m, best raw {:.3} m",
            report.generation,
            report.mean_distance,
            report.best_raw_distance
        );

        let visualize = self.playback_config.visualize_top;
        if visualize > 0 {
            self.playback = Some(Playback::new(
                self.generation,
                blueprint,
                &ranked,
                visualize,
                self.playback_config.frames_per_step,
                &self.terrain,
                &self.sim,
            ));
            self.ranked = ranked;
            self.phase = RunPhase::Visualizing;
        } else {
            self.ranked = ranked;
            self.population = breed(&self.ranked, &self.evolution, &mut self.rng);
        }

        TickOutcome::Generation(report)
    }

    fn tick_visualizing(&mut self) -> TickOutcome {
        if !self.stop_requested {
            if let Some(playback) = self.playback.as_mut() {
                if let Some(frame) = playback.next_frame(&self.terrain, &self.sim) {
                    return TickOutcome::Frame(frame);
                }
            }
        }

        self.playback = None;
        if self.stop_requested {
            return self.finish(RunPhase::Stopped);
        }
        self.population = breed(&self.ranked, &self.evolution, &mut self.rng);
        self.phase = RunPhase::Evaluating;
        TickOutcome::PlaybackFinished
    }
}
