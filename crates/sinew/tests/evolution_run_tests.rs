//! End-to-end tests for the evolution loop
//!
//! These run real (shortened) evaluations through the public API.

use std::sync::Arc;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use sinew::creature::{evaluate, Blueprint, BlueprintError, FlatTerrain, MAX_NODES};
use sinew::headless::{
    Checkpoint, EvolutionRun, GenerationReport, RunError, RunPhase, TickOutcome,
};
use sinew::{Preset, SinewConfig};

// ============================================================================
// Helpers
// ============================================================================

fn short_config(population: usize, generations: usize) -> SinewConfig {
    let mut config = SinewConfig::default();
    config.evolution.population_size = population;
    config.evolution.max_generations = generations;
    config.playback.visualize_top = 0;
    config.sim.evaluation.duration = 0.9; // 50 steps
    config
}

fn seeded_run(config: &SinewConfig, seed: u64) -> EvolutionRun<Xoshiro256StarStar> {
    EvolutionRun::new(config, Xoshiro256StarStar::seed_from_u64(seed))
}

fn oversized_blueprint() -> Blueprint {
    let nodes: Vec<String> = (0..MAX_NODES + 1)
        .map(|i| format!("(x: {}.0, y: 0.0, fixed: false)", i * 10))
        .collect();
    let text = format!(
        "(nodes: [{}], links: [Muscle((a: 0, b: 1, rest: 10.0))], \
         bounds: (min_x: 0.0, max_x: 200.0, min_y: 0.0, max_y: 0.0))",
        nodes.join(", ")
    );
    ron::from_str(&text).expect("blueprint RON should parse")
}

fn without_timing(mut report: GenerationReport) -> GenerationReport {
    report.evaluation_elapsed_ms = 0;
    report
}

// ============================================================================
// Start-up failures
// ============================================================================

#[test]
fn test_oversized_blueprint_is_rejected() {
    let mut run = seeded_run(&short_config(4, 3), 1);

    let err = run.start(oversized_blueprint());

    assert_eq!(
        err,
        Err(RunError::InvalidBlueprint(BlueprintError::TooManyNodes {
            count: MAX_NODES + 1,
            max: MAX_NODES,
        }))
    );
    assert_eq!(run.phase(), RunPhase::Idle);
    assert_eq!(run.tick(), TickOutcome::Idle);
    assert_eq!(run.generation(), 0);
    assert_eq!(run.evaluations(), 0);
    assert!(run.population().is_empty());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_elites_survive_unchanged() {
    let config = short_config(10, 3);
    let elites = config.evolution.elite_count();
    let mut run = seeded_run(&config, 2);
    run.start(Preset::Quad.blueprint().unwrap()).unwrap();

    for _ in 0..2 {
        assert!(matches!(run.tick(), TickOutcome::Generation(_)));

        assert_eq!(run.population().len(), 10);
        for i in 0..elites {
            assert!(
                Arc::ptr_eq(&run.population()[i], &run.ranked()[i].genome),
                "elite {} was not carried over",
                i
            );
        }
    }
}

#[test]
fn test_best_ever_is_running_maximum() {
    let mut run = seeded_run(&short_config(8, 4), 3);
    run.start(Preset::Walker.blueprint().unwrap()).unwrap();

    let mut reports = Vec::new();
    run.run_to_completion(|report| reports.push(report.clone()));

    assert_eq!(reports.len(), 4);
    let mut best = 0.0_f32;
    for report in &reports {
        best = best.max(report.best_distance);
        assert_eq!(report.best_ever_distance, best);
        assert!(report.mean_distance <= report.best_distance + 1e-6);
    }
    assert_eq!(run.best_ever_distance(), best);
}

#[test]
fn test_elitism_never_loses_ground() {
    // Evaluation is deterministic, so the carried-over elites score the same
    // again and the best distance can only stay or improve.
    let mut run = seeded_run(&short_config(8, 5), 4);
    run.start(Preset::Inchworm.blueprint().unwrap()).unwrap();

    let mut reports = Vec::new();
    run.run_to_completion(|report| reports.push(report.clone()));

    for pair in reports.windows(2) {
        assert!(pair[1].best_distance >= pair[0].best_distance);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_run() {
    let config = short_config(6, 3);
    let blueprint = Preset::Triangle.blueprint().unwrap();

    let mut first = seeded_run(&config, 42);
    let mut second = seeded_run(&config, 42);
    first.start(blueprint.clone()).unwrap();
    second.start(blueprint).unwrap();

    let mut reports_a = Vec::new();
    let mut reports_b = Vec::new();
    first.run_to_completion(|r| reports_a.push(without_timing(r.clone())));
    second.run_to_completion(|r| reports_b.push(without_timing(r.clone())));

    assert_eq!(reports_a, reports_b);
    assert_eq!(first.population().len(), second.population().len());
    for (a, b) in first.population().iter().zip(second.population()) {
        assert_eq!(**a, **b);
    }
}

#[test]
fn test_different_seeds_differ() {
    let config = short_config(4, 1);
    let blueprint = Preset::Quad.blueprint().unwrap();

    let mut first = seeded_run(&config, 1);
    let mut second = seeded_run(&config, 2);
    first.start(blueprint.clone()).unwrap();
    second.start(blueprint).unwrap();

    assert_ne!(*first.population()[0], *second.population()[0]);
}

// ============================================================================
// Termination
// ============================================================================

#[test]
fn test_zero_generation_cap() {
    let mut run = seeded_run(&short_config(4, 0), 5);
    run.start(Preset::Quad.blueprint().unwrap()).unwrap();

    assert_eq!(run.tick(), TickOutcome::Capped);
    assert_eq!(run.evaluations(), 0);
}

#[test]
fn test_stop_finishes_current_generation() {
    let mut run = seeded_run(&short_config(4, 10), 6);
    run.start(Preset::Quad.blueprint().unwrap()).unwrap();

    assert!(matches!(run.tick(), TickOutcome::Generation(_)));
    assert!(run.request_stop());
    // A second request is harmless
    assert!(run.request_stop());
    assert_eq!(run.tick(), TickOutcome::Stopped);

    assert_eq!(run.phase(), RunPhase::Stopped);
    assert_eq!(run.generation(), 1);
    assert_eq!(run.evaluations(), 4);
    assert!(!run.request_stop());
}

#[test]
fn test_stop_before_first_generation() {
    let mut run = seeded_run(&short_config(4, 10), 7);
    run.start(Preset::Quad.blueprint().unwrap()).unwrap();

    assert!(run.request_stop());
    assert_eq!(run.tick(), TickOutcome::Stopped);
    assert_eq!(run.evaluations(), 0);
}

// ============================================================================
// Custom terrain and playback
// ============================================================================

#[test]
fn test_flat_terrain_run_with_ghost_playback() {
    let mut config = short_config(5, 1);
    config.playback.visualize_top = 50;
    config.playback.frames_per_step = 1;
    let mut run = EvolutionRun::with_terrain(
        &config,
        FlatTerrain::new(440.0),
        Xoshiro256StarStar::seed_from_u64(8),
    );
    run.start(Preset::Triangle.blueprint().unwrap()).unwrap();

    assert!(matches!(run.tick(), TickOutcome::Generation(_)));

    let mut frames = 0;
    while let TickOutcome::Frame(frame) = run.tick() {
        // Only five genomes exist, so only five ghosts replay
        assert_eq!(frame.individuals.len(), 5);
        for individual in &frame.individuals {
            for node in &individual.nodes {
                assert!(node.pos.y <= 440.0);
            }
        }
        frames += 1;
    }

    assert_eq!(frames, config.sim.total_steps());
    assert_eq!(run.phase(), RunPhase::Evaluating);
    assert_eq!(run.tick(), TickOutcome::Capped);
}

// ============================================================================
// Checkpoints
// ============================================================================

#[test]
fn test_saved_champion_replays_to_same_fitness() {
    let config = short_config(6, 2);
    let mut run = seeded_run(&config, 9);
    run.start(Preset::Walker.blueprint().unwrap()).unwrap();
    run.run_to_completion(|_| {});

    let dir = tempfile::tempdir().unwrap();
    let path = run.checkpoint().unwrap().save(dir.path()).unwrap();
    let loaded = Checkpoint::load(&path).unwrap();

    let fitness = evaluate(
        &loaded.blueprint,
        &Arc::new(loaded.genome.clone()),
        &config.terrain,
        &config.sim,
    );
    assert_eq!(fitness, loaded.fitness);
    assert_eq!(loaded.fitness.distance, run.best_ever_distance());
}
