//! Selection and breeding
//!
//! Truncation selection with elitism: the best genomes survive unchanged
//! (the very same `Arc`), the rest of the next generation are mutated
//! children of uniformly chosen parents from the top of the ranking.

use std::sync::Arc;

use sinew_creature::{EvolutionRng, Fitness, Genome};

use crate::config::EvolutionConfig;

/// A genome together with the fitness it earned
#[derive(Debug, Clone)]
pub struct ScoredGenome {
    pub genome: Arc<Genome>,
    pub fitness: Fitness,
}

/// Sort best-first by distance
///
/// The sort is stable, so equally fit genomes keep their population order
/// and seeded runs stay reproducible.
pub fn rank(scored: &mut [ScoredGenome]) {
    scored.sort_by(|a, b| b.fitness.distance.total_cmp(&a.fitness.distance));
}

/// Build the next population from a ranked generation
pub fn breed<R: EvolutionRng + ?Sized>(
    ranked: &[ScoredGenome],
    config: &EvolutionConfig,
    rng: &mut R,
) -> Vec<Arc<Genome>> {
    if ranked.is_empty() {
        return Vec::new();
    }

    let elites = config.elite_count().min(ranked.len());
    let pool = config.parent_pool(ranked.len()).max(1);

    let mut next: Vec<Arc<Genome>> = ranked[..elites]
        .iter()
        .map(|s| Arc::clone(&s.genome))
        .collect();
    next.reserve(config.population_size.saturating_sub(elites));

    while next.len() < config.population_size {
        let parent = &ranked[rng.pick_index(pool)];
        let child = parent
            .genome
            .mutate(config.mutation_amount, &config.mutation, rng);
        next.push(Arc::new(child));
    }

    log::debug!(
        "Bred {} genomes ({} elites, parent pool {})",
        next.len(),
        elites,
        pool
    );
    next
}
