//! Run configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `sinew.ron` file (if exists)
//! 3. Environment variables prefixed with `SINEW_`
//!
//! Example environment variable: `SINEW_EVOLUTION__POPULATION_SIZE=80`

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sinew_creature::{CourseTerrain, MutationConfig, SimParams};

/// Default config file name (without extension)
pub const CONFIG_FILE: &str = "sinew";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SinewConfig {
    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub sim: SimParams,

    #[serde(default)]
    pub terrain: CourseTerrain,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Genetic algorithm settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Genomes per generation
    pub population_size: usize,
    /// Generation cap; the run ends once this many generations were evaluated
    pub max_generations: usize,
    /// Noise scale passed to genome mutation
    pub mutation_amount: f32,
    /// Fraction of the population carried over unchanged
    pub elite_fraction: f32,
    /// Lower bound on the elite count
    pub min_elites: usize,
    /// Lower bound on the number of top genomes eligible as parents
    pub min_parent_pool: usize,
    /// Per-parameter mutation rates
    pub mutation: MutationConfig,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 28,
            mutation_amount: 0.45,
            elite_fraction: 0.15,
            min_elites: 2,
            min_parent_pool: 6,
            mutation: MutationConfig::default(),
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Number of genomes copied unchanged into the next generation
    pub fn elite_count(&self) -> usize {
        let share = (self.population_size as f32 * self.elite_fraction).round() as usize;
        share.max(self.min_elites).min(self.population_size)
    }

    /// Size of the top slice parents are drawn from, given `scored` individuals
    pub fn parent_pool(&self, scored: usize) -> usize {
        (self.elite_count() * 2)
            .max(self.min_parent_pool)
            .min(scored)
    }
}

/// Post-generation replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How many top genomes to replay after each generation (0 disables playback)
    pub visualize_top: usize,
    /// Rendered frames per physics step (slow motion factor)
    pub frames_per_step: usize,
}

impl PlaybackConfig {
    /// Replay count used in ghost mode
    pub const GHOSTS: usize = 50;
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            visualize_top: 1,
            frames_per_step: 10,
        }
    }
}

/// Where the CLI writes its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write the best genome as RON when the run ends
    pub checkpoint: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sinew_output"),
            checkpoint: true,
        }
    }
}

impl SinewConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `sinew.ron` file (if exists)
    /// 3. Environment variables prefixed with `SINEW_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::layered(
            File::with_name(CONFIG_FILE)
                .format(FileFormat::Ron)
                .required(false),
        )
    }

    /// Like [`SinewConfig::load`] but with an explicit, required config file
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::layered(File::from(path).format(FileFormat::Ron).required(true))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Load from RON text instead of a file (environment still applies)
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Self::layered(File::from_str(text, FileFormat::Ron))
    }

    fn layered<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let builder = Config::builder()
            // Layer 1: Compiled defaults (remaining fields fall back to serde defaults)
            .set_default("evolution.population_size", 50_i64)?
            .set_default("evolution.max_generations", 28_i64)?
            .set_default("evolution.mutation_amount", 0.45)?
            .set_default("playback.visualize_top", 1_i64)?
            .set_default("playback.frames_per_step", 10_i64)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (SINEW_EVOLUTION__POPULATION_SIZE, etc.)
            .add_source(
                Environment::with_prefix("SINEW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall or corrupt a run
    pub fn validate(&self) -> Result<()> {
        self.sim.validate().context("Invalid simulation parameters")?;
        if self.playback.frames_per_step == 0 {
            bail!("playback.frames_per_step must be at least 1");
        }
        let evolution = &self.evolution;
        if !(evolution.mutation_amount.is_finite() && evolution.mutation_amount >= 0.0) {
            bail!(
                "evolution.mutation_amount must be finite and not negative (got {})",
                evolution.mutation_amount
            );
        }
        if !(0.0..=1.0).contains(&evolution.elite_fraction) {
            bail!(
                "evolution.elite_fraction must be between 0 and 1 (got {})",
                evolution.elite_fraction
            );
        }
        Ok(())
    }
}
