//! Per-generation reports and checkpoints

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sinew_creature::{Blueprint, Fitness, Genome, NetworkShape, SensorLayout};

use super::breeding::ScoredGenome;

/// Summary of one evaluated generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// 1-based generation number
    pub generation: usize,
    pub best_distance: f32,
    pub best_stability: f32,
    pub best_raw_distance: f32,
    pub mean_distance: f32,
    /// Running maximum over every generation so far
    pub best_ever_distance: f32,
    /// Wall-clock time spent evaluating the population
    pub evaluation_elapsed_ms: u64,
}

impl GenerationReport {
    /// Summarize a ranked (best-first) generation
    pub fn new(
        generation: usize,
        ranked: &[ScoredGenome],
        best_ever_distance: f32,
        evaluation_elapsed_ms: u64,
    ) -> Self {
        let best = ranked.first().map(|s| s.fitness).unwrap_or_default();
        let mean_distance = if ranked.is_empty() {
            0.0
        } else {
            ranked.iter().map(|s| s.fitness.distance).sum::<f32>() / ranked.len() as f32
        };

        Self {
            generation,
            best_distance: best.distance,
            best_stability: best.stability,
            best_raw_distance: best.raw_distance,
            mean_distance,
            best_ever_distance,
            evaluation_elapsed_ms,
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gen {}: best {:.2} m (stability {:.2}). Eval time {} ms.",
            self.generation, self.best_distance, self.best_stability, self.evaluation_elapsed_ms
        )
    }
}

/// Best genome of a run, written to disk as RON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: usize,
    pub fitness: Fitness,
    pub blueprint: Blueprint,
    /// Sensor layout the genome was evolved with
    #[serde(default)]
    pub sensors: SensorLayout,
    pub genome: Genome,
}

impl Checkpoint {
    pub const FILE_NAME: &'static str = "best_genome.ron";

    /// Write into `dir`, creating it if needed. Returns the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).context("Failed to create output directory")?;

        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize checkpoint")?;
        let path = dir.join(Self::FILE_NAME);
        fs::write(&path, text).context("Failed to write checkpoint file")?;

        log::info!("Checkpoint saved: {}", path.display());
        Ok(path)
    }

    /// Network shape a controller for this blueprint and sensor layout needs
    pub fn expected_shape(&self) -> NetworkShape {
        NetworkShape::for_muscles(self.sensors.input_size(), self.blueprint.muscle_count())
    }

    /// Read a checkpoint and make sure its genome can drive its blueprint
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        let checkpoint: Self = ron::from_str(&text).context("Failed to parse checkpoint")?;
        checkpoint
            .blueprint
            .validate()
            .context("Checkpoint contains an invalid blueprint")?;

        let expected = checkpoint.expected_shape();
        if !checkpoint.genome.matches(expected) {
            let found = checkpoint.genome.shape();
            bail!(
                "Checkpoint genome is {}-{}-{} but the blueprint needs {}-{}-{}",
                found.input,
                found.hidden,
                found.output,
                expected.input,
                expected.hidden,
                expected.output
            );
        }
        Ok(checkpoint)
    }
}

/// Write every generation report as a RON list
pub fn save_history(dir: &Path, reports: &[GenerationReport]) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create output directory")?;

    let text = ron::ser::to_string_pretty(reports, ron::ser::PrettyConfig::default())
        .context("Failed to serialize reports")?;
    let path = dir.join("generations.ron");
    fs::write(&path, text).context("Failed to write report history")?;
    Ok(path)
}
