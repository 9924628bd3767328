use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use sinew::creature::{evaluate, Blueprint};
use sinew::headless::{save_history, Checkpoint, EvolutionRun, TickOutcome};
use sinew::{PlaybackConfig, Preset, SinewConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (RON); defaults to ./sinew.ron if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blueprint file (RON) to evolve; overrides --preset
    #[arg(long)]
    blueprint: Option<PathBuf>,

    /// Built-in creature: inchworm, quad, walker, triangle
    #[arg(long, default_value = "quad")]
    preset: String,

    /// Number of generations to evolve
    #[arg(long)]
    generations: Option<usize>,

    /// Population size per generation
    #[arg(long)]
    population: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for reports and the best genome
    #[arg(long)]
    output: Option<PathBuf>,

    /// Replay the top 50 genomes after each generation instead of only the best
    #[arg(long)]
    ghosts: bool,

    /// Skip the post-generation replay entirely
    #[arg(long, conflicts_with = "ghosts")]
    no_playback: bool,

    /// Re-score a saved best genome instead of evolving
    #[arg(long, value_name = "CHECKPOINT")]
    replay: Option<PathBuf>,

    /// List available presets
    #[arg(long)]
    list_presets: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_presets {
        for preset in Preset::ALL {
            let blueprint = preset.blueprint()?;
            println!(
                "{:<10} {} nodes, {} muscles, {} bones",
                preset.name(),
                blueprint.node_count(),
                blueprint.muscle_count(),
                blueprint.bone_count()
            );
        }
        return Ok(());
    }

    let config = load_config(&args)?;
    if let Some(path) = &args.replay {
        return replay_checkpoint(&config, path);
    }
    let blueprint = load_blueprint(&args)?;
    run_evolution(&config, blueprint)
}

fn replay_checkpoint(config: &SinewConfig, path: &Path) -> Result<()> {
    let checkpoint = Checkpoint::load(path)?;
    let mut sim = config.sim;
    sim.sensors = checkpoint.sensors;

    let fitness = evaluate(
        &checkpoint.blueprint,
        &Arc::new(checkpoint.genome),
        &config.terrain,
        &sim,
    );
    log::info!(
        "Generation {} champion: saved {:.2} m, replayed {:.2} m (stability {:.2})",
        checkpoint.generation,
        checkpoint.fitness.distance,
        fitness.distance,
        fitness.stability
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<SinewConfig> {
    let mut config = match &args.config {
        Some(path) => SinewConfig::load_from(path)?,
        None => SinewConfig::load()?,
    };

    // CLI flags override the layered configuration
    if let Some(generations) = args.generations {
        config.evolution.max_generations = generations;
    }
    if let Some(population) = args.population {
        config.evolution.population_size = population;
    }
    if args.seed.is_some() {
        config.evolution.seed = args.seed;
    }
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
    }
    if args.ghosts {
        config.playback.visualize_top = PlaybackConfig::GHOSTS;
    }
    if args.no_playback {
        config.playback.visualize_top = 0;
    }
    Ok(config)
}

fn load_blueprint(args: &Args) -> Result<Blueprint> {
    match &args.blueprint {
        Some(path) => read_blueprint(path),
        None => {
            let preset: Preset = args
                .preset
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            log::info!("Using preset '{}'", preset);
            preset.blueprint()
        }
    }
}

fn read_blueprint(path: &Path) -> Result<Blueprint> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read blueprint {}", path.display()))?;
    let blueprint: Blueprint = ron::from_str(&text)
        .with_context(|| format!("Failed to parse blueprint {}", path.display()))?;
    log::info!("Loaded blueprint from {}", path.display());
    Ok(blueprint)
}

fn progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} gen ({eta}) {msg}")?
        .progress_chars("█▓░"))
}

fn run_evolution(config: &SinewConfig, blueprint: Blueprint) -> Result<()> {
    let rng = match config.evolution.seed {
        Some(seed) => {
            log::info!("Seeded run: {}", seed);
            Xoshiro256StarStar::seed_from_u64(seed)
        }
        None => Xoshiro256StarStar::from_entropy(),
    };

    let mut run = EvolutionRun::new(config, rng);
    run.start(blueprint)?;

    let pb = ProgressBar::new(config.evolution.max_generations as u64);
    pb.set_style(progress_style()?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut reports = Vec::new();
    while run.is_running() {
        match run.tick() {
            TickOutcome::Generation(report) => {
                pb.inc(1);
                pb.set_message(format!("best {:.2} m", report.best_ever_distance));
                reports.push(report);
            }
            TickOutcome::PlaybackFinished => {
                if let Some(best) = run.ranked().first() {
                    log::debug!(
                        "Replay of generation {} done (leader scored {:.2} m)",
                        run.generation(),
                        best.fitness.distance
                    );
                }
            }
            _ => {}
        }
    }
    pb.finish_with_message(format!("best {:.2} m", run.best_ever_distance()));

    log::info!(
        "Finished after {} generations ({} evaluations), best distance {:.2} m",
        run.generation(),
        run.evaluations(),
        run.best_ever_distance()
    );

    if config.output.checkpoint {
        let dir = &config.output.dir;
        let history = save_history(dir, &reports)?;
        log::info!("Generation reports: {}", history.display());
        if let Some(checkpoint) = run.checkpoint() {
            checkpoint.save(dir)?;
        }
    }
    Ok(())
}
