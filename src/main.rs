use std::path::PathBuf;

use anyhow::Result;
use barnes_hut_sim::{Simulation, SimulationConfig, Traversal, utils};
use clap::Parser;

/// Runs the Barnes-Hut simulation without a display and logs what happens.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// YAML configuration file; defaults are used for anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ticks to run
    #[arg(short, long, default_value_t = 100)]
    ticks: usize,
    /// Override the initial number of bodies
    #[arg(short, long)]
    bodies: Option<usize>,
    /// Seed for the initial distribution
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(n) = args.bodies {
        config.spawn.num_bodies = n;
    }
    if args.seed.is_some() {
        config.spawn.seed = args.seed;
    }

    let mut sim = Simulation::new(config)?;
    let mut traversal = Traversal::default();
    let mut dropped = 0;
    for _ in 0..args.ticks {
        let report = sim.step();
        traversal += report.traversal;
        dropped += report.dropped;
    }

    let bodies = sim.bodies();
    log::info!(
        "frame {}: {} bodies, total mass {:.3}, center of mass {:?}",
        sim.frame(),
        bodies.len(),
        utils::total_mass(bodies),
        utils::center_of_mass(bodies)
    );
    log::info!(
        "{} node expansions, {} interactions, {} bodies dropped over {} ticks",
        traversal.expansions,
        traversal.interactions,
        dropped,
        args.ticks
    );

    Ok(())
}
