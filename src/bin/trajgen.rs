//! trajgen - generate, score and rank trajectories from the command line
//!
//! Prints the generation response as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trajectory_engine::collision::{generate_obstacles, Obstacle};
use trajectory_engine::common::{Trajectory, Waypoint};
use trajectory_engine::config::EngineConfig;
use trajectory_engine::engine::{GenerationMethod, GenerationRequest, TrajectoryEngine};
use trajectory_engine::evaluation::compare_trajectories;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Start waypoint as x,y,z
    #[arg(long, value_parser = parse_waypoint, allow_hyphen_values = true)]
    start: Waypoint,

    /// End waypoint as x,y,z
    #[arg(long, value_parser = parse_waypoint, allow_hyphen_values = true)]
    end: Waypoint,

    /// bezier, spline, dubins, rrt or sampled
    #[arg(long, default_value_t = GenerationMethod::Bezier)]
    method: GenerationMethod,

    /// Number of candidates
    #[arg(long, default_value_t = 1)]
    n_samples: usize,

    /// Waypoints per candidate
    #[arg(long, default_value_t = 50)]
    seq_len: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Engine configuration JSON
    #[arg(long)]
    config: Option<String>,

    /// Obstacle list JSON: [{"center": {"x":..,"y":..,"z":..}, "radius": ..}]
    #[arg(long, conflicts_with = "random_obstacles")]
    obstacles: Option<String>,

    /// Scatter this many random obstacles away from start and end
    #[arg(long)]
    random_obstacles: Option<usize>,

    /// Append aggregate statistics over the candidate set
    #[arg(long)]
    compare: bool,
}

fn parse_waypoint(s: &str) -> Result<Waypoint, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[x, y, z] => Ok(Waypoint::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got '{}'", s)),
    }
}

fn load_obstacles(args: &Args, config: &EngineConfig) -> Result<Option<Vec<Obstacle>>> {
    if let Some(path) = &args.obstacles {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading obstacles from {}", path))?;
        let obstacles: Vec<Obstacle> =
            serde_json::from_str(&json).context("parsing obstacle list")?;
        return Ok(Some(obstacles));
    }
    if let Some(n) = args.random_obstacles {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let obstacles = generate_obstacles(n, &args.start, &args.end, &config.bounds, &mut rng)?;
        tracing::info!(n_obstacles = obstacles.len(), "generated random obstacle field");
        return Ok(Some(obstacles));
    }
    Ok(None)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("trajectory_engine=info".parse()?))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path))?,
        None => EngineConfig::default(),
    };
    let obstacles = load_obstacles(&args, &config)?;

    let request = GenerationRequest {
        start: args.start,
        end: args.end,
        n_samples: args.n_samples,
        seq_len: args.seq_len,
        obstacles,
        method: args.method,
        seed: args.seed,
    };

    let engine = TrajectoryEngine::new(config)?;
    let response = engine.generate(&request)?;

    let output = if args.compare {
        let trajectories = response
            .candidates
            .iter()
            .map(|c| Trajectory::from_arrays(&c.waypoints))
            .collect::<Result<Vec<_>, _>>()?;
        let comparison = compare_trajectories(&trajectories, None)?;
        serde_json::json!({ "response": response, "comparison": comparison })
    } else {
        serde_json::to_value(&response)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
