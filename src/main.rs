use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

use orbital_cloud::logging::init_tracing;
use orbital_cloud::{AppConfig, OrbitalParams, OrbitalSampler, Result};

/// Samples a hydrogen orbital and writes the signed point cloud as JSON.
#[derive(Parser, Debug)]
#[command(version, about = "Hydrogen orbital point-cloud sampler", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short = 'n', long)]
    n: Option<u32>,

    #[arg(short = 'l', long)]
    l: Option<u32>,

    #[arg(short = 'm', long, allow_negative_numbers = true)]
    m: Option<i32>,

    /// Number of points to accept
    #[arg(long)]
    count: Option<usize>,

    /// Sampling radius in Bohr radii
    #[arg(long)]
    r_max: Option<f64>,

    /// Seed for a reproducible cloud
    #[arg(long)]
    seed: Option<u64>,

    /// Parallel shards for the acceptance loop
    #[arg(long)]
    shards: Option<usize>,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if args.shards.is_some() {
        config.sampler.shards = args.shards;
    }

    let defaults = config.orbital;
    let params = OrbitalParams {
        n: args.n.unwrap_or(defaults.n),
        l: args.l.unwrap_or(defaults.l),
        m: args.m.unwrap_or(defaults.m),
        num_points: args.count.unwrap_or(defaults.num_points),
        r_max: args.r_max.unwrap_or(defaults.r_max),
    };
    let request = params.to_request()?;
    let sampler = OrbitalSampler::new(config.sampler)?;

    info!(
        n = params.n,
        l = params.l,
        m = params.m,
        count = params.num_points,
        r_max = params.r_max,
        "generating orbital"
    );
    let result = match args.seed {
        Some(seed) => sampler.run(&request, &mut ChaCha8Rng::seed_from_u64(seed))?,
        None => sampler.run(&request, &mut rand::thread_rng())?,
    };
    info!(
        positive = result.positions_pos.len(),
        negative = result.positions_neg.len(),
        acceptance = result.acceptance_rate(),
        "done"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, &result)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing("orbital_cloud=info");

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
