use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::coord;
use neural_racecars::simulation::params::Params;
use neural_racecars::simulation::population::Population;
use neural_racecars::simulation::track::{Track, TrackData};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "neural-racecars",
    version,
    about = "Evolve neural-network racecars on a 2D track"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a number of generations on a track.
    Run {
        /// Track record (JSON). A missing file falls back to the default track.
        #[arg(long, default_value = "track.json")]
        track: PathBuf,
        /// Parameter overrides (JSON).
        #[arg(long)]
        params: Option<PathBuf>,
        /// Number of generations to simulate.
        #[arg(long, default_value_t = 100)]
        generations: u32,
        /// Seed for the evolution random generator.
        #[arg(long, default_value_t = 0x5EED_CA75)]
        seed: u64,
        /// Worker threads for stepping (overrides the parameter file).
        #[arg(long)]
        threads: Option<usize>,
        /// Append one JSON frame per generation to this file.
        #[arg(long)]
        frames: Option<PathBuf>,
    },
    /// Write a square-loop demo track.
    InitTrack {
        /// Where to write the track record.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            track,
            params,
            generations,
            seed,
            threads,
            frames,
        } => run(&track, params, generations, seed, threads, frames),
        Command::InitTrack { path } => {
            demo_track()
                .save(&path)
                .with_context(|| format!("writing track to {}", path.display()))?;
            info!(path = %path.display(), "wrote demo track");
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(
    track_path: &Path,
    params_path: Option<PathBuf>,
    generations: u32,
    seed: u64,
    threads: Option<usize>,
    frames_path: Option<PathBuf>,
) -> Result<()> {
    let track = Track::load(track_path)
        .with_context(|| format!("loading track from {}", track_path.display()))?;

    let mut params = match params_path {
        Some(path) => Params::load(&path)
            .with_context(|| format!("loading params from {}", path.display()))?,
        None => Params::default(),
    };
    if let Some(threads) = threads {
        params.worker_threads = threads;
    }

    let mut frames = match frames_path {
        Some(path) => Some(BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening frame log {}", path.display()))?,
        )),
        None => None,
    };

    let mut population = Population::new(track, params, seed)?;
    info!(
        cars = population.car_count(),
        waypoints = population.track().waypoints().len(),
        seed,
        "starting evolution"
    );

    for _ in 0..generations {
        let Some((summary, frame)) = population.run_generation_captured()? else {
            warn!("population is empty, nothing to simulate");
            break;
        };
        info!(
            generation = summary.generation,
            leader = summary.leader_distance,
            best = summary.best_distance,
            last_improved = population.last_improved_generation,
            steps = summary.steps,
            "generation complete"
        );

        if let Some(out) = frames.as_mut() {
            serde_json::to_writer(&mut *out, &frame)?;
            writeln!(out)?;
        }
    }

    if let Some(mut out) = frames {
        out.flush()?;
    }
    Ok(())
}

fn demo_track() -> Track {
    Track::new(TrackData {
        centerpath: vec![
            coord! { x: 0.1, y: 0.1 },
            coord! { x: 0.9, y: 0.1 },
            coord! { x: 0.9, y: 0.9 },
            coord! { x: 0.1, y: 0.9 },
        ],
        start: coord! { x: 0.2, y: 0.2 },
        stop: coord! { x: 0.8, y: 0.8 },
        box_size: 0.1,
    })
}
