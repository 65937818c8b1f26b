//! Population of racecars sharing one track, with parallel stepping.
//!
//! Each step races every running racecar on a fixed rayon worker pool. The
//! pool joins before the "all stopped" check, and the generation transition
//! then runs sequentially on the caller's thread.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, warn};

use super::brain::NeuralNet;
use super::error::Result;
use super::evolution::{EvolutionEngine, GenerationSummary};
use super::frame::Frame;
use super::params::Params;
use super::racecar::Racecar;
use super::track::Track;

/// Fixed-size cohort of racecars plus generation bookkeeping.
#[derive(Debug)]
pub struct Population {
    /// Racecars of the current generation. Slot 0 is the lead racecar.
    pub cars: Vec<Racecar>,
    /// Number of completed generation transitions.
    pub generation: u32,
    /// Best leader distance over all generations.
    pub best_distance: f64,
    /// Generation at which `best_distance` last improved.
    pub last_improved_generation: u32,
    track: Track,
    params: Params,
    engine: EvolutionEngine,
    rng: ChaCha8Rng,
    pool: ThreadPool,
    generation_steps: u64,
}

impl Population {
    /// Creates the first generation with random networks.
    pub fn new(track: Track, params: Params, seed: u64) -> Result<Self> {
        params.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cars = (0..params.population_size)
            .map(|_| Racecar::new_random(&track, &params, &mut rng))
            .collect();

        if track.segments().is_empty() {
            warn!("track has no waypoints; every racecar will stop on its first step");
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(params.worker_threads)
            .thread_name(|i| format!("racecar-worker-{i}"))
            .build()?;

        Ok(Self {
            cars,
            generation: 0,
            best_distance: 0.0,
            last_improved_generation: 0,
            track,
            params,
            engine: EvolutionEngine::new(),
            rng,
            pool,
            generation_steps: 0,
        })
    }

    /// The shared track.
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Exclusive access to the track for editing between steps.
    pub fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    /// Simulation parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of racecars per generation.
    pub fn car_count(&self) -> usize {
        self.params.population_size
    }

    /// The racecar in slot 0.
    pub fn lead(&self) -> Option<&Racecar> {
        self.cars.first()
    }

    /// Network averaged from the last generation's elites.
    pub fn average_winner(&self) -> Option<&NeuralNet> {
        self.engine.average_winner()
    }

    /// Whether every racecar has stopped.
    pub fn all_stopped(&self) -> bool {
        self.cars.iter().all(Racecar::is_stopped)
    }

    /// Races every racecar by one step, then moves to the next generation if
    /// all of them have stopped.
    ///
    /// Returns the transition summary when a generation closed on this step.
    pub fn step(&mut self) -> Result<Option<GenerationSummary>> {
        if self.advance()? {
            return Ok(self.next_generation());
        }
        Ok(None)
    }

    /// Steps until the current generation closes.
    pub fn run_generation(&mut self) -> Result<Option<GenerationSummary>> {
        Ok(self.run_generation_captured()?.map(|(summary, _)| summary))
    }

    /// Steps until the current generation closes, also returning the frame
    /// captured after the final step and before the racecars are replaced.
    pub fn run_generation_captured(&mut self) -> Result<Option<(GenerationSummary, Frame)>> {
        if self.cars.is_empty() {
            return Ok(None);
        }
        while !self.advance()? {}
        let frame = self.frame();
        Ok(self.next_generation().map(|summary| (summary, frame)))
    }

    /// Races every racecar by one step and enforces the step limit.
    /// Returns whether every racecar has stopped.
    fn advance(&mut self) -> Result<bool> {
        let track = &self.track;
        let params = &self.params;
        let cars = &mut self.cars;
        self.pool
            .install(|| cars.par_iter_mut().try_for_each(|car| car.race(track, params)))?;
        self.generation_steps += 1;

        if self.generation_steps >= self.params.max_generation_steps && !self.all_stopped() {
            warn!(
                generation = self.generation,
                steps = self.generation_steps,
                running = self.cars.iter().filter(|c| !c.stopped).count(),
                "generation hit the step limit, halting remaining racecars"
            );
            for car in &mut self.cars {
                car.stopped = true;
            }
        }

        Ok(self.all_stopped())
    }

    /// Replaces the current racecars with the next generation and updates the
    /// generation counter and best distance.
    pub fn next_generation(&mut self) -> Option<GenerationSummary> {
        let (next, leader_distance) =
            self.engine
                .next_generation(&self.cars, &self.track, &self.params, &mut self.rng)?;
        self.cars = next;
        self.generation += 1;

        let improved = leader_distance > self.best_distance;
        if improved {
            self.best_distance = leader_distance;
            self.last_improved_generation = self.generation;
            info!(
                generation = self.generation,
                best_distance = self.best_distance,
                "new best distance"
            );
        }

        let summary = GenerationSummary {
            generation: self.generation,
            leader_distance,
            best_distance: self.best_distance,
            improved,
            steps: self.generation_steps,
        };
        self.generation_steps = 0;
        Some(summary)
    }

    /// Read-only snapshot for a renderer.
    pub fn frame(&self) -> Frame {
        Frame::capture(self)
    }
}
