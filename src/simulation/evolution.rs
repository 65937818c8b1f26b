//! Selection and reproduction between generations.
//!
//! The top racecars by distance traveled become elites. The next generation
//! is the best elite restarted, the elite average restarted, and mutations of
//! the elite average for every remaining slot.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::brain::NeuralNet;
use super::params::Params;
use super::racecar::Racecar;
use super::track::Track;

/// Outcome of one generation transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation number after the transition.
    pub generation: u32,
    /// Distance traveled by the best racecar of the closed generation.
    pub leader_distance: f64,
    /// Best distance over all generations so far.
    pub best_distance: f64,
    /// Whether the closed generation set a new best.
    pub improved: bool,
    /// Steps the closed generation ran for.
    pub steps: u64,
}

/// Builds successive generations from ranked racecars.
#[derive(Debug, Clone, Default)]
pub struct EvolutionEngine {
    average_winner: Option<NeuralNet>,
}

impl EvolutionEngine {
    /// Creates an engine with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network averaged from the elites of the last transition.
    pub fn average_winner(&self) -> Option<&NeuralNet> {
        self.average_winner.as_ref()
    }

    /// Ranks `cars` by distance traveled, highest first.
    ///
    /// The sort is stable, so equal distances keep their slot order.
    pub fn rank(cars: &[Racecar]) -> Vec<&Racecar> {
        let mut ranked: Vec<&Racecar> = cars.iter().collect();
        ranked.sort_by(|a, b| b.distance_traveled.total_cmp(&a.distance_traveled));
        ranked
    }

    /// Produces the next generation from `cars`.
    ///
    /// Returns the new racecars and the leader's distance, or `None` when
    /// `cars` is empty.
    pub fn next_generation<R: Rng + ?Sized>(
        &mut self,
        cars: &[Racecar],
        track: &Track,
        params: &Params,
        rng: &mut R,
    ) -> Option<(Vec<Racecar>, f64)> {
        let ranked = Self::rank(cars);
        let leader = *ranked.first()?;
        let elites: Vec<&NeuralNet> = ranked
            .iter()
            .take(params.elite_count.max(1))
            .map(|car| &car.brain)
            .collect();

        let average = NeuralNet::average(&elites)?;
        let average_winner = Racecar::new(track, average.clone());

        let size = params.population_size;
        let mut next = Vec::with_capacity(size);
        if size > 0 {
            next.push(leader.restart(track));
        }
        if size > 1 {
            next.push(average_winner.restart(track));
        }
        while next.len() < size {
            next.push(average_winner.mutate(track, params, rng));
        }

        debug!(
            elites = elites.len(),
            leader_distance = leader.distance_traveled,
            offspring = next.len(),
            "built next generation"
        );

        self.average_winner = Some(average);
        Some((next, leader.distance_traveled))
    }
}
