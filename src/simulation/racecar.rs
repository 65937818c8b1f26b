//! Racecar behavior, state, and per-step update.
//!
//! A racecar senses the track with a fan of short rays, feeds the distances
//! into its steering network, turns, moves, and then checks whether it has
//! to stop.

use geo::{Coord, coord};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::brain::NeuralNet;
use super::error::Result;
use super::geometric_utils::{
    LineEquation, distance, distance_squared, length, rotate_degrees, within_box,
};
use super::params::Params;
use super::track::Track;

/// Point reported by a sensor that sees no boundary.
pub const NOTHING_SEEN: Coord<f64> = Coord { x: 5.0, y: 5.0 };

/// A simulated vehicle steered by its own neural network.
///
/// A racecar lives for one generation. Offspring are always new racecars
/// created with [`Racecar::new`], [`Racecar::restart`] or
/// [`Racecar::mutate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Racecar {
    /// Current position.
    pub position: Coord<f64>,
    /// Unit vector the racecar is facing.
    pub heading: Coord<f64>,
    /// Distance covered per step.
    pub speed: f64,
    /// Last steering command in degrees, within `±max_turn_rate`.
    pub turn_rate: f64,
    /// Points found by the last sensing pass, one per sensor.
    pub seen_points: Vec<Coord<f64>>,
    /// Distance covered outside the start box. This is the fitness.
    pub distance_traveled: f64,
    /// Number of steps raced.
    pub steps: u32,
    /// Set once any termination rule fires. Never cleared.
    pub stopped: bool,
    /// Steering network.
    pub brain: NeuralNet,
}

impl Racecar {
    /// Places a new racecar at the track start, facing `(0, 1)`.
    pub fn new(track: &Track, brain: NeuralNet) -> Self {
        Self {
            position: track.start(),
            heading: coord! { x: 0.0, y: 1.0 },
            speed: 0.0,
            turn_rate: 0.0,
            seen_points: Vec::new(),
            distance_traveled: 0.0,
            steps: 0,
            stopped: false,
            brain,
        }
    }

    /// Creates a racecar with a fresh random network shaped for `params`.
    pub fn new_random<R: Rng + ?Sized>(track: &Track, params: &Params, rng: &mut R) -> Self {
        let brain = NeuralNet::new_random(params.sensor_count(), 1, params.hidden_layers, rng);
        Self::new(track, brain)
    }

    /// A fresh racecar at the start with an exact copy of this network.
    pub fn restart(&self, track: &Track) -> Self {
        Self::new(track, self.brain.clone())
    }

    /// A fresh racecar at the start with a mutation of this network.
    pub fn mutate<R: Rng + ?Sized>(&self, track: &Track, params: &Params, rng: &mut R) -> Self {
        Self::new(track, self.brain.mutate(&params.mutation, rng))
    }

    /// Whether the racecar has stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Advances the racecar by one step. Does nothing once stopped.
    ///
    /// Reads only the track and writes only `self`, so racecars can be
    /// stepped in parallel.
    pub fn race(&mut self, track: &Track, params: &Params) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.steps += 1;

        let out_of_start = !track.in_start_box(self.position);
        self.look(track, params);
        self.steer(params)?;

        let movement = self.heading * self.speed;
        if out_of_start {
            self.distance_traveled += length(movement);
        }
        self.position = self.position + movement;

        self.stopped = self.should_stop(track, params);
        Ok(())
    }

    fn should_stop(&self, track: &Track, params: &Params) -> bool {
        if self.steps > params.timeout_steps && !track.in_start_box(self.position) {
            return true;
        }
        if track.in_stop_box(self.position) {
            return true;
        }
        self.bounding_box(params)
            .iter()
            .any(|&corner| !track.on_track(corner))
    }

    fn look(&mut self, track: &Track, params: &Params) {
        self.seen_points = params
            .sensor_angles
            .iter()
            .map(|&angle| self.look_towards(track, angle, params.sensor_range))
            .collect();
    }

    /// Casts one ray `angle` degrees off the heading and returns the nearest
    /// boundary crossing, or [`NOTHING_SEEN`].
    fn look_towards(&self, track: &Track, angle: f64, range: f64) -> Coord<f64> {
        let end = self.position + rotate_degrees(self.heading, angle) * range;
        let ray = LineEquation::through(self.position, end);

        let mut closest = NOTHING_SEEN;
        for segment in track.segments() {
            let hit = segment.find_intersect(&ray);
            if hit.intersects
                && within_box(hit.location, self.position, end)
                && distance_squared(self.position, hit.location)
                    < distance_squared(self.position, closest)
            {
                closest = hit.location;
            }
        }
        closest
    }

    fn steer(&mut self, params: &Params) -> Result<()> {
        let inputs: Vec<f64> = self
            .seen_points
            .iter()
            .map(|&p| params.input_scale * distance(self.position, p))
            .collect();

        let outputs = self.brain.update(&inputs)?;
        let correction = self
            .brain
            .outputs()
            .neurons
            .first()
            .map_or(0.0, |n| n.range_correction());
        let command = outputs.first().copied().unwrap_or(correction);

        if params.variable_speed {
            let acceleration = command - 0.5;
            self.speed = (self.speed + acceleration / 10.0).clamp(0.0, params.max_speed);
        } else {
            self.speed = params.speed;
        }

        self.turn_rate = ((command - correction) * params.turn_gain)
            .clamp(-params.max_turn_rate, params.max_turn_rate);
        self.heading = rotate_degrees(self.heading, self.turn_rate);
        Ok(())
    }

    /// Corners of the rectangle centered on the racecar and aligned with its
    /// heading.
    pub fn bounding_box(&self, params: &Params) -> [Coord<f64>; 4] {
        let forward = self.heading * params.car_half_length;
        let side = rotate_degrees(self.heading, 90.0) * params.car_half_width;
        [
            self.position + forward + side,
            self.position + forward - side,
            self.position - forward - side,
            self.position - forward + side,
        ]
    }
}
