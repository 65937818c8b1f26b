//! Read-only snapshot of a population for renderers.
//!
//! The simulation never draws anything itself. A renderer asks for a
//! [`Frame`] once per displayed frame and does what it likes with it.

use geo::Coord;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::population::Population;

/// Outline and status of one racecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarView {
    /// Oriented bounding-box corners.
    pub corners: [Coord<f64>; 4],
    /// Whether the racecar has stopped.
    pub stopped: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Current generation number.
    pub generation: u32,
    /// Best distance ever recorded.
    pub best_distance: f64,
    /// Generation at which the best distance last improved.
    pub last_improved_generation: u32,
    /// Lead racecar's speed.
    pub lead_speed: f64,
    /// Lead racecar's last turn rate in degrees.
    pub lead_turn_rate: f64,
    /// Lead racecar's position.
    pub lead_position: Option<Coord<f64>>,
    /// Points the lead racecar's sensors found on the last step.
    pub lead_seen_points: Vec<Coord<f64>>,
    /// Weight × value per connection of the lead steering network, one
    /// matrix per non-input layer.
    pub lead_connections: Vec<Array2<f64>>,
    /// Every racecar in slot order.
    pub cars: Vec<CarView>,
}

impl Frame {
    /// Captures the current state of `population`.
    pub fn capture(population: &Population) -> Self {
        let params = population.params();
        let lead = population.lead();

        Self {
            generation: population.generation,
            best_distance: population.best_distance,
            last_improved_generation: population.last_improved_generation,
            lead_speed: lead.map_or(0.0, |car| car.speed),
            lead_turn_rate: lead.map_or(0.0, |car| car.turn_rate),
            lead_position: lead.map(|car| car.position),
            lead_seen_points: lead.map(|car| car.seen_points.clone()).unwrap_or_default(),
            lead_connections: lead
                .map(|car| car.brain.connection_products())
                .unwrap_or_default(),
            cars: population
                .cars
                .iter()
                .map(|car| CarView {
                    corners: car.bounding_box(params),
                    stopped: car.stopped,
                })
                .collect(),
        }
    }
}
