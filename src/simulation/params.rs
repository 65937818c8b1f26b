use std::path::Path;

use serde::{Deserialize, Serialize};

use super::brain::MutationParams;
use super::error::{Result, SimulationError};

/// Simulation parameters that control racing and evolution.
///
/// Every field has a default, so a parameter file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of racecars per generation.
    pub population_size: usize,
    /// Number of top-ranked racecars used to seed the next generation.
    pub elite_count: usize,
    /// Hidden layers in each steering network.
    pub hidden_layers: usize,
    /// Distance covered per step while variable speed is off.
    pub speed: f64,
    /// Multiplier from re-centered network output to turn rate in degrees.
    pub turn_gain: f64,
    /// Turn rate clamp in degrees per step.
    pub max_turn_rate: f64,
    /// Multiplier applied to each sensed distance before it enters the network.
    pub input_scale: f64,
    /// Length of each sensor ray.
    pub sensor_range: f64,
    /// Sensor ray offsets from the heading, in degrees.
    pub sensor_angles: Vec<f64>,
    /// Steps after which a racecar outside the start box is stopped.
    pub timeout_steps: u32,
    /// Half the racecar's length along its heading.
    pub car_half_length: f64,
    /// Half the racecar's width across its heading.
    pub car_half_width: f64,
    /// Let the network's output also drive acceleration. Off by default.
    pub variable_speed: bool,
    /// Speed ceiling when variable speed is on.
    pub max_speed: f64,
    /// Mutation applied when deriving offspring networks.
    pub mutation: MutationParams,
    /// Size of the stepping worker pool. Zero picks one thread per core.
    pub worker_threads: usize,
    /// Steps after which a generation is forcibly halted. Must be positive.
    pub max_generation_steps: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            population_size: 50,
            elite_count: 3,
            hidden_layers: 2,
            speed: 0.002,
            turn_gain: 30.0,
            max_turn_rate: 20.0,
            input_scale: 10.0,
            sensor_range: 1.0,
            sensor_angles: vec![45.0, 20.0, 0.0, -20.0, -45.0],
            timeout_steps: 100,
            car_half_length: 0.02,
            car_half_width: 0.01,
            variable_speed: false,
            max_speed: 0.02,
            mutation: MutationParams::default(),
            worker_threads: 0,
            max_generation_steps: 5000,
        }
    }
}

impl Params {
    /// Number of network inputs, one per sensor.
    pub fn sensor_count(&self) -> usize {
        self.sensor_angles.len()
    }

    /// Loads parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    /// Rejects values that would keep a generation from ever closing.
    pub fn validate(&self) -> Result<()> {
        if self.max_generation_steps == 0 {
            return Err(SimulationError::InvalidParams(
                "max_generation_steps must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Saves parameters to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
