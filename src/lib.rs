//! # Neural Racecars - Neuroevolution on a 2D Track
//!
//! A population of racecars, each steered by a small feed-forward neural
//! network, learns to drive around a closed track. There is no gradient
//! training: every generation the best racecars are kept, averaged, and
//! mutated to seed the next one.
//!
//! ## Features
//!
//! - Feed-forward networks with random, mutated, and averaged construction
//! - Ray-cast sensing against the track boundary
//! - Constant-speed kinematics with an optional variable-speed mode
//! - Parallel per-step racing on a fixed worker pool
//! - Seeded, reproducible evolution runs
//! - JSON track records and parameter files
//! - Read-only frame snapshots for external renderers
//!
//! ## Core Modules
//!
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::geometric_utils`] - Line intersection and point-in-polygon
//! - [`simulation::track`] - Track waypoints and derived boundary geometry
//! - [`simulation::racecar`] - Racecar sensing, steering, and termination
//! - [`simulation::population`] - Step loop and generation bookkeeping
//! - [`simulation::evolution`] - Elite selection and reproduction

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neural network implementation for racecar steering.
    pub mod brain;
    /// Error type shared by the simulation.
    pub mod error;
    /// Selection and reproduction between generations.
    pub mod evolution;
    /// Read-only snapshots for renderers.
    pub mod frame;
    /// Geometric utility functions for sensing and containment.
    pub mod geometric_utils;
    /// Simulation parameters.
    pub mod params;
    /// Population of racecars and the step loop.
    pub mod population;
    /// Racecar behavior, state, and per-step update.
    pub mod racecar;
    /// Race track and its derived geometry.
    pub mod track;
}
