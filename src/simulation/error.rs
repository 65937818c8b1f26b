//! Error type shared by the simulation modules.

use thiserror::Error;

/// Errors surfaced by the simulation library.
///
/// Geometry never produces an error: degenerate cases resolve to a
/// non-intersecting [`super::geometric_utils::Intersection`] instead.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Reading or writing a track or parameter file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A track or parameter file exists but could not be parsed.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    /// A forward pass was fed an input vector of the wrong length.
    #[error("network expects {expected} inputs, got {actual}")]
    InputSize {
        /// Size of the network's input layer.
        expected: usize,
        /// Length of the vector that was supplied.
        actual: usize,
    },
    /// A parameter set failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// The worker pool used for parallel stepping could not be built.
    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;
