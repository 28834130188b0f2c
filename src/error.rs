//! Error types for construction-time validation.
//!
//! The per-tick path never fails; these errors only come out of the
//! `try_*` constructors and the `validate` methods on the config types.

use thiserror::Error;

/// Errors reported when building particles or configurations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be positive and finite.
    #[error("mass must be positive and finite")]
    InvalidMass,
    /// Child scale must be positive and finite.
    #[error("child scale must be positive and finite")]
    InvalidScale,
    /// At least one spring iteration is required per step.
    #[error("spring iterations must be at least 1")]
    InvalidSpringIterations,
    /// The maximum timestep must be positive and finite.
    #[error("maximum timestep must be positive and finite")]
    InvalidTimestep,
    /// Tile grid dimensions overflow `usize` when multiplied.
    #[error("tile grid of {cols} x {rows} is too large")]
    GridTooLarge { cols: usize, rows: usize },
    /// A tuning coefficient is outside its valid range.
    #[error("coefficient `{name}` out of range: {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },
}
