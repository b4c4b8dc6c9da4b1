//! Crate-level error types.

use thiserror::Error;

/// Errors surfaced by constructors, the particle generator and the drivers.
///
/// Step-budget exhaustion in the adaptive driver is deliberately *not* an
/// error: the run terminates early with
/// [`TerminationReason::MaxSteps`](crate::simulation::TerminationReason) and
/// the partial trajectory is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Ellipse semi-axes must satisfy `a >= b > 0`.
    #[error("invalid ellipse semi-axes a = {a}, b = {b}: require a >= b > 0")]
    InvalidGeometry { a: f64, b: f64 },

    /// A driver or generator option failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The random generator could not place every particle without overlap
    /// within its retry budget.
    #[error("placed only {placed} of {requested} particles after {attempts} attempts")]
    Initialization {
        requested: usize,
        placed: usize,
        attempts: usize,
    },
}
