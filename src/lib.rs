//! # Geodyn -- collective dynamics on an elliptical manifold
//!
//! A physics library for evolving systems of hard point particles constrained
//! to an ellipse, treated as a 1-D Riemannian manifold: geodesic motion
//! between contacts, parallel-transport-corrected elastic exchange at
//! contacts, and exact collision prediction in adaptive mode. Total kinetic
//! energy is conserved to O(dt^4) over millions of steps.
//!
//! ## Quick Start
//!
//! ```rust
//! use geodyn::prelude::*;
//!
//! # fn main() -> Result<(), geodyn::error::Error> {
//! // An ellipse with semi-axes a = 2, b = 1.
//! let ellipse = Ellipse::new(2.0, 1.0)?;
//!
//! // Eight non-overlapping particles with seeded random placement.
//! let particles = generate_random_particles(8, 1.0, 0.02, &ellipse, -1.0..1.0, 42)?;
//!
//! // Run the adaptive driver and summarize energy conservation.
//! let options = AdaptiveOptions { max_time: 0.01, ..Default::default() };
//! let data = simulate_ellipse_adaptive(&particles, &ellipse, &options)?;
//! let report = analyze_energy_conservation(&data.conservation).unwrap();
//! assert!(report.conserved);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`geometry`] -- the manifold: metric, Christoffel symbol, Cartesian
//!   embedding, angle arithmetic
//! - [`geodesic`] -- the Forest-Ruth symplectic step and RK4 parallel
//!   transport
//! - [`particle`] -- immutable particle records, derived energies, seeded
//!   random generation
//! - [`collision`] -- contact predicates, resolution methods, time-to-contact
//!   prediction, the deterministic parallel pair scan
//! - [`simulation`] -- fixed-step and adaptive drivers, snapshot log,
//!   [`SimulationData`](simulation::SimulationData)
//! - [`conservation`] -- running totals and invariant analysis
//! - [`error`] -- the crate error type

pub mod collision;
pub mod conservation;
pub mod error;
pub mod geodesic;
pub mod geometry;
pub mod particle;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::collision::{CollisionMethod, CollisionPrediction};
    pub use crate::conservation::{
        analyze_conjugate_momentum, analyze_energy_conservation, ConservationLog,
        ConservationQuality, ConservationReport,
    };
    pub use crate::error::Error;
    pub use crate::geometry::Ellipse;
    pub use crate::particle::{generate_random_particles, update_particle, Particle};
    pub use crate::simulation::{
        simulate_ellipse, simulate_ellipse_adaptive, AdaptiveOptions, FixedStepOptions,
        SimulationData, TerminationReason,
    };
}
