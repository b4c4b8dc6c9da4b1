//! Induced geometry of the ellipse.
//!
//! The ellipse with semi-axes `(a, b)` is the 1-D Riemannian manifold
//! parameterized by `theta |-> (a cos theta, b sin theta)`. The induced metric
//! has the single component
//!
//! ```text
//! g(theta) = a^2 sin^2 theta + b^2 cos^2 theta
//! ```
//!
//! and the single non-zero Christoffel symbol
//!
//! ```text
//! Gamma(theta) = (a^2 - b^2) sin theta cos theta / g(theta)
//! ```
//!
//! Every function here is pure and finite for all real `theta`: the metric is
//! bounded below by `b^2 > 0`.

use std::f64::consts::{PI, TAU};

use glam::DVec2;

use crate::error::Error;

/// Wrap an angle into the canonical range `[0, 2pi)`.
#[inline]
pub fn wrap_angle(theta: f64) -> f64 {
    theta.rem_euclid(TAU)
}

/// Signed angular difference `to - from`, reduced to the shorter arc.
///
/// The result lies in `[-pi, pi)` and is invariant under shifting both angles
/// by any multiple of `2pi`, so separations behave correctly across the
/// `theta = 0` seam.
#[inline]
pub fn signed_angle_delta(from: f64, to: f64) -> f64 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// An ellipse with semi-axes `a >= b > 0`. Immutable after construction.
///
/// # Example
///
/// ```
/// use geodyn::geometry::Ellipse;
///
/// let ellipse = Ellipse::new(2.0, 1.0).unwrap();
/// // On a circle the connection vanishes identically.
/// let circle = Ellipse::new(1.0, 1.0).unwrap();
/// assert_eq!(circle.christoffel(0.7), 0.0);
/// assert!(ellipse.metric(0.3) > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipse {
    a: f64,
    b: f64,
}

impl Ellipse {
    /// Create an ellipse, validating `a >= b > 0`.
    pub fn new(a: f64, b: f64) -> Result<Self, Error> {
        if !(b > 0.0) || !(a >= b) || !a.is_finite() {
            return Err(Error::InvalidGeometry { a, b });
        }
        Ok(Self { a, b })
    }

    /// Major semi-axis.
    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Minor semi-axis.
    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Metric component `g(theta) = a^2 sin^2 theta + b^2 cos^2 theta`.
    #[inline]
    pub fn metric(&self, theta: f64) -> f64 {
        let (sin, cos) = theta.sin_cos();
        self.a * self.a * sin * sin + self.b * self.b * cos * cos
    }

    /// Christoffel symbol `Gamma(theta) = (a^2 - b^2) sin theta cos theta / g(theta)`.
    #[inline]
    pub fn christoffel(&self, theta: f64) -> f64 {
        let (sin, cos) = theta.sin_cos();
        (self.a * self.a - self.b * self.b) * sin * cos / self.metric(theta)
    }

    /// Embedded Cartesian position `(a cos theta, b sin theta)`.
    #[inline]
    pub fn position(&self, theta: f64) -> DVec2 {
        let (sin, cos) = theta.sin_cos();
        DVec2::new(self.a * cos, self.b * sin)
    }

    /// Embedded Cartesian velocity `(-a theta_dot sin theta, b theta_dot cos theta)`.
    #[inline]
    pub fn velocity(&self, theta: f64, theta_dot: f64) -> DVec2 {
        let (sin, cos) = theta.sin_cos();
        DVec2::new(-self.a * theta_dot * sin, self.b * theta_dot * cos)
    }

    /// Geodesic separation of two angular positions.
    ///
    /// Approximates arc length as `sqrt(g(theta_m)) * |delta theta|` with
    /// `delta theta` the shorter arc and `theta_m` its midpoint. The midpoint
    /// is taken along the shorter arc, so both the branch choice at the seam
    /// and any common angular offset leave the result unchanged.
    pub fn geodesic_separation(&self, theta_1: f64, theta_2: f64) -> f64 {
        let delta = signed_angle_delta(theta_1, theta_2);
        let midpoint = wrap_angle(theta_1 + 0.5 * delta);
        self.metric(midpoint).sqrt() * delta.abs()
    }
}
