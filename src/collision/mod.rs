//! Contact detection, prediction, and resolution for particle pairs.
//!
//! Contact is defined geodesically: two particles touch when their arc
//! separation equals the sum of their radii. The submodules provide
//!
//! - [`resolver`] -- post-collision velocities (transport swap or elastic
//!   exchange), with a per-collision conservation report,
//! - [`predictor`] -- time-to-contact root finding per pair and the serial
//!   global scan,
//! - [`scan`] -- the pair/linear index bijection and the deterministic
//!   parallel scan.

mod predictor;
mod resolver;
mod scan;

pub use predictor::{find_next_collision, time_to_contact, CollisionPrediction};
pub use resolver::{resolve_collision, CollisionReport};
pub use scan::{find_next_collision_parallel, linear_to_pair, pair_to_linear};

use crate::geometry::Ellipse;
use crate::particle::Particle;

/// Strategy used to produce post-collision velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollisionMethod {
    /// Parallel-transport swap of the angular velocities, nothing else.
    Simple,
    /// The same swap, plus a conservation check of the pair totals reported
    /// back to the driver.
    #[default]
    ParallelTransport,
    /// Elastic exchange at the contact midpoint followed by one Forest-Ruth
    /// sub-step. Experimental; kept for research runs.
    Geodesic,
}

/// Geodesic contact predicate: arc separation within the sum of radii.
#[inline]
pub fn in_contact(ellipse: &Ellipse, p: &Particle, q: &Particle) -> bool {
    ellipse.geodesic_separation(p.theta, q.theta) <= p.radius + q.radius
}

/// Cartesian contact predicate on the embedded positions.
///
/// The chord never exceeds the arc, so this fires at least as often as
/// [`in_contact`]; it is the cheap coarse filter, not the authority.
#[inline]
pub fn in_contact_cartesian(p: &Particle, q: &Particle) -> bool {
    p.pos.distance(q.pos) <= p.radius + q.radius
}

/// Whether the pair's angular separation is currently shrinking.
///
/// A pair that is in contact but already separating must not be resolved
/// again: re-swapping would turn them around and trap them inside each
/// other's radius.
#[inline]
pub fn approaching(p: &Particle, q: &Particle) -> bool {
    crate::geometry::signed_angle_delta(p.theta, q.theta) * (q.theta_dot - p.theta_dot) < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_predicates_agree_on_touching_pair() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let p = Particle::new(0, 1.0, 0.3, 1.0, 0.0, &ellipse);
        let q = Particle::new(1, 1.0, 0.3, 1.1, 0.0, &ellipse);
        assert!(in_contact(&ellipse, &p, &q));
        assert!(in_contact_cartesian(&p, &q));

        let far = Particle::new(2, 1.0, 0.3, 4.0, 0.0, &ellipse);
        assert!(!in_contact(&ellipse, &p, &far));
        assert!(!in_contact_cartesian(&p, &far));
    }

    #[test]
    fn approaching_tracks_the_shrinking_arc() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let p = Particle::new(0, 1.0, 0.1, 1.0, 0.5, &ellipse);
        let q = Particle::new(1, 1.0, 0.1, 1.5, -0.5, &ellipse);
        assert!(approaching(&p, &q), "head-on pair is approaching");
        let (p_away, q_away) = (
            Particle::new(0, 1.0, 0.1, 1.0, -0.5, &ellipse),
            Particle::new(1, 1.0, 0.1, 1.5, 0.5, &ellipse),
        );
        assert!(!approaching(&p_away, &q_away), "receding pair is not");
        // Across the seam: p behind the seam moving forward closes on q.
        let p_seam = Particle::new(0, 1.0, 0.1, 6.2, 0.4, &ellipse);
        let q_seam = Particle::new(1, 1.0, 0.1, 0.1, -0.4, &ellipse);
        assert!(approaching(&p_seam, &q_seam));
    }

    #[test]
    fn cartesian_filter_is_at_least_as_permissive() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for k in 0..200 {
            let th = k as f64 * std::f64::consts::TAU / 200.0;
            let p = Particle::new(0, 1.0, 0.2, th, 0.0, &ellipse);
            let q = Particle::new(1, 1.0, 0.2, th + 0.35, 0.0, &ellipse);
            if in_contact(&ellipse, &p, &q) {
                assert!(
                    in_contact_cartesian(&p, &q),
                    "chord predicate must fire whenever the arc predicate does (theta = {})",
                    th
                );
            }
        }
    }
}
