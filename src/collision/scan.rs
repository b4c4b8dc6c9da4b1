//! Deterministic parallel scan over unordered pairs.
//!
//! The `n(n-1)/2` unordered pairs `(i, j)`, `i < j`, are mapped to linear
//! indices `0..n(n-1)/2` in ascending lexicographic order. The parallel scan
//! partitions that index range into one contiguous chunk per worker; each
//! worker reduces its chunk to a private `(t_min, pair)` candidate and the
//! candidates are combined serially afterwards. No state is shared during the
//! scan and no atomics are involved, so repeated runs produce bit-identical
//! results, and exact ties are broken toward the lexicographically smallest
//! pair -- the same answer the serial scan produces by iteration order.

use rayon::prelude::*;

use crate::geometry::Ellipse;
use crate::particle::Particle;

use super::predictor::{find_next_collision, time_to_contact, CollisionPrediction};

/// Below this many particles the serial scan wins: the fork-join overhead
/// dominates the pair loop.
const SERIAL_SCAN_THRESHOLD: usize = 30;

/// Number of pairs preceding row `i`, i.e. the linear index of pair `(i, i+1)`.
#[inline]
fn row_start(i: usize, n: usize) -> usize {
    // i and (2n - i - 1) have opposite parity, so the product is even.
    i * (2 * n - i - 1) / 2
}

/// Linear index of the unordered pair `(i, j)`, `i < j < n`.
#[inline]
pub fn pair_to_linear(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i < j && j < n);
    row_start(i, n) + (j - i - 1)
}

/// The unordered pair `(i, j)` at linear index `k`, inverse of
/// [`pair_to_linear`].
pub fn linear_to_pair(k: usize, n: usize) -> (usize, usize) {
    debug_assert!(k < n * (n - 1) / 2);
    // Closed-form row guess from the triangular numbers, then integer fixup
    // against rounding.
    let discriminant = ((2 * n - 1) * (2 * n - 1) - 8 * k) as f64;
    let mut i = ((2 * n - 1) as f64 - discriminant.sqrt()) as usize / 2;
    while i + 1 < n && row_start(i + 1, n) <= k {
        i += 1;
    }
    while row_start(i, n) > k {
        i -= 1;
    }
    let j = i + 1 + (k - row_start(i, n));
    (i, j)
}

/// Keep the earlier candidate; break exact ties lexicographically.
fn earlier(
    best: Option<(f64, (usize, usize))>,
    candidate: (f64, (usize, usize)),
) -> Option<(f64, (usize, usize))> {
    match best {
        None => Some(candidate),
        Some(current) => {
            if candidate.0 < current.0 || (candidate.0 == current.0 && candidate.1 < current.1) {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    }
}

/// Parallel equivalent of
/// [`find_next_collision`](super::find_next_collision): same inputs, same
/// result, bit for bit.
///
/// Falls back to the serial scan for small particle counts or a single-thread
/// pool.
pub fn find_next_collision_parallel(
    ellipse: &Ellipse,
    particles: &[Particle],
    max_time: f64,
    dt_min: f64,
) -> CollisionPrediction {
    let n = particles.len();
    let workers = rayon::current_num_threads();
    if n < SERIAL_SCAN_THRESHOLD || workers <= 1 {
        return find_next_collision(ellipse, particles, max_time, dt_min);
    }

    let total = n * (n - 1) / 2;
    let chunk = total.div_ceil(workers);

    // Map: every worker scans its own index range into a private minimum.
    // `collect` preserves chunk order for the serial combine below.
    let locals: Vec<Option<(f64, (usize, usize))>> = (0..workers)
        .into_par_iter()
        .map(|w| {
            let lo = w * chunk;
            let hi = ((w + 1) * chunk).min(total);
            let mut best = None;
            for k in lo..hi {
                let (i, j) = linear_to_pair(k, n);
                if let Some(t) = time_to_contact(ellipse, &particles[i], &particles[j], max_time)
                {
                    best = earlier(best, (t, (i, j)));
                }
            }
            best
        })
        .collect();

    // Reduce: serial combine of the per-worker candidates.
    let mut best = None;
    for local in locals.into_iter().flatten() {
        best = earlier(best, local);
    }
    match best {
        Some((t, pair)) => CollisionPrediction {
            dt: t.max(dt_min),
            pair,
            found: true,
        },
        None => CollisionPrediction {
            dt: f64::INFINITY,
            pair: (0, 0),
            found: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::generate_random_particles;

    #[test]
    fn pair_index_bijection_round_trips() {
        for n in [2, 3, 5, 10, 37, 100] {
            let total = n * (n - 1) / 2;
            for k in 0..total {
                let (i, j) = linear_to_pair(k, n);
                assert!(i < j && j < n, "invalid pair ({}, {}) for n = {}", i, j, n);
                assert_eq!(
                    pair_to_linear(i, j, n),
                    k,
                    "bijection broken at k = {}, n = {}",
                    k,
                    n
                );
            }
            // And the other direction: every pair maps into range, uniquely.
            let mut seen = vec![false; total];
            for i in 0..n {
                for j in (i + 1)..n {
                    let k = pair_to_linear(i, j, n);
                    assert!(k < total);
                    assert!(!seen[k], "pair ({}, {}) collides at k = {}", i, j, k);
                    seen[k] = true;
                }
            }
        }
    }

    #[test]
    fn linear_index_is_lexicographic() {
        let n = 6;
        let mut previous = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let k = pair_to_linear(i, j, n);
                if let Some(prev) = previous {
                    assert_eq!(k, prev + 1, "indices must be dense and ascending");
                }
                previous = Some(k);
            }
        }
    }

    #[test]
    fn parallel_scan_matches_serial_exactly() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for n in [10, 20, 30, 50] {
            let particles =
                generate_random_particles(n, 1.0, 0.02, &ellipse, -1.0..1.0, 42).unwrap();
            let serial = find_next_collision(&ellipse, &particles, 1.0, 1e-9);
            let parallel = find_next_collision_parallel(&ellipse, &particles, 1.0, 1e-9);
            assert_eq!(
                serial, parallel,
                "serial and parallel scans disagree for n = {}",
                n
            );
        }
    }

    #[test]
    fn parallel_scan_is_repeatable() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let particles = generate_random_particles(50, 1.0, 0.02, &ellipse, -1.0..1.0, 7).unwrap();
        let first = find_next_collision_parallel(&ellipse, &particles, 1.0, 1e-9);
        for _ in 0..5 {
            let again = find_next_collision_parallel(&ellipse, &particles, 1.0, 1e-9);
            assert_eq!(first, again, "repeated parallel scans must be bit-identical");
        }
    }
}
