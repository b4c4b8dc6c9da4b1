//! Simulation drivers and the in-memory result aggregate.
//!
//! Two drivers share the same building blocks:
//!
//! - [`simulate_ellipse`] -- fixed step size, collision resolution by a
//!   single pass over the currently overlapping pairs after every step;
//! - [`simulate_ellipse_adaptive`] -- the primary driver: every step is sized
//!   to the earliest predicted contact (bounded by `dt_max`/`dt_min`), so
//!   collisions are hit exactly rather than discovered after the fact.
//!
//! Both return a [`SimulationData`] owning the snapshot log, the conservation
//! log, and the collision counters. Hitting the adaptive step budget is not
//! an error: the run stops with [`TerminationReason::MaxSteps`], logs a
//! warning, and returns the partial trajectory.

use tracing::{debug, warn};

use crate::collision::{
    approaching, find_next_collision, find_next_collision_parallel, in_contact, resolve_collision,
    CollisionMethod, CollisionReport,
};
use crate::conservation::ConservationLog;
use crate::error::Error;
use crate::geodesic::forest_ruth_step;
use crate::geometry::Ellipse;
use crate::particle::{total_conjugate_momentum, total_energy, update_particle, Particle};

/// Slack when deciding whether the consumed step reached the predicted
/// contact time.
const COLLISION_TIME_SLACK: f64 = 1e-12;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// Fixed-step driver ran its full step count.
    Completed,
    /// Adaptive driver reached `max_time`.
    MaxTime,
    /// Adaptive driver exhausted `max_steps` before `max_time`.
    MaxSteps,
}

/// One recorded state of the whole system.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Simulation time of the record.
    pub time: f64,
    /// Full particle state at that time.
    pub particles: Vec<Particle>,
}

/// Everything a run produces, in memory.
///
/// The snapshot log grows monotonically in time and always contains the
/// initial state; collaborators serialize from here. Nothing is freed before
/// the whole aggregate is dropped.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationData {
    /// The manifold the run was performed on.
    pub ellipse: Ellipse,
    /// Dense time-ordered state log.
    pub snapshots: Vec<Snapshot>,
    /// System totals at every snapshot.
    pub conservation: ConservationLog,
    /// Number of resolved contacts.
    pub n_collisions: usize,
    /// How many of those carried a conservation check.
    pub n_checked: usize,
    /// How many checks passed.
    pub n_conserved: usize,
    /// Step sizes actually consumed; empty for fixed-step runs.
    pub dt_history: Vec<f64>,
    /// Steps executed.
    pub steps_taken: usize,
    /// Why the run stopped.
    pub termination: TerminationReason,
}

impl SimulationData {
    fn new(ellipse: Ellipse, termination: TerminationReason) -> Self {
        Self {
            ellipse,
            snapshots: Vec::new(),
            conservation: ConservationLog::default(),
            n_collisions: 0,
            n_checked: 0,
            n_conserved: 0,
            dt_history: Vec::new(),
            steps_taken: 0,
            termination,
        }
    }

    /// Fraction of conservation-checked resolutions that stayed within
    /// tolerance; 1.0 when nothing was checked.
    pub fn conserved_fraction(&self) -> f64 {
        if self.n_checked == 0 {
            1.0
        } else {
            self.n_conserved as f64 / self.n_checked as f64
        }
    }

    fn record(&mut self, time: f64, particles: &[Particle]) {
        self.conservation.record(
            time,
            total_energy(particles, &self.ellipse),
            total_conjugate_momentum(particles, &self.ellipse),
        );
        self.snapshots.push(Snapshot {
            time,
            particles: particles.to_vec(),
        });
    }

    fn count_collision(&mut self, report: Option<CollisionReport>) {
        self.n_collisions += 1;
        if let Some(report) = report {
            self.n_checked += 1;
            if report.conserved {
                self.n_conserved += 1;
            }
        }
    }
}

/// Options for the fixed-step driver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedStepOptions {
    /// Number of steps to run.
    pub n_steps: usize,
    /// Step size.
    pub dt: f64,
    /// Snapshot cadence in steps.
    pub save_every: usize,
    /// Collision resolution strategy.
    pub method: CollisionMethod,
    /// Conservation tolerance handed to the resolver.
    pub tolerance: f64,
}

impl Default for FixedStepOptions {
    fn default() -> Self {
        Self {
            n_steps: 10_000,
            dt: 1e-4,
            save_every: 100,
            method: CollisionMethod::default(),
            tolerance: 1e-6,
        }
    }
}

impl FixedStepOptions {
    fn validate(&self) -> Result<(), Error> {
        if self.n_steps == 0 {
            return Err(Error::InvalidOptions("n_steps must be positive".into()));
        }
        if !(self.dt > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.save_every == 0 {
            return Err(Error::InvalidOptions("save_every must be positive".into()));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Options for the adaptive driver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveOptions {
    /// Simulation horizon.
    pub max_time: f64,
    /// Upper bound on any single step.
    pub dt_max: f64,
    /// Lower bound on any single step (the stuck-pair safety valve).
    pub dt_min: f64,
    /// Snapshot cadence in simulation time.
    pub save_interval: f64,
    /// Collision resolution strategy.
    pub method: CollisionMethod,
    /// Conservation tolerance handed to the resolver.
    pub tolerance: f64,
    /// Step budget; exhausting it ends the run early with a warning.
    pub max_steps: usize,
    /// Use the parallel pair scan for collision prediction.
    pub parallel: bool,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            max_time: 1.0,
            dt_max: 1e-3,
            dt_min: 1e-9,
            save_interval: 1e-2,
            method: CollisionMethod::default(),
            tolerance: 1e-6,
            max_steps: 10_000_000,
            parallel: false,
        }
    }
}

impl AdaptiveOptions {
    fn validate(&self) -> Result<(), Error> {
        if !(self.max_time > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "max_time must be positive, got {}",
                self.max_time
            )));
        }
        if !(self.dt_min > 0.0) || !(self.dt_max > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "step bounds must be positive, got dt_min = {}, dt_max = {}",
                self.dt_min, self.dt_max
            )));
        }
        if self.dt_min >= self.dt_max {
            return Err(Error::InvalidOptions(format!(
                "dt_min = {} must be below dt_max = {}",
                self.dt_min, self.dt_max
            )));
        }
        if !(self.save_interval > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "save_interval must be positive, got {}",
                self.save_interval
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidOptions("max_steps must be positive".into()));
        }
        Ok(())
    }
}

fn validate_particles(particles: &[Particle]) -> Result<(), Error> {
    if particles.is_empty() {
        return Err(Error::InvalidOptions(
            "at least one particle is required".into(),
        ));
    }
    for p in particles {
        if !(p.mass > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "particle {} has non-positive mass {}",
                p.id, p.mass
            )));
        }
        if !(p.radius >= 0.0) {
            return Err(Error::InvalidOptions(format!(
                "particle {} has negative radius {}",
                p.id, p.radius
            )));
        }
    }
    Ok(())
}

/// Advance every particle by one Forest-Ruth step of size `dt`.
///
/// All positions are read from the prior state before any is written, so the
/// update order across particles is irrelevant.
fn integrate_all(state: &mut [Particle], ellipse: &Ellipse, dt: f64) {
    for p in state.iter_mut() {
        let (theta, theta_dot) = forest_ruth_step(ellipse, p.theta, p.theta_dot, dt);
        *p = update_particle(p, theta, theta_dot, ellipse);
    }
}

/// Fixed-step driver.
///
/// After each step, every currently overlapping *approaching* pair is
/// resolved once, in ascending lexicographic `(i, j)` order -- the documented
/// deterministic choice for particles that appear in several overlapping
/// pairs at once. Pairs whose overlap is already opening are skipped so a
/// contact that persists across several fixed steps is resolved exactly once.
pub fn simulate_ellipse(
    particles: &[Particle],
    ellipse: &Ellipse,
    options: &FixedStepOptions,
) -> Result<SimulationData, Error> {
    options.validate()?;
    validate_particles(particles)?;

    let mut state = particles.to_vec();
    let mut data = SimulationData::new(*ellipse, TerminationReason::Completed);
    data.record(0.0, &state);

    let mut time = 0.0;
    for step in 1..=options.n_steps {
        integrate_all(&mut state, ellipse, options.dt);
        time = step as f64 * options.dt;

        for i in 0..state.len() {
            for j in (i + 1)..state.len() {
                if in_contact(ellipse, &state[i], &state[j]) && approaching(&state[i], &state[j])
                {
                    let (p, q, report) = resolve_collision(
                        ellipse,
                        &state[i],
                        &state[j],
                        options.method,
                        options.tolerance,
                        options.dt,
                    );
                    state[i] = p;
                    state[j] = q;
                    data.count_collision(report);
                    debug!(i, j, time, "fixed-step contact resolved");
                }
            }
        }

        if step % options.save_every == 0 {
            data.record(time, &state);
        }
    }

    if options.n_steps % options.save_every != 0 {
        data.record(time, &state);
    }
    data.steps_taken = options.n_steps;
    Ok(data)
}

/// Adaptive driver: the primary entry point.
///
/// Each iteration asks the predictor for the earliest contact, advances by
/// `min(dt_c, dt_max, remaining)` (floored at `dt_min`), and resolves the
/// predicted pair only when the consumed step actually reached the contact.
/// Snapshots follow simulation time (`save_interval`), not step count.
pub fn simulate_ellipse_adaptive(
    particles: &[Particle],
    ellipse: &Ellipse,
    options: &AdaptiveOptions,
) -> Result<SimulationData, Error> {
    options.validate()?;
    validate_particles(particles)?;

    let mut state = particles.to_vec();
    let mut data = SimulationData::new(*ellipse, TerminationReason::MaxTime);
    data.record(0.0, &state);

    let mut time = 0.0;
    let mut step = 0usize;
    let mut next_save = options.save_interval;

    while time < options.max_time {
        if step >= options.max_steps {
            warn!(
                steps = step,
                time, "step budget exhausted before max_time; returning partial run"
            );
            data.termination = TerminationReason::MaxSteps;
            break;
        }

        let prediction = if options.parallel {
            find_next_collision_parallel(ellipse, &state, options.max_time, options.dt_min)
        } else {
            find_next_collision(ellipse, &state, options.max_time, options.dt_min)
        };

        let remaining = options.max_time - time;
        let mut dt = prediction.dt.min(options.dt_max).min(remaining);
        if dt < options.dt_min {
            dt = options.dt_min.min(remaining);
        }

        integrate_all(&mut state, ellipse, dt);

        if prediction.found && dt >= prediction.dt - COLLISION_TIME_SLACK {
            let (i, j) = prediction.pair;
            let (p, q, report) = resolve_collision(
                ellipse,
                &state[i],
                &state[j],
                options.method,
                options.tolerance,
                dt,
            );
            state[i] = p;
            state[j] = q;
            data.count_collision(report);
            debug!(i, j, time, dt, "adaptive contact resolved");
        }

        time += dt;
        data.dt_history.push(dt);
        step += 1;

        if time >= next_save {
            data.record(time, &state);
            while next_save <= time {
                next_save += options.save_interval;
            }
        }
    }

    if data
        .snapshots
        .last()
        .is_none_or(|snapshot| snapshot.time < time)
    {
        data.record(time, &state);
    }
    data.steps_taken = step;
    Ok(data)
}
