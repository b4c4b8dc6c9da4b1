//! Conservation logging and analysis.
//!
//! Every snapshot appends one [`ConservationSample`] with the system totals.
//! After a run, [`analyze_energy_conservation`] and
//! [`analyze_conjugate_momentum`] summarize how well each total held up.
//!
//! Total kinetic energy is the quantity the engine actually promises to
//! conserve. Conjugate momentum is logged for analysis but is not an
//! invariant of motion on the ellipse, and linear momentum is not conserved
//! at all (the ellipse has no translational symmetry) -- neither is asserted
//! anywhere.

/// Relative deviation below which a run is classified Excellent.
pub const BAND_EXCELLENT: f64 = 1e-6;
/// Relative deviation below which a run is classified Good (and `conserved`).
pub const BAND_GOOD: f64 = 1e-4;
/// Relative deviation below which a run is classified Acceptable.
pub const BAND_ACCEPTABLE: f64 = 1e-2;

/// One `(t, E_total, P_theta_total)` record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConservationSample {
    /// Simulation time of the snapshot.
    pub time: f64,
    /// Total kinetic energy.
    pub energy: f64,
    /// Total conjugate momentum.
    pub momentum: f64,
}

/// Time-ordered log of system totals.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConservationLog {
    pub samples: Vec<ConservationSample>,
}

impl ConservationLog {
    /// Append a sample; callers record in time order.
    pub fn record(&mut self, time: f64, energy: f64, momentum: f64) {
        self.samples.push(ConservationSample {
            time,
            energy,
            momentum,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Quality classification of a conserved quantity over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConservationQuality {
    /// Max relative deviation below 1e-6.
    Excellent,
    /// Below 1e-4.
    Good,
    /// Below 1e-2.
    Acceptable,
    /// Anything worse.
    Poor,
}

impl ConservationQuality {
    /// Classify a maximum relative deviation into a band.
    pub fn classify(max_relative_deviation: f64) -> Self {
        if max_relative_deviation < BAND_EXCELLENT {
            Self::Excellent
        } else if max_relative_deviation < BAND_GOOD {
            Self::Good
        } else if max_relative_deviation < BAND_ACCEPTABLE {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }
}

/// Summary statistics for one logged quantity.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConservationReport {
    /// Value at the first snapshot.
    pub initial: f64,
    /// Value at the last snapshot.
    pub final_value: f64,
    /// Mean over all snapshots.
    pub mean: f64,
    /// Population standard deviation over all snapshots.
    pub std_dev: f64,
    /// Largest `|v_k - v_0| / |v_0|` over the run.
    pub max_relative_deviation: f64,
    /// `(final - initial) / initial`.
    pub drift: f64,
    /// Verdict: max relative deviation below 1e-4.
    pub conserved: bool,
    /// Band classification of the max relative deviation.
    pub quality: ConservationQuality,
}

/// Summarize the energy column of the log. `None` on an empty log.
pub fn analyze_energy_conservation(log: &ConservationLog) -> Option<ConservationReport> {
    analyze(log.samples.iter().map(|s| s.energy))
}

/// Summarize the conjugate-momentum column of the log. `None` on an empty
/// log.
pub fn analyze_conjugate_momentum(log: &ConservationLog) -> Option<ConservationReport> {
    analyze(log.samples.iter().map(|s| s.momentum))
}

/// Deviations are measured relative to the initial value; a zero initial
/// value degrades to absolute deviations rather than dividing by zero.
fn analyze(values: impl Iterator<Item = f64>) -> Option<ConservationReport> {
    let values: Vec<f64> = values.collect();
    let first = *values.first()?;
    let last = *values.last()?;
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let scale = if first.abs() > 0.0 { first.abs() } else { 1.0 };
    let max_relative_deviation = values
        .iter()
        .map(|v| (v - first).abs() / scale)
        .fold(0.0_f64, f64::max);
    let drift = if first.abs() > 0.0 {
        (last - first) / first
    } else {
        last - first
    };

    Some(ConservationReport {
        initial: first,
        final_value: last,
        mean,
        std_dev: variance.sqrt(),
        max_relative_deviation,
        drift,
        conserved: max_relative_deviation < BAND_GOOD,
        quality: ConservationQuality::classify(max_relative_deviation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn log_from_energies(energies: &[f64]) -> ConservationLog {
        let mut log = ConservationLog::default();
        for (k, e) in energies.iter().enumerate() {
            log.record(k as f64, *e, 0.5 * e);
        }
        log
    }

    #[test]
    fn empty_log_has_no_report() {
        assert!(analyze_energy_conservation(&ConservationLog::default()).is_none());
        assert!(analyze_conjugate_momentum(&ConservationLog::default()).is_none());
    }

    #[test]
    fn perfectly_flat_log_is_excellent() {
        let log = log_from_energies(&[2.0, 2.0, 2.0, 2.0]);
        let report = analyze_energy_conservation(&log).unwrap();
        assert_eq!(report.initial, 2.0);
        assert_eq!(report.final_value, 2.0);
        assert_eq!(report.max_relative_deviation, 0.0);
        assert_eq!(report.drift, 0.0);
        assert_eq!(report.std_dev, 0.0);
        assert!(report.conserved);
        assert_eq!(report.quality, ConservationQuality::Excellent);
    }

    #[test]
    fn statistics_match_hand_computation() {
        let log = log_from_energies(&[1.0, 1.1, 0.9, 1.0]);
        let report = analyze_energy_conservation(&log).unwrap();
        assert_relative_eq!(report.mean, 1.0, max_relative = 1e-12);
        assert_relative_eq!(report.std_dev, (0.005_f64).sqrt(), max_relative = 1e-12);
        assert_relative_eq!(report.max_relative_deviation, 0.1, max_relative = 1e-12);
        assert_eq!(report.drift, 0.0);
        assert!(!report.conserved, "10% deviation is not conserved");
        assert_eq!(report.quality, ConservationQuality::Poor);
    }

    #[test]
    fn bands_classify_as_documented() {
        assert_eq!(
            ConservationQuality::classify(1e-7),
            ConservationQuality::Excellent
        );
        assert_eq!(ConservationQuality::classify(1e-5), ConservationQuality::Good);
        assert_eq!(
            ConservationQuality::classify(1e-3),
            ConservationQuality::Acceptable
        );
        assert_eq!(ConservationQuality::classify(0.5), ConservationQuality::Poor);
    }

    #[test]
    fn momentum_column_is_analyzed_independently() {
        let log = log_from_energies(&[2.0, 2.0 + 2e-5]);
        let energy = analyze_energy_conservation(&log).unwrap();
        let momentum = analyze_conjugate_momentum(&log).unwrap();
        assert_relative_eq!(energy.max_relative_deviation, 1e-5, max_relative = 1e-9);
        assert_relative_eq!(momentum.max_relative_deviation, 1e-5, max_relative = 1e-9);
        assert_eq!(energy.quality, ConservationQuality::Good);
    }
}
