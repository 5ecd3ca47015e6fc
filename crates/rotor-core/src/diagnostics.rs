// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Diagnostics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Solver health per trial and across a run, and the run-level trust decision.

use rotor_types::config::TrustPolicy;
use serde::Serialize;

use crate::aggregate::TrialResult;
use crate::section::{SolveStatus, StationState};

/// Station-level counts for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TrialDiagnostics {
    pub stations: usize,
    pub not_converged: usize,
    pub diverged: usize,
    pub degenerate: usize,
    pub out_of_domain: usize,
    pub high_induction: usize,
    /// Stations whose final flow breached a Mach/Reynolds limit.
    pub envelope_violations: usize,
    pub integrity_faults: usize,
    pub iterations: usize,
    pub max_iterations: usize,
}

impl TrialDiagnostics {
    pub fn from_states(states: &[StationState], integrity_faults: usize) -> Self {
        let mut d = TrialDiagnostics {
            stations: states.len(),
            integrity_faults,
            ..Default::default()
        };
        for s in states {
            match s.status {
                SolveStatus::Converged => {}
                SolveStatus::NotConverged => d.not_converged += 1,
                SolveStatus::Diverged => d.diverged += 1,
                SolveStatus::Degenerate => d.degenerate += 1,
            }
            d.out_of_domain += usize::from(s.out_of_domain);
            d.high_induction += usize::from(s.high_induction);
            d.envelope_violations += usize::from(s.envelope.is_some());
            d.iterations += s.iterations;
            d.max_iterations = d.max_iterations.max(s.iterations);
        }
        d
    }

    /// Stations that did not reach a converged state for any reason.
    pub fn failed_stations(&self) -> usize {
        self.not_converged + self.diverged + self.degenerate
    }
}

/// Aggregate counts over every attempted trial of a run. Mergeable across shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunDiagnostics {
    pub trials_attempted: u64,
    pub trials_valid: u64,
    pub trials_invalid: u64,
    /// Invalid trials with at least one failed station.
    pub trials_unconverged: u64,
    /// Invalid trials with at least one integrity fault.
    pub trials_with_faults: u64,
    /// Invalid trials with at least one station outside the Mach/Reynolds envelope.
    pub trials_outside_envelope: u64,
    pub stations_evaluated: u64,
    pub stations_not_converged: u64,
    pub stations_diverged: u64,
    pub stations_degenerate: u64,
    pub out_of_domain_lookups: u64,
    pub high_induction_stations: u64,
    pub envelope_violations: u64,
    pub integrity_faults: u64,
    pub total_iterations: u64,
    pub max_iterations: u64,
}

impl RunDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trial: &TrialResult) {
        let d = &trial.diagnostics;
        self.trials_attempted += 1;
        if trial.is_valid() {
            self.trials_valid += 1;
        } else {
            self.trials_invalid += 1;
            self.trials_unconverged += u64::from(d.failed_stations() > 0);
            self.trials_with_faults += u64::from(d.integrity_faults > 0);
            self.trials_outside_envelope += u64::from(d.envelope_violations > 0);
        }
        self.stations_evaluated += d.stations as u64;
        self.stations_not_converged += d.not_converged as u64;
        self.stations_diverged += d.diverged as u64;
        self.stations_degenerate += d.degenerate as u64;
        self.out_of_domain_lookups += d.out_of_domain as u64;
        self.high_induction_stations += d.high_induction as u64;
        self.envelope_violations += d.envelope_violations as u64;
        self.integrity_faults += d.integrity_faults as u64;
        self.total_iterations += d.iterations as u64;
        self.max_iterations = self.max_iterations.max(d.max_iterations as u64);
    }

    /// Counts are sums, so merging is associative and commutative.
    pub fn merge(&mut self, other: &RunDiagnostics) {
        self.trials_attempted += other.trials_attempted;
        self.trials_valid += other.trials_valid;
        self.trials_invalid += other.trials_invalid;
        self.trials_unconverged += other.trials_unconverged;
        self.trials_with_faults += other.trials_with_faults;
        self.trials_outside_envelope += other.trials_outside_envelope;
        self.stations_evaluated += other.stations_evaluated;
        self.stations_not_converged += other.stations_not_converged;
        self.stations_diverged += other.stations_diverged;
        self.stations_degenerate += other.stations_degenerate;
        self.out_of_domain_lookups += other.out_of_domain_lookups;
        self.high_induction_stations += other.high_induction_stations;
        self.envelope_violations += other.envelope_violations;
        self.integrity_faults += other.integrity_faults;
        self.total_iterations += other.total_iterations;
        self.max_iterations = self.max_iterations.max(other.max_iterations);
    }

    /// `None` before any trial was attempted.
    pub fn invalid_fraction(&self) -> Option<f64> {
        (self.trials_attempted > 0).then(|| self.trials_invalid as f64 / self.trials_attempted as f64)
    }

    pub fn out_of_domain_fraction(&self) -> Option<f64> {
        (self.stations_evaluated > 0)
            .then(|| self.out_of_domain_lookups as f64 / self.stations_evaluated as f64)
    }

    /// Average solver iterations per evaluated station.
    pub fn mean_iterations(&self) -> Option<f64> {
        (self.stations_evaluated > 0)
            .then(|| self.total_iterations as f64 / self.stations_evaluated as f64)
    }

    /// Decide whether the run's statistics can be relied on.
    pub fn assess(&self, policy: &TrustPolicy) -> TrustAssessment {
        let mut issues = Vec::new();
        if self.trials_attempted == 0 {
            issues.push(TrustIssue::NoTrials);
        }
        if self.trials_valid < policy.min_valid_trials {
            issues.push(TrustIssue::TooFewValidTrials {
                valid: self.trials_valid,
                required: policy.min_valid_trials,
            });
        }
        if let Some(fraction) = self.invalid_fraction() {
            if fraction > policy.max_invalid_fraction {
                issues.push(TrustIssue::InvalidFractionExceeded {
                    fraction,
                    limit: policy.max_invalid_fraction,
                });
            }
        }
        if let (Some(limit), Some(fraction)) =
            (policy.max_out_of_domain_fraction, self.out_of_domain_fraction())
        {
            if fraction > limit {
                issues.push(TrustIssue::OutOfDomainFractionExceeded { fraction, limit });
            }
        }
        TrustAssessment {
            trusted: issues.is_empty(),
            issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum TrustIssue {
    NoTrials,
    TooFewValidTrials { valid: u64, required: u64 },
    InvalidFractionExceeded { fraction: f64, limit: f64 },
    OutOfDomainFractionExceeded { fraction: f64, limit: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustAssessment {
    pub trusted: bool,
    pub issues: Vec<TrustIssue>,
}
