// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Closeout Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end closeout of one study: nominal solve, Monte Carlo, gates, trust.

use rotor_core::aggregate::{IntegrityFault, RotorPerformance};
use rotor_core::diagnostics::{TrialDiagnostics, TrustAssessment};
use rotor_core::rotor::RotorModel;
use rotor_types::config::StudyConfig;
use rotor_types::error::RotorResult;
use rotor_types::state::RotorMode;
use serde::Serialize;
use tracing::{info, warn};

use crate::gates::{evaluate_gates, GateVerdict, Verdict};
use crate::monte_carlo::{CancelToken, MonteCarloDriver, MonteCarloReport};
use crate::uncertainty::UncertaintyModel;

/// Deterministic solution at the base operating point.
#[derive(Debug, Clone, Serialize)]
pub struct NominalSolution {
    pub performance: RotorPerformance,
    pub valid: bool,
    pub faults: Vec<IntegrityFault>,
    pub diagnostics: TrialDiagnostics,
}

/// Everything handed to the reporting side for one study.
#[derive(Debug, Clone, Serialize)]
pub struct CloseoutReport {
    pub study_name: String,
    pub mode: RotorMode,
    pub nominal: NominalSolution,
    pub monte_carlo: MonteCarloReport,
    pub verdicts: Vec<GateVerdict>,
    pub trust: TrustAssessment,
}

impl CloseoutReport {
    /// Worst gate verdict; inconclusive when the run itself is not trusted.
    pub fn overall(&self) -> Verdict {
        if !self.trust.trusted {
            return Verdict::Inconclusive;
        }
        let has = |v: Verdict| self.verdicts.iter().any(|g| g.verdict() == v);
        if has(Verdict::Fail) {
            Verdict::Fail
        } else if has(Verdict::Inconclusive) {
            Verdict::Inconclusive
        } else if has(Verdict::Marginal) {
            Verdict::Marginal
        } else {
            Verdict::Pass
        }
    }

    pub fn verdict_for(&self, gate: &str) -> Option<&GateVerdict> {
        self.verdicts.iter().find(|v| v.gate() == gate)
    }
}

/// Run a validated study end to end.
///
/// Configuration and geometry errors abort before any trial runs. Trial-level
/// trouble only shows up in the diagnostics and the trust assessment.
pub fn run_study(config: &StudyConfig, cancel: &CancelToken) -> RotorResult<CloseoutReport> {
    config.validate()?;
    info!(
        study = %config.study_name,
        mode = ?config.rotor.mode,
        stations = config.rotor.stations.len(),
        trials = config.monte_carlo.trials,
        gates = config.gates.len(),
        "closeout started"
    );

    let model = RotorModel::from_study(config)?;
    let nominal = model.evaluate_nominal(&config.operating_point)?;
    if !nominal.is_valid() {
        warn!(
            faults = ?nominal.faults,
            unconverged = nominal.diagnostics.failed_stations(),
            outside_envelope = nominal.diagnostics.envelope_violations,
            "nominal solution is invalid"
        );
    }

    let uncertainty = UncertaintyModel::from_config(&config.uncertainty)?;
    let driver = MonteCarloDriver::new(
        &model,
        &uncertainty,
        config.operating_point,
        config.monte_carlo.clone(),
    )?;
    let monte_carlo = driver.run_with_cancel(cancel)?;
    let verdicts = evaluate_gates(&config.gates, &monte_carlo.stats)?;
    let trust = monte_carlo.diagnostics.assess(&config.trust);
    if !trust.trusted {
        warn!(issues = ?trust.issues, "run statistics are not trusted");
    }

    let report = CloseoutReport {
        study_name: config.study_name.clone(),
        mode: config.rotor.mode,
        nominal: NominalSolution {
            performance: nominal.performance,
            valid: nominal.is_valid(),
            faults: nominal.faults,
            diagnostics: nominal.diagnostics,
        },
        monte_carlo,
        verdicts,
        trust,
    };
    info!(
        study = %report.study_name,
        overall = ?report.overall(),
        valid_trials = report.monte_carlo.diagnostics.trials_valid,
        "closeout finished"
    );
    Ok(report)
}
