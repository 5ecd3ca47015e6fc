// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Probabilistic Gates
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closeout gates: a confidence bound on a monitored quantity against a threshold.
//!
//! With `slack = threshold − bound` for "at most" and `bound − threshold` for
//! "at least", a gate passes when slack > margin, is marginal when
//! |slack| ≤ margin and fails otherwise. Gates whose statistic is undefined
//! (no data, or fewer than two samples for a mean bound) are inconclusive.

use rotor_types::config::{Comparison, GateSpec, GateStatistic, Sidedness};
use rotor_types::error::{ensure, ErrorKind, RotorError, RotorResult};
use rotor_types::state::Quantity;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::monte_carlo::MonitoredStats;
use crate::online_stats::RunningStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Marginal,
    Fail,
    Inconclusive,
}

/// Standard normal quantile for a confidence level.
///
/// One-sided: Φ⁻¹(c). Two-sided: Φ⁻¹(1 − (1 − c)/2).
pub fn z_value(confidence: f64, sided: Sidedness) -> RotorResult<f64> {
    ensure(
        confidence > 0.0 && confidence < 1.0,
        ErrorKind::OutOfRange,
        || format!("confidence must lie in (0, 1), got {confidence}"),
    )?;
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| RotorError::internal(format!("standard normal: {e}")))?;
    let p = match sided {
        Sidedness::OneSided => confidence,
        Sidedness::TwoSided => 1.0 - 0.5 * (1.0 - confidence),
    };
    Ok(standard.inverse_cdf(p))
}

/// Bound on the mean on the unfavourable side of `comparison`:
/// mean + z·stderr for "at most", mean − z·stderr for "at least".
/// `None` below two samples.
pub fn mean_confidence_bound(
    stats: &RunningStats,
    confidence: f64,
    sided: Sidedness,
    comparison: Comparison,
) -> RotorResult<Option<f64>> {
    let z = z_value(confidence, sided)?;
    Ok(stats.mean().zip(stats.std_error()).map(|(mean, se)| match comparison {
        Comparison::AtMost => mean + z * se,
        Comparison::AtLeast => mean - z * se,
    }))
}

/// Signed distance from the bound to the threshold, positive on the acceptable side.
pub fn slack(bound: f64, threshold: f64, comparison: Comparison) -> f64 {
    match comparison {
        Comparison::AtMost => threshold - bound,
        Comparison::AtLeast => bound - threshold,
    }
}

pub fn classify(bound: f64, threshold: f64, comparison: Comparison, margin: f64) -> Verdict {
    let s = slack(bound, threshold, comparison);
    if !s.is_finite() {
        Verdict::Inconclusive
    } else if s > margin {
        Verdict::Pass
    } else if s >= -margin {
        Verdict::Marginal
    } else {
        Verdict::Fail
    }
}

/// Immutable outcome of one gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    gate: String,
    quantity: Quantity,
    statistic: GateStatistic,
    comparison: Comparison,
    samples: u64,
    point_estimate: Option<f64>,
    bound: Option<f64>,
    /// Rank-error caveat of a quantile bound, as a fraction of the sample count.
    rank_error: Option<f64>,
    threshold: f64,
    margin: f64,
    slack: Option<f64>,
    verdict: Verdict,
}

impl GateVerdict {
    pub fn gate(&self) -> &str {
        &self.gate
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn statistic(&self) -> GateStatistic {
        self.statistic
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Sample mean of the quantity.
    pub fn point_estimate(&self) -> Option<f64> {
        self.point_estimate
    }

    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    pub fn rank_error(&self) -> Option<f64> {
        self.rank_error
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn slack(&self) -> Option<f64> {
        self.slack
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }
}

/// Evaluate one gate against the statistics of its quantity. Pure.
pub fn evaluate_gate(spec: &GateSpec, stats: &RunningStats) -> RotorResult<GateVerdict> {
    spec.validate()?;
    let (bound, rank_error) = match spec.statistic {
        GateStatistic::Mean { confidence, sided } => (
            mean_confidence_bound(stats, confidence, sided, spec.comparison)?,
            None,
        ),
        GateStatistic::Quantile { probability } => match stats.quantile(probability) {
            Some(q) => (Some(q.value), Some(q.rank_error)),
            None => (None, None),
        },
    };
    let verdict = bound.map_or(Verdict::Inconclusive, |b| {
        classify(b, spec.threshold, spec.comparison, spec.margin)
    });
    Ok(GateVerdict {
        gate: spec.name.clone(),
        quantity: spec.quantity,
        statistic: spec.statistic,
        comparison: spec.comparison,
        samples: stats.count(),
        point_estimate: stats.mean(),
        bound,
        rank_error,
        threshold: spec.threshold,
        margin: spec.margin,
        slack: bound.map(|b| slack(b, spec.threshold, spec.comparison)),
        verdict,
    })
}

/// Evaluate every gate in order. A gate on an unmonitored quantity is an error.
pub fn evaluate_gates(specs: &[GateSpec], stats: &MonitoredStats) -> RotorResult<Vec<GateVerdict>> {
    specs
        .iter()
        .map(|spec| {
            let quantity_stats = stats.get(spec.quantity).ok_or_else(|| {
                RotorError::invalid_argument(format!(
                    "gate '{}' uses unmonitored quantity '{}'",
                    spec.name,
                    spec.quantity.name()
                ))
            })?;
            evaluate_gate(spec, quantity_stats)
        })
        .collect()
}
