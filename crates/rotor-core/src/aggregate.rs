// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Aggregator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spanwise integration of station loads into rotor-level performance,
//! followed by the global momentum-theory consistency check.

use ndarray::Array1;
use rotor_math::quadrature::trapezoid;
use rotor_types::config::SolverConfig;
use rotor_types::constants::{BETZ_LIMIT, SINGULAR_EPS};
use rotor_types::state::{OperatingPoint, Quantity, RotorMode};
use serde::Serialize;
use tracing::debug;

use crate::diagnostics::TrialDiagnostics;
use crate::grid::StationGrid;
use crate::section::StationState;

/// Rotor-level performance of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RotorPerformance {
    /// Axial force on the rotor (N)
    pub thrust: f64,
    /// Shaft torque (N·m), positive when driving (turbine) or absorbed (propeller)
    pub torque: f64,
    /// Shaft power QΩ (W)
    pub power: f64,
    /// T / (½ρAV²)
    pub thrust_coefficient: f64,
    /// P / (½ρAV³)
    pub power_coefficient: f64,
    /// Q / (½ρAV²R)
    pub torque_coefficient: f64,
    pub tip_speed_ratio: f64,
    /// TV/P for propellers, CP/Betz for turbines
    pub efficiency: f64,
    /// T / (ρA(ΩR)²), defined in hover
    pub tip_thrust_coefficient: f64,
    /// P / (ρA(ΩR)³)
    pub tip_power_coefficient: f64,
    /// T^1.5 / √(2ρA) / P for a thrusting, power-absorbing propeller, else 0
    pub figure_of_merit: f64,
    /// T / A (N/m²)
    pub disk_loading: f64,
}

impl RotorPerformance {
    pub fn get(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::Thrust => self.thrust,
            Quantity::Torque => self.torque,
            Quantity::Power => self.power,
            Quantity::ThrustCoefficient => self.thrust_coefficient,
            Quantity::PowerCoefficient => self.power_coefficient,
            Quantity::TorqueCoefficient => self.torque_coefficient,
            Quantity::TipSpeedRatio => self.tip_speed_ratio,
            Quantity::Efficiency => self.efficiency,
            Quantity::TipThrustCoefficient => self.tip_thrust_coefficient,
            Quantity::TipPowerCoefficient => self.tip_power_coefficient,
            Quantity::FigureOfMerit => self.figure_of_merit,
            Quantity::DiskLoading => self.disk_loading,
        }
    }
}

/// Global consistency failure detected after integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum IntegrityFault {
    /// Turbine CP above the Betz limit.
    MomentumBound {
        power_coefficient: f64,
        bound: f64,
    },
    /// Propeller shaft power below the ideal actuator-disk power for its thrust (W).
    BelowIdealPower { power: f64, ideal_power: f64 },
    /// A station produced a non-finite load.
    NonFiniteLoad { station: usize },
    /// An integrated rotor quantity is non-finite.
    NonFinitePerformance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialValidity {
    Valid,
    /// Excluded from statistics; counted in diagnostics.
    Invalid,
}

/// Output of one trial. Trial-scoped: consumed by the statistics and then dropped.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResult {
    pub performance: RotorPerformance,
    pub stations: Vec<StationState>,
    /// Thrust per unit span at each station (N/m)
    pub thrust_per_span: Array1<f64>,
    /// Torque per unit span at each station (N·m/m)
    pub torque_per_span: Array1<f64>,
    pub faults: Vec<IntegrityFault>,
    pub diagnostics: TrialDiagnostics,
    pub validity: TrialValidity,
}

impl TrialResult {
    pub fn is_valid(&self) -> bool {
        self.validity == TrialValidity::Valid
    }

    /// Every station converged.
    pub fn all_converged(&self) -> bool {
        self.stations.iter().all(|s| s.status.is_converged())
    }
}

/// Ideal actuator-disk power to produce `thrust` at free-stream speed `inflow_speed` (W).
///
/// P = T(V/2 + √(V²/4 + T/(2ρA))), which reduces to T^1.5 / √(2ρA) in hover.
/// Zero for non-positive thrust.
pub fn ideal_power(thrust: f64, inflow_speed: f64, air_density: f64, disk_area: f64) -> f64 {
    if thrust <= 0.0 {
        return 0.0;
    }
    let half_v = 0.5 * inflow_speed;
    thrust * (half_v + (half_v * half_v + thrust / (2.0 * air_density * disk_area)).sqrt())
}

/// Hover figure of merit: ideal induced power over shaft power. Zero unless T > 0 and P > 0.
pub fn figure_of_merit(thrust: f64, power: f64, air_density: f64, disk_area: f64) -> f64 {
    if thrust <= 0.0 || power <= SINGULAR_EPS {
        return 0.0;
    }
    thrust.powf(1.5) / (2.0 * air_density * disk_area).sqrt() / power
}

/// Check integrated performance against momentum theory. Faults are recorded, never clamped.
///
/// Turbines: CP may not exceed the Betz limit. Propellers: shaft power may not
/// fall below the ideal power for the thrust produced, hover included.
pub fn check_integrity(
    mode: RotorMode,
    op: &OperatingPoint,
    disk_area: f64,
    performance: &RotorPerformance,
    stations: &[StationState],
    tolerance: f64,
) -> Vec<IntegrityFault> {
    let mut faults = Vec::new();
    for (i, s) in stations.iter().enumerate() {
        if !(s.thrust_per_span.is_finite() && s.torque_per_span.is_finite()) {
            faults.push(IntegrityFault::NonFiniteLoad { station: i });
        }
    }
    let p = performance;
    if ![p.thrust, p.torque, p.power, p.thrust_coefficient, p.power_coefficient]
        .iter()
        .all(|v| v.is_finite())
    {
        faults.push(IntegrityFault::NonFinitePerformance);
        return faults;
    }

    match mode {
        RotorMode::Turbine => {
            if p.power_coefficient > BETZ_LIMIT * (1.0 + tolerance) {
                faults.push(IntegrityFault::MomentumBound {
                    power_coefficient: p.power_coefficient,
                    bound: BETZ_LIMIT,
                });
            }
        }
        RotorMode::Propeller => {
            let ideal = ideal_power(p.thrust, op.inflow_speed, op.air_density, disk_area);
            if p.thrust > 0.0 && p.power < ideal * (1.0 - tolerance) {
                faults.push(IntegrityFault::BelowIdealPower {
                    power: p.power,
                    ideal_power: ideal,
                });
            }
        }
    }
    faults
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() > SINGULAR_EPS {
        numerator / denominator
    } else {
        0.0
    }
}

/// Integrate station loads over the span and classify the trial.
///
/// With `integrate_to_tip`, a zero-load node at the tip radius closes the integral.
/// The trial is valid only if every station converged inside the Mach/Reynolds
/// envelope and no integrity fault fired.
pub fn integrate(
    grid: &StationGrid,
    mode: RotorMode,
    op: &OperatingPoint,
    stations: Vec<StationState>,
    config: &SolverConfig,
) -> TrialResult {
    let thrust_per_span: Array1<f64> = stations.iter().map(|s| s.thrust_per_span).collect();
    let torque_per_span: Array1<f64> = stations.iter().map(|s| s.torque_per_span).collect();

    let mut radii = grid.radii().to_vec();
    let mut dt = thrust_per_span.to_vec();
    let mut dq = torque_per_span.to_vec();
    if config.integrate_to_tip {
        radii.push(grid.tip_radius());
        dt.push(0.0);
        dq.push(0.0);
    }
    let thrust = trapezoid(&radii, &dt);
    let torque = trapezoid(&radii, &dq);
    let power = torque * op.rotor_speed;

    let v = op.inflow_speed;
    let tip = grid.tip_radius();
    let area = grid.disk_area();
    let dynamic_load = 0.5 * op.air_density * area * v * v;
    let tip_speed = op.rotor_speed * tip;
    let tip_load = op.air_density * area * tip_speed * tip_speed;
    let thrust_coefficient = ratio(thrust, dynamic_load);
    let power_coefficient = ratio(power, dynamic_load * v);
    let efficiency = match mode {
        RotorMode::Turbine => power_coefficient / BETZ_LIMIT,
        RotorMode::Propeller => ratio(thrust * v, power),
    };

    let performance = RotorPerformance {
        thrust,
        torque,
        power,
        thrust_coefficient,
        power_coefficient,
        torque_coefficient: ratio(torque, dynamic_load * tip),
        tip_speed_ratio: op.tip_speed_ratio(tip),
        efficiency,
        tip_thrust_coefficient: ratio(thrust, tip_load),
        tip_power_coefficient: ratio(power, tip_load * tip_speed),
        figure_of_merit: match mode {
            RotorMode::Turbine => 0.0,
            RotorMode::Propeller => figure_of_merit(thrust, power, op.air_density, area),
        },
        disk_loading: thrust / area,
    };

    let faults = check_integrity(mode, op, area, &performance, &stations, config.power_bound_tolerance);
    let diagnostics = TrialDiagnostics::from_states(&stations, faults.len());
    let healthy = stations.iter().all(|s| s.status.is_converged() && s.envelope.is_none());
    let validity = if faults.is_empty() && healthy {
        TrialValidity::Valid
    } else {
        TrialValidity::Invalid
    };
    if !faults.is_empty() {
        debug!(?faults, cp = power_coefficient, ct = thrust_coefficient, "integrity fault");
    }

    TrialResult {
        performance,
        stations,
        thrust_per_span,
        torque_per_span,
        faults,
        diagnostics,
        validity,
    }
}
