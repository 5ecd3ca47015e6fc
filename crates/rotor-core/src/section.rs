// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Section Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Blade-element momentum balance at a single station.
//!
//! Under-relaxed fixed-point iteration on an axial unknown and a':
//! inflow triangle → polar lookup → loss factor → momentum update.
//! Converged once the axial step stays below tolerance on consecutive iterations.
//!
//! Turbines iterate on the induction factor a. Propellers iterate on the
//! induced velocity w, scaled by the local blade speed Ωr, so hover (V = 0)
//! is solved rather than rejected. Propeller axial momentum:
//!
//! - w(V + w) = σ c_n W² / (4F), taking the positive root for w
//! - for V > 0 this is the same balance as a = k / (1 − k) with a = w/V
//!
//! Turbine axial update, with k = σ c_n / (4F sin²φ):
//!
//! - momentum branch: a = k / (1 + k)
//! - past a = 0.4 (k = 2/3), Buhl's modified Glauert relation
//!   C_T = 8/9 + (4F − 40/9)a + (50/9 − 4F)a², solved for a with
//!   C_T = 4Fk(1 − a)². It joins the momentum branch continuously.
//!
//! Non-convergence and divergence are reported in the returned state, never raised.

use rotor_types::config::SolverConfig;
use rotor_types::constants::{
    CONVERGENCE_STREAK, GLAUERT_TRANSITION_A, PROPELLER_INFLOW_RATIO_MAX,
    PROPELLER_MIN_AXIAL_FRACTION, PROPELLER_TANGENTIAL_BOUNDS, SINGULAR_EPS,
    TURBINE_AXIAL_BOUNDS, TURBINE_TANGENTIAL_BOUNDS,
};
use rotor_types::error::RotorResult;
use rotor_types::state::{OperatingPoint, RotorMode};
use serde::Serialize;

use crate::airfoil::{Airfoil, PolarSample};
use crate::kinematics::{force_coefficients, inflow, velocity_triangle, Inflow};
use crate::losses::LossContext;

/// Outcome of one station solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Converged,
    /// Iteration cap reached.
    NotConverged,
    /// A non-finite iterate appeared.
    Diverged,
    /// No blade speed, or a turbine without wind; the balance is undefined.
    Degenerate,
}

impl SolveStatus {
    pub fn is_converged(self) -> bool {
        self == SolveStatus::Converged
    }
}

/// Section flow outside the configured Mach/Reynolds limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeViolation {
    MachAboveMax,
    ReynoldsBelowMin,
    ReynoldsAboveMax,
}

/// Solver state and loads for one station in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StationState {
    pub radius: f64,
    /// a = w/V. Undefined in hover, reported as 0 there.
    pub axial_induction: f64,
    pub tangential_induction: f64,
    /// Induced axial velocity w (m/s), positive in the direction of the thrust-driven flow
    pub induced_velocity: f64,
    /// Inflow angle φ (rad)
    pub inflow_angle: f64,
    /// Angle of attack (rad)
    pub angle_of_attack: f64,
    pub relative_speed: f64,
    pub reynolds: f64,
    pub mach: f64,
    pub cl: f64,
    pub cd: f64,
    pub loss_factor: f64,
    pub iterations: usize,
    pub status: SolveStatus,
    /// Final update used the high-induction branch.
    pub high_induction: bool,
    /// Final polar lookup was outside the tabulated domain.
    pub out_of_domain: bool,
    /// First Mach/Reynolds limit the final flow breached, if any.
    pub envelope: Option<EnvelopeViolation>,
    /// Thrust per unit span, all blades (N/m)
    pub thrust_per_span: f64,
    /// Torque per unit span, all blades (N·m/m)
    pub torque_per_span: f64,
}

impl StationState {
    fn degenerate(radius: f64) -> Self {
        StationState {
            radius,
            axial_induction: 0.0,
            tangential_induction: 0.0,
            induced_velocity: 0.0,
            inflow_angle: 0.0,
            angle_of_attack: 0.0,
            relative_speed: 0.0,
            reynolds: 0.0,
            mach: 0.0,
            cl: 0.0,
            cd: 0.0,
            loss_factor: 1.0,
            iterations: 0,
            status: SolveStatus::Degenerate,
            high_induction: false,
            out_of_domain: false,
            envelope: None,
            thrust_per_span: 0.0,
            torque_per_span: 0.0,
        }
    }
}

/// Geometry and polar for one station, with any per-trial blade perturbation applied.
#[derive(Debug, Clone, Copy)]
pub struct SectionInput<'a> {
    pub mode: RotorMode,
    pub radius: f64,
    pub chord: f64,
    /// Local solidity Bc / (2πr)
    pub solidity: f64,
    /// Twist plus collective pitch (rad)
    pub theta: f64,
    pub blades: usize,
    pub airfoil: &'a Airfoil,
    pub lift_scale: f64,
    pub drag_scale: f64,
    pub losses: LossContext,
}

impl SectionInput<'_> {
    /// Flow for the mode's axial unknown `x` (a, or w/Ωr) and swirl factor `a_prime`.
    fn flow(&self, op: &OperatingPoint, x: f64, a_prime: f64) -> Inflow {
        match self.mode {
            RotorMode::Turbine => {
                inflow(self.mode, op, self.radius, self.chord, self.theta, x, a_prime)
            }
            RotorMode::Propeller => {
                let blade_speed = op.rotor_speed * self.radius;
                velocity_triangle(
                    self.mode,
                    op,
                    self.chord,
                    self.theta,
                    op.inflow_speed + x * blade_speed,
                    blade_speed * (1.0 - a_prime),
                )
            }
        }
    }

    fn polar(&self, flow: &Inflow) -> PolarSample {
        self.airfoil
            .lookup(flow.alpha, flow.reynolds)
            .scaled(self.lift_scale, self.drag_scale)
    }
}

/// Induction update targets from one evaluation of the momentum balance.
struct Update {
    axial: f64,
    tangential: f64,
    high_induction: bool,
}

/// Buhl's high-induction branch for k > 2/3.
fn buhl_axial_induction(k: f64, f: f64) -> f64 {
    let g1 = 2.0 * f * k - (10.0 / 9.0 - f);
    let g2 = (2.0 * f * k - f * (4.0 / 3.0 - f)).max(0.0);
    let g3 = 2.0 * f * k - (25.0 / 9.0 - 2.0 * f);
    if g3.abs() < 1e-6 {
        1.0 - 1.0 / (2.0 * g2.sqrt())
    } else {
        (g1 - g2.sqrt()) / g3
    }
}

#[derive(Debug, Clone)]
pub struct SectionSolver {
    config: SolverConfig,
}

impl SectionSolver {
    pub fn new(config: SolverConfig) -> RotorResult<Self> {
        config.validate()?;
        Ok(SectionSolver { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the coupled momentum/blade-element balance at one station.
    ///
    /// Pure: the same input and operating point always give the same state.
    pub fn solve(&self, input: &SectionInput<'_>, op: &OperatingPoint) -> StationState {
        let blade_speed = op.rotor_speed * input.radius;
        let degenerate = match input.mode {
            RotorMode::Turbine => op.inflow_speed <= 0.0 || blade_speed <= 0.0,
            RotorMode::Propeller => blade_speed <= 0.0,
        };
        if degenerate {
            return StationState::degenerate(input.radius);
        }

        let (x_bounds, ap_bounds) = match input.mode {
            RotorMode::Turbine => (TURBINE_AXIAL_BOUNDS, TURBINE_TANGENTIAL_BOUNDS),
            RotorMode::Propeller => (
                (
                    (PROPELLER_MIN_AXIAL_FRACTION - 1.0) * op.inflow_speed / blade_speed,
                    PROPELLER_INFLOW_RATIO_MAX,
                ),
                PROPELLER_TANGENTIAL_BOUNDS,
            ),
        };
        let relax = self.config.relaxation;

        let mut x = 0.0;
        let mut a_prime = 0.0;
        let mut streak = 0;
        let mut iterations = 0;
        let mut high_induction = false;
        let mut status = SolveStatus::NotConverged;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let flow = input.flow(op, x, a_prime);
            let polar = input.polar(&flow);
            let f = input.losses.factor(input.radius, flow.phi);
            let update = self.momentum_update(input, op, &flow, &polar, f);
            high_induction = update.high_induction;

            if !(update.axial.is_finite() && update.tangential.is_finite()) {
                status = SolveStatus::Diverged;
                break;
            }

            let next_x = (x + relax * (update.axial - x)).clamp(x_bounds.0, x_bounds.1);
            let next_ap =
                (a_prime + relax * (update.tangential - a_prime)).clamp(ap_bounds.0, ap_bounds.1);
            let delta = (next_x - x).abs();
            x = next_x;
            a_prime = next_ap;

            if delta < self.config.tolerance {
                streak += 1;
                if streak >= CONVERGENCE_STREAK {
                    status = SolveStatus::Converged;
                    break;
                }
            } else {
                streak = 0;
            }
        }

        let flow = input.flow(op, x, a_prime);
        let polar = input.polar(&flow);
        let loss_factor = input.losses.factor(input.radius, flow.phi);
        let (cn, ct) = force_coefficients(input.mode, polar.cl, polar.cd, flow.phi);
        let q_chord = 0.5 * op.air_density * flow.speed * flow.speed * input.chord;
        let blades = input.blades as f64;
        let thrust_per_span = blades * q_chord * cn;
        let torque_per_span = blades * q_chord * ct * input.radius;

        if status != SolveStatus::Diverged
            && !(thrust_per_span.is_finite() && torque_per_span.is_finite())
        {
            status = SolveStatus::Diverged;
        }

        let (axial_induction, induced_velocity) = match input.mode {
            RotorMode::Turbine => (x, x * op.inflow_speed),
            RotorMode::Propeller => {
                let w = x * blade_speed;
                let a = if op.inflow_speed > 0.0 { w / op.inflow_speed } else { 0.0 };
                (a, w)
            }
        };
        let mach = flow.speed / op.speed_of_sound;

        StationState {
            radius: input.radius,
            axial_induction,
            tangential_induction: a_prime,
            induced_velocity,
            inflow_angle: flow.phi,
            angle_of_attack: flow.alpha,
            relative_speed: flow.speed,
            reynolds: flow.reynolds,
            mach,
            cl: polar.cl,
            cd: polar.cd,
            loss_factor,
            iterations,
            status,
            high_induction,
            out_of_domain: polar.out_of_domain,
            envelope: self.envelope(mach, flow.reynolds),
            thrust_per_span,
            torque_per_span,
        }
    }

    /// Check the final section flow against the configured Mach and Reynolds limits.
    pub fn envelope(&self, mach: f64, reynolds: f64) -> Option<EnvelopeViolation> {
        let c = &self.config;
        if c.mach_max.is_some_and(|max| mach > max) {
            Some(EnvelopeViolation::MachAboveMax)
        } else if c.reynolds_min.is_some_and(|min| reynolds < min) {
            Some(EnvelopeViolation::ReynoldsBelowMin)
        } else if c.reynolds_max.is_some_and(|max| reynolds > max) {
            Some(EnvelopeViolation::ReynoldsAboveMax)
        } else {
            None
        }
    }

    fn momentum_update(
        &self,
        input: &SectionInput<'_>,
        op: &OperatingPoint,
        flow: &Inflow,
        polar: &PolarSample,
        f: f64,
    ) -> Update {
        let (cn, ct) = force_coefficients(input.mode, polar.cl, polar.cd, flow.phi);
        let sigma = input.solidity;
        let (s, c) = flow.phi.sin_cos();
        let s2 = s * s;

        match input.mode {
            RotorMode::Turbine => {
                let k = if s2 > SINGULAR_EPS {
                    sigma * cn / (4.0 * f * s2)
                } else {
                    0.0
                };
                let k_transition = GLAUERT_TRANSITION_A / (1.0 - GLAUERT_TRANSITION_A);
                let high_induction = self.config.high_induction_correction && k > k_transition;
                let axial = if k.is_nan() {
                    f64::NAN
                } else if k <= SINGULAR_EPS {
                    0.0
                } else if high_induction {
                    buhl_axial_induction(k, f)
                } else {
                    k / (1.0 + k)
                };
                let denom = 4.0 * f * s * c - sigma * ct;
                let tangential = if denom.abs() > SINGULAR_EPS {
                    sigma * ct / denom
                } else {
                    TURBINE_TANGENTIAL_BOUNDS.1
                };
                Update {
                    axial,
                    tangential,
                    high_induction,
                }
            }
            RotorMode::Propeller => {
                // w² + Vw − σ c_n W² / (4F) = 0; a negative discriminant floors at w = −V/2.
                let v = op.inflow_speed;
                let load = sigma * cn * flow.speed * flow.speed / (4.0 * f);
                let discriminant = v * v + 4.0 * load;
                let axial = if discriminant.is_nan() {
                    f64::NAN
                } else {
                    0.5 * (discriminant.max(0.0).sqrt() - v) / (op.rotor_speed * input.radius)
                };
                let denom_t = 4.0 * f * s * c + sigma * ct;
                let tangential = if denom_t.abs() > SINGULAR_EPS {
                    sigma * ct / denom_t
                } else {
                    0.0
                };
                Update {
                    axial,
                    tangential,
                    high_induction: false,
                }
            }
        }
    }
}
