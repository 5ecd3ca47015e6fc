// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Kinematics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Velocity triangle at one station, from induction factors or from velocity components.

use std::f64::consts::PI;

use rotor_types::state::{OperatingPoint, RotorMode};

/// Local flow at a blade element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inflow {
    /// Axial velocity through the rotor plane (m/s)
    pub axial: f64,
    /// In-plane velocity seen by the section (m/s)
    pub tangential: f64,
    /// Relative speed W (m/s)
    pub speed: f64,
    /// Inflow angle φ from the rotor plane (rad)
    pub phi: f64,
    /// Angle of attack (rad), wrapped to (-π, π]
    pub alpha: f64,
    pub reynolds: f64,
}

/// Wrap an angle to (-π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Velocity triangle at `radius` for section pitch `theta` (twist + collective).
///
/// Turbines slow the axial flow (1 − a) and add swirl (1 + a');
/// propellers accelerate it (1 + a) against the blade motion (1 − a').
pub fn inflow(
    mode: RotorMode,
    op: &OperatingPoint,
    radius: f64,
    chord: f64,
    theta: f64,
    a: f64,
    a_prime: f64,
) -> Inflow {
    let blade_speed = op.rotor_speed * radius;
    let (axial, tangential) = match mode {
        RotorMode::Turbine => (op.inflow_speed * (1.0 - a), blade_speed * (1.0 + a_prime)),
        RotorMode::Propeller => (op.inflow_speed * (1.0 + a), blade_speed * (1.0 - a_prime)),
    };
    velocity_triangle(mode, op, chord, theta, axial, tangential)
}

/// Velocity triangle from the axial and in-plane velocity components (m/s).
///
/// Needed where the induction factor is undefined, e.g. a hovering propeller
/// whose axial flow is entirely induced.
pub fn velocity_triangle(
    mode: RotorMode,
    op: &OperatingPoint,
    chord: f64,
    theta: f64,
    axial: f64,
    tangential: f64,
) -> Inflow {
    let phi = axial.atan2(tangential);
    let alpha = match mode {
        RotorMode::Turbine => phi - theta,
        RotorMode::Propeller => theta - phi,
    };
    let speed = axial.hypot(tangential);
    Inflow {
        axial,
        tangential,
        speed,
        phi,
        alpha: wrap_angle(alpha),
        reynolds: op.air_density * speed * chord / op.viscosity,
    }
}

/// Project (cl, cd) onto the rotor axis and plane: (cn, ct).
///
/// cn drives thrust, ct drives torque. Drag opposes torque on a turbine
/// and adds to it on a propeller.
pub fn force_coefficients(mode: RotorMode, cl: f64, cd: f64, phi: f64) -> (f64, f64) {
    let (s, c) = phi.sin_cos();
    match mode {
        RotorMode::Turbine => (cl * c + cd * s, cl * s - cd * c),
        RotorMode::Propeller => (cl * c - cd * s, cl * s + cd * c),
    }
}
