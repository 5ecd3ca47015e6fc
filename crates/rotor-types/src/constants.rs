// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Betz limit on the power coefficient of an ideal actuator-disk turbine (16/27).
pub const BETZ_LIMIT: f64 = 16.0 / 27.0;

/// Sea-level standard air density (kg/m³).
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225;

/// Dynamic viscosity of air at 15 °C (Pa·s).
pub const AIR_VISCOSITY_SEA_LEVEL: f64 = 1.81e-5;

/// Speed of sound in air at 15 °C (m/s).
pub const SPEED_OF_SOUND_SEA_LEVEL: f64 = 340.3;

/// Axial induction above which simple momentum theory breaks down.
pub const GLAUERT_TRANSITION_A: f64 = 0.4;

/// Lower floor on the combined tip/hub loss factor. Keeps the momentum update finite.
pub const LOSS_FACTOR_FLOOR: f64 = 1e-6;

/// Turbine axial induction bounds during iteration.
pub const TURBINE_AXIAL_BOUNDS: (f64, f64) = (0.0, 0.95);

/// Turbine tangential induction bounds during iteration.
pub const TURBINE_TANGENTIAL_BOUNDS: (f64, f64) = (-0.5, 1.0);

/// Upper bound on propeller induced velocity as a fraction of local blade speed.
pub const PROPELLER_INFLOW_RATIO_MAX: f64 = 1.0;

/// Propeller axial velocity through the disk never drops below this fraction of the free stream.
pub const PROPELLER_MIN_AXIAL_FRACTION: f64 = 0.5;

/// Propeller tangential induction bounds during iteration.
pub const PROPELLER_TANGENTIAL_BOUNDS: (f64, f64) = (-0.5, 0.9);

/// Consecutive sub-tolerance iterations required to declare a station converged.
pub const CONVERGENCE_STREAK: usize = 2;

/// Maximum blade count accepted by the station grid.
pub const MAX_BLADES: usize = 16;

/// Denominators below this magnitude are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;
