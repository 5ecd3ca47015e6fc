// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Property-Based Tests (proptest) for rotor-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for rotor-core using proptest.
//!
//! Covers: loss factor bounds and monotonicity, section solver ranges
//! and determinism in forward flight and hover, integrity of rotor evaluations.

use std::f64::consts::PI;

use proptest::prelude::*;
use rotor_core::airfoil::{Airfoil, AirfoilLibrary, LinearPolar};
use rotor_core::grid::StationGrid;
use rotor_core::losses::{tip_loss, tip_loss_at_speed_ratio, LossContext};
use rotor_core::rotor::RotorModel;
use rotor_core::section::{SectionInput, SectionSolver, SolveStatus};
use rotor_types::config::{LossModel, SolverConfig};
use rotor_types::constants::{BETZ_LIMIT, LOSS_FACTOR_FLOOR};
use rotor_types::state::{OperatingPoint, RotorMode, Station};

fn polar() -> Airfoil {
    Airfoil::Linear(LinearPolar::new(0.2, 2.0 * PI, 13f64.to_radians(), 0.008, 0.01).unwrap())
}

// ── Loss Factors ─────────────────────────────────────────────────────

proptest! {
    /// Every loss factor lies in (0, 1].
    #[test]
    fn loss_factor_bounded(
        blades in 1usize..8,
        radius in 0.55f64..4.99,
        phi in -1.5f64..1.5,
        hub in proptest::bool::ANY,
    ) {
        let ctx = LossContext {
            model: LossModel::Prandtl,
            include_hub: hub,
            blades,
            hub_radius: 0.5,
            tip_radius: 5.0,
            tip_speed_ratio: 7.0,
        };
        let f = ctx.factor(radius, phi);
        prop_assert!(f >= LOSS_FACTOR_FLOOR && f <= 1.0, "F = {}", f);
    }

    /// Tip loss does not increase moving outboard at fixed inflow angle.
    #[test]
    fn tip_loss_monotone_in_radius(
        blades in 1usize..8,
        r1 in 0.5f64..4.9,
        dr in 0.001f64..0.09,
        phi in 0.02f64..1.2,
    ) {
        let inner = tip_loss(blades, 5.0, r1, phi);
        let outer = tip_loss(blades, 5.0, r1 + dr, phi);
        prop_assert!(outer <= inner + 1e-15);
    }

    /// Speed-ratio form: 1 at the root, non-increasing in μ, floored at the tip.
    #[test]
    fn speed_ratio_loss_shape(
        tsr in 0.5f64..12.0,
        mu in 0.01f64..0.98,
        blades in 1usize..6,
    ) {
        prop_assert_eq!(tip_loss_at_speed_ratio(tsr, 0.0, blades), 1.0);
        let here = tip_loss_at_speed_ratio(tsr, mu, blades);
        let further = tip_loss_at_speed_ratio(tsr, (mu + 0.01).min(1.0), blades);
        prop_assert!(further <= here + 1e-15);
        prop_assert!(tip_loss_at_speed_ratio(tsr, 1.0, blades) >= LOSS_FACTOR_FLOOR);
    }
}

// ── Section Solver ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Converged turbine stations have a in [0, 1) and a finite load.
    #[test]
    fn turbine_station_in_range(
        radius in 0.8f64..4.8,
        chord in 0.1f64..0.6,
        theta in -0.05f64..0.3,
        v in 4.0f64..14.0,
        omega in 6.0f64..14.0,
    ) {
        let airfoil = polar();
        let input = SectionInput {
            mode: RotorMode::Turbine,
            radius,
            chord,
            solidity: 3.0 * chord / (2.0 * PI * radius),
            theta,
            blades: 3,
            airfoil: &airfoil,
            lift_scale: 1.0,
            drag_scale: 1.0,
            losses: LossContext {
                model: LossModel::Prandtl,
                include_hub: true,
                blades: 3,
                hub_radius: 0.5,
                tip_radius: 5.0,
                tip_speed_ratio: omega * 5.0 / v,
            },
        };
        let op = OperatingPoint::new(v, omega);
        let solver = SectionSolver::new(SolverConfig::default()).unwrap();
        let state = solver.solve(&input, &op);
        prop_assert!(state.status != SolveStatus::Diverged);
        if state.status == SolveStatus::Converged {
            prop_assert!(state.axial_induction >= 0.0 && state.axial_induction < 1.0);
            prop_assert!(state.thrust_per_span.is_finite());
            prop_assert!(state.torque_per_span.is_finite());
            prop_assert!(state.loss_factor > 0.0 && state.loss_factor <= 1.0);
        }
        // Pure: a second solve is bit-identical.
        prop_assert_eq!(solver.solve(&input, &op), state);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A hovering propeller station induces downwash and never degenerates.
    #[test]
    fn hover_station_induces_flow(
        radius in 0.1f64..0.45,
        chord in 0.02f64..0.07,
        theta in 0.05f64..0.3,
        omega in 200.0f64..800.0,
    ) {
        let airfoil = polar();
        let input = SectionInput {
            mode: RotorMode::Propeller,
            radius,
            chord,
            solidity: 2.0 * chord / (2.0 * PI * radius),
            theta,
            blades: 2,
            airfoil: &airfoil,
            lift_scale: 1.0,
            drag_scale: 1.0,
            losses: LossContext {
                model: LossModel::Prandtl,
                include_hub: true,
                blades: 2,
                hub_radius: 0.075,
                tip_radius: 0.5,
                tip_speed_ratio: f64::INFINITY,
            },
        };
        let op = OperatingPoint::new(0.0, omega);
        let state = SectionSolver::new(SolverConfig::default()).unwrap().solve(&input, &op);
        prop_assert!(state.status != SolveStatus::Degenerate);
        prop_assert!(state.status != SolveStatus::Diverged);
        if state.status == SolveStatus::Converged {
            prop_assert!(state.induced_velocity > 0.0);
            prop_assert!(state.thrust_per_span > 0.0 && state.thrust_per_span.is_finite());
            prop_assert_eq!(state.axial_induction, 0.0);
        }
    }
}

// ── Rotor Evaluation ─────────────────────────────────────────────────

fn model() -> RotorModel {
    let stations = (0..10)
        .map(|i| {
            let mu = (i as f64 + 0.5) / 10.0;
            Station {
                radius: 0.5 + 4.5 * mu,
                chord: 0.55 - 0.35 * mu,
                twist: (13.0 * (1.0 - mu)).to_radians(),
                airfoil: "thin".to_string(),
            }
        })
        .collect();
    let grid = StationGrid::new(3, 0.5, 5.0, stations).unwrap();
    let mut airfoils = AirfoilLibrary::default();
    airfoils.insert("thin", polar()).unwrap();
    RotorModel::new(RotorMode::Turbine, grid, airfoils, SolverConfig::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A valid turbine trial never reports power above the Betz limit.
    #[test]
    fn valid_turbine_trial_respects_betz(
        v in 5.0f64..12.0,
        omega in 7.0f64..13.0,
    ) {
        let result = model().evaluate_nominal(&OperatingPoint::new(v, omega)).unwrap();
        if result.is_valid() {
            prop_assert!(result.performance.power_coefficient <= BETZ_LIMIT * 1.001);
            prop_assert!(result.faults.is_empty());
        } else {
            prop_assert!(!result.faults.is_empty() || !result.all_converged());
        }
    }
}
