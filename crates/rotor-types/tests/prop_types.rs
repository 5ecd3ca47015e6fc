// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Property-Based Tests (proptest) for rotor-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for rotor-types using proptest.
//!
//! Covers: operating-point validation, tip-speed ratio, distribution and
//! gate validation.

use proptest::prelude::*;
use rotor_types::config::{Comparison, DistributionConfig, GateSpec, GateStatistic};
use rotor_types::error::ErrorKind;
use rotor_types::state::{OperatingPoint, Quantity, UncertainInput};

// ── Operating Point ──────────────────────────────────────────────────

proptest! {
    /// Any non-negative finite speed pair at sea level is accepted.
    #[test]
    fn physical_operating_points_validate(v in 0.0f64..80.0, omega in 0.0f64..500.0) {
        prop_assert!(OperatingPoint::new(v, omega).validate().is_ok());
    }

    /// Negative speeds are range errors, not argument errors.
    #[test]
    fn negative_speed_is_out_of_range(v in -80.0f64..-1e-9) {
        let err = OperatingPoint::new(v, 10.0).validate().unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::OutOfRange);
        let err = OperatingPoint::new(10.0, v).validate().unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    /// λ scales linearly with radius and inversely with inflow.
    #[test]
    fn tip_speed_ratio_scaling(
        v in 0.5f64..40.0,
        omega in 0.1f64..100.0,
        radius in 0.1f64..60.0,
    ) {
        let op = OperatingPoint::new(v, omega);
        let tsr = op.tip_speed_ratio(radius);
        prop_assert!((tsr - omega * radius / v).abs() <= 1e-12 * tsr);
        let doubled = OperatingPoint::new(2.0 * v, omega).tip_speed_ratio(radius);
        prop_assert!((2.0 * doubled - tsr).abs() <= 1e-12 * tsr);
    }

    /// Every input starts from a value at or above its physical floor.
    #[test]
    fn nominal_respects_floor(v in 0.0f64..40.0, omega in 0.0f64..100.0) {
        let op = OperatingPoint::new(v, omega);
        for input in [
            UncertainInput::InflowSpeed,
            UncertainInput::RotorSpeed,
            UncertainInput::AirDensity,
            UncertainInput::Viscosity,
            UncertainInput::Pitch,
            UncertainInput::ChordScale,
            UncertainInput::TwistOffset,
            UncertainInput::LiftScale,
            UncertainInput::DragScale,
        ] {
            prop_assert!(input.nominal(&op) >= input.physical_floor(), "{}", input.name());
        }
    }
}

#[test]
fn non_finite_operating_point_is_invalid_argument() {
    let mut op = OperatingPoint::new(8.0, 10.0);
    op.pitch = f64::NAN;
    assert_eq!(op.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);
    let op = OperatingPoint::new(f64::INFINITY, 10.0);
    assert_eq!(op.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn zero_inflow_tip_speed_ratio() {
    assert_eq!(OperatingPoint::new(0.0, 10.0).tip_speed_ratio(5.0), f64::INFINITY);
    assert_eq!(OperatingPoint::new(0.0, 0.0).tip_speed_ratio(5.0), 0.0);
}

// ── Distribution and Gate Validation ─────────────────────────────────

proptest! {
    /// Triangular parameters are accepted exactly when low <= mode <= high and low < high.
    #[test]
    fn triangular_ordering(low in -10.0f64..10.0, mode in -10.0f64..10.0, high in -10.0f64..10.0) {
        let ok = DistributionConfig::Triangular { low, mode, high }.validate().is_ok();
        prop_assert_eq!(ok, low < high && low <= mode && mode <= high);
    }

    /// Spread parameters must be strictly positive.
    #[test]
    fn spread_must_be_positive(s in -5.0f64..5.0) {
        let normal = DistributionConfig::Normal { mean: 0.0, std_dev: s }.validate();
        let lognormal = DistributionConfig::LogNormal { mu: 0.0, sigma: s }.validate();
        prop_assert_eq!(normal.is_ok(), s > 0.0);
        prop_assert_eq!(lognormal.is_ok(), s > 0.0);
    }

    /// Mean-gate confidence must lie strictly inside (0, 1).
    #[test]
    fn gate_confidence_range(confidence in -0.5f64..1.5, margin in 0.0f64..1.0) {
        let gate = GateSpec {
            name: "g".into(),
            quantity: Quantity::Power,
            statistic: GateStatistic::Mean { confidence, sided: Default::default() },
            comparison: Comparison::AtLeast,
            threshold: 1.0,
            margin,
        };
        prop_assert_eq!(gate.validate().is_ok(), confidence > 0.0 && confidence < 1.0);
    }
}

#[test]
fn negative_gate_margin_is_out_of_range() {
    let gate = GateSpec {
        name: "g".into(),
        quantity: Quantity::Thrust,
        statistic: GateStatistic::Quantile { probability: 0.5 },
        comparison: Comparison::AtMost,
        threshold: 1.0,
        margin: -0.1,
    };
    assert_eq!(gate.validate().unwrap_err().kind(), ErrorKind::OutOfRange);
}
