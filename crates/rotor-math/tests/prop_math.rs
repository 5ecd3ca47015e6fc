// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Property-Based Tests (proptest) for rotor-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for rotor-math using proptest.
//!
//! Covers: axis bracketing, clamped 1-D/2-D interpolation, compensated
//! summation, trapezoidal quadrature.

use ndarray::Array2;
use proptest::prelude::*;
use rotor_math::interp::{bracket, interp1, interp2_clamped};
use rotor_math::quadrature::{kahan_sum, trapezoid};

fn increasing_axis(n: usize) -> impl Strategy<Value = Vec<f64>> {
    (-50.0f64..50.0, prop::collection::vec(0.01f64..5.0, n - 1)).prop_map(|(start, steps)| {
        let mut axis = vec![start];
        for s in steps {
            let last = *axis.last().unwrap();
            axis.push(last + s);
        }
        axis
    })
}

// ── Bracketing Properties ────────────────────────────────────────────

proptest! {
    /// In-range queries land in a cell that contains them and are never flagged.
    #[test]
    fn bracket_contains_query(axis in increasing_axis(8), t in 0.0f64..1.0) {
        let x = axis[0] + t * (axis[7] - axis[0]);
        let b = bracket(&axis, x);
        prop_assert!(!b.out_of_domain);
        prop_assert!(b.lower < axis.len() - 1);
        prop_assert!(axis[b.lower] <= x + 1e-12 && x <= axis[b.lower + 1] + 1e-12,
            "x={} not in [{}, {}]", x, axis[b.lower], axis[b.lower + 1]);
        prop_assert!((0.0..=1.0).contains(&b.weight));
    }

    /// Queries beyond either end are clamped and flagged.
    #[test]
    fn bracket_flags_outside(axis in increasing_axis(5), excess in 0.001f64..100.0) {
        let below = bracket(&axis, axis[0] - excess);
        let above = bracket(&axis, axis[4] + excess);
        prop_assert!(below.out_of_domain && above.out_of_domain);
        prop_assert_eq!(below.weight, 0.0);
        prop_assert_eq!(above.weight, 1.0);
    }
}

// ── Interpolation Properties ─────────────────────────────────────────

proptest! {
    /// Interpolated values stay inside the hull of the sampled values.
    #[test]
    fn interp1_within_hull(
        axis in increasing_axis(6),
        values in prop::collection::vec(-10.0f64..10.0, 6),
        x in -100.0f64..100.0,
    ) {
        let r = interp1(&axis, &values, x);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(r.value >= lo - 1e-12 && r.value <= hi + 1e-12);
    }

    /// Bilinear interpolation reproduces any plane a + b·x + c·y inside the domain.
    #[test]
    fn interp2_reproduces_planes(
        a in -5.0f64..5.0, b in -5.0f64..5.0, c in -5.0f64..5.0,
        tx in 0.0f64..1.0, ty in 0.0f64..1.0,
    ) {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys = [0.0, 2.0, 3.0];
        let table = Array2::from_shape_fn((4, 3), |(i, j)| a + b * xs[i] + c * ys[j]);
        let x = 4.0 * tx;
        let y = 3.0 * ty;
        let r = interp2_clamped(&xs, &ys, &table.view(), x, y);
        prop_assert!(!r.out_of_domain);
        prop_assert!((r.value - (a + b * x + c * y)).abs() < 1e-10);
    }
}

// ── Quadrature Properties ────────────────────────────────────────────

proptest! {
    /// Compensated sum is invariant (to rounding) under reversal.
    #[test]
    fn kahan_sum_order_insensitive(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
        let forward = kahan_sum(&values);
        let mut reversed = values.clone();
        reversed.reverse();
        let backward = kahan_sum(&reversed);
        let scale = values.iter().map(|v| v.abs()).sum::<f64>().max(1.0);
        prop_assert!((forward - backward).abs() <= 1e-14 * scale);
    }

    /// Trapezoid of a linear function is exact on any node set.
    #[test]
    fn trapezoid_exact_for_linear(axis in increasing_axis(7), m in -3.0f64..3.0, q in -3.0f64..3.0) {
        let y: Vec<f64> = axis.iter().map(|x| m * x + q).collect();
        let (x0, x1) = (axis[0], axis[6]);
        let exact = 0.5 * m * (x1 * x1 - x0 * x0) + q * (x1 - x0);
        let got = trapezoid(&axis, &y);
        prop_assert!((got - exact).abs() < 1e-9 * (1.0 + exact.abs()));
    }
}
