// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Property-Based Tests (proptest) for rotor-uq
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for rotor-uq using proptest.
//!
//! Covers: Welford/Chan merging, quantile sketch rank error, gate
//! classification bands, per-trial stream independence.

use proptest::prelude::*;
use rand::Rng;
use rotor_types::config::Comparison;
use rotor_uq::gates::{classify, slack, Verdict};
use rotor_uq::monte_carlo::trial_rng;
use rotor_uq::online_stats::{QuantileSketch, RunningStats};

fn filled(values: &[f64]) -> RunningStats {
    let mut s = RunningStats::new(64).unwrap();
    for &v in values {
        s.push(v);
    }
    s
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
}

// ── Merge Properties ─────────────────────────────────────────────────

proptest! {
    /// Splitting a stream anywhere and merging gives the sequential moments.
    #[test]
    fn merge_matches_sequential(
        values in prop::collection::vec(-1e3f64..1e3, 2..200),
        split in 0.0f64..1.0,
    ) {
        let k = ((values.len() as f64) * split) as usize;
        let whole = filled(&values);
        let mut left = filled(&values[..k]);
        let right = filled(&values[k..]);
        left.merge(&right).unwrap();

        prop_assert_eq!(left.count(), whole.count());
        prop_assert!(close(left.mean().unwrap(), whole.mean().unwrap(), 1e-12));
        prop_assert!(close(
            left.sample_variance().unwrap(),
            whole.sample_variance().unwrap(),
            1e-9
        ));
        prop_assert_eq!(left.min(), whole.min());
        prop_assert_eq!(left.max(), whole.max());
    }

    /// Merge order does not matter beyond rounding.
    #[test]
    fn merge_is_commutative(
        a in prop::collection::vec(-50.0f64..50.0, 1..60),
        b in prop::collection::vec(-50.0f64..50.0, 1..60),
    ) {
        let mut ab = filled(&a);
        ab.merge(&filled(&b)).unwrap();
        let mut ba = filled(&b);
        ba.merge(&filled(&a)).unwrap();
        prop_assert_eq!(ab.count(), ba.count());
        prop_assert!(close(ab.mean().unwrap(), ba.mean().unwrap(), 1e-12));
        prop_assert!(close(
            ab.population_variance().unwrap(),
            ba.population_variance().unwrap(),
            1e-9
        ));
    }

    /// Merging with an empty accumulator is the identity.
    #[test]
    fn merge_with_empty_is_identity(values in prop::collection::vec(-10.0f64..10.0, 0..50)) {
        let mut s = filled(&values);
        let before = s.clone();
        s.merge(&RunningStats::new(64).unwrap()).unwrap();
        prop_assert_eq!(s, before);
    }

    /// Non-finite samples never reach the moments.
    #[test]
    fn non_finite_samples_are_rejected(
        values in prop::collection::vec(-10.0f64..10.0, 1..50),
        junk in 1usize..5,
    ) {
        let mut s = filled(&values);
        for i in 0..junk {
            s.push(if i % 2 == 0 { f64::NAN } else { f64::INFINITY });
        }
        prop_assert_eq!(s.count(), values.len() as u64);
        prop_assert_eq!(s.rejected(), junk as u64);
        prop_assert!(s.mean().unwrap().is_finite());
    }
}

// ── Sketch Properties ────────────────────────────────────────────────

/// Fraction of `sorted` that lies at or below `x`.
fn empirical_rank(sorted: &[f64], x: f64) -> f64 {
    sorted.partition_point(|&v| v <= x) as f64 / sorted.len() as f64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Reported quantiles lie within the reported rank error of the target.
    #[test]
    fn sketch_rank_error_is_honest(
        values in prop::collection::vec(-1e4f64..1e4, 1..3000),
        p in 0.0f64..=1.0,
    ) {
        let mut sketch = QuantileSketch::new(32).unwrap();
        for &v in &values {
            sketch.push(v);
        }
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let est = sketch.quantile(p).unwrap();
        prop_assert!(est.value >= sorted[0] && est.value <= sorted[sorted.len() - 1]);
        if !est.exact {
            let n = sorted.len() as f64;
            let lo = sorted.partition_point(|&v| v < est.value) as f64 / n;
            let hi = empirical_rank(&sorted, est.value);
            let slack = est.rank_error + 1.0 / n;
            prop_assert!(
                lo - slack <= p && p <= hi + slack,
                "p={} value={} ranks=[{}, {}] err={}", p, est.value, lo, hi, est.rank_error
            );
        }
    }

    /// Retained samples stay bounded whatever the stream length.
    #[test]
    fn sketch_memory_is_bounded(n in 1usize..20_000) {
        let mut sketch = QuantileSketch::new(16).unwrap();
        for i in 0..n {
            sketch.push(i as f64);
        }
        prop_assert_eq!(sketch.count(), n as u64);
        let levels = 64 - (n as u64).leading_zeros() as usize;
        prop_assert!(sketch.retained() <= 16 * (levels + 1));
    }
}

// ── Gate Properties ──────────────────────────────────────────────────

proptest! {
    /// Verdict bands follow the slack: pass above the margin, marginal inside it.
    #[test]
    fn classify_follows_slack(
        bound in -100.0f64..100.0,
        threshold in -100.0f64..100.0,
        margin in 0.0f64..10.0,
        at_most in any::<bool>(),
    ) {
        let comparison = if at_most { Comparison::AtMost } else { Comparison::AtLeast };
        let s = slack(bound, threshold, comparison);
        let verdict = classify(bound, threshold, comparison, margin);
        let expected = if s > margin {
            Verdict::Pass
        } else if s >= -margin {
            Verdict::Marginal
        } else {
            Verdict::Fail
        };
        prop_assert_eq!(verdict, expected);
    }

    /// Mirroring bound and threshold swaps the comparison without changing the verdict.
    #[test]
    fn classify_is_mirror_symmetric(
        bound in -100.0f64..100.0,
        threshold in -100.0f64..100.0,
        margin in 0.0f64..10.0,
    ) {
        prop_assert_eq!(
            classify(bound, threshold, Comparison::AtMost, margin),
            classify(-bound, -threshold, Comparison::AtLeast, margin)
        );
    }

    /// A wider margin never turns a failure into a pass or a pass into a failure.
    #[test]
    fn wider_margin_only_softens(
        bound in -100.0f64..100.0,
        threshold in -100.0f64..100.0,
        margin in 0.0f64..10.0,
        extra in 0.0f64..10.0,
    ) {
        let narrow = classify(bound, threshold, Comparison::AtMost, margin);
        let wide = classify(bound, threshold, Comparison::AtMost, margin + extra);
        prop_assert!(!(narrow == Verdict::Fail && wide == Verdict::Pass));
        if wide == Verdict::Fail {
            prop_assert_eq!(narrow, Verdict::Fail);
        }
        if wide == Verdict::Pass {
            prop_assert_eq!(narrow, Verdict::Pass);
        }
    }
}

// ── Random Stream Properties ─────────────────────────────────────────

proptest! {
    /// Trial streams depend only on (seed, index).
    #[test]
    fn trial_stream_is_reproducible(seed in any::<u64>(), index in 0u64..1_000_000) {
        let a: [f64; 4] = {
            let mut rng = trial_rng(seed, index);
            [rng.gen(), rng.gen(), rng.gen(), rng.gen()]
        };
        let b: [f64; 4] = {
            let mut rng = trial_rng(seed, index);
            [rng.gen(), rng.gen(), rng.gen(), rng.gen()]
        };
        prop_assert_eq!(a, b);
        let mut other = trial_rng(seed, index + 1);
        let c: f64 = other.gen();
        prop_assert_ne!(a[0], c);
    }
}
