// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Online Statistics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Streaming statistics in bounded memory.
//!
//! [`RunningStats`] keeps count, mean and M2 with Welford's update and merges
//! partial aggregates with Chan's pairwise formula. Quantiles come from a
//! [`QuantileSketch`]: a deterministic compactor hierarchy that is exact until
//! its first compaction and afterwards carries a guaranteed rank-error bound.
//!
//! Merging is associative and commutative up to floating-point rounding; callers
//! that need bit-identical results merge in a fixed order.

use rotor_types::error::{ensure, ErrorKind, RotorResult};
use serde::Serialize;

/// Smallest per-level buffer a sketch accepts.
pub const MIN_SKETCH_CAPACITY: usize = 8;

/// Quantiles reported in every summary.
pub const SUMMARY_PROBABILITIES: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];

/// How much a statistic can say about its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataState {
    NoData,
    /// Mean defined; variance undefined.
    SingleSample,
    Sufficient,
}

/// A quantile estimate with its accuracy caveat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileEstimate {
    pub probability: f64,
    pub value: f64,
    /// Bound on |true rank − requested rank| as a fraction of the sample count.
    /// Zero while the sketch still holds every sample.
    pub rank_error: f64,
    pub exact: bool,
}

/// Mergeable compactor sketch.
///
/// Level `h` holds items of weight 2^h. When a level fills, it is sorted and
/// every other item (alternating the starting offset between compactions) is
/// promoted to level `h + 1`; an odd leftover stays behind. Each compaction of
/// level `h` shifts any rank by at most 2^h, which is added to the error bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileSketch {
    capacity: usize,
    levels: Vec<Vec<f64>>,
    compactions: Vec<u64>,
    count: u64,
    /// Accumulated absolute rank error from compactions.
    rank_error: f64,
}

impl QuantileSketch {
    pub fn new(capacity: usize) -> RotorResult<Self> {
        ensure(capacity >= MIN_SKETCH_CAPACITY, ErrorKind::OutOfRange, || {
            format!("sketch capacity must be >= {MIN_SKETCH_CAPACITY}, got {capacity}")
        })?;
        Ok(QuantileSketch {
            capacity,
            levels: vec![Vec::with_capacity(capacity)],
            compactions: vec![0],
            count: 0,
            rank_error: 0.0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// True until the first compaction.
    pub fn is_exact(&self) -> bool {
        self.levels.len() == 1
    }

    /// Items currently retained across all levels.
    pub fn retained(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Non-finite values are ignored.
    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        self.count += 1;
        self.levels[0].push(x);
        if self.levels[0].len() >= self.capacity {
            self.compress();
        }
    }

    /// Fold `other` into `self`. Both sketches must share a capacity.
    pub fn merge(&mut self, other: &QuantileSketch) -> RotorResult<()> {
        ensure(
            self.capacity == other.capacity,
            ErrorKind::InvariantViolation,
            || {
                format!(
                    "cannot merge sketches of capacity {} and {}",
                    self.capacity, other.capacity
                )
            },
        )?;
        while self.levels.len() < other.levels.len() {
            self.levels.push(Vec::new());
            self.compactions.push(0);
        }
        for (h, items) in other.levels.iter().enumerate() {
            self.levels[h].extend_from_slice(items);
            self.compactions[h] += other.compactions[h];
        }
        self.count += other.count;
        self.rank_error += other.rank_error;
        self.compress();
        Ok(())
    }

    fn compress(&mut self) {
        let mut h = 0;
        while h < self.levels.len() {
            if self.levels[h].len() >= self.capacity {
                self.compact(h);
            }
            h += 1;
        }
    }

    fn compact(&mut self, h: usize) {
        if h + 1 == self.levels.len() {
            self.levels.push(Vec::with_capacity(self.capacity));
            self.compactions.push(0);
        }
        let mut items = std::mem::take(&mut self.levels[h]);
        items.sort_by(f64::total_cmp);
        let leftover = if items.len() % 2 == 1 { items.pop() } else { None };
        let offset = (self.compactions[h] % 2) as usize;
        self.compactions[h] += 1;

        let promoted = items.iter().skip(offset).step_by(2).copied();
        self.levels[h + 1].extend(promoted);
        self.levels[h].extend(leftover);
        self.rank_error += (1u64 << h) as f64;
    }

    /// Absolute rank-error bound: compaction error plus the heaviest retained weight.
    fn absolute_rank_error(&self) -> f64 {
        if self.is_exact() {
            return 0.0;
        }
        let heaviest = self
            .levels
            .iter()
            .rposition(|level| !level.is_empty())
            .map_or(0.0, |h| (1u64 << h) as f64);
        self.rank_error + heaviest
    }

    /// Estimate the `probability` quantile. `None` without data or for NaN.
    ///
    /// Exact type-7 interpolation while no compaction has happened, otherwise
    /// the smallest retained item whose cumulative weight reaches p·N.
    pub fn quantile(&self, probability: f64) -> Option<QuantileEstimate> {
        if self.count == 0 || probability.is_nan() {
            return None;
        }
        let p = probability.clamp(0.0, 1.0);

        if self.is_exact() {
            let mut sorted = self.levels[0].clone();
            sorted.sort_by(f64::total_cmp);
            let pos = (sorted.len() - 1) as f64 * p;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(sorted.len() - 1);
            let frac = pos - lo as f64;
            let value = sorted[lo] + frac * (sorted[hi] - sorted[lo]);
            return Some(QuantileEstimate {
                probability: p,
                value,
                rank_error: 0.0,
                exact: true,
            });
        }

        let mut weighted: Vec<(f64, u64)> = self
            .levels
            .iter()
            .enumerate()
            .flat_map(|(h, level)| level.iter().map(move |&v| (v, 1u64 << h)))
            .collect();
        weighted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let target = p * self.count as f64;
        let mut cumulative = 0u64;
        let mut value = weighted.last().map_or(f64::NAN, |w| w.0);
        for &(v, w) in &weighted {
            cumulative += w;
            if cumulative as f64 >= target {
                value = v;
                break;
            }
        }
        Some(QuantileEstimate {
            probability: p,
            value,
            rank_error: self.absolute_rank_error() / self.count as f64,
            exact: false,
        })
    }
}

/// Streaming mean, variance, extrema and quantiles of one scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    /// Non-finite samples turned away.
    rejected: u64,
    sketch: QuantileSketch,
}

impl RunningStats {
    pub fn new(sketch_capacity: usize) -> RotorResult<Self> {
        Ok(RunningStats {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            rejected: 0,
            sketch: QuantileSketch::new(sketch_capacity)?,
        })
    }

    /// Welford update. Non-finite samples are counted as rejected and otherwise ignored.
    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            self.rejected += 1;
            return;
        }
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sketch.push(x);
    }

    /// Chan's parallel combination of two partial aggregates.
    pub fn merge(&mut self, other: &RunningStats) -> RotorResult<()> {
        self.sketch.merge(&other.sketch)?;
        self.rejected += other.rejected;
        if other.count == 0 {
            return Ok(());
        }
        if self.count == 0 {
            self.count = other.count;
            self.mean = other.mean;
            self.m2 = other.m2;
            self.min = other.min;
            self.max = other.max;
            return Ok(());
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn state(&self) -> DataState {
        match self.count {
            0 => DataState::NoData,
            1 => DataState::SingleSample,
            _ => DataState::Sufficient,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased variance, M2 / (N − 1). Undefined below two samples.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0))
    }

    /// M2 / N.
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).max(0.0))
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    /// Standard error of the mean, s / √N.
    pub fn std_error(&self) -> Option<f64> {
        self.std_dev().map(|s| s / (self.count as f64).sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn quantile(&self, probability: f64) -> Option<QuantileEstimate> {
        self.sketch.quantile(probability)
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            count: self.count,
            rejected: self.rejected,
            state: self.state(),
            mean: self.mean(),
            std_dev: self.std_dev(),
            std_error: self.std_error(),
            min: self.min(),
            max: self.max(),
            quantiles: SUMMARY_PROBABILITIES
                .iter()
                .filter_map(|&p| self.quantile(p))
                .collect(),
        }
    }
}

/// Serializable snapshot of a [`RunningStats`]. Undefined statistics are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub rejected: u64,
    pub state: DataState,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub std_error: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub quantiles: Vec<QuantileEstimate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> RunningStats {
        RunningStats::new(64).unwrap()
    }

    fn filled(values: &[f64]) -> RunningStats {
        let mut s = stats();
        values.iter().for_each(|&v| s.push(v));
        s
    }

    #[test]
    fn test_one_to_five() {
        let s = filled(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(s.count(), 5);
        assert_eq!(s.mean(), Some(3.0));
        assert_eq!(s.sample_variance(), Some(2.5));
        assert_eq!(s.population_variance(), Some(2.0));
        assert_eq!(s.min(), Some(1.0));
        assert_eq!(s.max(), Some(5.0));
        assert_eq!(s.state(), DataState::Sufficient);
    }

    #[test]
    fn test_no_data() {
        let s = stats();
        assert_eq!(s.state(), DataState::NoData);
        assert_eq!(s.mean(), None);
        assert_eq!(s.population_variance(), None);
        assert_eq!(s.std_error(), None);
        assert_eq!(s.quantile(0.5), None);
        let summary = s.summary();
        assert!(summary.quantiles.is_empty());
        assert_eq!(summary.mean, None);
    }

    #[test]
    fn test_single_sample_has_no_variance() {
        let s = filled(&[4.2]);
        assert_eq!(s.state(), DataState::SingleSample);
        assert_eq!(s.mean(), Some(4.2));
        assert_eq!(s.sample_variance(), None);
        assert_eq!(s.std_dev(), None);
        assert_eq!(s.population_variance(), Some(0.0));
        assert_eq!(s.quantile(0.9).unwrap().value, 4.2);
    }

    #[test]
    fn test_standard_error() {
        let s = filled(&[9.0, 11.0]);
        assert_eq!(s.mean(), Some(10.0));
        assert!((s.std_error().unwrap() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_non_finite_rejected() {
        let s = filled(&[1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(s.count(), 2);
        assert_eq!(s.rejected(), 2);
        assert_eq!(s.mean(), Some(2.0));
    }

    #[test]
    fn test_large_offset_is_stable() {
        // Naive sum-of-squares loses everything here.
        let s = filled(&[1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0]);
        assert!((s.sample_variance().unwrap() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_merge_matches_sequential() {
        let values: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 * 0.25).collect();
        let all = filled(&values);
        let mut left = filled(&values[..123]);
        let right = filled(&values[123..]);
        left.merge(&right).unwrap();
        assert_eq!(left.count(), all.count());
        assert!((left.mean().unwrap() - all.mean().unwrap()).abs() < 1e-12);
        assert!((left.sample_variance().unwrap() - all.sample_variance().unwrap()).abs() < 1e-9);
        assert_eq!(left.min(), all.min());
        assert_eq!(left.max(), all.max());
    }

    #[test]
    fn test_merge_with_empty() {
        let mut s = filled(&[1.0, 2.0]);
        let before = s.clone();
        s.merge(&stats()).unwrap();
        assert_eq!(s, before);
        let mut empty = stats();
        empty.merge(&before).unwrap();
        assert_eq!(empty.mean(), before.mean());
        assert_eq!(empty.sample_variance(), before.sample_variance());
    }

    #[test]
    fn test_merge_capacity_mismatch_is_invariant() {
        let mut a = RunningStats::new(16).unwrap();
        let b = RunningStats::new(32).unwrap();
        let err = a.merge(&b).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(
            QuantileSketch::new(4).unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
    }

    #[test]
    fn test_exact_quantiles_type7() {
        let s = filled(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let q = s.quantile(0.5).unwrap();
        assert!(q.exact);
        assert_eq!(q.value, 3.0);
        assert_eq!(q.rank_error, 0.0);
        // h = 4·0.9 = 3.6 → 4 + 0.6
        assert!((s.quantile(0.9).unwrap().value - 4.6).abs() < 1e-12);
        assert_eq!(s.quantile(0.0).unwrap().value, 1.0);
        assert_eq!(s.quantile(1.0).unwrap().value, 5.0);
        assert_eq!(s.quantile(f64::NAN), None);
    }

    #[test]
    fn test_sketch_memory_is_bounded() {
        let mut sketch = QuantileSketch::new(32).unwrap();
        for i in 0..100_000 {
            sketch.push(i as f64);
        }
        assert_eq!(sketch.count(), 100_000);
        assert!(!sketch.is_exact());
        // One partially filled buffer per level, ~log2(N / capacity) levels.
        assert!(sketch.retained() < 32 * 20, "retained {}", sketch.retained());
    }

    #[test]
    fn test_sketch_rank_error_bound_holds() {
        let n = 20_000u64;
        let mut sketch = QuantileSketch::new(256).unwrap();
        // Values 1..=n in a scrambled order; the true rank of v is v.
        for i in 0..n {
            sketch.push(((i * 7_919) % n + 1) as f64);
        }
        for p in [0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99] {
            let q = sketch.quantile(p).unwrap();
            let rank_gap = (q.value - p * n as f64).abs() / n as f64;
            assert!(
                rank_gap <= q.rank_error + 1.0 / n as f64,
                "p={p}: gap {rank_gap} exceeds bound {}",
                q.rank_error
            );
            assert!(q.rank_error < 0.05, "bound {}", q.rank_error);
        }
    }

    #[test]
    fn test_sketch_merge_keeps_count_and_bound() {
        let mut a = QuantileSketch::new(16).unwrap();
        let mut b = QuantileSketch::new(16).unwrap();
        for i in 0..1000 {
            a.push(i as f64);
            b.push((1000 + i) as f64);
        }
        a.merge(&b).unwrap();
        assert_eq!(a.count(), 2000);
        let q = a.quantile(0.5).unwrap();
        let gap = (q.value - 1000.0).abs() / 2000.0;
        assert!(gap <= q.rank_error + 1.0 / 2000.0);
    }
}
