//! Compensated summation and trapezoidal quadrature.

/// Kahan–Babuška (Neumaier) compensated accumulator.
///
/// The running error term survives addends larger than the current sum,
/// which plain Kahan loses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for KahanSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

/// Compensated sum of a slice.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut acc = KahanSum::new();
    acc.extend(values.iter().copied());
    acc.value()
}

/// Trapezoidal integral of `y` over the nodes `x`, accumulated with compensation.
///
/// Fewer than two nodes integrate to zero. Extra entries in the longer slice are ignored.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mut acc = KahanSum::new();
    for i in 0..n - 1 {
        acc.add(0.5 * (y[i] + y[i + 1]) * (x[i + 1] - x[i]));
    }
    acc.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kahan_recovers_small_terms() {
        // 1 + 1e-16 * 10_000 loses every small term in naive summation.
        let mut values = vec![1.0];
        values.extend(std::iter::repeat(1e-16).take(10_000));
        let naive: f64 = values.iter().sum();
        let compensated = kahan_sum(&values);
        assert_eq!(naive, 1.0);
        assert!((compensated - (1.0 + 1e-12)).abs() < 1e-15);
    }

    #[test]
    fn test_neumaier_large_addend() {
        let total = kahan_sum(&[1.0, 1e100, 1.0, -1e100]);
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_trapezoid_linear_exact() {
        let x = [0.0, 0.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        // ∫0^3 (2x + 1) dx = 12
        assert!((trapezoid(&x, &y) - 12.0).abs() < 1e-13);
    }

    #[test]
    fn test_trapezoid_degenerate() {
        assert_eq!(trapezoid(&[], &[]), 0.0);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
    }

    #[test]
    fn test_trapezoid_quadratic_converges() {
        let n = 1001;
        let x: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        assert!((trapezoid(&x, &y) - 1.0 / 3.0).abs() < 1e-6);
    }
}
