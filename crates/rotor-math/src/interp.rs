//! Clamped linear and bilinear lookup on strictly increasing axes.
//!
//! Queries outside an axis are clamped to its end and reported, never rejected.

use ndarray::ArrayView2;

/// Position of a query on one axis: cell index, fractional weight within the cell,
/// and whether the query had to be clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub weight: f64,
    pub out_of_domain: bool,
}

/// Interpolated value together with its out-of-domain flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolated {
    pub value: f64,
    pub out_of_domain: bool,
}

/// True when every entry is finite and each exceeds its predecessor.
pub fn is_strictly_increasing(axis: &[f64]) -> bool {
    axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[1] > w[0])
}

/// Locate `x` on `axis`.
///
/// A single-point axis is treated as constant: never out of domain.
/// NaN clamps to the first cell and is flagged.
pub fn bracket(axis: &[f64], x: f64) -> Bracket {
    let n = axis.len();
    if n < 2 {
        return Bracket {
            lower: 0,
            weight: 0.0,
            out_of_domain: x.is_nan(),
        };
    }
    if x.is_nan() {
        return Bracket {
            lower: 0,
            weight: 0.0,
            out_of_domain: true,
        };
    }
    if x <= axis[0] {
        return Bracket {
            lower: 0,
            weight: 0.0,
            out_of_domain: x < axis[0],
        };
    }
    if x >= axis[n - 1] {
        return Bracket {
            lower: n - 2,
            weight: 1.0,
            out_of_domain: x > axis[n - 1],
        };
    }

    // First index with axis[i] > x, so axis[lower] <= x < axis[lower + 1].
    let upper = axis.partition_point(|&v| v <= x);
    let lower = upper.saturating_sub(1).min(n - 2);
    let width = axis[lower + 1] - axis[lower];
    Bracket {
        lower,
        weight: ((x - axis[lower]) / width).clamp(0.0, 1.0),
        out_of_domain: false,
    }
}

/// Linear interpolation of `values` sampled on `axis`, clamped at both ends.
pub fn interp1(axis: &[f64], values: &[f64], x: f64) -> Interpolated {
    if values.is_empty() {
        return Interpolated {
            value: f64::NAN,
            out_of_domain: true,
        };
    }
    let b = bracket(axis, x);
    let value = if values.len() < 2 {
        values[0]
    } else {
        (1.0 - b.weight) * values[b.lower] + b.weight * values[b.lower + 1]
    };
    Interpolated {
        value,
        out_of_domain: b.out_of_domain,
    }
}

/// Bilinear blend of `table[[row, col]]` at two precomputed brackets.
///
/// A table with a single column ignores `col`.
pub fn bilinear_at(table: &ArrayView2<f64>, row: &Bracket, col: &Bracket) -> f64 {
    let (nrows, ncols) = table.dim();
    let r0 = row.lower.min(nrows.saturating_sub(1));
    let r1 = if nrows > 1 { r0 + 1 } else { r0 };
    let (c0, c1) = if ncols > 1 {
        (col.lower, col.lower + 1)
    } else {
        (0, 0)
    };
    let t = row.weight;
    let u = if ncols > 1 { col.weight } else { 0.0 };

    let v00 = table[[r0, c0]];
    let v01 = table[[r0, c1]];
    let v10 = table[[r1, c0]];
    let v11 = table[[r1, c1]];
    (1.0 - t) * ((1.0 - u) * v00 + u * v01) + t * ((1.0 - u) * v10 + u * v11)
}

/// Clamped bilinear interpolation over (`row_axis`, `col_axis`).
pub fn interp2_clamped(
    row_axis: &[f64],
    col_axis: &[f64],
    table: &ArrayView2<f64>,
    x: f64,
    y: f64,
) -> Interpolated {
    let row = bracket(row_axis, x);
    let col = bracket(col_axis, y);
    Interpolated {
        value: bilinear_at(table, &row, &col),
        out_of_domain: row.out_of_domain || col.out_of_domain,
    }
}
