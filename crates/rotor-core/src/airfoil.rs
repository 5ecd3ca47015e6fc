// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Airfoil Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Section aerodynamics: (angle of attack, Reynolds number) → (Cl, Cd).
//!
//! Tabulated polars interpolate bilinearly and clamp at the table edges.
//! Anything outside the tabulated domain is answered but flagged.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use ndarray::Array2;
use rotor_math::interp::{bilinear_at, bracket, is_strictly_increasing, Bracket};
use rotor_types::config::{AirfoilConfig, PolarConfig, PostStallConfig};
use rotor_types::error::{ensure, ErrorKind, RotorError, RotorResult};

/// Lift/drag pair at one query, with the extrapolation flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarSample {
    pub cl: f64,
    pub cd: f64,
    pub out_of_domain: bool,
}

impl PolarSample {
    /// Multiplicative polar noise. Drag stays non-negative.
    pub fn scaled(self, lift_scale: f64, drag_scale: f64) -> Self {
        PolarSample {
            cl: self.cl * lift_scale,
            cd: (self.cd * drag_scale).max(0.0),
            out_of_domain: self.out_of_domain,
        }
    }
}

/// Treatment of angles beyond the tabulated range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostStall {
    /// Hold the edge row.
    Clamp,
    /// Viterna–Corrigan flat-plate blend anchored at the edge row.
    Viterna { cd_max: f64 },
}

impl PostStall {
    pub fn from_config(config: &PostStallConfig) -> RotorResult<Self> {
        match *config {
            PostStallConfig::Clamp => Ok(PostStall::Clamp),
            PostStallConfig::Viterna { aspect_ratio } => {
                ensure(
                    aspect_ratio.is_finite() && aspect_ratio > 0.0,
                    ErrorKind::InvalidArgument,
                    || format!("Viterna aspect ratio must be > 0, got {aspect_ratio}"),
                )?;
                // Viterna & Corrigan (1982): CDmax = 1.11 + 0.018·AR, capped at AR = 50.
                Ok(PostStall::Viterna {
                    cd_max: 1.11 + 0.018 * aspect_ratio.min(50.0),
                })
            }
        }
    }
}

/// Viterna–Corrigan extrapolation for α in (α_s, π/2], anchored at (α_s, cl_s, cd_s).
fn viterna(alpha: f64, alpha_s: f64, cl_s: f64, cd_s: f64, cd_max: f64) -> (f64, f64) {
    let alpha = alpha.min(FRAC_PI_2);
    let (ss, cs) = alpha_s.sin_cos();
    let a2 = (cl_s - cd_max * ss * cs) * ss / (cs * cs);
    let b2 = (cd_s - cd_max * ss * ss) / cs;
    let (s, c) = alpha.sin_cos();
    let cl = 0.5 * cd_max * (2.0 * alpha).sin() + a2 * c * c / s;
    let cd = cd_max * s * s + b2 * c;
    (cl, cd.max(0.0))
}

/// Tabulated polar on an angle × Reynolds grid (row-major: one row per angle).
#[derive(Debug, Clone)]
pub struct AirfoilTable {
    /// Angle-of-attack axis (rad), strictly increasing
    alpha: Vec<f64>,
    /// Reynolds axis, strictly increasing; a single column makes the table Re-independent
    reynolds: Vec<f64>,
    cl: Array2<f64>,
    cd: Array2<f64>,
    post_stall: PostStall,
}

impl AirfoilTable {
    pub fn new(
        alpha: Vec<f64>,
        reynolds: Vec<f64>,
        cl: Array2<f64>,
        cd: Array2<f64>,
        post_stall: PostStall,
    ) -> RotorResult<Self> {
        ensure(alpha.len() >= 2, ErrorKind::InvalidArgument, || {
            format!("polar needs at least 2 angles, got {}", alpha.len())
        })?;
        ensure(is_strictly_increasing(&alpha), ErrorKind::InvalidArgument, || {
            "polar angle axis must be finite and strictly increasing".to_string()
        })?;
        ensure(!reynolds.is_empty(), ErrorKind::InvalidArgument, || {
            "polar needs at least one Reynolds column".to_string()
        })?;
        ensure(
            is_strictly_increasing(&reynolds) && reynolds[0] > 0.0,
            ErrorKind::InvalidArgument,
            || "polar Reynolds axis must be positive and strictly increasing".to_string(),
        )?;
        let shape = (alpha.len(), reynolds.len());
        ensure(cl.dim() == shape && cd.dim() == shape, ErrorKind::InvalidArgument, || {
            format!(
                "polar tables must be {}x{}, got cl {:?} and cd {:?}",
                shape.0,
                shape.1,
                cl.dim(),
                cd.dim()
            )
        })?;
        ensure(
            cl.iter().all(|v| v.is_finite()) && cd.iter().all(|v| v.is_finite() && *v >= 0.0),
            ErrorKind::InvalidArgument,
            || "polar contains non-finite lift or negative drag".to_string(),
        )?;
        Ok(AirfoilTable {
            alpha,
            reynolds,
            cl,
            cd,
            post_stall,
        })
    }

    pub fn alpha_range(&self) -> (f64, f64) {
        (self.alpha[0], self.alpha[self.alpha.len() - 1])
    }

    fn edge(&self, row: usize, col: &Bracket) -> (f64, f64) {
        let at = Bracket {
            lower: row.min(self.alpha.len() - 2),
            weight: if row == 0 { 0.0 } else { 1.0 },
            out_of_domain: false,
        };
        (
            bilinear_at(&self.cl.view(), &at, col),
            bilinear_at(&self.cd.view(), &at, col),
        )
    }

    pub fn lookup(&self, alpha: f64, reynolds: f64) -> PolarSample {
        let col = bracket(&self.reynolds, reynolds);
        let row = bracket(&self.alpha, alpha);
        let out_of_domain = row.out_of_domain || col.out_of_domain;

        if row.out_of_domain && !alpha.is_nan() {
            if let PostStall::Viterna { cd_max } = self.post_stall {
                let (lo, hi) = self.alpha_range();
                if alpha > hi && hi > 0.0 {
                    let (cl_s, cd_s) = self.edge(self.alpha.len() - 1, &col);
                    let (cl, cd) = viterna(alpha, hi, cl_s, cd_s, cd_max);
                    return PolarSample {
                        cl,
                        cd,
                        out_of_domain,
                    };
                }
                if alpha < lo && lo < 0.0 {
                    // Mirror the negative branch onto positive angles.
                    let (cl_s, cd_s) = self.edge(0, &col);
                    let (cl, cd) = viterna(-alpha, -lo, -cl_s, cd_s, cd_max);
                    return PolarSample {
                        cl: -cl,
                        cd,
                        out_of_domain,
                    };
                }
            }
        }

        PolarSample {
            cl: bilinear_at(&self.cl.view(), &row, &col),
            cd: bilinear_at(&self.cd.view(), &row, &col),
            out_of_domain,
        }
    }
}

/// Thin-airfoil polar: cl = cl0 + cl_alpha·α with α held at ±stall, cd = cd0 + k·cl².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPolar {
    cl0: f64,
    cl_alpha: f64,
    alpha_stall: f64,
    cd0: f64,
    k: f64,
}

impl LinearPolar {
    const CL_LIMIT: f64 = 2.0;
    const CD_LIMIT: f64 = 2.0;

    /// `alpha_stall` in radians, in (0, 60°).
    pub fn new(cl0: f64, cl_alpha: f64, alpha_stall: f64, cd0: f64, k: f64) -> RotorResult<Self> {
        ensure(cl0.is_finite(), ErrorKind::InvalidArgument, || {
            format!("linear polar cl0 must be finite, got {cl0}")
        })?;
        ensure(
            cl_alpha.is_finite() && cl_alpha.abs() < 1000.0,
            ErrorKind::InvalidArgument,
            || format!("linear polar lift slope invalid: {cl_alpha}"),
        )?;
        ensure(
            alpha_stall.is_finite() && alpha_stall > 0.0 && alpha_stall < 60f64.to_radians(),
            ErrorKind::OutOfRange,
            || format!("linear polar stall angle must lie in (0, 60°), got {alpha_stall} rad"),
        )?;
        ensure(
            cd0.is_finite() && cd0 >= 0.0 && k.is_finite() && k >= 0.0,
            ErrorKind::InvalidArgument,
            || format!("linear polar drag terms must be >= 0, got cd0={cd0}, k={k}"),
        )?;
        Ok(LinearPolar {
            cl0,
            cl_alpha,
            alpha_stall,
            cd0,
            k,
        })
    }

    /// Reynolds-independent. Flags angles past stall.
    pub fn lookup(&self, alpha: f64) -> PolarSample {
        let held = alpha.clamp(-self.alpha_stall, self.alpha_stall);
        let cl = (self.cl0 + self.cl_alpha * held).clamp(-Self::CL_LIMIT, Self::CL_LIMIT);
        let cd = (self.cd0 + self.k * cl * cl).clamp(0.0, Self::CD_LIMIT);
        PolarSample {
            cl,
            cd,
            out_of_domain: alpha.is_nan() || alpha.abs() > self.alpha_stall,
        }
    }
}

/// One named section polar.
#[derive(Debug, Clone)]
pub enum Airfoil {
    Table(AirfoilTable),
    Linear(LinearPolar),
}

impl Airfoil {
    pub fn from_config(config: &AirfoilConfig) -> RotorResult<Self> {
        match &config.polar {
            PolarConfig::Table {
                alpha_deg,
                reynolds,
                cl,
                cd,
            } => {
                let alpha: Vec<f64> = alpha_deg.iter().map(|a| a.to_radians()).collect();
                let cl = rows_to_array(&config.name, "cl", cl, reynolds.len())?;
                let cd = rows_to_array(&config.name, "cd", cd, reynolds.len())?;
                let post_stall = PostStall::from_config(&config.post_stall)?;
                AirfoilTable::new(alpha, reynolds.clone(), cl, cd, post_stall)
                    .map(Airfoil::Table)
                    .map_err(|e| {
                        RotorError::new(e.kind(), format!("airfoil '{}': {}", config.name, e.message()))
                    })
            }
            PolarConfig::Linear {
                cl0,
                cl_alpha,
                alpha_stall_deg,
                cd0,
                k,
            } => LinearPolar::new(*cl0, *cl_alpha, alpha_stall_deg.to_radians(), *cd0, *k)
                .map(Airfoil::Linear),
        }
    }

    pub fn lookup(&self, alpha: f64, reynolds: f64) -> PolarSample {
        match self {
            Airfoil::Table(table) => table.lookup(alpha, reynolds),
            Airfoil::Linear(polar) => polar.lookup(alpha),
        }
    }
}

fn rows_to_array(
    name: &str,
    field: &str,
    rows: &[Vec<f64>],
    ncols: usize,
) -> RotorResult<Array2<f64>> {
    ensure(
        rows.iter().all(|r| r.len() == ncols),
        ErrorKind::InvalidArgument,
        || format!("airfoil '{name}': every {field} row needs {ncols} Reynolds entries"),
    )?;
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), ncols), flat).map_err(|e| {
        RotorError::invalid_argument(format!("airfoil '{name}': {field} table shape: {e}"))
    })
}

/// Shared, read-only set of polars resolved by name.
#[derive(Debug, Clone, Default)]
pub struct AirfoilLibrary {
    airfoils: Vec<Airfoil>,
    index: BTreeMap<String, usize>,
}

impl AirfoilLibrary {
    pub fn from_configs(configs: &[AirfoilConfig]) -> RotorResult<Self> {
        let mut library = AirfoilLibrary::default();
        for config in configs {
            library.insert(&config.name, Airfoil::from_config(config)?)?;
        }
        Ok(library)
    }

    pub fn insert(&mut self, name: &str, airfoil: Airfoil) -> RotorResult<usize> {
        ensure(!self.index.contains_key(name), ErrorKind::InvalidArgument, || {
            format!("duplicate airfoil name '{name}'")
        })?;
        let id = self.airfoils.len();
        self.airfoils.push(airfoil);
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn index_of(&self, name: &str) -> RotorResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RotorError::invalid_argument(format!("unknown airfoil '{name}'")))
    }

    /// Panics on an index not issued by this library.
    pub fn get(&self, id: usize) -> &Airfoil {
        &self.airfoils[id]
    }

    pub fn len(&self) -> usize {
        self.airfoils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airfoils.is_empty()
    }
}
