// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Study Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ensure, ErrorKind, RotorResult};
use crate::state::{OperatingPoint, Quantity, RotorMode, Station, UncertainInput};

/// Top-level closeout study: rotor, polars, base point, uncertainty and gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    pub study_name: String,
    pub rotor: RotorConfig,
    pub airfoils: Vec<AirfoilConfig>,
    pub operating_point: OperatingPoint,
    #[serde(default)]
    pub solver: SolverConfig,
    /// Uncertain inputs keyed by name. Sampling order follows the key order.
    #[serde(default)]
    pub uncertainty: BTreeMap<UncertainInput, InputSpec>,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub gates: Vec<GateSpec>,
    #[serde(default)]
    pub trust: TrustPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotorConfig {
    #[serde(default)]
    pub mode: RotorMode,
    pub blades: usize,
    pub hub_radius: f64,
    pub tip_radius: f64,
    /// Ordered root to tip.
    pub stations: Vec<Station>,
}

/// Tip/hub loss variant applied to the momentum balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LossModel {
    /// Prandtl factor driven by the local inflow angle.
    #[default]
    Prandtl,
    /// Prandtl factor driven by tip-speed ratio and radial fraction.
    SpeedRatio,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Convergence threshold between iterations on the axial unknown: a for turbines,
    /// induced velocity over local blade speed for propellers (default: 1e-6)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap per station (default: 500)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Under-relaxation on the induction update, in (0, 1] (default: 0.5)
    #[serde(default = "default_relaxation")]
    pub relaxation: f64,
    #[serde(default)]
    pub loss_model: LossModel,
    /// Apply the hub-loss factor in addition to tip loss (default: true)
    #[serde(default = "default_true")]
    pub hub_loss: bool,
    /// Switch to the Buhl/Glauert branch past the momentum-theory limit (default: true)
    #[serde(default = "default_true")]
    pub high_induction_correction: bool,
    /// Close the spanwise integral with zero load at the tip radius (default: true)
    #[serde(default = "default_true")]
    pub integrate_to_tip: bool,
    /// Relative slack allowed over the momentum-theory power bound (default: 1e-3)
    #[serde(default = "default_power_bound_tolerance")]
    pub power_bound_tolerance: f64,
    /// Highest section Mach number accepted; stations above it invalidate the trial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mach_max: Option<f64>,
    /// Lowest section Reynolds number accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reynolds_min: Option<f64>,
    /// Highest section Reynolds number accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reynolds_max: Option<f64>,
}

fn default_tolerance() -> f64 {
    1e-6
}
fn default_max_iterations() -> usize {
    500
}
fn default_relaxation() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_power_bound_tolerance() -> f64 {
    1e-3
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            relaxation: default_relaxation(),
            loss_model: LossModel::default(),
            hub_loss: true,
            high_induction_correction: true,
            integrate_to_tip: true,
            power_bound_tolerance: default_power_bound_tolerance(),
            mach_max: None,
            reynolds_min: None,
            reynolds_max: None,
        }
    }
}

/// Named section polar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirfoilConfig {
    pub name: String,
    #[serde(flatten)]
    pub polar: PolarConfig,
    #[serde(default)]
    pub post_stall: PostStallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolarConfig {
    /// Row-major tables: one row per angle, one column per Reynolds number.
    Table {
        alpha_deg: Vec<f64>,
        reynolds: Vec<f64>,
        cl: Vec<Vec<f64>>,
        cd: Vec<Vec<f64>>,
    },
    /// cl = cl0 + cl_alpha·α clamped at ±stall, cd = cd0 + k·cl².
    Linear {
        cl0: f64,
        /// Lift slope (1/rad)
        cl_alpha: f64,
        alpha_stall_deg: f64,
        cd0: f64,
        k: f64,
    },
}

/// Behaviour outside the tabulated angle range. Lookups there are flagged either way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PostStallConfig {
    #[default]
    Clamp,
    Viterna {
        aspect_ratio: f64,
    },
}

/// Probability distribution of one uncertain input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionConfig {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    /// Parameters of the underlying normal.
    LogNormal { mu: f64, sigma: f64 },
    Triangular { low: f64, mode: f64, high: f64 },
}

/// How a sampled value combines with the nominal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    #[default]
    Replace,
    Add,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub apply: ApplyMode,
    /// Optional [lo, hi] clamp on the combined value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Trials per shard. Shards are the unit of parallel work and are merged in index order.
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,
    /// Worker threads; `None` uses the global rayon pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Wall-clock budget in seconds; trials not started by then are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wall_time_s: Option<f64>,
    /// Per-level buffer size of the quantile sketch.
    #[serde(default = "default_sketch_capacity")]
    pub sketch_capacity: usize,
    #[serde(default = "default_monitored")]
    pub monitored: Vec<Quantity>,
}

fn default_trials() -> usize {
    1000
}
fn default_seed() -> u64 {
    0x5EED_0001
}
fn default_shard_size() -> usize {
    64
}
fn default_sketch_capacity() -> usize {
    256
}
fn default_monitored() -> Vec<Quantity> {
    vec![
        Quantity::Thrust,
        Quantity::Power,
        Quantity::ThrustCoefficient,
        Quantity::PowerCoefficient,
    ]
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            trials: default_trials(),
            seed: default_seed(),
            shard_size: default_shard_size(),
            threads: None,
            max_wall_time_s: None,
            sketch_capacity: default_sketch_capacity(),
            monitored: default_monitored(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Acceptable when the bound stays at or below the threshold.
    AtMost,
    /// Acceptable when the bound stays at or above the threshold.
    AtLeast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sidedness {
    #[default]
    OneSided,
    TwoSided,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateStatistic {
    /// Confidence bound on the mean, mean ± z·stderr on the unfavourable side.
    Mean {
        #[serde(default = "default_confidence")]
        confidence: f64,
        #[serde(default)]
        sided: Sidedness,
    },
    /// Streaming quantile estimate at `probability`.
    Quantile { probability: f64 },
}

fn default_confidence() -> f64 {
    0.95
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSpec {
    pub name: String,
    pub quantity: Quantity,
    pub statistic: GateStatistic,
    pub comparison: Comparison,
    pub threshold: f64,
    /// Half-width of the marginal band around the threshold.
    #[serde(default)]
    pub margin: f64,
}

/// Run-level acceptance of the statistics themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Reject the run when invalid trials exceed this fraction (default: 0.05)
    #[serde(default = "default_max_invalid_fraction")]
    pub max_invalid_fraction: f64,
    /// Reject the run with fewer valid trials than this (default: 2)
    #[serde(default = "default_min_valid_trials")]
    pub min_valid_trials: u64,
    /// Optional cap on the fraction of airfoil lookups that left the table domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_out_of_domain_fraction: Option<f64>,
}

fn default_max_invalid_fraction() -> f64 {
    0.05
}
fn default_min_valid_trials() -> u64 {
    2
}

impl Default for TrustPolicy {
    fn default() -> Self {
        TrustPolicy {
            max_invalid_fraction: default_max_invalid_fraction(),
            min_valid_trials: default_min_valid_trials(),
            max_out_of_domain_fraction: None,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> RotorResult<()> {
        ensure(
            self.tolerance.is_finite() && self.tolerance > 0.0,
            ErrorKind::OutOfRange,
            || format!("solver tolerance must be > 0, got {}", self.tolerance),
        )?;
        ensure(self.max_iterations >= 1, ErrorKind::OutOfRange, || {
            "solver max_iterations must be >= 1".to_string()
        })?;
        ensure(
            self.relaxation > 0.0 && self.relaxation <= 1.0,
            ErrorKind::OutOfRange,
            || format!("solver relaxation must lie in (0, 1], got {}", self.relaxation),
        )?;
        ensure(
            self.power_bound_tolerance.is_finite() && self.power_bound_tolerance >= 0.0,
            ErrorKind::OutOfRange,
            || "power_bound_tolerance must be finite and >= 0".to_string(),
        )?;
        for (name, limit) in [
            ("mach_max", self.mach_max),
            ("reynolds_min", self.reynolds_min),
            ("reynolds_max", self.reynolds_max),
        ] {
            if let Some(value) = limit {
                ensure(value.is_finite() && value > 0.0, ErrorKind::OutOfRange, || {
                    format!("solver {name} must be finite and > 0, got {value}")
                })?;
            }
        }
        if let (Some(lo), Some(hi)) = (self.reynolds_min, self.reynolds_max) {
            ensure(lo < hi, ErrorKind::InvalidArgument, || {
                format!("solver reynolds_min must be below reynolds_max, got [{lo}, {hi}]")
            })?;
        }
        Ok(())
    }
}

impl DistributionConfig {
    pub fn validate(&self) -> RotorResult<()> {
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());
        match *self {
            DistributionConfig::Uniform { low, high } => ensure(
                finite(&[low, high]) && low < high,
                ErrorKind::InvalidArgument,
                || format!("uniform requires low < high, got [{low}, {high}]"),
            ),
            DistributionConfig::Normal { mean, std_dev } => ensure(
                finite(&[mean, std_dev]) && std_dev > 0.0,
                ErrorKind::InvalidArgument,
                || format!("normal requires std_dev > 0, got {std_dev}"),
            ),
            DistributionConfig::LogNormal { mu, sigma } => ensure(
                finite(&[mu, sigma]) && sigma > 0.0,
                ErrorKind::InvalidArgument,
                || format!("log_normal requires sigma > 0, got {sigma}"),
            ),
            DistributionConfig::Triangular { low, mode, high } => ensure(
                finite(&[low, mode, high]) && low < high && low <= mode && mode <= high,
                ErrorKind::InvalidArgument,
                || format!("triangular requires low <= mode <= high, got ({low}, {mode}, {high})"),
            ),
        }
    }
}

impl GateSpec {
    pub fn validate(&self) -> RotorResult<()> {
        ensure(self.threshold.is_finite(), ErrorKind::InvalidArgument, || {
            format!("gate '{}' threshold must be finite", self.name)
        })?;
        ensure(
            self.margin.is_finite() && self.margin >= 0.0,
            ErrorKind::OutOfRange,
            || format!("gate '{}' margin must be >= 0, got {}", self.name, self.margin),
        )?;
        match self.statistic {
            GateStatistic::Mean { confidence, .. } => ensure(
                confidence > 0.0 && confidence < 1.0,
                ErrorKind::OutOfRange,
                || format!("gate '{}' confidence must lie in (0, 1), got {confidence}", self.name),
            ),
            GateStatistic::Quantile { probability } => ensure(
                (0.0..=1.0).contains(&probability),
                ErrorKind::OutOfRange,
                || format!("gate '{}' probability must lie in [0, 1], got {probability}", self.name),
            ),
        }
    }
}

impl StudyConfig {
    /// Load from a JSON file and validate it.
    pub fn from_file(path: &str) -> RotorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Config-level checks. Blade geometry is validated when the station grid is built.
    pub fn validate(&self) -> RotorResult<()> {
        self.operating_point.validate()?;
        self.solver.validate()?;

        let mut names = BTreeSet::new();
        for airfoil in &self.airfoils {
            ensure(names.insert(airfoil.name.as_str()), ErrorKind::InvalidArgument, || {
                format!("duplicate airfoil name '{}'", airfoil.name)
            })?;
        }
        for station in &self.rotor.stations {
            ensure(
                names.contains(station.airfoil.as_str()),
                ErrorKind::InvalidArgument,
                || format!("station at r={} references unknown airfoil '{}'", station.radius, station.airfoil),
            )?;
        }

        for (input, spec) in &self.uncertainty {
            spec.distribution.validate()?;
            if let Some([lo, hi]) = spec.bounds {
                ensure(lo < hi, ErrorKind::InvalidArgument, || {
                    format!("{} bounds must satisfy lo < hi, got [{lo}, {hi}]", input.name())
                })?;
            }
        }

        let mc = &self.monte_carlo;
        ensure(mc.shard_size >= 1, ErrorKind::OutOfRange, || {
            "monte_carlo.shard_size must be >= 1".to_string()
        })?;
        ensure(mc.sketch_capacity >= 8, ErrorKind::OutOfRange, || {
            format!("monte_carlo.sketch_capacity must be >= 8, got {}", mc.sketch_capacity)
        })?;
        ensure(mc.threads != Some(0), ErrorKind::OutOfRange, || {
            "monte_carlo.threads must be >= 1 when set".to_string()
        })?;
        if let Some(budget) = mc.max_wall_time_s {
            ensure(budget.is_finite() && budget > 0.0, ErrorKind::OutOfRange, || {
                format!("monte_carlo.max_wall_time_s must be > 0, got {budget}")
            })?;
        }
        ensure(!mc.monitored.is_empty(), ErrorKind::InvalidArgument, || {
            "monte_carlo.monitored must name at least one quantity".to_string()
        })?;

        for gate in &self.gates {
            gate.validate()?;
            ensure(
                mc.monitored.contains(&gate.quantity),
                ErrorKind::InvalidArgument,
                || format!("gate '{}' uses unmonitored quantity '{}'", gate.name, gate.quantity.name()),
            )?;
        }

        let trust = &self.trust;
        ensure(
            (0.0..=1.0).contains(&trust.max_invalid_fraction),
            ErrorKind::OutOfRange,
            || format!("trust.max_invalid_fraction must lie in [0, 1], got {}", trust.max_invalid_fraction),
        )?;
        if let Some(fraction) = trust.max_out_of_domain_fraction {
            ensure((0.0..=1.0).contains(&fraction), ErrorKind::OutOfRange, || {
                format!("trust.max_out_of_domain_fraction must lie in [0, 1], got {fraction}")
            })?;
        }
        Ok(())
    }
}
