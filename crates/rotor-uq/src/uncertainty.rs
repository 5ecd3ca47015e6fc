// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Uncertainty Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Named input distributions and per-trial sampling of operating point and blade.

use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Distribution as _, LogNormal, Normal, Triangular, Uniform};
use rotor_core::rotor::BladePerturbation;
use rotor_types::config::{ApplyMode, DistributionConfig, InputSpec};
use rotor_types::error::{ensure, ErrorKind, RotorError, RotorResult};
use rotor_types::state::{OperatingPoint, UncertainInput};
use serde::Serialize;

/// Sampling distribution of one uncertain input.
#[derive(Debug, Clone, Copy)]
pub enum Distribution {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    Triangular(Triangular<f64>),
}

impl Distribution {
    pub fn from_config(config: &DistributionConfig) -> RotorResult<Self> {
        config.validate()?;
        let rejected = |e: &dyn std::fmt::Display| {
            RotorError::invalid_argument(format!("distribution {config:?} rejected: {e}"))
        };
        Ok(match *config {
            DistributionConfig::Uniform { low, high } => {
                Distribution::Uniform(Uniform::new(low, high))
            }
            DistributionConfig::Normal { mean, std_dev } => {
                Distribution::Normal(Normal::new(mean, std_dev).map_err(|e| rejected(&e))?)
            }
            DistributionConfig::LogNormal { mu, sigma } => {
                Distribution::LogNormal(LogNormal::new(mu, sigma).map_err(|e| rejected(&e))?)
            }
            DistributionConfig::Triangular { low, mode, high } => Distribution::Triangular(
                Triangular::new(low, high, mode).map_err(|e| rejected(&e))?,
            ),
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Distribution::Uniform(d) => d.sample(rng),
            Distribution::Normal(d) => d.sample(rng),
            Distribution::LogNormal(d) => d.sample(rng),
            Distribution::Triangular(d) => d.sample(rng),
        }
    }
}

/// One perturbed input: draw, combine with the nominal value, clamp.
#[derive(Debug, Clone, Copy)]
pub struct InputModel {
    pub input: UncertainInput,
    pub distribution: Distribution,
    pub apply: ApplyMode,
    pub bounds: Option<(f64, f64)>,
}

impl InputModel {
    pub fn from_spec(input: UncertainInput, spec: &InputSpec) -> RotorResult<Self> {
        let bounds = match spec.bounds {
            Some([lo, hi]) => {
                ensure(lo.is_finite() && hi.is_finite() && lo < hi, ErrorKind::InvalidArgument, || {
                    format!("{} bounds must satisfy lo < hi, got [{lo}, {hi}]", input.name())
                })?;
                Some((lo, hi))
            }
            None => None,
        };
        Ok(InputModel {
            input,
            distribution: Distribution::from_config(&spec.distribution)?,
            apply: spec.apply,
            bounds,
        })
    }

    /// Combine a draw with `nominal`, then clamp to the bounds and the physical floor.
    pub fn combine(&self, nominal: f64, draw: f64) -> f64 {
        let value = match self.apply {
            ApplyMode::Replace => draw,
            ApplyMode::Add => nominal + draw,
            ApplyMode::Scale => nominal * draw,
        };
        let value = match self.bounds {
            Some((lo, hi)) => value.clamp(lo, hi),
            None => value,
        };
        value.max(self.input.physical_floor())
    }
}

/// Everything one trial perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampledTrial {
    pub op: OperatingPoint,
    pub perturbation: BladePerturbation,
}

/// Named input → distribution mapping.
///
/// Inputs are drawn in [`UncertainInput`] order, one draw each, so a trial's
/// sample depends only on its random stream.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyModel {
    inputs: Vec<InputModel>,
}

impl UncertaintyModel {
    pub fn from_config(specs: &BTreeMap<UncertainInput, InputSpec>) -> RotorResult<Self> {
        let inputs = specs
            .iter()
            .map(|(&input, spec)| InputModel::from_spec(input, spec))
            .collect::<RotorResult<Vec<_>>>()?;
        Ok(UncertaintyModel { inputs })
    }

    pub fn inputs(&self) -> &[InputModel] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn sample<R: Rng + ?Sized>(&self, base: &OperatingPoint, rng: &mut R) -> SampledTrial {
        let mut op = *base;
        let mut perturbation = BladePerturbation::default();
        for model in &self.inputs {
            let draw = model.distribution.sample(rng);
            let value = model.combine(model.input.nominal(base), draw);
            let slot = match model.input {
                UncertainInput::InflowSpeed => &mut op.inflow_speed,
                UncertainInput::RotorSpeed => &mut op.rotor_speed,
                UncertainInput::AirDensity => &mut op.air_density,
                UncertainInput::Viscosity => &mut op.viscosity,
                UncertainInput::Pitch => &mut op.pitch,
                UncertainInput::ChordScale => &mut perturbation.chord_scale,
                UncertainInput::TwistOffset => &mut perturbation.twist_offset,
                UncertainInput::LiftScale => &mut perturbation.lift_scale,
                UncertainInput::DragScale => &mut perturbation.drag_scale,
            };
            *slot = value;
        }
        SampledTrial { op, perturbation }
    }
}
