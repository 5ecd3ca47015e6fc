// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{AIR_DENSITY_SEA_LEVEL, AIR_VISCOSITY_SEA_LEVEL, SPEED_OF_SOUND_SEA_LEVEL};
use crate::error::{ensure, ErrorKind, RotorResult};

/// Whether the rotor extracts energy from the flow or adds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotorMode {
    #[default]
    Turbine,
    Propeller,
}

/// One radial blade cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Radial position (m)
    pub radius: f64,
    /// Chord length (m)
    pub chord: f64,
    /// Geometric twist (rad), added to the collective pitch
    pub twist: f64,
    /// Airfoil name, resolved against the study's airfoil library
    pub airfoil: String,
}

/// Rotor operating condition for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Free-stream (wind or flight) speed (m/s). Zero is hover for a propeller.
    pub inflow_speed: f64,
    /// Rotational speed (rad/s)
    pub rotor_speed: f64,
    /// Air density (kg/m³)
    #[serde(default = "default_air_density")]
    pub air_density: f64,
    /// Dynamic viscosity (Pa·s)
    #[serde(default = "default_viscosity")]
    pub viscosity: f64,
    /// Collective pitch (rad)
    #[serde(default)]
    pub pitch: f64,
    /// Speed of sound (m/s), for section Mach numbers
    #[serde(default = "default_speed_of_sound")]
    pub speed_of_sound: f64,
}

fn default_air_density() -> f64 {
    AIR_DENSITY_SEA_LEVEL
}
fn default_viscosity() -> f64 {
    AIR_VISCOSITY_SEA_LEVEL
}
fn default_speed_of_sound() -> f64 {
    SPEED_OF_SOUND_SEA_LEVEL
}

impl OperatingPoint {
    pub fn new(inflow_speed: f64, rotor_speed: f64) -> Self {
        OperatingPoint {
            inflow_speed,
            rotor_speed,
            air_density: AIR_DENSITY_SEA_LEVEL,
            viscosity: AIR_VISCOSITY_SEA_LEVEL,
            pitch: 0.0,
            speed_of_sound: SPEED_OF_SOUND_SEA_LEVEL,
        }
    }

    /// Reject non-finite values, negative speeds and non-positive fluid properties.
    pub fn validate(&self) -> RotorResult<()> {
        let fields = [
            ("inflow_speed", self.inflow_speed),
            ("rotor_speed", self.rotor_speed),
            ("air_density", self.air_density),
            ("viscosity", self.viscosity),
            ("pitch", self.pitch),
            ("speed_of_sound", self.speed_of_sound),
        ];
        for (name, value) in fields {
            ensure(value.is_finite(), ErrorKind::InvalidArgument, || {
                format!("operating point {name} must be finite, got {value}")
            })?;
        }
        ensure(self.inflow_speed >= 0.0, ErrorKind::OutOfRange, || {
            format!("inflow speed must be >= 0, got {}", self.inflow_speed)
        })?;
        ensure(self.rotor_speed >= 0.0, ErrorKind::OutOfRange, || {
            format!("rotor speed must be >= 0, got {}", self.rotor_speed)
        })?;
        ensure(self.air_density > 0.0, ErrorKind::OutOfRange, || {
            format!("air density must be > 0, got {}", self.air_density)
        })?;
        ensure(self.viscosity > 0.0, ErrorKind::OutOfRange, || {
            format!("viscosity must be > 0, got {}", self.viscosity)
        })?;
        ensure(self.speed_of_sound > 0.0, ErrorKind::OutOfRange, || {
            format!("speed of sound must be > 0, got {}", self.speed_of_sound)
        })?;
        Ok(())
    }

    /// λ = ΩR / V. Infinite for zero inflow with a spinning rotor.
    pub fn tip_speed_ratio(&self, tip_radius: f64) -> f64 {
        if self.inflow_speed > 0.0 {
            self.rotor_speed * tip_radius / self.inflow_speed
        } else if self.rotor_speed > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

/// Rotor-level output tracked by the streaming statistics and the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Thrust,
    Torque,
    Power,
    ThrustCoefficient,
    PowerCoefficient,
    TorqueCoefficient,
    TipSpeedRatio,
    /// Propulsive efficiency TV/P for propellers, CP relative to the Betz limit for turbines.
    Efficiency,
    /// T / (ρA(ΩR)²)
    TipThrustCoefficient,
    /// P / (ρA(ΩR)³)
    TipPowerCoefficient,
    /// Ideal induced power over shaft power, T^1.5 / √(2ρA) / P. Propellers only.
    FigureOfMerit,
    /// T / A (N/m²)
    DiskLoading,
}

impl Quantity {
    pub const ALL: [Quantity; 12] = [
        Quantity::Thrust,
        Quantity::Torque,
        Quantity::Power,
        Quantity::ThrustCoefficient,
        Quantity::PowerCoefficient,
        Quantity::TorqueCoefficient,
        Quantity::TipSpeedRatio,
        Quantity::Efficiency,
        Quantity::TipThrustCoefficient,
        Quantity::TipPowerCoefficient,
        Quantity::FigureOfMerit,
        Quantity::DiskLoading,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Quantity::Thrust => "thrust",
            Quantity::Torque => "torque",
            Quantity::Power => "power",
            Quantity::ThrustCoefficient => "thrust_coefficient",
            Quantity::PowerCoefficient => "power_coefficient",
            Quantity::TorqueCoefficient => "torque_coefficient",
            Quantity::TipSpeedRatio => "tip_speed_ratio",
            Quantity::Efficiency => "efficiency",
            Quantity::TipThrustCoefficient => "tip_thrust_coefficient",
            Quantity::TipPowerCoefficient => "tip_power_coefficient",
            Quantity::FigureOfMerit => "figure_of_merit",
            Quantity::DiskLoading => "disk_loading",
        }
    }
}

/// Input that the uncertainty model may perturb.
///
/// The first five map onto [`OperatingPoint`] fields. The rest perturb the blade:
/// chord and polar scales are multiplicative around 1, twist offset is additive around 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertainInput {
    InflowSpeed,
    RotorSpeed,
    AirDensity,
    Viscosity,
    Pitch,
    ChordScale,
    TwistOffset,
    LiftScale,
    DragScale,
}

impl UncertainInput {
    /// Unperturbed value of this input for a given base operating point.
    pub fn nominal(self, base: &OperatingPoint) -> f64 {
        match self {
            UncertainInput::InflowSpeed => base.inflow_speed,
            UncertainInput::RotorSpeed => base.rotor_speed,
            UncertainInput::AirDensity => base.air_density,
            UncertainInput::Viscosity => base.viscosity,
            UncertainInput::Pitch => base.pitch,
            UncertainInput::ChordScale | UncertainInput::LiftScale | UncertainInput::DragScale => {
                1.0
            }
            UncertainInput::TwistOffset => 0.0,
        }
    }

    /// Physical lower limit a sampled value is clamped to.
    pub fn physical_floor(self) -> f64 {
        match self {
            UncertainInput::InflowSpeed | UncertainInput::RotorSpeed => 0.0,
            UncertainInput::AirDensity
            | UncertainInput::Viscosity
            | UncertainInput::ChordScale
            | UncertainInput::LiftScale
            | UncertainInput::DragScale => f64::MIN_POSITIVE,
            UncertainInput::Pitch | UncertainInput::TwistOffset => f64::NEG_INFINITY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UncertainInput::InflowSpeed => "inflow_speed",
            UncertainInput::RotorSpeed => "rotor_speed",
            UncertainInput::AirDensity => "air_density",
            UncertainInput::Viscosity => "viscosity",
            UncertainInput::Pitch => "pitch",
            UncertainInput::ChordScale => "chord_scale",
            UncertainInput::TwistOffset => "twist_offset",
            UncertainInput::LiftScale => "lift_scale",
            UncertainInput::DragScale => "drag_scale",
        }
    }
}
