// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Rotor Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Whole-rotor evaluation: one operating point through every station, then integration.

use rotor_types::config::{SolverConfig, StudyConfig};
use rotor_types::error::{ensure, ErrorKind, RotorResult};
use rotor_types::state::{OperatingPoint, RotorMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{integrate, TrialResult};
use crate::airfoil::AirfoilLibrary;
use crate::grid::StationGrid;
use crate::losses::LossContext;
use crate::section::{SectionInput, SectionSolver};

/// Per-trial blade and polar perturbation. The default leaves the rotor untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BladePerturbation {
    /// Multiplies every chord.
    pub chord_scale: f64,
    /// Added to every twist (rad).
    pub twist_offset: f64,
    pub lift_scale: f64,
    pub drag_scale: f64,
}

impl Default for BladePerturbation {
    fn default() -> Self {
        BladePerturbation {
            chord_scale: 1.0,
            twist_offset: 0.0,
            lift_scale: 1.0,
            drag_scale: 1.0,
        }
    }
}

impl BladePerturbation {
    pub fn validate(&self) -> RotorResult<()> {
        ensure(
            self.chord_scale.is_finite() && self.chord_scale > 0.0,
            ErrorKind::OutOfRange,
            || format!("chord scale must be finite and > 0, got {}", self.chord_scale),
        )?;
        ensure(self.twist_offset.is_finite(), ErrorKind::InvalidArgument, || {
            format!("twist offset must be finite, got {}", self.twist_offset)
        })?;
        ensure(self.lift_scale.is_finite(), ErrorKind::InvalidArgument, || {
            format!("lift scale must be finite, got {}", self.lift_scale)
        })?;
        ensure(
            self.drag_scale.is_finite() && self.drag_scale >= 0.0,
            ErrorKind::OutOfRange,
            || format!("drag scale must be finite and >= 0, got {}", self.drag_scale),
        )
    }
}

/// Immutable rotor description shared by every trial of a study.
#[derive(Debug, Clone)]
pub struct RotorModel {
    mode: RotorMode,
    grid: StationGrid,
    airfoils: AirfoilLibrary,
    /// Library index of each station's airfoil, resolved once at construction.
    station_airfoils: Vec<usize>,
    solver: SectionSolver,
}

impl RotorModel {
    pub fn new(
        mode: RotorMode,
        grid: StationGrid,
        airfoils: AirfoilLibrary,
        solver: SolverConfig,
    ) -> RotorResult<Self> {
        let station_airfoils = grid
            .stations()
            .iter()
            .map(|s| airfoils.index_of(&s.airfoil))
            .collect::<RotorResult<Vec<_>>>()?;
        Ok(RotorModel {
            mode,
            grid,
            airfoils,
            station_airfoils,
            solver: SectionSolver::new(solver)?,
        })
    }

    pub fn from_study(study: &StudyConfig) -> RotorResult<Self> {
        let grid = StationGrid::from_config(&study.rotor)?;
        let airfoils = AirfoilLibrary::from_configs(&study.airfoils)?;
        Self::new(study.rotor.mode, grid, airfoils, study.solver.clone())
    }

    pub fn mode(&self) -> RotorMode {
        self.mode
    }

    pub fn grid(&self) -> &StationGrid {
        &self.grid
    }

    pub fn airfoils(&self) -> &AirfoilLibrary {
        &self.airfoils
    }

    pub fn solver_config(&self) -> &SolverConfig {
        self.solver.config()
    }

    /// Solve every station at `op` with the blade perturbed by `perturbation`.
    ///
    /// Malformed inputs are errors. Solver trouble (non-convergence, divergence,
    /// integrity faults) is reported in the returned trial, which is then invalid.
    pub fn evaluate(
        &self,
        op: &OperatingPoint,
        perturbation: &BladePerturbation,
    ) -> RotorResult<TrialResult> {
        op.validate()?;
        perturbation.validate()?;

        let config = self.solver.config();
        let losses = LossContext {
            model: config.loss_model,
            include_hub: config.hub_loss,
            blades: self.grid.blades(),
            hub_radius: self.grid.hub_radius(),
            tip_radius: self.grid.tip_radius(),
            tip_speed_ratio: op.tip_speed_ratio(self.grid.tip_radius()),
        };

        let states: Vec<_> = self
            .grid
            .stations()
            .iter()
            .zip(&self.station_airfoils)
            .enumerate()
            .map(|(i, (station, &airfoil_id))| {
                let chord = station.chord * perturbation.chord_scale;
                let input = SectionInput {
                    mode: self.mode,
                    radius: station.radius,
                    chord,
                    solidity: self.grid.solidity(i, chord),
                    theta: station.twist + perturbation.twist_offset + op.pitch,
                    blades: self.grid.blades(),
                    airfoil: self.airfoils.get(airfoil_id),
                    lift_scale: perturbation.lift_scale,
                    drag_scale: perturbation.drag_scale,
                    losses,
                };
                let state = self.solver.solve(&input, op);
                if !state.status.is_converged() {
                    debug!(
                        station = i,
                        radius = station.radius,
                        status = ?state.status,
                        iterations = state.iterations,
                        "station did not converge"
                    );
                }
                if let Some(violation) = state.envelope {
                    debug!(
                        station = i,
                        ?violation,
                        mach = state.mach,
                        reynolds = state.reynolds,
                        "station outside flow envelope"
                    );
                }
                state
            })
            .collect();

        Ok(integrate(&self.grid, self.mode, op, states, config))
    }

    /// Evaluate the unperturbed blade.
    pub fn evaluate_nominal(&self, op: &OperatingPoint) -> RotorResult<TrialResult> {
        self.evaluate(op, &BladePerturbation::default())
    }
}
