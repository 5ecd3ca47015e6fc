// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Station Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::f64::consts::PI;

use rotor_types::config::RotorConfig;
use rotor_types::constants::MAX_BLADES;
use rotor_types::error::{ensure, ErrorKind, RotorResult};
use rotor_types::state::Station;

/// Spanwise discretisation of one blade, shared read-only by every trial.
#[derive(Debug, Clone)]
pub struct StationGrid {
    blades: usize,
    hub_radius: f64,
    tip_radius: f64,
    stations: Vec<Station>,
    radii: Vec<f64>,
}

impl StationGrid {
    /// Build and validate a grid.
    ///
    /// Non-increasing radii are an invariant violation; other malformed geometry
    /// is an invalid argument or out-of-range value.
    pub fn new(
        blades: usize,
        hub_radius: f64,
        tip_radius: f64,
        stations: Vec<Station>,
    ) -> RotorResult<Self> {
        ensure(
            (1..=MAX_BLADES).contains(&blades),
            ErrorKind::InvalidArgument,
            || format!("blade count must lie in 1..={MAX_BLADES}, got {blades}"),
        )?;
        ensure(
            hub_radius.is_finite() && hub_radius >= 0.0,
            ErrorKind::InvalidArgument,
            || format!("hub radius must be finite and >= 0, got {hub_radius}"),
        )?;
        ensure(
            tip_radius.is_finite() && tip_radius > hub_radius,
            ErrorKind::InvalidArgument,
            || format!("tip radius {tip_radius} must exceed hub radius {hub_radius}"),
        )?;
        ensure(stations.len() >= 2, ErrorKind::InvalidArgument, || {
            format!("a blade needs at least 2 stations, got {}", stations.len())
        })?;

        for (i, s) in stations.iter().enumerate() {
            ensure(
                s.radius.is_finite() && s.chord.is_finite() && s.twist.is_finite(),
                ErrorKind::InvalidArgument,
                || format!("station {i} has non-finite geometry"),
            )?;
            ensure(s.chord > 0.0, ErrorKind::InvalidArgument, || {
                format!("station {i} chord must be > 0, got {}", s.chord)
            })?;
            if i > 0 {
                let prev = stations[i - 1].radius;
                ensure(s.radius > prev, ErrorKind::InvariantViolation, || {
                    format!(
                        "station radii must be strictly increasing: r[{}]={} follows r[{}]={}",
                        i,
                        s.radius,
                        i - 1,
                        prev
                    )
                })?;
            }
            ensure(
                s.radius > hub_radius && s.radius < tip_radius,
                ErrorKind::OutOfRange,
                || {
                    format!(
                        "station {i} radius {} outside ({hub_radius}, {tip_radius})",
                        s.radius
                    )
                },
            )?;
        }

        let radii = stations.iter().map(|s| s.radius).collect();
        Ok(StationGrid {
            blades,
            hub_radius,
            tip_radius,
            stations,
            radii,
        })
    }

    pub fn from_config(config: &RotorConfig) -> RotorResult<Self> {
        Self::new(
            config.blades,
            config.hub_radius,
            config.tip_radius,
            config.stations.clone(),
        )
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn blades(&self) -> usize {
        self.blades
    }

    pub fn hub_radius(&self) -> f64 {
        self.hub_radius
    }

    pub fn tip_radius(&self) -> f64 {
        self.tip_radius
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Swept disk area πR².
    pub fn disk_area(&self) -> f64 {
        PI * self.tip_radius * self.tip_radius
    }

    /// Local solidity σ = Bc / (2πr) for a given chord at station `i`.
    pub fn solidity(&self, i: usize, chord: f64) -> f64 {
        self.blades as f64 * chord / (2.0 * PI * self.radii[i])
    }
}
