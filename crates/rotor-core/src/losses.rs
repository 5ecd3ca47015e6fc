// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Loss Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Prandtl tip and hub loss factors.
//!
//! All factors lie in (0, 1]; 1 means no loss.

use std::f64::consts::FRAC_PI_2;

use rotor_types::config::LossModel;
use rotor_types::constants::{LOSS_FACTOR_FLOOR, SINGULAR_EPS};

/// F = (2/π)·acos(exp(−f)). Unbounded or undefined exponents mean no loss.
pub fn prandtl_factor(f: f64) -> f64 {
    if f.is_nan() || f == f64::INFINITY {
        return 1.0;
    }
    if f <= 0.0 {
        return 0.0;
    }
    let e = (-f).exp();
    if e == 0.0 {
        return 1.0;
    }
    (e.clamp(0.0, 1.0).acos() / FRAC_PI_2).clamp(0.0, 1.0)
}

/// Tip loss from the local inflow angle: f = (B/2)(R − r) / (r|sin φ|).
pub fn tip_loss(blades: usize, tip_radius: f64, radius: f64, phi: f64) -> f64 {
    let s = phi.sin().abs();
    if s < SINGULAR_EPS || radius <= 0.0 {
        return 1.0;
    }
    let f = 0.5 * blades as f64 * (tip_radius - radius) / (radius * s);
    prandtl_factor(f)
}

/// Hub loss from the local inflow angle: f = (B/2)(r − R_hub) / (r|sin φ|).
/// A zero hub radius disables it.
pub fn hub_loss(blades: usize, hub_radius: f64, radius: f64, phi: f64) -> f64 {
    let s = phi.sin().abs();
    if hub_radius <= 0.0 || s < SINGULAR_EPS || radius <= 0.0 {
        return 1.0;
    }
    let f = 0.5 * blades as f64 * (radius - hub_radius) / (radius * s);
    prandtl_factor(f)
}

/// Tip loss expressed through tip-speed ratio λ and radial fraction μ = r/R.
///
/// Uses the undisturbed inflow angle, sin φ = 1/√(1 + (λμ)²), so
/// f = (B/2)(1 − μ)/μ · √(1 + (λμ)²). Exactly 1 at the root (μ = 0),
/// strictly decreasing in μ, floored at the tip (μ = 1).
pub fn tip_loss_at_speed_ratio(tip_speed_ratio: f64, mu: f64, blades: usize) -> f64 {
    if mu <= 0.0 || mu.is_nan() {
        return 1.0;
    }
    let mu = mu.min(1.0);
    let local = tip_speed_ratio.max(0.0) * mu;
    let f = 0.5 * blades as f64 * (1.0 - mu) / mu * (1.0 + local * local).sqrt();
    prandtl_factor(f).max(LOSS_FACTOR_FLOOR)
}

/// Everything the loss model may need at one station.
#[derive(Debug, Clone, Copy)]
pub struct LossContext {
    pub model: LossModel,
    pub include_hub: bool,
    pub blades: usize,
    pub hub_radius: f64,
    pub tip_radius: f64,
    pub tip_speed_ratio: f64,
}

impl LossContext {
    /// Combined tip × hub factor at `radius` for inflow angle `phi`, floored.
    pub fn factor(&self, radius: f64, phi: f64) -> f64 {
        let tip = match self.model {
            LossModel::None => return 1.0,
            LossModel::Prandtl => tip_loss(self.blades, self.tip_radius, radius, phi),
            LossModel::SpeedRatio => tip_loss_at_speed_ratio(
                self.tip_speed_ratio,
                radius / self.tip_radius,
                self.blades,
            ),
        };
        let hub = if self.include_hub {
            hub_loss(self.blades, self.hub_radius, radius, phi)
        } else {
            1.0
        };
        (tip * hub).max(LOSS_FACTOR_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prandtl_limits() {
        assert_eq!(prandtl_factor(f64::INFINITY), 1.0);
        assert_eq!(prandtl_factor(0.0), 0.0);
        assert_eq!(prandtl_factor(f64::NAN), 1.0);
        assert_eq!(prandtl_factor(1000.0), 1.0);
        // f = ln 2 → acos(1/2) = π/3 → F = 2/3
        assert!((prandtl_factor(2f64.ln()) - 2.0 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn test_tip_loss_decreases_towards_tip() {
        let phi = 0.15;
        let inboard = tip_loss(3, 5.0, 2.0, phi);
        let outboard = tip_loss(3, 5.0, 4.8, phi);
        assert!(inboard > outboard);
        assert!(outboard > 0.0 && inboard <= 1.0);
    }

    #[test]
    fn test_hub_loss_disabled_without_hub() {
        assert_eq!(hub_loss(3, 0.0, 0.2, 0.3), 1.0);
        assert!(hub_loss(3, 0.5, 0.55, 0.3) < hub_loss(3, 0.5, 1.5, 0.3));
    }

    #[test]
    fn test_speed_ratio_form_root_and_tip() {
        assert_eq!(tip_loss_at_speed_ratio(7.0, 0.0, 3), 1.0);
        assert_eq!(tip_loss_at_speed_ratio(7.0, 1.0, 3), LOSS_FACTOR_FLOOR);
        let mid = tip_loss_at_speed_ratio(7.0, 0.5, 3);
        assert!(mid > 0.99 && mid < 1.0, "F(0.5)={mid}");
        let near_tip = tip_loss_at_speed_ratio(7.0, 0.98, 3);
        assert!(near_tip < 0.6, "F(0.98)={near_tip}");
    }

    #[test]
    fn test_speed_ratio_form_matches_angle_form_for_ideal_inflow() {
        let (lambda, blades, tip): (f64, _, f64) = (6.0, 3, 5.0);
        let r = 4.0;
        let mu = r / tip;
        let phi = (1.0 / (lambda * mu)).atan();
        let by_angle = tip_loss(blades, tip, r, phi);
        let by_ratio = tip_loss_at_speed_ratio(lambda, mu, blades);
        assert!((by_angle - by_ratio).abs() < 1e-12);
    }

    #[test]
    fn test_combined_factor_is_floored() {
        let ctx = LossContext {
            model: LossModel::Prandtl,
            include_hub: true,
            blades: 3,
            hub_radius: 0.5,
            tip_radius: 5.0,
            tip_speed_ratio: 7.0,
        };
        assert_eq!(ctx.factor(5.0, 0.2), LOSS_FACTOR_FLOOR);
        let none = LossContext {
            model: LossModel::None,
            ..ctx
        };
        assert_eq!(none.factor(4.9, 0.2), 1.0);
    }
}
