//! Player health integration

use serde::{Deserialize, Serialize};

use crate::consts::{DAMAGE_RATE, RECOVERY_RATE};

/// Drains health while a hand is in a hazard, refills it otherwise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthModel {
    /// Health lost per second of exposure
    pub damage_rate: f32,
    /// Health regained per second of safety
    pub recovery_rate: f32,
}

impl Default for HealthModel {
    fn default() -> Self {
        Self {
            damage_rate: DAMAGE_RATE,
            recovery_rate: RECOVERY_RATE,
        }
    }
}

impl HealthModel {
    /// Health after `dt` seconds. `invulnerable` turns damage into recovery.
    /// The result is always in [0, 1].
    pub fn step(&self, health: f32, hurt: bool, invulnerable: bool, dt: f32) -> f32 {
        let delta = if hurt && !invulnerable {
            -self.damage_rate * dt
        } else {
            self.recovery_rate * dt
        };
        let next = health + delta;
        if next.is_nan() { health.clamp(0.0, 1.0) } else { next.clamp(0.0, 1.0) }
    }

    /// Seconds of continuous exposure to drain full health
    pub fn time_to_deplete(&self) -> f32 {
        1.0 / self.damage_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_and_recovery_rates() {
        let model = HealthModel::default();
        assert!((model.step(1.0, true, false, 0.25) - 0.75).abs() < 1e-6);
        assert!((model.step(0.5, false, false, 0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_clamped() {
        let model = HealthModel::default();
        assert_eq!(model.step(0.1, true, false, 5.0), 0.0);
        assert_eq!(model.step(0.9, false, false, 5.0), 1.0);
    }

    #[test]
    fn test_invulnerable_never_damages() {
        let model = HealthModel::default();
        let mut health = 0.5;
        for _ in 0..120 {
            health = model.step(health, true, true, 1.0 / 60.0);
        }
        assert_eq!(health, 1.0);
    }

    #[test]
    fn test_full_drain_takes_one_over_rate() {
        let model = HealthModel::default();
        let mut health = 1.0;
        let steps = (model.time_to_deplete() * 60.0).round() as usize;
        for _ in 0..steps {
            health = model.step(health, true, false, 1.0 / 60.0);
        }
        assert!(health < 1e-4);
        health = model.step(health, true, false, 1.0 / 60.0);
        assert_eq!(health, 0.0);
    }
}
