use serde::{Deserialize, Serialize};

use crate::controller::LocomotionError;

/// Tunables for one controlled actor. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionSettings {
    /// Horizontal speed in units per second.
    pub move_speed: f32,
    /// Apex height of a jump from rest, in units.
    pub jump_height: f32,
    /// Vertical acceleration; must be negative.
    pub gravity: f32,
    /// Degrees of rotation per unit of look input.
    pub rotation_power: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Vertical velocity held while resting on the ground.
    pub grounded_velocity: f32,
    /// Squared move magnitude below which move input is ignored.
    pub move_dead_zone: f32,
    /// Squared look magnitude below which look input is ignored.
    pub look_dead_zone: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_height: 2.0,
            gravity: -9.81,
            rotation_power: 0.2,
            min_pitch: -40.0,
            max_pitch: 40.0,
            grounded_velocity: -2.0,
            move_dead_zone: 0.01,
            look_dead_zone: 0.0001,
        }
    }
}

impl LocomotionSettings {
    pub fn validate(&self) -> Result<(), LocomotionError> {
        let invalid = |reason: &str| Err(LocomotionError::InvalidSettings(reason.to_string()));
        let fields = [
            self.move_speed,
            self.jump_height,
            self.gravity,
            self.rotation_power,
            self.min_pitch,
            self.max_pitch,
            self.grounded_velocity,
            self.move_dead_zone,
            self.look_dead_zone,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return invalid("all values must be finite");
        }
        if self.gravity >= 0.0 {
            return invalid("gravity must be negative");
        }
        if self.min_pitch > self.max_pitch {
            return invalid("min_pitch exceeds max_pitch");
        }
        if self.jump_height < 0.0 || self.move_speed < 0.0 {
            return invalid("jump_height and move_speed must not be negative");
        }
        if self.grounded_velocity > 0.0 {
            return invalid("grounded_velocity must not be positive");
        }
        if self.move_dead_zone < 0.0 || self.look_dead_zone < 0.0 {
            return invalid("dead zones must not be negative");
        }
        Ok(())
    }

    /// Launch speed that reaches `jump_height` under constant `gravity`.
    pub fn jump_velocity(&self) -> f32 {
        (self.jump_height * -2.0 * self.gravity).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        LocomotionSettings::default().validate().unwrap();
    }

    #[test]
    fn jump_velocity_reaches_height() {
        let s = LocomotionSettings::default();
        assert!((s.jump_velocity() - 6.264).abs() < 1e-3);
        let zero = LocomotionSettings {
            jump_height: 0.0,
            ..s
        };
        assert_eq!(zero.jump_velocity(), 0.0);
    }

    #[test]
    fn rejects_bad_values() {
        let base = LocomotionSettings::default();
        for bad in [
            LocomotionSettings { gravity: 9.81, ..base },
            LocomotionSettings { min_pitch: 50.0, ..base },
            LocomotionSettings { move_speed: f32::NAN, ..base },
            LocomotionSettings { jump_height: -1.0, ..base },
            LocomotionSettings { grounded_velocity: 1.0, ..base },
        ] {
            assert!(matches!(bad.validate(), Err(LocomotionError::InvalidSettings(_))));
        }
    }
}
