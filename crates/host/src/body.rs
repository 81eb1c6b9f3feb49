use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use westward_common::Transform;
use westward_locomotion::MotionPrimitive;

/// Infinite horizontal floor at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub height: f32,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self { height: 0.0 }
    }
}

/// Kinematic character body. Moves are resolved against a single ground plane.
#[derive(Debug, Clone)]
pub struct KinematicBody {
    transform: Transform,
    ground: GroundPlane,
    grounded: bool,
    moves: u64,
}

impl KinematicBody {
    pub fn new(position: Vec3, ground: GroundPlane) -> Self {
        let mut body = Self {
            transform: Transform::from_position(position),
            ground,
            grounded: false,
            moves: 0,
        };
        body.transform.position.y = body.transform.position.y.max(ground.height);
        body
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// Place the body without collision. Clears ground contact.
    pub fn teleport(&mut self, position: Vec3) {
        self.transform.position = Vec3::new(position.x, position.y.max(self.ground.height), position.z);
        self.grounded = false;
        tracing::debug!(?position, "body teleported");
    }

    pub fn ground(&self) -> GroundPlane {
        self.ground
    }

    /// Number of moves resolved so far.
    pub fn move_count(&self) -> u64 {
        self.moves
    }
}

impl MotionPrimitive for KinematicBody {
    fn move_by(&mut self, displacement: Vec3) -> bool {
        self.moves += 1;
        let mut target = self.transform.position + displacement;
        let mut hit_floor = false;
        if target.y <= self.ground.height {
            hit_floor = target.y < self.ground.height || displacement.y < 0.0;
            target.y = self.ground.height;
        }
        self.transform.position = target;
        self.grounded = hit_floor && displacement.y <= 0.0;
        self.grounded
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_below_ground_is_lifted() {
        let body = KinematicBody::new(Vec3::new(0.0, -5.0, 0.0), GroundPlane::default());
        assert_eq!(body.position().y, 0.0);
    }

    #[test]
    fn falling_lands_on_plane() {
        let mut body = KinematicBody::new(Vec3::new(0.0, 0.5, 0.0), GroundPlane::default());
        assert!(!body.move_by(Vec3::new(0.0, -0.2, 0.0)));
        assert!((body.position().y - 0.3).abs() < 1e-6);
        assert!(body.move_by(Vec3::new(0.0, -1.0, 0.0)));
        assert_eq!(body.position().y, 0.0);
        assert!(body.is_grounded());
    }

    #[test]
    fn horizontal_move_reports_no_contact() {
        let mut body = KinematicBody::new(Vec3::ZERO, GroundPlane::default());
        body.move_by(Vec3::new(0.0, -0.1, 0.0));
        assert!(body.is_grounded());
        assert!(!body.move_by(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(body.position(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn upward_move_leaves_ground() {
        let mut body = KinematicBody::new(Vec3::ZERO, GroundPlane { height: 0.0 });
        assert!(!body.move_by(Vec3::new(0.0, 0.1, 0.0)));
        assert!((body.position().y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn teleport_clears_contact() {
        let mut body = KinematicBody::new(Vec3::ZERO, GroundPlane::default());
        body.move_by(Vec3::NEG_Y);
        body.teleport(Vec3::new(3.0, 2.0, 1.0));
        assert!(!body.is_grounded());
        assert_eq!(body.move_count(), 1);
    }
}
