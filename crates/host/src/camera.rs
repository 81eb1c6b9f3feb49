use glam::{Mat4, Quat, Vec3};
use westward_common::CameraBasis;
use westward_locomotion::CameraBasisSource;

/// Viewpoint mounted on an actor's camera-follow pivot.
/// Orientation comes from the controller each frame; the camera never turns itself.
///
/// Left-handed with +Y up: identity looks along +Z with +X on screen-right,
/// so the matrices use the `_lh` constructors.
#[derive(Debug, Clone)]
pub struct HeadCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for HeadCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 0.0),
            rotation: Quat::IDENTITY,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl HeadCamera {
    pub fn sync(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }

    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::Z).normalize()
    }

    pub fn right(&self) -> Vec3 {
        (self.rotation * Vec3::X).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl CameraBasisSource for HeadCamera {
    fn camera_basis(&self) -> Option<CameraBasis> {
        Some(CameraBasis::from_rotation(self.rotation))
    }
}
