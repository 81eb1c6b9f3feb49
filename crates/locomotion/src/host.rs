use glam::Vec3;
use westward_common::CameraBasis;

/// Collision-aware body movement supplied by the physics host.
pub trait MotionPrimitive {
    /// Move by `displacement`, resolving collisions. Returns whether the body
    /// ends the move in contact with a supporting surface.
    fn move_by(&mut self, displacement: Vec3) -> bool;

    /// Ground contact as of the last move.
    fn is_grounded(&self) -> bool;
}

/// Orientation of the active viewpoint, supplied by the rendering host.
pub trait CameraBasisSource {
    /// Current forward/right unit vectors, or `None` when no viewpoint is available.
    fn camera_basis(&self) -> Option<CameraBasis>;
}

impl CameraBasisSource for CameraBasis {
    fn camera_basis(&self) -> Option<CameraBasis> {
        Some(*self)
    }
}

impl CameraBasisSource for Option<CameraBasis> {
    fn camera_basis(&self) -> Option<CameraBasis> {
        *self
    }
}

/// A host without any viewpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

impl CameraBasisSource for NoCamera {
    fn camera_basis(&self) -> Option<CameraBasis> {
        None
    }
}
