use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an actor or other runtime entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local +Z expressed in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local +X expressed in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

/// Forward/right unit vectors of the active viewpoint.
///
/// Left-handed: world up is +Y and an identity viewpoint faces +Z with +X to
/// its right, so a positive turn about +Y swings forward toward right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl CameraBasis {
    pub fn new(forward: Vec3, right: Vec3) -> Self {
        Self { forward, right }
    }

    /// Basis of a viewpoint with the given world orientation.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            forward: rotation * Vec3::Z,
            right: rotation * Vec3::X,
        }
    }

    /// Forward and right flattened onto the XZ plane and renormalized.
    ///
    /// A vector that is vertical (or zero) flattens to zero.
    pub fn horizontal(&self) -> (Vec3, Vec3) {
        let flatten = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        (flatten(self.forward), flatten(self.right))
    }
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self::from_rotation(Quat::IDENTITY)
    }
}
