//! Reference host: the physics and viewpoint primitives a locomotion controller drives.
//!
//! # Invariants
//! - The body never sinks below the ground plane.
//! - Ground contact reflects only the most recent move.
//! - The camera basis always derives from the last synced view rotation.

mod body;
mod camera;

pub use body::{GroundPlane, KinematicBody};
pub use camera::HeadCamera;

pub fn crate_info() -> &'static str {
    "westward-host v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("host"));
    }
}
