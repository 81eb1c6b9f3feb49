//! Locomotion: integrates buffered gameplay input into body motion and camera orientation.
//!
//! # Invariants
//! - Pitch stays within `[min_pitch, max_pitch]` after every tick.
//! - The look buffer is zero at the end of every tick.
//! - Position and ground contact belong to the host; the controller only submits displacements.
//! - Subscriptions are released before the controller is gone.

mod controller;
mod host;
mod settings;

pub use controller::{
    CameraFollow, ControllerState, DegradedBindingWarning, LocomotionController, LocomotionError, TickReport,
};
pub use host::{CameraBasisSource, MotionPrimitive, NoCamera};
pub use settings::LocomotionSettings;

pub fn crate_info() -> &'static str {
    "westward-locomotion v0.1.0"
}
