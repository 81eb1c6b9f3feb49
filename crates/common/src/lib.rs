//! Shared types for the westward gameplay runtime.
//!
//! # Invariants
//! - Types here carry no behaviour that depends on the input or locomotion layers.
//! - `InstanceSlot` keeps the first installed instance authoritative.

pub mod slot;
pub mod types;

pub use slot::{DuplicateInstanceWarning, InstanceSlot, Shared};
pub use types::{CameraBasis, EntityId, Transform};
