//! Runtime: wires the input dispatcher, a locomotion controller and the reference host
//! into a frame loop.
//!
//! # Invariants
//! - Exactly one dispatcher per process, held in an `InstanceSlot`.
//! - Each frame polls input before ticking locomotion.
//! - Frame deltas never exceed `max_frame_dt`.

mod config;
mod script;
mod session;

pub use config::{ConfigError, RuntimeConfig};
pub use script::{InputScript, ScriptFrame};
pub use session::{Session, SessionError};

pub fn crate_info() -> &'static str {
    "westward-runtime v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("runtime"));
    }
}
