//! Input dispatch: raw device readings resolved into semantic gameplay actions.
//!
//! # Invariants
//! - The dispatcher is the only reader of device hardware.
//! - Every raw reading carries its device family from the point of capture.
//! - Delivery is synchronous within `poll`, in registration order per action.
//! - Subscriptions are scoped handles; dropping one unsubscribes it.

pub mod action;
pub mod binding;
#[cfg(feature = "winit")]
pub mod capture;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod subscription;
pub mod value;

pub use action::{InputEvent, StandardAction, subscribe_gameplay_events};
pub use binding::{ActionBinding, ActionMap, AxisComponent, BindingSet, Composite, Source, SourcePath, ValueShape};
pub use device::{DeviceFamily, DeviceQueue, DeviceSource, RawInput, RawValue, coalesce_relative};
pub use dispatcher::{DispatcherConfig, DispatcherState, InputDispatcher, PollStats};
pub use error::{BindingLoadError, ConfigurationError, ResolveError, UnknownActionError};
pub use subscription::{DeliveryMode, Subscription, SubscriptionId};
pub use value::ActionValue;

pub fn crate_info() -> &'static str {
    "westward-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
