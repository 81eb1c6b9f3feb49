use glam::Vec2;
use std::rc::Rc;

use crate::binding::ValueShape;
use crate::dispatcher::InputDispatcher;
use crate::error::UnknownActionError;
use crate::subscription::{DeliveryMode, Subscription};
use crate::value::ActionValue;

/// The gameplay action vocabulary every binding set is expected to follow.
///
/// Maps may leave the optional ones out, but a declared standard action must
/// keep the shape listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardAction {
    Move,
    Look,
    Zoom,
    Jump,
    Sprint,
    Interact,
    Fire,
    Aim,
    Reload,
    Crouch,
    Inventory,
    HolsterWeapon,
}

impl StandardAction {
    pub const ALL: [StandardAction; 12] = [
        Self::Move,
        Self::Look,
        Self::Zoom,
        Self::Jump,
        Self::Sprint,
        Self::Interact,
        Self::Fire,
        Self::Aim,
        Self::Reload,
        Self::Crouch,
        Self::Inventory,
        Self::HolsterWeapon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Move => "Move",
            Self::Look => "Look",
            Self::Zoom => "Zoom",
            Self::Jump => "Jump",
            Self::Sprint => "Sprint",
            Self::Interact => "Interact",
            Self::Fire => "Fire",
            Self::Aim => "Aim",
            Self::Reload => "Reload",
            Self::Crouch => "Crouch",
            Self::Inventory => "Inventory",
            Self::HolsterWeapon => "HolsterWeapon",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Move | Self::Look => ValueShape::Vector2,
            Self::Zoom => ValueShape::Scalar,
            _ => ValueShape::Button,
        }
    }

    /// Continuous actions report every change; buttons report press edges.
    pub fn natural_mode(&self) -> DeliveryMode {
        match self.shape() {
            ValueShape::Button => DeliveryMode::OnEdge,
            ValueShape::Vector2 | ValueShape::Scalar => DeliveryMode::OnChange,
        }
    }

    /// Required by every gameplay map.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Move | Self::Look | Self::Jump)
    }
}

/// A gameplay event any collaborator can consume.
///
/// Gameplay code reacts to these, never to raw device readings, so the same
/// logic serves keyboard, pointer and gamepad players.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Movement intent; zero on release.
    OnMove(Vec2),
    /// Look delta for this poll.
    OnLook(Vec2),
    OnZoom(f32),
    OnJump,
    OnSprint,
    OnInteract,
    OnFire,
    OnAim,
    OnReload,
    OnCrouch,
    OnInventory,
    OnHolsterWeapon,
}

impl InputEvent {
    pub fn from_action(action: StandardAction, value: ActionValue) -> Self {
        match action {
            StandardAction::Move => Self::OnMove(value.as_vec2()),
            StandardAction::Look => Self::OnLook(value.as_vec2()),
            StandardAction::Zoom => Self::OnZoom(value.as_scalar()),
            StandardAction::Jump => Self::OnJump,
            StandardAction::Sprint => Self::OnSprint,
            StandardAction::Interact => Self::OnInteract,
            StandardAction::Fire => Self::OnFire,
            StandardAction::Aim => Self::OnAim,
            StandardAction::Reload => Self::OnReload,
            StandardAction::Crouch => Self::OnCrouch,
            StandardAction::Inventory => Self::OnInventory,
            StandardAction::HolsterWeapon => Self::OnHolsterWeapon,
        }
    }

    pub fn action(&self) -> StandardAction {
        match self {
            Self::OnMove(_) => StandardAction::Move,
            Self::OnLook(_) => StandardAction::Look,
            Self::OnZoom(_) => StandardAction::Zoom,
            Self::OnJump => StandardAction::Jump,
            Self::OnSprint => StandardAction::Sprint,
            Self::OnInteract => StandardAction::Interact,
            Self::OnFire => StandardAction::Fire,
            Self::OnAim => StandardAction::Aim,
            Self::OnReload => StandardAction::Reload,
            Self::OnCrouch => StandardAction::Crouch,
            Self::OnInventory => StandardAction::Inventory,
            Self::OnHolsterWeapon => StandardAction::HolsterWeapon,
        }
    }
}

/// Route every standard action, in its natural delivery mode, to one typed callback.
///
/// Actions the active map does not declare simply never fire.
pub fn subscribe_gameplay_events<F>(
    dispatcher: &InputDispatcher,
    callback: F,
) -> Result<Vec<Subscription>, UnknownActionError>
where
    F: Fn(InputEvent) + 'static,
{
    let callback = Rc::new(callback);
    StandardAction::ALL
        .into_iter()
        .map(|action| {
            let callback = callback.clone();
            dispatcher.subscribe(action.name(), action.natural_mode(), move |value| {
                callback(InputEvent::from_action(action, value))
            })
        })
        .collect()
}
