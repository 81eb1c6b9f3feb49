//! The input dispatcher: raw device readings in, semantic action events out.
//!
//! # Invariants
//! - Only the dispatcher reads its device source.
//! - Callbacks run synchronously inside the `poll` that resolved their value.
//! - Subscribers of one action are invoked in registration order.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::action::StandardAction;
use crate::binding::{ActionBinding, AxisComponent, BindingSet, Composite, Source, SourcePath, ValueShape};
use crate::device::{DeviceFamily, DeviceSource, RawInput, RawValue, coalesce_relative};
use crate::error::{ConfigurationError, ResolveError, UnknownActionError};
use crate::subscription::{DeliveryMode, Registry, Subscription, SubscriptionId};
use crate::value::ActionValue;

/// Which part of a binding set the dispatcher drives, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name of the action map activated from the binding set.
    pub action_map: String,
    /// Actions the map must declare for activation to succeed.
    pub required_actions: Vec<String>,
    /// Actuation at or above which an action counts as pressed.
    pub press_point: f32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            action_map: "Player".into(),
            required_actions: vec!["Move".into(), "Look".into(), "Jump".into()],
            press_point: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Never activated, or deactivated by the caller.
    Inactive,
    /// Resolving device input into action events.
    Active,
    /// Last activation failed; inert until a valid binding set is supplied.
    Disabled,
}

/// Counters for one `poll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub inputs: usize,
    /// Readings filtered out by device-family arbitration.
    pub dropped: usize,
    /// Resolutions that failed and were skipped.
    pub failed: usize,
    /// Callback invocations.
    pub deliveries: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct ActionTrack {
    last: Option<ActionValue>,
    pressed: bool,
}

struct ActiveBindings {
    set: Rc<BindingSet>,
    map: usize,
}

/// Translates raw device state into named action events.
///
/// Construct exactly one per process (see `westward_common::InstanceSlot`) and
/// hand it to consumers explicitly. The binding set is referenced, not owned.
pub struct InputDispatcher {
    config: DispatcherConfig,
    device: Box<dyn DeviceSource>,
    state: DispatcherState,
    active: Option<ActiveBindings>,
    /// Actions declared by the most recently activated map.
    catalog: BTreeMap<String, ValueShape>,
    controls: HashMap<(DeviceFamily, String), RawValue>,
    tracks: HashMap<String, ActionTrack>,
    registry: Rc<RefCell<Registry>>,
}

impl InputDispatcher {
    pub fn new(config: DispatcherConfig, device: impl DeviceSource + 'static) -> Self {
        Self {
            config,
            device: Box::new(device),
            state: DispatcherState::Inactive,
            active: None,
            catalog: BTreeMap::new(),
            controls: HashMap::new(),
            tracks: HashMap::new(),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == DispatcherState::Active
    }

    /// Name of the map currently producing events.
    pub fn active_map(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|a| a.set.maps[a.map].name.as_str())
    }

    /// Start producing events from `bindings`.
    ///
    /// A no-op when already active with an equal binding set. On failure the
    /// dispatcher is disabled and stays inert until a later activation succeeds.
    pub fn activate(&mut self, bindings: Option<Rc<BindingSet>>) -> Result<(), ConfigurationError> {
        let Some(set) = bindings else {
            return Err(self.disable(ConfigurationError::MissingBindingSet));
        };
        if let Some(active) = &self.active {
            if self.state == DispatcherState::Active
                && (Rc::ptr_eq(&active.set, &set) || *active.set == *set)
            {
                tracing::debug!("input dispatcher already active with this binding set");
                return Ok(());
            }
        }

        let Some(map_index) = set
            .maps
            .iter()
            .position(|m| m.name == self.config.action_map)
        else {
            let err = ConfigurationError::MissingActionMap(self.config.action_map.clone());
            return Err(self.disable(err));
        };
        if let Err(err) = set.maps[map_index].validate(&self.config.required_actions) {
            return Err(self.disable(err));
        }

        if self.state == DispatcherState::Active {
            self.release_held();
        }
        let map = &set.maps[map_index];
        self.catalog = map
            .actions
            .iter()
            .map(|a| (a.name.clone(), a.shape))
            .collect();
        tracing::info!(
            map = %map.name,
            actions = map.actions.len(),
            "input dispatcher active"
        );
        self.controls.clear();
        self.tracks.clear();
        self.active = Some(ActiveBindings { set, map: map_index });
        self.state = DispatcherState::Active;
        Ok(())
    }

    /// Stop producing events. Subscriptions are kept.
    ///
    /// Actions still actuated receive one final released value first.
    pub fn deactivate(&mut self) {
        if self.state == DispatcherState::Active {
            self.release_held();
            tracing::info!("input dispatcher inactive");
        }
        self.active = None;
        self.controls.clear();
        self.tracks.clear();
        self.state = DispatcherState::Inactive;
    }

    fn disable(&mut self, err: ConfigurationError) -> ConfigurationError {
        tracing::error!(%err, "critical: input dispatcher disabled");
        if self.state == DispatcherState::Active {
            self.release_held();
        }
        self.active = None;
        self.controls.clear();
        self.tracks.clear();
        self.state = DispatcherState::Disabled;
        err
    }

    /// True for the standard gameplay actions and anything the active map declares.
    pub fn is_known(&self, action: &str) -> bool {
        StandardAction::from_name(action).is_some() || self.catalog.contains_key(action)
    }

    fn shape_of(&self, action: &str) -> Option<ValueShape> {
        self.catalog
            .get(action)
            .copied()
            .or_else(|| StandardAction::from_name(action).map(|a| a.shape()))
    }

    /// Register `callback` for `action`. Drop the returned handle to unsubscribe.
    pub fn subscribe<F>(
        &self,
        action: &str,
        mode: DeliveryMode,
        callback: F,
    ) -> Result<Subscription, UnknownActionError>
    where
        F: Fn(ActionValue) + 'static,
    {
        if !self.is_known(action) {
            return Err(UnknownActionError(action.to_string()));
        }
        let id = self
            .registry
            .borrow_mut()
            .add(action, mode, Rc::new(callback));
        tracing::debug!(action, ?mode, %id, "subscribed");
        Ok(Subscription::new(id, action.to_string(), &self.registry))
    }

    /// Remove a registration by id. Returns false when nothing matched.
    pub fn unsubscribe(&self, action: &str, id: SubscriptionId) -> bool {
        self.registry.borrow_mut().remove(action, id)
    }

    pub fn subscriber_count(&self, action: &str) -> usize {
        self.registry.borrow().count(action)
    }

    pub fn total_subscribers(&self) -> usize {
        self.registry.borrow().total()
    }

    /// Last resolved value of `action`, or its released value.
    pub fn read(&self, action: &str) -> Result<ActionValue, UnknownActionError> {
        let shape = self
            .shape_of(action)
            .ok_or_else(|| UnknownActionError(action.to_string()))?;
        Ok(self
            .tracks
            .get(action)
            .and_then(|t| t.last)
            .unwrap_or(ActionValue::zero(shape)))
    }

    /// Drain the device source and dispatch every resulting action event.
    ///
    /// Relative readings (pointer motion, scroll) are summed per control first,
    /// so each poll resolves them once.
    ///
    /// Callbacks must not borrow the dispatcher itself; dropping `Subscription`
    /// handles from inside a callback is fine.
    pub fn poll(&mut self) -> PollStats {
        let raw = self.device.poll();
        let mut stats = PollStats {
            inputs: raw.len(),
            ..PollStats::default()
        };
        let Some(active) = &self.active else {
            if !raw.is_empty() {
                tracing::trace!(count = raw.len(), "dispatcher inactive; device input discarded");
            }
            return stats;
        };
        let inputs = coalesce_relative(raw);
        let set = active.set.clone();
        let map = &set.maps[active.map];
        let _span = tracing::trace_span!("input_poll", inputs = inputs.len()).entered();

        let mut skipped: HashSet<&str> = HashSet::new();
        for input in &inputs {
            self.controls
                .insert((input.family, input.control.clone()), input.value);
            for binding in &map.actions {
                let Some(source) = binding.source_for(input) else {
                    continue;
                };
                if !binding.honors(input.family) {
                    stats.dropped += 1;
                    tracing::trace!(
                        action = %binding.name,
                        family = %input.family,
                        control = %input.control,
                        "device family not honored; event dropped"
                    );
                    continue;
                }
                if skipped.contains(binding.name.as_str()) {
                    continue;
                }
                match self.resolve(binding, source, input) {
                    Ok(value) => stats.deliveries += self.deliver(&binding.name, value),
                    Err(err) => {
                        stats.failed += 1;
                        tracing::warn!(
                            action = %binding.name,
                            %err,
                            "resolution failed; action skipped for this poll"
                        );
                        skipped.insert(binding.name.as_str());
                    }
                }
            }
        }
        stats
    }

    fn resolve(
        &self,
        binding: &ActionBinding,
        source: &Source,
        input: &RawInput,
    ) -> Result<ActionValue, ResolveError> {
        match source {
            Source::Composite { composite } => {
                Ok(ActionValue::Vector(self.composite_value(binding, composite)))
            }
            Source::Control { control } => {
                let raw = match (control.component, input.value) {
                    (None, raw) => raw,
                    (Some(AxisComponent::X), RawValue::Vector(v)) => RawValue::Axis(v.x),
                    (Some(AxisComponent::Y), RawValue::Vector(v)) => RawValue::Axis(v.y),
                    (Some(_), _) => {
                        return Err(ResolveError::ComponentOfNonVector(control.to_string()));
                    }
                };
                shape_value(binding.shape, raw, input, self.config.press_point)
            }
        }
    }

    /// Plain vector sum of the held parts' unit directions.
    fn composite_value(&self, binding: &ActionBinding, composite: &Composite) -> Vec2 {
        composite
            .parts()
            .fold(Vec2::ZERO, |acc, (path, dir)| acc + dir * self.part_actuation(binding, path))
    }

    /// Readings from families the binding does not honor never count.
    fn part_actuation(&self, binding: &ActionBinding, path: &SourcePath) -> f32 {
        match path.family {
            Some(family) if !binding.honors(family) => 0.0,
            Some(family) => self
                .controls
                .get(&(family, path.control.clone()))
                .map_or(0.0, |v| v.actuation().min(1.0)),
            None => self
                .controls
                .iter()
                .filter(|((family, control), _)| *control == path.control && binding.honors(*family))
                .map(|(_, v)| v.actuation().min(1.0))
                .fold(0.0, f32::max),
        }
    }

    fn deliver(&mut self, action: &str, value: ActionValue) -> usize {
        let press_point = self.config.press_point;
        let track = self.tracks.entry(action.to_string()).or_default();
        let changed = !(value.is_zero() && track.last.is_none_or(|last| last.is_zero()));
        let pressed = !value.is_zero() && value.magnitude() >= press_point;
        let edge = pressed && !track.pressed;
        track.pressed = pressed;
        if changed {
            track.last = Some(value);
        }

        let due = self.registry.borrow().due(action, changed, edge);
        if edge {
            tracing::debug!(action, "press edge");
        }
        tracing::trace!(action, ?value, changed, edge, subscribers = due.len(), "dispatch");
        let mut delivered = 0;
        for (id, callback) in &due {
            // an earlier callback may have released this one
            let live = self.registry.borrow().contains(action, *id);
            if !live {
                continue;
            }
            callback(value);
            delivered += 1;
        }
        delivered
    }

    fn release_held(&mut self) {
        let held: BTreeMap<String, ActionValue> = self
            .tracks
            .iter()
            .filter_map(|(name, track)| {
                track
                    .last
                    .filter(|v| !v.is_zero())
                    .map(|v| (name.clone(), ActionValue::zero(v.shape())))
            })
            .collect();
        for (name, zero) in held {
            self.deliver(&name, zero);
        }
    }
}

fn shape_value(
    shape: ValueShape,
    raw: RawValue,
    input: &RawInput,
    press_point: f32,
) -> Result<ActionValue, ResolveError> {
    let finite = match raw {
        RawValue::Button(_) => true,
        RawValue::Axis(a) => a.is_finite(),
        RawValue::Vector(v) => v.is_finite(),
    };
    if !finite {
        return Err(ResolveError::NonFinite(input.control.clone()));
    }
    let mismatch = |got: &'static str| ResolveError::ValueKind {
        family: input.family,
        control: input.control.clone(),
        got,
        expected: shape,
    };
    match (shape, raw) {
        (ValueShape::Vector2, RawValue::Vector(v)) => Ok(ActionValue::Vector(v)),
        (ValueShape::Vector2, RawValue::Axis(_)) => Err(mismatch("axis")),
        (ValueShape::Vector2, RawValue::Button(_)) => Err(mismatch("button")),
        (ValueShape::Scalar, RawValue::Axis(a)) => Ok(ActionValue::Scalar(a)),
        (ValueShape::Scalar, RawValue::Button(b)) => Ok(ActionValue::Scalar(if b { 1.0 } else { 0.0 })),
        (ValueShape::Scalar, RawValue::Vector(_)) => Err(mismatch("vector")),
        (ValueShape::Button, raw) => Ok(ActionValue::Button(raw.actuation() >= press_point)),
    }
}

impl fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("state", &self.state)
            .field("map", &self.active_map())
            .field("subscribers", &self.total_subscribers())
            .finish()
    }
}
