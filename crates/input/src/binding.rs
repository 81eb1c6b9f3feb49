//! Binding sets: named action maps associating logical actions with device sources.
//!
//! A source path reads `<family>/<control>[/x|/y]`, where `*` in the family
//! position matches any device and the optional suffix picks one axis of a
//! vector control.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::action::StandardAction;
use crate::device::{DeviceFamily, RawInput};
use crate::error::{BindingLoadError, ConfigurationError};

/// Declared value shape of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    Vector2,
    Scalar,
    Button,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Vector2 => "vector2",
            Self::Scalar => "scalar",
            Self::Button => "button",
        })
    }
}

/// One axis of a vector control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisComponent {
    X,
    Y,
}

/// Address of a physical control, optionally narrowed to one axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourcePath {
    pub family: Option<DeviceFamily>,
    pub control: String,
    pub component: Option<AxisComponent>,
}

impl SourcePath {
    pub fn new(family: DeviceFamily, control: impl Into<String>) -> Self {
        Self {
            family: Some(family),
            control: control.into(),
            component: None,
        }
    }

    /// A path matching `control` on any device family.
    pub fn any(control: impl Into<String>) -> Self {
        Self {
            family: None,
            control: control.into(),
            component: None,
        }
    }

    pub fn with_component(mut self, component: AxisComponent) -> Self {
        self.component = Some(component);
        self
    }

    /// True when the reading comes from this control. Family is ignored for `*` paths.
    pub fn matches(&self, input: &RawInput) -> bool {
        self.control == input.control && self.family.is_none_or(|f| f == input.family)
    }
}

impl FromStr for SourcePath {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigurationError::InvalidSourcePath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = s.split('/').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid("expected <family>/<control>[/x|/y]"));
        }
        let family = match parts[0] {
            "*" => None,
            name => Some(name.parse::<DeviceFamily>().map_err(|e| invalid(&e))?),
        };
        if parts[1].is_empty() {
            return Err(invalid("empty control name"));
        }
        let component = match parts.get(2) {
            None => None,
            Some(&"x") => Some(AxisComponent::X),
            Some(&"y") => Some(AxisComponent::Y),
            Some(_) => return Err(invalid("axis suffix must be `x` or `y`")),
        };
        Ok(Self {
            family,
            control: parts[1].to_string(),
            component,
        })
    }
}

impl TryFrom<String> for SourcePath {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourcePath> for String {
    fn from(path: SourcePath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            Some(family) => write!(f, "{family}/{}", self.control)?,
            None => write!(f, "*/{}", self.control)?,
        }
        match self.component {
            Some(AxisComponent::X) => f.write_str("/x"),
            Some(AxisComponent::Y) => f.write_str("/y"),
            None => Ok(()),
        }
    }
}

/// Four discrete controls combined into one 2-D vector.
///
/// Each held part contributes its unit direction; missing parts contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Composite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<SourcePath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<SourcePath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<SourcePath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<SourcePath>,
}

impl Composite {
    /// Composite over four controls of the same device family.
    pub fn of(family: DeviceFamily, up: &str, down: &str, left: &str, right: &str) -> Self {
        Self {
            up: Some(SourcePath::new(family, up)),
            down: Some(SourcePath::new(family, down)),
            left: Some(SourcePath::new(family, left)),
            right: Some(SourcePath::new(family, right)),
        }
    }

    /// Declared parts with their unit directions.
    pub fn parts(&self) -> impl Iterator<Item = (&SourcePath, Vec2)> {
        [
            (&self.up, Vec2::Y),
            (&self.down, Vec2::NEG_Y),
            (&self.left, Vec2::NEG_X),
            (&self.right, Vec2::X),
        ]
        .into_iter()
        .filter_map(|(path, dir)| path.as_ref().map(|p| (p, dir)))
    }

    pub fn matches(&self, input: &RawInput) -> bool {
        self.parts().any(|(path, _)| path.matches(input))
    }
}

/// A single physical source feeding an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Control { control: SourcePath },
    Composite { composite: Composite },
}

impl Source {
    pub fn matches(&self, input: &RawInput) -> bool {
        match self {
            Self::Control { control } => control.matches(input),
            Self::Composite { composite } => composite.matches(input),
        }
    }
}

/// A logical action and the physical sources that drive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    pub name: String,
    pub shape: ValueShape,
    /// Device families allowed to drive this action. `None` honors all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honor: Option<Vec<DeviceFamily>>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ActionBinding {
    pub fn new(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: name.into(),
            shape,
            honor: None,
            sources: Vec::new(),
        }
    }

    pub fn control(mut self, path: SourcePath) -> Self {
        self.sources.push(Source::Control { control: path });
        self
    }

    pub fn composite(mut self, composite: Composite) -> Self {
        self.sources.push(Source::Composite { composite });
        self
    }

    pub fn honoring(mut self, families: &[DeviceFamily]) -> Self {
        self.honor = Some(families.to_vec());
        self
    }

    pub fn honors(&self, family: DeviceFamily) -> bool {
        self.honor.as_ref().is_none_or(|h| h.contains(&family))
    }

    /// First declared source that the reading belongs to.
    pub fn source_for(&self, input: &RawInput) -> Option<&Source> {
        self.sources.iter().find(|s| s.matches(input))
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedSource {
            action: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.honor.as_ref().is_some_and(|h| h.is_empty()) {
            return Err(malformed("honor list is empty; the action could never fire"));
        }
        for source in &self.sources {
            match source {
                Source::Composite { composite } => {
                    if self.shape != ValueShape::Vector2 {
                        return Err(malformed("composite sources require a vector2 action"));
                    }
                    if composite.parts().next().is_none() {
                        return Err(malformed("composite declares no directions"));
                    }
                    if composite.parts().any(|(p, _)| p.component.is_some()) {
                        return Err(malformed("composite parts cannot select an axis"));
                    }
                }
                Source::Control { control } => {
                    if control.component.is_some() && self.shape == ValueShape::Vector2 {
                        return Err(malformed("a single axis cannot feed a vector2 action"));
                    }
                }
            }
        }
        if let Some(standard) = StandardAction::from_name(&self.name) {
            if standard.shape() != self.shape {
                return Err(ConfigurationError::ShapeMismatch {
                    action: self.name.clone(),
                    declared: self.shape,
                    expected: standard.shape(),
                });
            }
        }
        Ok(())
    }
}

/// A named group of actions activated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMap {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionBinding>,
}

impl ActionMap {
    pub fn new(name: impl Into<String>, actions: Vec<ActionBinding>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    pub fn action(&self, name: &str) -> Option<&ActionBinding> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Check the map can drive a dispatcher requiring `required` actions.
    pub fn validate(&self, required: &[String]) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for action in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(ConfigurationError::DuplicateAction(action.name.clone()));
            }
            action.validate()?;
        }
        for name in required {
            if !seen.contains(name.as_str()) {
                return Err(ConfigurationError::MissingAction {
                    map: self.name.clone(),
                    action: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The full binding configuration: every action map the game declares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingSet {
    #[serde(default)]
    pub maps: Vec<ActionMap>,
}

impl BindingSet {
    pub fn new(maps: Vec<ActionMap>) -> Self {
        Self { maps }
    }

    pub fn map(&self, name: &str) -> Option<&ActionMap> {
        self.maps.iter().find(|m| m.name == name)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, BindingLoadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, BindingLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindingLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let set = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            _ => Self::from_yaml_str(&text)?,
        };
        tracing::debug!(path = %path.display(), maps = set.maps.len(), "binding set loaded");
        Ok(set)
    }

    pub fn to_yaml_string(&self) -> Result<String, BindingLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The stock bindings: on-foot `Player`, menu `UI`, `Horse` and `Wagon` maps.
    pub fn standard() -> Self {
        use DeviceFamily::{Gamepad, Keyboard, Pointer};
        use ValueShape::{Button, Scalar, Vector2};

        let kb = |c: &str| SourcePath::new(Keyboard, c);
        let pad = |c: &str| SourcePath::new(Gamepad, c);
        let ptr = |c: &str| SourcePath::new(Pointer, c);
        let wasd = || Composite::of(Keyboard, "w", "s", "a", "d");
        let button = |name: &str, key: &str, pad_button: &str| {
            ActionBinding::new(name, Button).control(kb(key)).control(pad(pad_button))
        };

        let player = ActionMap::new(
            "Player",
            vec![
                ActionBinding::new("Move", Vector2)
                    .composite(wasd())
                    .control(pad("left_stick")),
                ActionBinding::new("Look", Vector2)
                    .control(ptr("delta"))
                    .control(pad("right_stick"))
                    .honoring(&[Pointer, Gamepad]),
                ActionBinding::new("Zoom", Scalar)
                    .control(ptr("scroll").with_component(AxisComponent::Y))
                    .control(pad("right_stick").with_component(AxisComponent::Y)),
                button("Jump", "space", "button_south"),
                button("Sprint", "left_shift", "left_stick_press"),
                button("Interact", "e", "button_west"),
                ActionBinding::new("Fire", Button)
                    .control(ptr("left_button"))
                    .control(pad("right_trigger")),
                ActionBinding::new("Aim", Button)
                    .control(ptr("right_button"))
                    .control(pad("left_trigger")),
                button("Reload", "r", "button_north"),
                button("Crouch", "c", "button_east"),
                button("Inventory", "tab", "start"),
                button("HolsterWeapon", "h", "dpad_down"),
            ],
        );

        let ui = ActionMap::new(
            "UI",
            vec![
                ActionBinding::new("Navigate", Vector2)
                    .composite(Composite::of(
                        Keyboard,
                        "up_arrow",
                        "down_arrow",
                        "left_arrow",
                        "right_arrow",
                    ))
                    .control(pad("dpad")),
                button("Submit", "enter", "button_south"),
                button("Cancel", "escape", "button_east"),
                ActionBinding::new("Point", Vector2).control(ptr("position")),
                ActionBinding::new("Click", Button)
                    .control(ptr("left_button"))
                    .control(pad("button_south")),
                button("Pause", "escape", "start"),
            ],
        );

        let horse = ActionMap::new(
            "Horse",
            vec![
                ActionBinding::new("Move", Vector2)
                    .composite(wasd())
                    .control(pad("left_stick")),
                button("MountDismount", "f", "button_north"),
                button("Sprint", "left_shift", "left_stick_press"),
                button("Jump", "space", "button_south"),
                button("Whistle", "q", "dpad_up"),
                button("Brake", "s", "dpad_down"),
                button("Interact", "e", "button_west"),
                button("Inventory", "tab", "start"),
            ],
        );

        let wagon = ActionMap::new(
            "Wagon",
            vec![
                ActionBinding::new("Steer", Vector2)
                    .composite(Composite {
                        left: Some(kb("a")),
                        right: Some(kb("d")),
                        ..Composite::default()
                    })
                    .control(pad("left_stick")),
                button("MountDismount", "f", "button_north"),
                button("Accelerate", "w", "right_trigger"),
                button("BrakeReverse", "s", "left_trigger"),
                button("Whip", "space", "button_south"),
                button("HornBell", "q", "dpad_up"),
                button("Interact", "e", "button_west"),
            ],
        );

        Self::new(vec![player, ui, horse, wagon])
    }
}
