//! Raw device events, tagged with their device family at the point of capture.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Closed set of device kinds an event can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    Keyboard,
    Pointer,
    Gamepad,
    Touch,
}

impl DeviceFamily {
    pub const ALL: [DeviceFamily; 4] = [
        DeviceFamily::Keyboard,
        DeviceFamily::Pointer,
        DeviceFamily::Gamepad,
        DeviceFamily::Touch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Pointer => "pointer",
            Self::Gamepad => "gamepad",
            Self::Touch => "touch",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown device family `{s}`"))
    }
}

/// The value a physical control reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawValue {
    Button(bool),
    Axis(f32),
    Vector(Vec2),
}

impl RawValue {
    /// How far the control is actuated, in `[0, inf)`.
    pub fn actuation(&self) -> f32 {
        match *self {
            Self::Button(pressed) => {
                if pressed {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Axis(a) => a.abs(),
            Self::Vector(v) => v.length(),
        }
    }

    /// Sum of two relative readings of the same kind.
    fn accumulate(self, other: RawValue) -> Option<RawValue> {
        match (self, other) {
            (Self::Axis(a), Self::Axis(b)) => Some(Self::Axis(a + b)),
            (Self::Vector(a), Self::Vector(b)) => Some(Self::Vector(a + b)),
            _ => None,
        }
    }
}

/// One reading from one control of one device.
///
/// In YAML the value is written as a one-key map, e.g. `value: { button: true }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub family: DeviceFamily,
    pub control: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub value: RawValue,
}

impl RawInput {
    pub fn new(family: DeviceFamily, control: impl Into<String>, value: RawValue) -> Self {
        Self {
            family,
            control: control.into(),
            value,
        }
    }

    pub fn button(family: DeviceFamily, control: impl Into<String>, pressed: bool) -> Self {
        Self::new(family, control, RawValue::Button(pressed))
    }

    pub fn axis(family: DeviceFamily, control: impl Into<String>, value: f32) -> Self {
        Self::new(family, control, RawValue::Axis(value))
    }

    pub fn vector(family: DeviceFamily, control: impl Into<String>, value: Vec2) -> Self {
        Self::new(family, control, RawValue::Vector(value))
    }

    /// Shorthand for a keyboard key press or release.
    pub fn key(control: impl Into<String>, pressed: bool) -> Self {
        Self::button(DeviceFamily::Keyboard, control, pressed)
    }

    /// Controls that report motion since the previous reading rather than a position.
    pub fn is_relative(&self) -> bool {
        RELATIVE_CONTROLS.contains(&self.control.as_str())
    }
}

const RELATIVE_CONTROLS: [&str; 2] = ["delta", "scroll"];

/// Fold every relative reading of one control into a single summed reading.
///
/// The sum takes the place of the first reading; everything else keeps its order.
pub fn coalesce_relative(inputs: Vec<RawInput>) -> Vec<RawInput> {
    let mut out: Vec<RawInput> = Vec::with_capacity(inputs.len());
    let mut first: HashMap<(DeviceFamily, String), usize> = HashMap::new();
    for input in inputs {
        if !input.is_relative() {
            out.push(input);
            continue;
        }
        let key = (input.family, input.control.clone());
        if let Some(&at) = first.get(&key) {
            if let Some(sum) = out[at].value.accumulate(input.value) {
                out[at].value = sum;
                continue;
            }
        }
        first.insert(key, out.len());
        out.push(input);
    }
    out
}

/// The hardware side of the dispatcher: drained once per poll.
pub trait DeviceSource {
    /// Return every reading captured since the previous poll, oldest first.
    fn poll(&mut self) -> Vec<RawInput>;
}

/// FIFO device source fed by capture code.
///
/// Clones share the same queue, so the capture side keeps a clone while the
/// dispatcher owns another.
#[derive(Debug, Clone, Default)]
pub struct DeviceQueue {
    queue: Rc<RefCell<VecDeque<RawInput>>>,
}

impl DeviceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, input: RawInput) {
        self.queue.borrow_mut().push_back(input);
    }

    pub fn extend(&self, inputs: impl IntoIterator<Item = RawInput>) {
        self.queue.borrow_mut().extend(inputs);
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl DeviceSource for DeviceQueue {
    fn poll(&mut self) -> Vec<RawInput> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_round_trips_through_str() {
        for family in DeviceFamily::ALL {
            assert_eq!(family.as_str().parse::<DeviceFamily>().unwrap(), family);
        }
        assert!("joystick".parse::<DeviceFamily>().is_err());
    }

    #[test]
    fn actuation_per_value_kind() {
        assert_eq!(RawValue::Button(true).actuation(), 1.0);
        assert_eq!(RawValue::Button(false).actuation(), 0.0);
        assert_eq!(RawValue::Axis(-0.25).actuation(), 0.25);
        assert_eq!(RawValue::Vector(Vec2::new(3.0, 4.0)).actuation(), 5.0);
    }

    #[test]
    fn queue_clones_share_storage_and_drain_in_order() {
        let capture = DeviceQueue::new();
        let mut source = capture.clone();
        capture.push(RawInput::key("w", true));
        capture.push(RawInput::key("w", false));
        assert_eq!(source.len(), 2);

        let drained = source.poll();
        assert_eq!(drained[0].value, RawValue::Button(true));
        assert_eq!(drained[1].value, RawValue::Button(false));
        assert!(capture.is_empty());
        assert!(source.poll().is_empty());
    }

    #[test]
    fn yaml_reading_uses_one_key_value_map() {
        let input: RawInput =
            serde_yaml::from_str("{ family: keyboard, control: w, value: { button: true } }").unwrap();
        assert_eq!(input, RawInput::key("w", true));

        let input: RawInput =
            serde_yaml::from_str("{ family: pointer, control: delta, value: { vector: [3.0, -1.5] } }")
                .unwrap();
        assert_eq!(input.value, RawValue::Vector(Vec2::new(3.0, -1.5)));

        let text = serde_yaml::to_string(&RawInput::axis(DeviceFamily::Gamepad, "left_trigger", 0.5)).unwrap();
        assert!(text.contains("axis: 0.5"), "{text}");
    }

    #[test]
    fn json_reading_keeps_tagged_value() {
        let input: RawInput =
            serde_json::from_str(r#"{"family":"touch","control":"tap","value":{"button":false}}"#).unwrap();
        assert_eq!(input, RawInput::button(DeviceFamily::Touch, "tap", false));
    }

    #[test]
    fn relative_readings_sum_per_control() {
        let pointer = |x: f32, y: f32| RawInput::vector(DeviceFamily::Pointer, "delta", Vec2::new(x, y));
        let merged = coalesce_relative(vec![
            pointer(0.0, -25.0),
            RawInput::key("w", true),
            pointer(0.0, -25.0),
            RawInput::vector(DeviceFamily::Touch, "delta", Vec2::new(1.0, 0.0)),
            pointer(4.0, -25.0),
            RawInput::vector(DeviceFamily::Pointer, "scroll", Vec2::new(0.0, 1.0)),
            pointer(0.0, -25.0),
            RawInput::vector(DeviceFamily::Pointer, "scroll", Vec2::new(0.0, 1.0)),
        ]);
        assert_eq!(
            merged,
            vec![
                pointer(4.0, -100.0),
                RawInput::key("w", true),
                RawInput::vector(DeviceFamily::Touch, "delta", Vec2::new(1.0, 0.0)),
                RawInput::vector(DeviceFamily::Pointer, "scroll", Vec2::new(0.0, 2.0)),
            ]
        );
    }

    #[test]
    fn absolute_readings_are_not_merged() {
        let inputs = vec![
            RawInput::key("space", true),
            RawInput::key("space", false),
            RawInput::vector(DeviceFamily::Gamepad, "left_stick", Vec2::X),
            RawInput::vector(DeviceFamily::Gamepad, "left_stick", Vec2::Y),
        ];
        assert_eq!(coalesce_relative(inputs.clone()), inputs);
    }
}
