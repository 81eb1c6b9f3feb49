use serde::{Deserialize, Serialize};
use westward_input::RawInput;

use crate::config::ConfigError;

/// Recorded or hand-written device input, replayed frame by frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    /// Frame delta used when a frame does not set its own.
    #[serde(default = "default_dt")]
    pub dt: f32,
    pub frames: Vec<ScriptFrame>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptFrame {
    /// Readings pushed before the first repetition of this frame.
    #[serde(default)]
    pub inputs: Vec<RawInput>,
    #[serde(default)]
    pub dt: Option<f32>,
    /// How many frames this entry spans; inputs are pushed once.
    #[serde(default = "one")]
    pub repeat: u32,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn one() -> u32 {
    1
}

impl InputScript {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(ConfigError::Script)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// `frames` idle frames with no input.
    pub fn idle(frames: u32) -> Self {
        Self {
            dt: default_dt(),
            frames: vec![ScriptFrame {
                repeat: frames,
                ..Default::default()
            }],
        }
    }

    /// Total frames the script plays.
    pub fn frame_count(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use westward_input::{DeviceFamily, RawValue};

    #[test]
    fn parses_frames_with_defaults() {
        let script = InputScript::from_yaml_str(
            r#"
frames:
  - inputs:
      - { family: keyboard, control: w, value: { button: true } }
    repeat: 30
  - inputs:
      - { family: pointer, control: delta, value: { vector: [4.0, -2.0] } }
    dt: 0.02
"#,
        )
        .unwrap();
        assert!((script.dt - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(script.frame_count(), 31);
        assert_eq!(script.frames[0].inputs[0], RawInput::key("w", true));
        assert_eq!(
            script.frames[1].inputs[0].value,
            RawValue::Vector(Vec2::new(4.0, -2.0))
        );
        assert_eq!(script.frames[1].inputs[0].family, DeviceFamily::Pointer);
        assert_eq!(script.frames[1].dt, Some(0.02));
    }

    #[test]
    fn idle_script_has_no_input() {
        let script = InputScript::idle(10);
        assert_eq!(script.frame_count(), 10);
        assert!(script.frames[0].inputs.is_empty());
    }

    #[test]
    fn unknown_family_rejected() {
        let result = InputScript::from_yaml_str(
            "frames:\n  - inputs:\n      - { family: joystick, control: x, value: { button: true } }\n",
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Script(_)));
        assert!(err.to_string().starts_with("malformed input script"), "{err}");
    }

    #[test]
    fn loaded_script_errors_name_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "frames: 3\n").unwrap();
        let err = InputScript::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Script(_)));
        assert!(!err.to_string().contains("runtime config"), "{err}");
    }
}
