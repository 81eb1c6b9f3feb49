use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use westward_input::{BindingLoadError, BindingSet, DispatcherConfig};
use westward_locomotion::LocomotionSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed runtime config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed input script: {0}")]
    Script(#[source] serde_yaml::Error),
    #[error("failed to load bindings from {path}: {source}")]
    Bindings {
        path: PathBuf,
        source: BindingLoadError,
    },
    #[error("invalid runtime config: {0}")]
    Invalid(String),
}

/// Everything a session needs, loadable from one YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub dispatcher: DispatcherConfig,
    pub locomotion: LocomotionSettings,
    /// Binding set file. The standard bindings are used when absent.
    pub bindings: Option<PathBuf>,
    pub spawn: Vec3,
    /// Height of the camera-follow pivot above the actor origin.
    pub eye_height: f32,
    pub ground_height: f32,
    /// Upper bound on a single frame's delta, in seconds.
    pub max_frame_dt: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            locomotion: LocomotionSettings::default(),
            bindings: None,
            spawn: Vec3::ZERO,
            eye_height: 1.5,
            ground_height: 0.0,
            max_frame_dt: 0.1,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file. A relative `bindings` path resolves against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let (Some(bindings), Some(dir)) = (config.bindings.as_mut(), path.parent()) {
            if bindings.is_relative() {
                *bindings = dir.join(&*bindings);
            }
        }
        tracing::info!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locomotion
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            return Err(ConfigError::Invalid("max_frame_dt must be positive".into()));
        }
        if !self.eye_height.is_finite() || !self.spawn.is_finite() || !self.ground_height.is_finite() {
            return Err(ConfigError::Invalid("spawn, eye_height and ground_height must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.dispatcher.press_point) || self.dispatcher.press_point == 0.0 {
            return Err(ConfigError::Invalid("press_point must be in (0, 1]".into()));
        }
        Ok(())
    }

    /// The configured binding set, or the standard one.
    pub fn load_bindings(&self) -> Result<BindingSet, ConfigError> {
        match &self.bindings {
            Some(path) => BindingSet::load(path).map_err(|source| ConfigError::Bindings {
                path: path.clone(),
                source,
            }),
            None => Ok(BindingSet::standard()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RuntimeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.dispatcher.action_map, "Player");
    }

    #[test]
    fn partial_overrides() {
        let config = RuntimeConfig::from_yaml_str(
            "locomotion:\n  move_speed: 8.0\nspawn: [1.0, 2.0, 3.0]\nmax_frame_dt: 0.05\n",
        )
        .unwrap();
        assert_eq!(config.locomotion.move_speed, 8.0);
        assert_eq!(config.locomotion.gravity, -9.81);
        assert_eq!(config.spawn, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.max_frame_dt, 0.05);
    }

    #[test]
    fn invalid_values_rejected() {
        for text in [
            "max_frame_dt: 0.0",
            "locomotion:\n  gravity: 3.0",
            "dispatcher:\n  press_point: 1.5",
        ] {
            assert!(
                matches!(RuntimeConfig::from_yaml_str(text), Err(ConfigError::Invalid(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn relative_bindings_resolve_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bindings.yaml"),
            BindingSet::standard().to_yaml_string().unwrap(),
        )
        .unwrap();
        let config_path = dir.path().join("runtime.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "bindings: bindings.yaml").unwrap();

        let config = RuntimeConfig::load(&config_path).unwrap();
        assert_eq!(config.bindings.as_deref(), Some(dir.path().join("bindings.yaml").as_path()));
        let set = config.load_bindings().unwrap();
        assert!(set.map("Player").is_some());
    }

    #[test]
    fn missing_bindings_file_reported() {
        let config = RuntimeConfig {
            bindings: Some(PathBuf::from("/nonexistent/bindings.yaml")),
            ..Default::default()
        };
        assert!(matches!(config.load_bindings(), Err(ConfigError::Bindings { .. })));
    }

    #[test]
    fn missing_config_file_reported() {
        let err = RuntimeConfig::load("/nonexistent/runtime.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
