//! Settings for the `cforge` CLI.
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! - `CFORGE_SCHEMA_PATH`: schema file, relative to the project root
//! - `CFORGE_PROJECT_ROOT`: project root, relative to the config file
//! - `CFORGE_POLL_SECS`: watcher poll interval in seconds
//!
//! Relative paths resolve against the directory holding the config file,
//! or the working directory when there is none.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cforge_registry::PrimitiveTable;
use serde::{Deserialize, Serialize};

pub const ENV_SCHEMA_PATH: &str = "CFORGE_SCHEMA_PATH";
pub const ENV_PROJECT_ROOT: &str = "CFORGE_PROJECT_ROOT";
pub const ENV_POLL_SECS: &str = "CFORGE_POLL_SECS";

/// Bounds of the watcher poll interval, in seconds.
pub const POLL_RANGE: (f64, f64) = (1.0, 10.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema file, relative to `project_root_path`.
    pub schema_path: PathBuf,
    /// Project root, relative to the config file's directory.
    pub project_root_path: PathBuf,
    pub watcher_enabled: bool,
    /// Seconds between schema checks; clamped to [`POLL_RANGE`].
    pub watcher_poll_frequency: f64,
    pub disable_all_object_updates: bool,
    /// Optional YAML primitive table overlaid on the built-in one.
    pub primitives: Option<PathBuf>,
    /// Recursion ceiling of the compiler.
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("registry.json"),
            project_root_path: PathBuf::from(".."),
            watcher_enabled: true,
            watcher_poll_frequency: 1.0,
            disable_all_object_updates: false,
            primitives: None,
            max_depth: cforge_compiler::DEFAULT_MAX_DEPTH,
        }
    }
}

impl Settings {
    /// Read settings from `path` (or defaults) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_yaml_str(&content)?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|var| std::env::var(var).ok())
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_yaml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(settings.clamped())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(ENV_SCHEMA_PATH) {
            self.schema_path = PathBuf::from(path);
        }
        if let Some(root) = lookup(ENV_PROJECT_ROOT) {
            self.project_root_path = PathBuf::from(root);
        }
        if let Some(secs) = lookup(ENV_POLL_SECS) {
            self.watcher_poll_frequency =
                secs.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                    var: ENV_POLL_SECS.to_string(),
                    value: secs.clone(),
                })?;
        }
        Ok(self.clamped())
    }

    fn clamped(mut self) -> Self {
        let (min, max) = POLL_RANGE;
        let requested = self.watcher_poll_frequency;
        self.watcher_poll_frequency = if requested.is_finite() {
            requested.clamp(min, max)
        } else {
            min
        };
        if self.watcher_poll_frequency != requested {
            tracing::warn!(requested, used = self.watcher_poll_frequency, "poll frequency clamped");
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.watcher_poll_frequency)
    }

    /// Absolute-or-relative schema location for a config living in `base`.
    pub fn schema_path_full(&self, base: &Path) -> PathBuf {
        if self.schema_path.is_absolute() {
            return self.schema_path.clone();
        }
        base.join(&self.project_root_path).join(&self.schema_path)
    }

    /// The built-in primitive table, overlaid with the configured one.
    pub fn primitive_table(&self, base: &Path) -> Result<PrimitiveTable, ConfigError> {
        let mut table = PrimitiveTable::builtin();
        if let Some(path) = &self.primitives {
            let path = if path.is_absolute() { path.clone() } else { base.join(path) };
            let overlay = PrimitiveTable::from_path(&path).map_err(|e| ConfigError::Primitives {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            table.extend(overlay);
        }
        Ok(table)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("invalid value for {var}: '{value}'")]
    InvalidOverride { var: String, value: String },
    #[error("cannot load primitive table '{path}': {reason}")]
    Primitives { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_host_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_path, PathBuf::from("registry.json"));
        assert_eq!(settings.project_root_path, PathBuf::from(".."));
        assert!(settings.watcher_enabled);
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert!(!settings.disable_all_object_updates);
        assert_eq!(settings.max_depth, 10);
    }

    #[test]
    fn yaml_fills_missing_keys_with_defaults() {
        let settings = Settings::from_yaml_str("schema_path: assets/registry.json\n").unwrap();
        assert_eq!(settings.schema_path, PathBuf::from("assets/registry.json"));
        assert!(settings.watcher_enabled);
    }

    #[test]
    fn poll_frequency_is_clamped() {
        let fast = Settings::from_yaml_str("watcher_poll_frequency: 0.1\n").unwrap();
        assert_eq!(fast.watcher_poll_frequency, 1.0);
        let slow = Settings::default()
            .apply_overrides(|var| (var == ENV_POLL_SECS).then(|| "60".to_string()))
            .unwrap();
        assert_eq!(slow.watcher_poll_frequency, 10.0);
    }

    #[test]
    fn environment_overrides_file_values() {
        let settings = Settings::from_yaml_str("schema_path: a.json\nproject_root_path: x\n")
            .unwrap()
            .apply_overrides(|var| match var {
                ENV_SCHEMA_PATH => Some("b.json".to_string()),
                ENV_PROJECT_ROOT => Some(".".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.schema_path_full(Path::new("/proj/blend")), PathBuf::from("/proj/blend/./b.json"));
    }

    #[test]
    fn bad_poll_override_is_rejected() {
        let err = Settings::default()
            .apply_overrides(|var| (var == ENV_POLL_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn absolute_schema_path_ignores_root() {
        let settings = Settings {
            schema_path: PathBuf::from("/tmp/registry.json"),
            ..Settings::default()
        }
        .apply_overrides(no_env)
        .unwrap();
        assert_eq!(settings.schema_path_full(Path::new("/elsewhere")), PathBuf::from("/tmp/registry.json"));
    }

    #[test]
    fn malformed_values_are_parse_errors() {
        assert!(matches!(
            Settings::from_yaml_str("watcher_poll_frequency: fast\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
