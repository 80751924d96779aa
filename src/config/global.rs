//! Global configuration.
//!
//! Loaded from ~/.config/tickr/tickr.yml or .tickr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TickrError;
use crate::fps::MIN_SAMPLE_WINDOW_MS;
use crate::queue::QueueKind;

/// Global configuration for tickr.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TickrConfig {
    /// Pause ticking while the host surface is unfocused.
    #[serde(rename = "pause-on-blur")]
    pub pause_on_blur: bool,

    /// Minimum elapsed milliseconds between FPS recomputations (at least 1000).
    #[serde(rename = "fps-sample-window-ms")]
    pub fps_sample_window_ms: u64,

    /// Prefix for ready-signal event names.
    pub namespace: String,

    /// Initial `active` flag per queue.
    pub queues: QueuesConfig,

    /// Headless runtime settings.
    pub runtime: RuntimeConfig,
}

impl Default for TickrConfig {
    fn default() -> Self {
        Self {
            pause_on_blur: true,
            fps_sample_window_ms: crate::fps::DEFAULT_SAMPLE_WINDOW_MS,
            namespace: crate::config::DEFAULT_NAMESPACE.to_string(),
            queues: QueuesConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl TickrConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .tickr.yml in current directory
    /// 3. ~/.config/tickr/tickr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".tickr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .tickr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .tickr.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tickr").join("tickr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load and validate a single config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.fps_sample_window_ms < MIN_SAMPLE_WINDOW_MS {
            return Err(TickrError::InvalidConfig(format!(
                "fps-sample-window-ms must be >= {}, got {}",
                MIN_SAMPLE_WINDOW_MS, self.fps_sample_window_ms
            )));
        }
        if self.runtime.target_fps == 0 {
            return Err(TickrError::InvalidConfig("runtime.target-fps must be > 0".to_string()));
        }
        Ok(())
    }

    /// Render the configuration as YAML.
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Initial activation of each queue.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct QueuesConfig {
    pub default: bool,
    pub scroll: bool,
    pub resize: bool,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            default: true,
            scroll: true,
            resize: true,
        }
    }
}

impl QueuesConfig {
    pub fn is_active(&self, kind: QueueKind) -> bool {
        match kind {
            QueueKind::Default => self.default,
            QueueKind::Scroll => self.scroll,
            QueueKind::Resize => self.resize,
        }
    }
}

/// Headless runtime settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Frames per second the headless loop aims for.
    #[serde(rename = "target-fps")]
    pub target_fps: u32,

    /// Stop after this many frames (None = run until stopped).
    #[serde(rename = "max-frames")]
    pub max_frames: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TickrConfig::default();
        assert!(config.pause_on_blur);
        assert_eq!(config.fps_sample_window_ms, 1000);
        assert_eq!(config.namespace, "tickr");
        assert_eq!(config.runtime.target_fps, 60);
        assert!(config.runtime.max_frames.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = TickrConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = TickrConfig {
            fps_sample_window_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TickrError::InvalidConfig(_))));

        let config = TickrConfig {
            runtime: RuntimeConfig {
                target_fps: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
pause-on-blur: false
namespace: FJBO
queues:
  resize: false
runtime:
  max-frames: 120
"#;
        let config: TickrConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.pause_on_blur);
        assert_eq!(config.namespace, "FJBO");
        assert!(config.queues.default);
        assert!(!config.queues.resize);
        assert_eq!(config.runtime.max_frames, Some(120));
        // Other fields should have defaults
        assert_eq!(config.fps_sample_window_ms, 1000);
        assert_eq!(config.runtime.target_fps, 60);
    }

    #[test]
    fn test_queues_config_is_active() {
        let queues = QueuesConfig {
            scroll: false,
            ..Default::default()
        };
        assert!(queues.is_active(QueueKind::Default));
        assert!(!queues.is_active(QueueKind::Scroll));
        assert!(queues.is_active(QueueKind::Resize));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fps-sample-window-ms: 2500").unwrap();
        let path = file.path().to_path_buf();

        let config = TickrConfig::load(Some(&path)).unwrap();
        assert_eq!(config.fps_sample_window_ms, 2500);
    }

    #[test]
    fn test_short_sample_window_rejected() {
        let config = TickrConfig {
            fps_sample_window_ms: 500,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid config: fps-sample-window-ms must be >= 1000, got 500"
        );

        let config = TickrConfig {
            fps_sample_window_ms: MIN_SAMPLE_WINDOW_MS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_path_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fps-sample-window-ms: 0").unwrap();
        let path = file.path().to_path_buf();

        assert!(TickrConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let path = PathBuf::from("/nonexistent/tickr.yml");
        assert!(TickrConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_yaml_output_uses_kebab_keys() {
        let yaml = TickrConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("pause-on-blur: true"));
        assert!(yaml.contains("target-fps: 60"));
    }
}
