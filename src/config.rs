//! Configuration loading.
//!
//! Lookup order: explicit path, `./config/trailblaze.yaml`,
//! `<config_dir>/trailblaze/config.yaml`, built-in defaults. Environment
//! variables are applied on top of whatever was loaded.

use std::env;
use std::path::{Path, PathBuf};

use action_primitives::{DriverType, ScrollConfig};
use agent_core::{AgentRunnerConfig, LlmCapability, LlmModel};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

pub const ENV_MAX_STEPS: &str = "TRAILBLAZE_MAX_STEPS";
pub const ENV_LLM_MODEL: &str = "TRAILBLAZE_LLM_MODEL";
pub const ENV_LOG_LEVEL: &str = "TRAILBLAZE_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "TRAILBLAZE_LOG_JSON";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailblazeConfig {
    pub llm: LlmSettings,
    /// Device driver family, selects driver specific gesture constants.
    pub driver: DriverType,
    pub agent: AgentRunnerConfig,
    pub scroll: ScrollConfig,
    pub logging: LoggingConfig,
}

/// Model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub provider: String,
    /// Send screenshots along with the view hierarchy.
    pub vision: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            provider: "openai".to_string(),
            vision: true,
        }
    }
}

impl LlmSettings {
    pub fn to_model(&self) -> LlmModel {
        let model = LlmModel::new(self.model.clone(), self.provider.clone());
        if self.vision {
            model.with_capability(LlmCapability::VisionImage)
        } else {
            model
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of the human readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TrailblazeConfig {
    /// Apply `TRAILBLAZE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(ENV_MAX_STEPS) {
            let max_steps: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_MAX_STEPS} value: {raw}"))?;
            if max_steps == 0 {
                bail!("{ENV_MAX_STEPS} must be at least 1");
            }
            self.agent.max_steps = max_steps;
        }
        if let Ok(model) = env::var(ENV_LLM_MODEL) {
            if !model.trim().is_empty() {
                self.llm.model = model.trim().to_string();
            }
        }
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.logging.level = level.trim().to_string();
            }
        }
        if let Ok(raw) = env::var(ENV_LOG_JSON) {
            self.logging.json = parse_flag(&raw)
                .with_context(|| format!("Invalid {ENV_LOG_JSON} value: {raw}"))?;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

pub struct LoadedConfig {
    pub config: TrailblazeConfig,
    /// File the configuration was read from, if any.
    pub path: Option<PathBuf>,
}

/// Resolve the config file location without reading it.
pub fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }

    let local_config = PathBuf::from("config/trailblaze.yaml");
    if local_config.exists() {
        return Some(local_config);
    }

    dirs::config_dir().map(|mut path| {
        path.push("trailblaze");
        path.push("config.yaml");
        path
    })
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let mut loaded = match resolve_config_path(config_path) {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: TrailblazeConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;

            info!("Loaded configuration from: {}", path.display());
            LoadedConfig {
                config,
                path: Some(path),
            }
        }
        Some(path) => {
            warn!("Config file not found, using defaults: {}", path.display());
            LoadedConfig {
                config: TrailblazeConfig::default(),
                path: None,
            }
        }
        None => {
            warn!("No config directory available, using defaults");
            LoadedConfig {
                config: TrailblazeConfig::default(),
                path: None,
            }
        }
    };

    loaded.config.apply_env_overrides()?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrailblazeConfig::default();
        assert_eq!(config.agent.max_steps, 50);
        assert_eq!(config.scroll.max_center_retries, 4);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.driver, DriverType::AndroidHost);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
llm:
  model: claude-sonnet
  vision: false
driver: android_on_device
agent:
  max_steps: 20
scroll:
  default_timeout_ms: 5000
"#;
        let config: TrailblazeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.model, "claude-sonnet");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.driver, DriverType::AndroidOnDevice);
        assert_eq!(config.agent.max_steps, 20);
        assert_eq!(config.agent.history_window, 10);
        assert_eq!(config.scroll.default_timeout_ms, 5000);
        assert_eq!(config.scroll.max_center_retries, 4);
        assert!(!config.llm.to_model().supports_vision());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag(" 0 ").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
