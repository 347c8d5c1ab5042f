use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};

use crate::wisdom::acceptance::AcceptancePolicy;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub wisdom: WisdomConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 15,
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 800,
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WisdomConfig {
    pub max_attempts: usize,
    pub acceptance_bar: usize,
    pub max_tips: usize,
    pub tips_requested: usize,
    pub rotation_interval_secs: u64,
}

impl Default for WisdomConfig {
    fn default() -> Self {
        let policy = AcceptancePolicy::default();
        WisdomConfig {
            max_attempts: policy.max_attempts,
            acceptance_bar: policy.acceptance_bar,
            max_tips: policy.max_tips,
            tips_requested: policy.tips_requested,
            rotation_interval_secs: 8,
        }
    }
}

impl WisdomConfig {
    pub fn policy(&self) -> AcceptancePolicy {
        AcceptancePolicy {
            max_attempts: self.max_attempts.max(1),
            acceptance_bar: self.acceptance_bar.max(1),
            max_tips: self.max_tips.max(1),
            tips_requested: self.tips_requested.max(1),
        }
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs.max(1))
    }

    /// Interval for `watch`, preferring an explicit number of seconds.
    pub fn watch_interval(&self, secs: Option<u64>) -> Duration {
        secs.map_or_else(|| self.rotation_interval(), |s| Duration::from_secs(s.max(1)))
    }
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("earth-wisdom")
        });

        // Ensure data directory exists
        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        // Try to load existing config
        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                tracing::warn!("Config file is empty, recreating defaults");
            } else {
                match serde_json::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.data_dir = data_dir;
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse existing config.json: {}", e);
                        tracing::warn!("Falling back to default configuration");
                        let mut config = Self::default_config(data_dir);
                        config.apply_env();
                        return Ok(config);
                    }
                }
            }
        }

        // Create default config
        let config = Self::default_config(data_dir);
        config.save()?;

        let mut config = config;
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            gemini: GeminiConfig::default(),
            wisdom: WisdomConfig::default(),
        }
    }

    // Check for environment variables if API key is empty
    fn apply_env(&mut self) {
        if self.gemini.api_key.as_ref().map_or(true, |key| key.is_empty()) {
            self.gemini.api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}
