// ABOUTME: Engine configuration for the wizard engine
// Service endpoints, timeouts, debounce window, and media capacity

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remote service endpoints and credentials
    #[serde(default)]
    pub services: ServiceConfig,

    /// Timeout for one AI generation call, in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Timeout for the listing submission POST, in seconds
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,

    /// Quiet window before a draft write is flushed, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub draft_debounce_ms: u64,

    /// Maximum number of media attachments per session
    #[serde(default = "default_media_capacity")]
    pub media_capacity: usize,

    /// Form-data key whose value drives branding derivation
    #[serde(default = "default_primary_color_field")]
    pub primary_color_field: String,

    /// Override for the draft directory (defaults under the user data dir)
    #[serde(default)]
    pub draft_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the AI generation service
    #[serde(default = "default_generation_url")]
    pub generation_url: String,

    /// Base URL of the CRM/property backend
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Base URL of the image/asset storage service
    #[serde(default = "default_asset_url")]
    pub asset_url: String,

    /// Bearer token sent to all three services
    #[serde(default)]
    pub api_token: Option<String>,
}

fn default_generation_timeout() -> u64 {
    15
}

fn default_submit_timeout() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_media_capacity() -> usize {
    24
}

fn default_primary_color_field() -> String {
    "primary_color".to_string()
}

fn default_generation_url() -> String {
    "https://assist.listwise.dev".to_string()
}

fn default_listing_url() -> String {
    "https://api.listwise.dev".to_string()
}

fn default_asset_url() -> String {
    "https://assets.listwise.dev".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            generation_url: default_generation_url(),
            listing_url: default_listing_url(),
            asset_url: default_asset_url(),
            api_token: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            services: ServiceConfig::default(),
            generation_timeout_secs: default_generation_timeout(),
            submit_timeout_secs: default_submit_timeout(),
            draft_debounce_ms: default_debounce_ms(),
            media_capacity: default_media_capacity(),
            primary_color_field: default_primary_color_field(),
            draft_dir: None,
        }
    }
}

impl EngineConfig {
    /// Get the path to the engine config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".listwise/config.toml"))
    }

    /// Load config from the default location, falling back to defaults
    /// when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load config from an explicit path
    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse engine config from {}", path.display()))?;

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize engine config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write engine config to {}", path.display()))?;

        Ok(())
    }

    pub fn generation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn submit_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn draft_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.draft_debounce_ms)
    }
}
