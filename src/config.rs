//! Configuration file at ~/.ipsift/config.toml.
//!
//! Every key is optional. `[[providers]]` tables add profiles or replace a built-in
//! profile of the same name.

use crate::lookup::{builtin_profiles, ProviderProfile};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
}

fn default_provider() -> String {
    "qjqq".into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            store_path: None,
            providers: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ipsift")
            .join("config.toml")
    }

    /// Read the config file. A missing file yields the defaults; a broken one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Built-in profiles overlaid with the configured ones.
    pub fn profiles(&self) -> Vec<ProviderProfile> {
        let mut profiles = builtin_profiles();
        for custom in &self.providers {
            match profiles.iter_mut().find(|p| p.name == custom.name) {
                Some(existing) => *existing = custom.clone(),
                None => profiles.push(custom.clone()),
            }
        }
        profiles
    }

    /// The profile named by `provider`.
    pub fn active_profile(&self) -> Result<ProviderProfile> {
        let profiles = self.profiles();
        profiles
            .iter()
            .find(|p| p.name == self.provider)
            .cloned()
            .ok_or_else(|| {
                let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
                anyhow!("unknown provider '{}' (available: {})", self.provider, names.join(", "))
            })
    }
}
