//
//  schematics-cli
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Settings for `sch` are kept in a TOML file in the platform config
//! directory:
//!
//! - **Linux**: `~/.config/sch/config.toml`
//! - **macOS**: `~/Library/Application Support/sch/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\sch\config\config.toml`
//!
//! `SCH_CONFIG` points `sch` at a different file.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [core]
//! region = "eu-de"
//! visibility = "private"
//! resource_group = "Default"
//! output = "table"
//! prompt = "enabled"
//!
//! [retry]
//! max_retries = 3
//! retry_interval_secs = 1
//! max_retry_interval_secs = 30
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use schematics_cli::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut config = Config::load()?;
//! config.set("region", "us-east")?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Submodules
//!
//! - [`file`](read_config_file): configuration file I/O
//! - [`retry`](RetryConfig): the `[retry]` section

mod file;
mod retry;

pub use file::*;
pub use retry::*;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::api::common::{Region, Visibility};
use crate::output::OutputFormat;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "SCH_CONFIG";

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const KEYS: [&str; 10] = [
    "region",
    "visibility",
    "resource_group",
    "output",
    "endpoint",
    "iam_endpoint",
    "prompt",
    "max_retries",
    "retry_interval_secs",
    "max_retry_interval_secs",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// The `[core]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub region: Region,

    #[serde(default)]
    pub visibility: Visibility,

    /// Resource group used when a create request does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub output: OutputFormat,

    /// Schematics endpoint override; wins over region and visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// IAM endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_endpoint: Option<String>,

    /// `enabled` or `disabled`; disabled behaves like `--no-prompt`.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "enabled".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            visibility: Visibility::default(),
            resource_group: None,
            output: OutputFormat::default(),
            endpoint: None,
            iam_endpoint: None,
            prompt: default_prompt(),
        }
    }
}

impl Config {
    /// Loads the config file, or the defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !config_exists(path) {
            return Ok(Self::default());
        }
        let content = read_config_file(path)?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_config_file(path, &content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Path of the config file: `SCH_CONFIG`, else the platform config dir.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", crate::APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns `true` unless prompting has been disabled in the config.
    pub fn prompt_enabled(&self) -> bool {
        self.core.prompt != "disabled"
    }

    /// Every key with its current value; unset values are `None`.
    pub fn keys(&self) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter().map(|key| (*key, self.get(key))).collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "region" => Some(self.core.region.to_string()),
            "visibility" => Some(self.core.visibility.to_string()),
            "resource_group" => self.core.resource_group.clone(),
            "output" => Some(self.core.output.to_string()),
            "endpoint" => self.core.endpoint.clone(),
            "iam_endpoint" => self.core.iam_endpoint.clone(),
            "prompt" => Some(self.core.prompt.clone()),
            "max_retries" => Some(self.retry.max_retries.to_string()),
            "retry_interval_secs" => Some(self.retry.retry_interval_secs.to_string()),
            "max_retry_interval_secs" => Some(self.retry.max_retry_interval_secs.to_string()),
            _ => None,
        }
    }

    /// Sets a key after validating the value. An empty value clears
    /// optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "region" => self.core.region = value.parse()?,
            "visibility" => self.core.visibility = value.parse()?,
            "output" => self.core.output = value.parse()?,
            "resource_group" => self.core.resource_group = optional(value),
            "endpoint" => self.core.endpoint = optional(value).map(validate_url).transpose()?,
            "iam_endpoint" => {
                self.core.iam_endpoint = optional(value).map(validate_url).transpose()?
            }
            "prompt" => match value {
                "enabled" | "disabled" => self.core.prompt = value.to_string(),
                _ => bail!("prompt must be 'enabled' or 'disabled'"),
            },
            "max_retries" => self.retry.max_retries = parse_number(key, value)?,
            "retry_interval_secs" => self.retry.retry_interval_secs = parse_number(key, value)?,
            "max_retry_interval_secs" => {
                self.retry.max_retry_interval_secs = parse_number(key, value)?
            }
            _ => bail!(
                "Unknown configuration key '{}'. Valid keys: {}",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn validate_url(value: String) -> Result<String> {
    let url = url::Url::parse(&value).with_context(|| format!("'{}' is not a valid URL", value))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("'{}' must be an http or https URL", value);
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer, got '{}'", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.core.region, Region::UsSouth);
        assert_eq!(config.core.visibility, Visibility::Public);
        assert_eq!(config.core.output, OutputFormat::Table);
        assert!(config.prompt_enabled());
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        config.set("region", "eu-de").unwrap();
        config.set("visibility", "private").unwrap();
        config.set("output", "yaml").unwrap();
        config.set("endpoint", "https://example.test/").unwrap();
        config.set("max_retries", "0").unwrap();

        assert_eq!(config.get("region").as_deref(), Some("eu-de"));
        assert_eq!(config.get("visibility").as_deref(), Some("private"));
        assert_eq!(config.get("output").as_deref(), Some("yaml"));
        assert_eq!(config.get("endpoint").as_deref(), Some("https://example.test"));
        assert_eq!(config.retry.max_retries, 0);

        assert!(config.set("region", "mars").is_err());
        assert!(config.set("output", "xml").is_err());
        assert!(config.set("endpoint", "ftp://example.test").is_err());
        assert!(config.set("max_retries", "-1").is_err());
        assert!(config.set("prompt", "sometimes").is_err());
        assert!(config.set("editor", "vim").is_err());
    }

    #[test]
    fn test_empty_value_clears_optional_key() {
        let mut config = Config::default();
        config.set("resource_group", "Default").unwrap();
        assert_eq!(config.get("resource_group").as_deref(), Some("Default"));
        config.set("resource_group", "").unwrap();
        assert_eq!(config.get("resource_group"), None);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("region", "us-east").unwrap();
        config.set("iam_endpoint", "https://private.iam.cloud.ibm.com").unwrap();
        config.set("retry_interval_secs", "2").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_file(&path, "[core]\nregion = \"eu-gb\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.core.region, Region::EuGb);
        assert_eq!(loaded.core.prompt, "enabled");
        assert_eq!(loaded.retry, RetryConfig::default());
    }

    #[test]
    fn test_keys_lists_every_key() {
        let keys = Config::default().keys();
        assert_eq!(keys.len(), KEYS.len());
        assert!(keys.iter().any(|(k, v)| *k == "endpoint" && v.is_none()));
    }
}
