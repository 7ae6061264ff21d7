//! Resolved settings with provenance
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config file (`~/.config/oip/record.toml` or `--config`)
//! 3. CLI overrides

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{builtin_layer, DEFAULT_LOG_FILTER, DEFAULT_SEARCH_PREFIX_LEN};
use super::merge::{merge_layers, toml_to_json};
use oip_wire::ErrorCode;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::MalformedInput
    }
}

/// Settings for chunk lookups against the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSettings {
    /// Characters of a txid used for chunk searches (1..=64).
    pub search_prefix_len: usize,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins over it.
    pub log_filter: String,
    pub index: IndexSettings,
}

/// Where a layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Settings plus the layers that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub sources: Vec<ConfigSource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            index: IndexSettings {
                search_prefix_len: DEFAULT_SEARCH_PREFIX_LEN,
            },
        }
    }
}

impl Settings {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("oip").join("record.toml"))
    }

    /// Merge builtin defaults, the file at `path` (skipped if missing) and
    /// `overrides`, then validate.
    pub fn load(path: Option<&Path>, overrides: Option<Value>) -> Result<LoadedSettings, ConfigError> {
        let mut layers = vec![builtin_layer()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = path.filter(|p| p.exists()) {
            let (layer, digest) = read_toml(path)?;
            layers.push(layer);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let settings: Settings = serde_json::from_value(merge_layers(layers))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(LoadedSettings { settings, sources })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.index.search_prefix_len) {
            return Err(ConfigError::Validation(
                "index.search_prefix_len must be in [1, 64]".to_string(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Validation("log_filter must not be empty".to_string()));
        }
        Ok(())
    }
}

fn read_toml(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let text = String::from_utf8(bytes)
        .map_err(|e| ConfigError::Parse(format!("invalid UTF-8: {}", e)))?;
    let parsed: toml::Value =
        toml::from_str(&text).map_err(|e| ConfigError::Parse(format!("TOML: {}", e)))?;
    Ok((toml_to_json(parsed), digest))
}
