//! Import configuration
//!
//! Loaded from a TOML file (explicit `--config` path, or
//! `<config dir>/telepoem-import/config.toml` when present), then overridden
//! by environment variables. Every field has a default so an empty or missing
//! file is valid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Environment variable overriding `database_url`
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable overriding `audio.bucket`
pub const ENV_AUDIO_BUCKET: &str = "TELEPOEM_AUDIO_BUCKET";
/// Environment variable overriding `audio.endpoint`
pub const ENV_AUDIO_ENDPOINT: &str = "TELEPOEM_AUDIO_ENDPOINT";

const CONFIG_DIR_NAME: &str = "telepoem-import";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite connection string
    pub database_url: String,
    pub import: ImportConfig,
    pub audio: AudioConfig,
}

/// How poems are matched against existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PoemKeyPolicy {
    /// Match on the sanitized telepoem number alone
    #[default]
    TelepoemNumber,
    /// Match on title plus the poet of the same spreadsheet row
    TitleAndPoet,
}

impl PoemKeyPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            PoemKeyPolicy::TelepoemNumber => "telepoem number",
            PoemKeyPolicy::TitleAndPoet => "title and poet",
        }
    }
}

/// Serialization of resolved lookup id lists stored on a poem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdListFormat {
    /// `id1,id2`
    #[default]
    Comma,
    /// `[id1,id2]`
    Bracketed,
}

/// Pipeline behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub poem_key: PoemKeyPolicy,
    pub id_list_format: IdListFormat,
    /// Maximum poem types kept per poem (0 = no limit)
    pub max_poem_types: usize,
    /// Maximum poem topics kept per poem (0 = no limit)
    pub max_poem_topics: usize,
    /// Maximum special tags kept per poem (0 = no limit)
    pub max_special_tags: usize,
    /// Maximum languages kept per poem (0 = no limit)
    pub max_languages: usize,
}

/// Where poem recordings live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Bucket to list recordings from; no bucket and no manifest disables audio matching
    pub bucket: Option<String>,
    /// Listing endpoint, `{bucket}` is substituted
    pub endpoint: String,
    /// Key prefix recordings are stored under
    pub prefix: String,
    /// Public link template, `{bucket}` and `{key}` are substituted
    pub url_template: String,
    /// Newline-separated key list used instead of a bucket listing
    pub manifest: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://telepoem.db?mode=rwc".to_string(),
            import: ImportConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            poem_key: PoemKeyPolicy::default(),
            id_list_format: IdListFormat::default(),
            max_poem_types: 2,
            max_poem_topics: 3,
            max_special_tags: 0,
            max_languages: 0,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: "https://{bucket}.s3.amazonaws.com".to_string(),
            prefix: "poem/audio".to_string(),
            url_template: "https://{bucket}.s3.amazonaws.com/{key}".to_string(),
            manifest: None,
        }
    }
}

impl ImportConfig {
    /// Turn a configured maximum into an optional cap
    pub fn cap(max: usize) -> Option<usize> {
        if max == 0 { None } else { Some(max) }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration, then apply environment overrides.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default_path) => Self::from_file(&default_path)?,
                None => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject values the importer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(invalid("database_url", "must not be empty"));
        }
        if !self.audio.url_template.contains("{key}") {
            return Err(invalid("audio.url_template", "must contain {key}"));
        }
        if self.audio.bucket.is_some() && self.audio.endpoint.trim().is_empty() {
            return Err(invalid("audio.endpoint", "must be set when a bucket is configured"));
        }
        Ok(())
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(bucket) = non_empty(ENV_AUDIO_BUCKET) {
            self.audio.bucket = Some(bucket);
        }
        if let Some(endpoint) = non_empty(ENV_AUDIO_ENDPOINT) {
            self.audio.endpoint = endpoint;
        }
    }
}

fn invalid(field: &str, reason: &str) -> anyhow::Error {
    ImportError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
