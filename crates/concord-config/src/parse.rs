//! Configuration file parsing.
//!
//! Parses individual `.concord.toml` files into `RawConfig` structures that keep every
//! field optional until merging.

use std::{fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::{ConfigError, SortKeyKind};

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Window construction section.
    pub window: Option<RawWindowSettings>,
    /// Search section.
    pub search: Option<RawSearchSettings>,
    /// Analysis section.
    pub analysis: Option<RawAnalysisSettings>,
}

/// Raw `[window]` settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWindowSettings {
    /// Tokens of context before the target.
    pub tokens_before: Option<usize>,
    /// Tokens of context after the target.
    pub tokens_after: Option<usize>,
    /// Trim leading and trailing whitespace from stored values.
    pub trim_whitespace: Option<bool>,
    /// Collapse runs of newlines in stored values.
    pub compress_newlines: Option<bool>,
    /// Skip null and empty stored values.
    pub filter_nulls: Option<bool>,
    /// Portion of the window used as its sort key.
    pub sort_key: Option<SortKeyKind>,
    /// Stored fields copied into each window. A single string or a list.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub metadata: Option<Vec<String>>,
    /// Separator between values of a multi-valued metadata field.
    pub metadata_separator: Option<String>,
}

/// Raw `[search]` settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchSettings {
    /// Field windows are cut from.
    pub field: Option<String>,
    /// Keep overlapping hits in the same document.
    pub allow_overlaps: Option<bool>,
    /// Stop after this many windows.
    pub max_hits: Option<usize>,
    /// Stored field identifying documents in output.
    pub id_field: Option<String>,
}

/// Raw `[analysis]` settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAnalysisSettings {
    /// Stemming language, or "none".
    pub stemmer: Option<String>,
    /// Words removed by the analyzer. A single string or a list.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub stop_words: Option<Vec<String>>,
    /// Tokens longer than this many bytes are dropped.
    pub max_token_length: Option<usize>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    let config: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    check_values(&config, path)?;
    Ok(config)
}

/// Rejects values that parse but can never work.
fn check_values(config: &RawConfig, path: &Path) -> Result<(), ConfigError> {
    let invalid = |key, message: &str| ConfigError::InvalidValue {
        path: path.to_path_buf(),
        key,
        message: message.to_string(),
    };

    if let Some(analysis) = &config.analysis
        && analysis.max_token_length == Some(0)
    {
        return Err(invalid("analysis.max_token_length", "must be at least 1"));
    }
    if let Some(search) = &config.search
        && search.field.as_deref().is_some_and(|f| f.trim().is_empty())
    {
        return Err(invalid("search.field", "must not be empty"));
    }
    Ok(())
}

/// Parses configuration from a TOML string without path context (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
