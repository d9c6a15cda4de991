//! Configuration system for concord.
//!
//! concord reads TOML files named `.concord.toml`. Configuration is resolved by walking up the
//! directory tree from the working directory, collecting every `.concord.toml` found, then
//! loading `~/.concord.toml` with the lowest precedence.
//!
//! ```toml
//! [window]
//! tokens_before = 5
//! tokens_after = 5
//! metadata = ["title", "date"]
//!
//! [search]
//! field = "body"
//! max_hits = 100
//! ```

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

pub use discovery::{
    CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config,
    require_global_config_path,
};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawAnalysisSettings, RawConfig, RawSearchSettings, RawWindowSettings, parse_config_file,
    parse_config_str,
};
use serde::{Deserialize, Serialize};
pub use templates::{global_template, local_template};
pub use validate::{ConfigWarning, KNOWN_STEMMERS, MAX_CONTEXT_TOKENS};
use validate::validate_config;

/// Fully merged configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Window construction settings.
    pub window: WindowSettings,
    /// Search settings.
    pub search: SearchSettings,
    /// Analyzer settings.
    pub analysis: AnalysisSettings,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Discovers and merges all `.concord.toml` files relevant to `cwd`.
    ///
    /// Returns `Ok(Config::default())` when no file is found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        Self::load_from_files(&discover_config_files(cwd))
    }

    /// Loads configuration from explicit files, highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                Ok(ParsedConfig {
                    path: path.clone(),
                    config: parse_config_file(path)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings in `.concord.toml` form.
    pub fn settings_to_toml(&self) -> Result<String, toml::ser::Error> {
        let serializable = SerializableSettings {
            window: &self.window,
            search: &self.search,
            analysis: &self.analysis,
        };
        toml::to_string_pretty(&serializable)
    }
}

/// Which part of a window its sort key is taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKeyKind {
    /// Target followed by post-context.
    #[default]
    TargetPost,
    /// Target only.
    Target,
    /// Pre-context, read left to right.
    Pre,
    /// Pre-context tokens in reverse order, nearest the target first.
    PreReversed,
    /// Post-context only.
    Post,
    /// Document order.
    Doc,
}

impl SortKeyKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::TargetPost,
        Self::Target,
        Self::Pre,
        Self::PreReversed,
        Self::Post,
        Self::Doc,
    ];

    /// The configuration spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TargetPost => "target_post",
            Self::Target => "target",
            Self::Pre => "pre",
            Self::PreReversed => "pre_reversed",
            Self::Post => "post",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for SortKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown sort key '{s}', expected one of {}", names.join(", "))
            })
    }
}

/// `[window]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Tokens of context before the target.
    pub tokens_before: usize,
    /// Tokens of context after the target.
    pub tokens_after: usize,
    /// Trim leading and trailing whitespace from stored values.
    pub trim_whitespace: bool,
    /// Collapse runs of newlines in stored values.
    pub compress_newlines: bool,
    /// Skip null and empty stored values.
    pub filter_nulls: bool,
    /// Portion of the window used as its sort key.
    pub sort_key: SortKeyKind,
    /// Stored fields copied into each window.
    pub metadata: Vec<String>,
    /// Separator between values of a multi-valued metadata field.
    pub metadata_separator: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            tokens_before: 10,
            tokens_after: 10,
            trim_whitespace: true,
            compress_newlines: false,
            filter_nulls: true,
            sort_key: SortKeyKind::default(),
            metadata: Vec::new(),
            metadata_separator: String::from(" | "),
        }
    }
}

/// `[search]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Field windows are cut from.
    pub field: String,
    /// Keep overlapping hits in the same document.
    pub allow_overlaps: bool,
    /// Stop after this many windows; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hits: Option<usize>,
    /// Stored field identifying documents in output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            field: String::from("body"),
            allow_overlaps: false,
            max_hits: None,
            id_field: None,
        }
    }
}

/// `[analysis]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Stemming language, or "none".
    pub stemmer: String,
    /// Words removed by the analyzer.
    pub stop_words: Vec<String>,
    /// Tokens longer than this many bytes are dropped.
    pub max_token_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            stemmer: String::from("none"),
            stop_words: Vec::new(),
            max_token_length: 40,
        }
    }
}

/// Borrowed view of the settings for TOML output.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// Window settings.
    window: &'a WindowSettings,
    /// Search settings.
    search: &'a SearchSettings,
    /// Analysis settings.
    analysis: &'a AnalysisSettings,
}
