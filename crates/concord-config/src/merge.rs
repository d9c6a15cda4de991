//! Configuration merging.
//!
//! Merges several `RawConfig` files into one resolved `Config`. Configs arrive highest
//! precedence first; every setting takes the first defined value.

use std::path::PathBuf;

use crate::{
    AnalysisSettings, Config, SearchSettings, WindowSettings,
    parse::{RawAnalysisSettings, RawConfig, RawSearchSettings, RawWindowSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges configuration files into a single resolved `Config`.
///
/// Lists (`metadata`, `stop_words`) are replaced wholesale, not concatenated.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let mut window = WindowSettings::default();
    let mut search = SearchSettings::default();
    let mut analysis = AnalysisSettings::default();

    // Lowest precedence first so that closer files overwrite.
    for parsed in configs.iter().rev() {
        if let Some(raw) = &parsed.config.window {
            apply_raw_window(&mut window, raw);
        }
        if let Some(raw) = &parsed.config.search {
            apply_raw_search(&mut search, raw);
        }
        if let Some(raw) = &parsed.config.analysis {
            apply_raw_analysis(&mut analysis, raw);
        }
    }

    Config {
        window,
        search,
        analysis,
        config_root: configs
            .first()
            .and_then(|c| c.path.parent())
            .map(PathBuf::from),
    }
}

/// Applies raw window settings, overwriting any present values.
fn apply_raw_window(result: &mut WindowSettings, raw: &RawWindowSettings) {
    if let Some(v) = raw.tokens_before {
        result.tokens_before = v;
    }
    if let Some(v) = raw.tokens_after {
        result.tokens_after = v;
    }
    if let Some(v) = raw.trim_whitespace {
        result.trim_whitespace = v;
    }
    if let Some(v) = raw.compress_newlines {
        result.compress_newlines = v;
    }
    if let Some(v) = raw.filter_nulls {
        result.filter_nulls = v;
    }
    if let Some(v) = raw.sort_key {
        result.sort_key = v;
    }
    if let Some(v) = &raw.metadata {
        result.metadata.clone_from(v);
    }
    if let Some(v) = &raw.metadata_separator {
        result.metadata_separator.clone_from(v);
    }
}

/// Applies raw search settings.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = &raw.field {
        result.field.clone_from(v);
    }
    if let Some(v) = raw.allow_overlaps {
        result.allow_overlaps = v;
    }
    if let Some(v) = raw.max_hits {
        result.max_hits = Some(v);
    }
    if let Some(v) = &raw.id_field {
        result.id_field = Some(v.clone());
    }
}

/// Applies raw analysis settings.
fn apply_raw_analysis(result: &mut AnalysisSettings, raw: &RawAnalysisSettings) {
    if let Some(v) = &raw.stemmer {
        result.stemmer.clone_from(v);
    }
    if let Some(v) = &raw.stop_words {
        result.stop_words.clone_from(v);
    }
    if let Some(v) = raw.max_token_length {
        result.max_token_length = v;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{SortKeyKind, parse::parse_config_str};

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: parse_config_str(toml, Path::new(path)).unwrap(),
        }
    }

    #[test]
    fn empty_list_gives_defaults() {
        let config = merge_configs(&[]);
        assert_eq!(config.window.tokens_before, 10);
        assert_eq!(config.search.field, "body");
        assert!(config.config_root.is_none());
    }

    #[test]
    fn closest_value_wins() {
        let configs = [
            parsed("/p/child/.concord.toml", "[window]\ntokens_before = 3\n"),
            parsed(
                "/p/.concord.toml",
                "[window]\ntokens_before = 8\ntokens_after = 4\n",
            ),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.window.tokens_before, 3);
        assert_eq!(config.window.tokens_after, 4);
        assert_eq!(config.config_root, Some(PathBuf::from("/p/child")));
    }

    #[test]
    fn lists_replace_rather_than_append() {
        let configs = [
            parsed("/a/.concord.toml", "[analysis]\nstop_words = [\"a\"]\n"),
            parsed("/.concord.toml", "[analysis]\nstop_words = [\"the\", \"of\"]\n"),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.analysis.stop_words, vec!["a".to_string()]);
    }

    #[test]
    fn sections_merge_independently() {
        let configs = [
            parsed("/a/.concord.toml", "[search]\nmax_hits = 5\n"),
            parsed(
                "/.concord.toml",
                "[window]\nsort_key = \"post\"\n[search]\nfield = \"text\"\n",
            ),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.search.max_hits, Some(5));
        assert_eq!(config.search.field, "text");
        assert_eq!(config.window.sort_key, SortKeyKind::Post);
    }
}
