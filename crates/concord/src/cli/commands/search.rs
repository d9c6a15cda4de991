//! Implementation of `concord search`.

use std::{
    io::{self, Read},
    process::ExitCode,
};

use concord_config::{Config, SortKeyKind};
use concord_index::{
    CallbackCollector, ConcordanceError, ConcordanceIndex, ConcordanceSearcher, ConcordanceWindow,
    ListCollector, SortedCollector, WindowCollector, analyze_with_positions,
};
use concord_query::Query;
use log::debug;

use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{output_search_json, render_window},
};

/// Applies command-line overrides on top of the loaded configuration.
fn effective_config(base: &Config, cmd: &SearchCommand) -> Config {
    let mut config = base.clone();
    if let Some(field) = &cmd.field {
        config.search.field.clone_from(field);
    }
    if let Some(before) = cmd.before {
        config.window.tokens_before = before;
    }
    if let Some(after) = cmd.after {
        config.window.tokens_after = after;
    }
    if let Some(sort) = cmd.sort {
        config.window.sort_key = sort;
    }
    if cmd.max_hits.is_some() {
        config.search.max_hits = cmd.max_hits;
    }
    if !cmd.metadata.is_empty() {
        config.window.metadata.clone_from(&cmd.metadata);
    }
    config.search.allow_overlaps |= cmd.allow_overlaps;
    config
}

/// Whether windows must be buffered and sorted before printing.
///
/// A configured sort key other than the default applies even when no
/// `--sort` or `--top` is given.
fn wants_sorting(config: &Config, cmd: &SearchCommand) -> bool {
    cmd.sort.is_some() || cmd.top.is_some() || config.window.sort_key != SortKeyKind::default()
}

/// Builds a phrase query by analyzing `text` with the field's analyzer.
///
/// Token positions are kept, so words the analyzer drops leave gaps the
/// phrase tolerates. A single token becomes a term query.
fn phrase_query(
    index: &ConcordanceIndex,
    field: &str,
    text: &str,
) -> Result<Query, ConcordanceError> {
    let mut analyzer = index.analyzer_for(field)?;
    let mut tokens = analyze_with_positions(&mut analyzer, text);
    if tokens.len() == 1 {
        let (text, _) = tokens.remove(0);
        return Ok(Query::Term {
            field: field.to_string(),
            text,
        });
    }
    let (terms, positions) = tokens.into_iter().unzip();
    Ok(Query::Phrase {
        field: field.to_string(),
        terms,
        positions,
        slop: 0,
    })
}

/// Reads the query from the arguments, or from stdin when none is given.
fn read_query(index: &ConcordanceIndex, field: &str, cmd: &SearchCommand) -> Result<Query, String> {
    if let Some(text) = &cmd.phrase {
        let query = phrase_query(index, field, text).map_err(|e| e.to_string())?;
        if matches!(&query, Query::Phrase { terms, .. } if terms.is_empty()) {
            return Err(format!("phrase '{text}' has no indexable terms"));
        }
        return Ok(query);
    }

    let json = match &cmd.query {
        Some(json) => json.clone(),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read query from stdin: {e}"))?;
            buf
        }
    };
    serde_json::from_str(&json).map_err(|e| format!("invalid query: {e}"))
}

/// Searches the corpus and prints one window per hit.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let config = effective_config(&ctx.config, cmd);
    let field = config.search.field.clone();
    let max_hits = config.search.max_hits;

    let index = match ctx.open_index(&cmd.index) {
        Ok(index) => index,
        Err(code) => return code,
    };
    let query = match read_query(&index, &field, cmd) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("searching {field} for {query:?}");

    let mut searcher = ConcordanceSearcher::from_config(&index, &config);
    let id_field = config.search.id_field.as_deref();

    if wants_sorting(&config, cmd) {
        let mut collector = SortedCollector::new(cmd.top, max_hits);
        if let Err(code) = search(&mut searcher, &query, &field, &mut collector) {
            return code;
        }
        let stats = collector.stats();
        let windows = collector.into_sorted_windows();
        if cmd.json {
            return output_search_json(&query, &field, &windows, stats);
        }
        for window in &windows {
            println!("{}", render_window(window, id_field));
        }
        return ExitCode::SUCCESS;
    }

    if cmd.json {
        let mut collector = ListCollector::new(max_hits);
        if let Err(code) = search(&mut searcher, &query, &field, &mut collector) {
            return code;
        }
        let stats = collector.stats();
        return output_search_json(&query, &field, collector.windows(), stats);
    }

    let mut collector = CallbackCollector::new(max_hits, |window: &ConcordanceWindow| {
        println!("{}", render_window(window, id_field));
    });
    match search(&mut searcher, &query, &field, &mut collector) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

/// Runs the search, reporting failures consistently.
fn search(
    searcher: &mut ConcordanceSearcher<'_>,
    query: &Query,
    field: &str,
    collector: &mut dyn WindowCollector,
) -> Result<(), ExitCode> {
    searcher.search(query, field, None, collector).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })?;
    let stats = collector.stats();
    debug!("{} windows from {} documents", stats.windows, stats.documents);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use concord_config::AnalysisSettings;
    use concord_index::{CorpusDocument, CorpusField, CorpusWriter};

    use super::*;

    fn command() -> SearchCommand {
        SearchCommand {
            index: PathBuf::from("idx"),
            query: None,
            phrase: None,
            field: None,
            before: None,
            after: None,
            max_hits: None,
            sort: None,
            top: None,
            allow_overlaps: false,
            metadata: Vec::new(),
            json: false,
        }
    }

    #[test]
    fn overrides_replace_configured_values() {
        let cmd = SearchCommand {
            field: Some("title".to_string()),
            before: Some(2),
            sort: Some(SortKeyKind::Post),
            max_hits: Some(5),
            allow_overlaps: true,
            ..command()
        };
        let config = effective_config(&Config::default(), &cmd);
        assert_eq!(config.search.field, "title");
        assert_eq!(config.window.tokens_before, 2);
        assert_eq!(config.window.tokens_after, 10);
        assert_eq!(config.window.sort_key, SortKeyKind::Post);
        assert_eq!(config.search.max_hits, Some(5));
        assert!(config.search.allow_overlaps);
    }

    #[test]
    fn configured_sort_key_enables_sorting() {
        let cmd = command();
        assert!(!wants_sorting(&Config::default(), &cmd));

        let mut config = Config::default();
        config.window.sort_key = SortKeyKind::Pre;
        assert!(wants_sorting(&effective_config(&config, &cmd), &cmd));

        let top = SearchCommand {
            top: Some(3),
            ..command()
        };
        assert!(wants_sorting(&Config::default(), &top));
    }

    #[test]
    fn phrase_keeps_stop_word_gaps() {
        let analysis = AnalysisSettings {
            stop_words: vec!["of".to_string()],
            ..AnalysisSettings::default()
        };
        let writer = CorpusWriter::create_in_ram(&[CorpusField::text("body")], &analysis).unwrap();
        let index = writer.finish().unwrap();

        let query = phrase_query(&index, "body", "Bank of England").unwrap();
        assert_eq!(
            query,
            Query::Phrase {
                field: "body".to_string(),
                terms: vec!["bank".to_string(), "england".to_string()],
                positions: vec![0, 2],
                slop: 0,
            }
        );

        let single = phrase_query(&index, "body", "Fox").unwrap();
        assert_eq!(
            single,
            Query::Term {
                field: "body".to_string(),
                text: "fox".to_string(),
            }
        );
    }

    #[test]
    fn phrase_of_stop_words_is_rejected() {
        let analysis = AnalysisSettings {
            stop_words: vec!["of".to_string()],
            ..AnalysisSettings::default()
        };
        let mut writer =
            CorpusWriter::create_in_ram(&[CorpusField::text("body")], &analysis).unwrap();
        writer
            .add_document(&CorpusDocument::new().with("body", "of"))
            .unwrap();
        let index = writer.finish().unwrap();
        let cmd = SearchCommand {
            phrase: Some("of".to_string()),
            ..command()
        };
        assert!(read_query(&index, "body", &cmd).is_err());
    }
}
