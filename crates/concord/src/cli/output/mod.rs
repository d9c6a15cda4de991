//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use concord_index::{CollectorStats, ConcordanceWindow, FieldStats};
use concord_query::Query;
use serde::Serialize;

/// Collector counters as reported in JSON.
#[derive(Serialize)]
struct JsonStats {
    /// Documents that produced at least one candidate window.
    documents: usize,
    /// Windows accepted.
    windows: usize,
    /// Whether the crawl stopped at the hit cap.
    truncated: bool,
}

/// JSON output for `concord search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The query as searched.
    query: &'a Query,
    /// Field windows were cut from.
    field: &'a str,
    /// Collector counters.
    stats: JsonStats,
    /// Windows in output order.
    windows: &'a [ConcordanceWindow],
}

/// One field of `concord fields --json`.
#[derive(Serialize)]
struct JsonFieldStats<'a> {
    /// Field name.
    field: &'a str,
    /// Totals for the field.
    #[serde(flatten)]
    stats: FieldStats,
}

/// Pretty-prints a value as JSON.
fn print_json(value: &impl Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json_str) => {
            println!("{json_str}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Renders a window as one line: `pre [target] post`.
///
/// The id field's value, when the window carries one, prefixes the line.
pub fn render_window(window: &ConcordanceWindow, id_field: Option<&str>) -> String {
    let mut line = String::new();
    if let Some(id) = id_field.and_then(|f| window.metadata().get(f)) {
        line.push_str(id);
        line.push('\t');
    }
    if !window.pre().is_empty() {
        line.push_str(window.pre());
        line.push(' ');
    }
    line.push('[');
    line.push_str(window.target());
    line.push(']');
    if !window.post().is_empty() {
        line.push(' ');
        line.push_str(window.post());
    }
    line
}

/// Outputs search results as JSON.
pub fn output_search_json(
    query: &Query,
    field: &str,
    windows: &[ConcordanceWindow],
    stats: CollectorStats,
) -> ExitCode {
    print_json(&JsonSearchOutput {
        query,
        field,
        stats: JsonStats {
            documents: stats.documents,
            windows: stats.windows,
            truncated: stats.hit_max(),
        },
        windows,
    })
}

/// Outputs per-field totals, as JSON or in the indented text layout.
pub fn output_field_stats(fields: &[(String, FieldStats)], json: bool) -> ExitCode {
    if json {
        let rows: Vec<_> = fields
            .iter()
            .map(|(field, stats)| JsonFieldStats {
                field,
                stats: *stats,
            })
            .collect();
        return print_json(&rows);
    }

    for (field, stats) in fields {
        println!("{field}:");
        println!("\tDocCount: {}", stats.num_docs);
        println!("\tUniqTerms: {}", stats.unique_terms);
        println!("\tSumDocFreq: {}", stats.sum_doc_freq);
        println!("\tTotalTokens: {}", stats.total_tokens);
    }
    ExitCode::SUCCESS
}
