//! Term statistics: most frequent terms and per-field totals.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    str,
};

use log::{debug, warn};
use serde::Serialize;

use crate::{ConcordanceError, ConcordanceIndex, IndexError};

/// Selection of the most frequent terms of a field.
#[derive(Debug, Clone, Default)]
pub struct TopTermsRequest {
    /// How many terms to keep; all of them when unset.
    pub top_n: Option<usize>,
    /// Smallest accepted document frequency.
    pub min_doc_freq: Option<u64>,
    /// Largest accepted document frequency.
    pub max_doc_freq: Option<u64>,
    /// Smallest accepted document frequency, in percent of all documents.
    pub min_doc_percent: Option<f64>,
    /// Largest accepted document frequency, in percent of all documents.
    pub max_doc_percent: Option<f64>,
    /// Append the document frequency to each output row.
    pub include_doc_freq: bool,
    /// Terms never reported.
    pub stop_words: HashSet<String>,
    /// Terms written ahead of the ranked terms and excluded from the ranking.
    pub start_words: Vec<String>,
}

impl TopTermsRequest {
    /// Whether a term with this document frequency passes every bound.
    fn accepts(&self, doc_freq: u64, num_docs: u64) -> bool {
        if self.min_doc_freq.is_some_and(|min| doc_freq < min) {
            return false;
        }
        if self.max_doc_freq.is_some_and(|max| doc_freq > max) {
            return false;
        }
        let percent = if num_docs == 0 {
            0.0
        } else {
            doc_freq as f64 * 100.0 / num_docs as f64
        };
        if self.min_doc_percent.is_some_and(|min| percent < min) {
            return false;
        }
        !self.max_doc_percent.is_some_and(|max| percent > max)
    }

    /// Whether `term` is excluded by the word lists.
    fn excludes(&self, term: &str) -> bool {
        self.stop_words.contains(term) || self.start_words.iter().any(|w| w == term)
    }
}

/// A term and the number of documents containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    /// Indexed term text.
    pub term: String,
    /// Document frequency across all segments.
    pub doc_freq: u64,
}

impl TermCount {
    /// Renders the output row: the term, then a tab and the document
    /// frequency when requested. Whitespace runs in the term become one space.
    pub fn render(&self, include_doc_freq: bool) -> String {
        let term = self.term.split_whitespace().collect::<Vec<_>>().join(" ");
        if include_doc_freq {
            format!("{term}\t{}", self.doc_freq)
        } else {
            term
        }
    }
}

/// Totals for one indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldStats {
    /// Live documents in the index.
    pub num_docs: u64,
    /// Distinct indexed terms.
    pub unique_terms: u64,
    /// Sum of the document frequencies of all terms.
    pub sum_doc_freq: u64,
    /// Tokens indexed in the field.
    pub total_tokens: u64,
}

/// Outcome of [`write_top_terms`].
#[derive(Debug, Default)]
pub struct TermDumpReport {
    /// Files written.
    pub written: Vec<PathBuf>,
    /// Files left alone because they already existed.
    pub skipped: Vec<PathBuf>,
}

/// Document frequency of every term of `field`, merged across segments.
fn merged_doc_freqs(
    index: &ConcordanceIndex,
    field: &str,
) -> Result<BTreeMap<String, u64>, ConcordanceError> {
    let handle = index.field(field)?;
    let searcher = index.searcher();
    let mut freqs = BTreeMap::new();
    for segment in searcher.segment_readers() {
        let inverted_index = segment.inverted_index(handle)?;
        let mut stream = inverted_index.terms().stream()?;
        while stream.advance() {
            let Ok(term) = str::from_utf8(stream.key()) else {
                continue;
            };
            let doc_freq = u64::from(stream.value().doc_freq);
            *freqs.entry(term.to_string()).or_insert(0) += doc_freq;
        }
    }
    Ok(freqs)
}

/// The most frequent terms of `field` passing the request's bounds, by
/// descending document frequency then term.
pub fn top_terms(
    index: &ConcordanceIndex,
    field: &str,
    request: &TopTermsRequest,
) -> Result<Vec<TermCount>, ConcordanceError> {
    let num_docs = index.num_docs();
    let mut terms: Vec<TermCount> = merged_doc_freqs(index, field)?
        .into_iter()
        .filter(|(term, df)| request.accepts(*df, num_docs) && !request.excludes(term))
        .map(|(term, doc_freq)| TermCount { term, doc_freq })
        .collect();
    terms.sort_by(|a, b| b.doc_freq.cmp(&a.doc_freq).then_with(|| a.term.cmp(&b.term)));
    if let Some(n) = request.top_n {
        terms.truncate(n);
    }
    debug!("field {field}: {} top terms", terms.len());
    Ok(terms)
}

/// Computes the totals of `field`.
pub fn field_stats(index: &ConcordanceIndex, field: &str) -> Result<FieldStats, ConcordanceError> {
    let handle = index.field(field)?;
    let freqs = merged_doc_freqs(index, field)?;
    let searcher = index.searcher();
    let mut total_tokens = 0;
    for segment in searcher.segment_readers() {
        total_tokens += segment.inverted_index(handle)?.total_num_tokens();
    }
    Ok(FieldStats {
        num_docs: index.num_docs(),
        unique_terms: freqs.len() as u64,
        sum_doc_freq: freqs.values().sum(),
        total_tokens,
    })
}

/// Writes the top terms of each field.
///
/// Without `output` the rows of every field go to `stdout`. When `output` is
/// a directory, each field gets a file named after it inside; otherwise all
/// fields target the one file. Files are written start words first and are
/// never overwritten: an existing file is reported and skipped.
pub fn write_top_terms(
    index: &ConcordanceIndex,
    fields: &[String],
    request: &TopTermsRequest,
    output: Option<&Path>,
    stdout: &mut dyn Write,
) -> Result<TermDumpReport, ConcordanceError> {
    let mut report = TermDumpReport::default();
    for field in fields {
        let terms = top_terms(index, field, request)?;
        let Some(output) = output else {
            for term in &terms {
                writeln!(stdout, "{}", term.render(request.include_doc_freq))?;
            }
            continue;
        };

        let path = if output.is_dir() {
            output.join(field)
        } else {
            output.to_path_buf()
        };
        if path.exists() {
            warn!("{} already exists; skipping field {field}", path.display());
            report.skipped.push(path);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = io::BufWriter::new(fs::File::create(&path)?);
        for word in &request.start_words {
            writeln!(file, "{word}")?;
        }
        for term in &terms {
            writeln!(file, "{}", term.render(request.include_doc_freq))?;
        }
        file.flush()?;
        report.written.push(path);
    }
    Ok(report)
}

/// Reads a UTF-8 word list, one word per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Duplicates keep their first position.
pub fn load_word_list(path: &Path) -> Result<Vec<String>, IndexError> {
    let content = fs::read_to_string(path)?;
    let mut seen = HashSet::new();
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect())
}
