//! Concordance window assembly.
//!
//! A window is cut from the raw stored text using resolved token offsets: the
//! pre-context runs from the earliest resolved context token before the target
//! up to the target, the post-context from the target end to the latest
//! resolved context token after it. Context never leaves the stored value the
//! adjacent target token lives in.

use std::collections::BTreeMap;

use concord_config::{SortKeyKind, WindowSettings};
use serde::Serialize;

use crate::{
    ConcordanceError,
    offsets::{DocKey, OffsetRequests, OffsetResults, PositionSpan, TokenOffset},
};

/// Cleans stored values before they reach a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValueMapper {
    /// Strip leading and trailing whitespace.
    pub trim: bool,
    /// Collapse newline runs and the indentation after them.
    pub compress_newlines: bool,
    /// Drop values that end up empty.
    pub filter_nulls: bool,
}

impl Default for FieldValueMapper {
    fn default() -> Self {
        Self {
            trim: true,
            compress_newlines: false,
            filter_nulls: true,
        }
    }
}

impl FieldValueMapper {
    /// Applies trimming and newline compression to one piece of text.
    pub fn map_text(&self, text: &str) -> String {
        let text = if self.trim { text.trim() } else { text };
        if self.compress_newlines {
            compress_newlines(text)
        } else {
            text.to_string()
        }
    }

    /// Maps every value, dropping empty results when `filter_nulls` is set.
    pub fn map_values<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        values
            .into_iter()
            .map(|v| self.map_text(v))
            .filter(|v| !(self.filter_nulls && v.is_empty()))
            .collect()
    }
}

/// Turns every line break plus following spaces and tabs into `\n`, then
/// shortens runs of blank lines to a single blank line.
fn compress_newlines(text: &str) -> String {
    let mut lines = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' || c == '\n' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            while chars.peek().is_some_and(|&n| n == ' ' || n == '\t') {
                chars.next();
            }
            lines.push('\n');
        } else {
            lines.push(c);
        }
    }

    let mut out = String::with_capacity(lines.len());
    let mut run = 0;
    for c in lines.chars() {
        if c == '\n' {
            run += 1;
            if run <= 2 {
                out.push(c);
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

/// Normalizes sort keys so windows order case- and spacing-insensitively.
pub fn default_sort_normalizer(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything a [`WindowBuilder`] needs to know about window shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Context tokens before the target.
    pub tokens_before: u32,
    /// Context tokens after the target.
    pub tokens_after: u32,
    /// Stored fields copied into the window metadata.
    pub metadata_fields: Vec<String>,
    /// Joins the values of multi-valued metadata fields.
    pub metadata_separator: String,
    /// What windows sort by.
    pub sort_key: SortKeyKind,
    /// Value cleanup.
    pub mapper: FieldValueMapper,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::from_settings(&WindowSettings::default())
    }
}

impl WindowConfig {
    /// Builds the window shape from the `[window]` settings.
    pub fn from_settings(settings: &WindowSettings) -> Self {
        Self {
            tokens_before: u32::try_from(settings.tokens_before).unwrap_or(u32::MAX),
            tokens_after: u32::try_from(settings.tokens_after).unwrap_or(u32::MAX),
            metadata_fields: settings.metadata.clone(),
            metadata_separator: settings.metadata_separator.clone(),
            sort_key: settings.sort_key,
            mapper: FieldValueMapper {
                trim: settings.trim_whitespace,
                compress_newlines: settings.compress_newlines,
                filter_nulls: settings.filter_nulls,
            },
        }
    }
}

/// One keyword-in-context hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcordanceWindow {
    /// Document the hit is in.
    doc: DocKey,
    /// Text before the target.
    pre: String,
    /// The matched text.
    target: String,
    /// Text after the target.
    post: String,
    /// Byte offset of the target start in its stored value.
    target_start: usize,
    /// Byte offset of the target end in its stored value.
    target_end: usize,
    /// Selected stored fields.
    metadata: BTreeMap<String, String>,
    /// Key windows are ordered by.
    sort_key: String,
}

impl ConcordanceWindow {
    /// Document the hit is in.
    pub fn doc(&self) -> DocKey {
        self.doc
    }

    /// Text before the target.
    pub fn pre(&self) -> &str {
        &self.pre
    }

    /// The matched text.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Text after the target.
    pub fn post(&self) -> &str {
        &self.post
    }

    /// Byte offset of the target start.
    pub fn target_start(&self) -> usize {
        self.target_start
    }

    /// Byte offset of the target end.
    pub fn target_end(&self) -> usize {
        self.target_end
    }

    /// Selected stored fields.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Key windows are ordered by.
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

/// Turns a span plus resolved offsets into a [`ConcordanceWindow`].
pub struct WindowBuilder {
    /// Window shape.
    config: WindowConfig,
    /// Sort key normalization.
    normalizer: Box<dyn Fn(&str) -> String>,
}

impl WindowBuilder {
    /// Creates a builder using [`default_sort_normalizer`].
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            normalizer: Box::new(default_sort_normalizer),
        }
    }

    /// Replaces the sort key normalizer.
    pub fn with_normalizer(mut self, normalizer: impl Fn(&str) -> String + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Window shape.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Requests the positions a window around `span` needs.
    pub fn add_requests(&self, span: PositionSpan, requests: &mut OffsetRequests) {
        requests.add_span(span, self.config.tokens_before, self.config.tokens_after);
    }

    /// Maps the stored values of a metadata field and joins them.
    pub fn metadata_value<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> String {
        self.config
            .mapper
            .map_values(values)
            .join(&self.config.metadata_separator)
    }

    /// Builds the window for `span` from the windowed field's stored `values`.
    pub fn build(
        &self,
        doc: DocKey,
        span: PositionSpan,
        values: &[String],
        results: &OffsetResults,
        metadata: BTreeMap<String, String>,
    ) -> Result<ConcordanceWindow, ConcordanceError> {
        let target_not_found = |position| ConcordanceError::TargetNotFound {
            doc: doc.address(),
            position,
        };
        let first = results
            .get(span.start)
            .ok_or_else(|| target_not_found(span.start))?;
        let last = results
            .get(span.last())
            .ok_or_else(|| target_not_found(span.last()))?;

        let target = target_text(values, first, last);

        let before = span.start.saturating_sub(self.config.tokens_before)..span.start;
        let pre = before
            .filter_map(|p| results.get(p))
            .find(|o| o.value_index == first.value_index)
            .map_or("", |o| slice(values, first.value_index, o.start, first.start));

        let after_end = span.end.saturating_add(self.config.tokens_after);
        let after = span.end..after_end.min(results.last().map_or(span.end, |p| p + 1));
        let post = after
            .rev()
            .filter_map(|p| results.get(p))
            .find(|o| o.value_index == last.value_index)
            .map_or("", |o| slice(values, last.value_index, last.end, o.end));

        let mapper = &self.config.mapper;
        let pre = mapper.map_text(pre);
        let target = mapper.map_text(&target);
        let post = mapper.map_text(post);
        let sort_key = self.sort_key(doc, span, &pre, &target, &post);

        Ok(ConcordanceWindow {
            doc,
            pre,
            target,
            post,
            target_start: first.start,
            target_end: last.end,
            metadata,
            sort_key,
        })
    }

    /// Computes the normalized sort key.
    fn sort_key(
        &self,
        doc: DocKey,
        span: PositionSpan,
        pre: &str,
        target: &str,
        post: &str,
    ) -> String {
        let raw = match self.config.sort_key {
            SortKeyKind::TargetPost => format!("{target} {post}"),
            SortKeyKind::Target => target.to_string(),
            SortKeyKind::Pre => pre.to_string(),
            SortKeyKind::PreReversed => pre.split_whitespace().rev().collect::<Vec<_>>().join(" "),
            SortKeyKind::Post => post.to_string(),
            SortKeyKind::Doc => format!("{:020} {:010}", doc.global, span.start),
        };
        (self.normalizer)(&raw)
    }
}

/// Slices `values[index][start..end]`, empty when out of range.
fn slice(values: &[String], index: usize, start: usize, end: usize) -> &str {
    values
        .get(index)
        .and_then(|v| v.get(start..end))
        .unwrap_or("")
}

/// Target text from the first to the last target token, joining the pieces
/// with a space when the target spans several values.
fn target_text(values: &[String], first: TokenOffset, last: TokenOffset) -> String {
    if first.value_index == last.value_index {
        return slice(values, first.value_index, first.start, last.end).to_string();
    }
    let mut parts = Vec::new();
    if let Some(value) = values.get(first.value_index) {
        parts.push(value.get(first.start..).unwrap_or(""));
    }
    for value in values
        .iter()
        .take(last.value_index)
        .skip(first.value_index + 1)
    {
        parts.push(value.as_str());
    }
    parts.push(slice(values, last.value_index, 0, last.end));
    parts.join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn doc() -> DocKey {
        DocKey {
            segment_ord: 0,
            doc_id: 7,
            global: 7,
        }
    }

    fn offset(value_index: usize, start: usize, end: usize) -> TokenOffset {
        TokenOffset {
            value_index,
            start,
            end,
        }
    }

    fn config(before: u32, after: u32) -> WindowConfig {
        WindowConfig {
            tokens_before: before,
            tokens_after: after,
            ..WindowConfig::default()
        }
    }

    /// Offsets of "the quick brown fox jumps".
    fn fox_results() -> OffsetResults {
        let mut results = OffsetResults::default();
        for (p, (s, e)) in [(0, 3), (4, 9), (10, 15), (16, 19), (20, 25)]
            .into_iter()
            .enumerate()
        {
            results.insert(p as u32, offset(0, s, e));
        }
        results
    }

    #[test]
    fn one_token_context() {
        let builder = WindowBuilder::new(config(1, 1));
        let values = vec!["the quick brown fox jumps".to_string()];
        let window = builder
            .build(doc(), PositionSpan::new(2, 4), &values, &fox_results(), BTreeMap::new())
            .unwrap();
        assert_eq!(window.pre(), "quick");
        assert_eq!(window.target(), "brown fox");
        assert_eq!(window.post(), "jumps");
        assert_eq!((window.target_start(), window.target_end()), (10, 19));
    }

    #[test]
    fn context_clips_at_document_edges() {
        let builder = WindowBuilder::new(config(5, 5));
        let values = vec!["the quick brown fox jumps".to_string()];
        let window = builder
            .build(doc(), PositionSpan::new(0, 1), &values, &fox_results(), BTreeMap::new())
            .unwrap();
        assert_eq!(window.pre(), "");
        assert_eq!(window.target(), "the");
        assert_eq!(window.post(), "quick brown fox jumps");
    }

    #[test]
    fn unbounded_context_takes_the_whole_value() {
        let builder = WindowBuilder::new(config(u32::MAX, u32::MAX));
        let values = vec!["the quick brown fox jumps".to_string()];
        let window = builder
            .build(doc(), PositionSpan::new(2, 4), &values, &fox_results(), BTreeMap::new())
            .unwrap();
        assert_eq!(window.pre(), "the quick");
        assert_eq!(window.post(), "jumps");
    }

    #[test]
    fn untrimmed_context_keeps_spacing() {
        let mut cfg = config(1, 1);
        cfg.mapper.trim = false;
        let builder = WindowBuilder::new(cfg);
        let values = vec!["the quick brown fox jumps".to_string()];
        let window = builder
            .build(doc(), PositionSpan::new(2, 3), &values, &fox_results(), BTreeMap::new())
            .unwrap();
        assert_eq!(window.pre(), "quick ");
        assert_eq!(window.post(), " fox");
    }

    #[test]
    fn context_stays_in_the_target_value() {
        // values "a b" and "c d": positions 0, 1 then 3, 4
        let values = vec!["a b".to_string(), "c d".to_string()];
        let mut results = OffsetResults::default();
        results.insert(0, offset(0, 0, 1));
        results.insert(1, offset(0, 2, 3));
        results.insert(3, offset(1, 0, 1));
        results.insert(4, offset(1, 2, 3));

        let builder = WindowBuilder::new(config(3, 3));
        let window = builder
            .build(doc(), PositionSpan::new(3, 4), &values, &results, BTreeMap::new())
            .unwrap();
        assert_eq!(window.pre(), "");
        assert_eq!(window.target(), "c");
        assert_eq!(window.post(), "d");
    }

    #[test]
    fn target_across_values_is_joined() {
        let values = vec!["a b".to_string(), "c d".to_string()];
        let mut results = OffsetResults::default();
        results.insert(1, offset(0, 2, 3));
        results.insert(3, offset(1, 0, 1));

        let builder = WindowBuilder::new(config(0, 0));
        let window = builder
            .build(doc(), PositionSpan::new(1, 4), &values, &results, BTreeMap::new())
            .unwrap();
        assert_eq!(window.target(), "b c");
    }

    #[test]
    fn missing_target_offset() {
        let builder = WindowBuilder::new(config(1, 1));
        let err = builder
            .build(
                doc(),
                PositionSpan::new(9, 10),
                &["x".to_string()],
                &OffsetResults::default(),
                BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConcordanceError::TargetNotFound { position: 9, .. }
        ));
    }

    #[test]
    fn sort_keys() {
        let values = vec!["the quick brown fox jumps".to_string()];
        let key = |kind| {
            let mut cfg = config(2, 1);
            cfg.sort_key = kind;
            WindowBuilder::new(cfg)
                .build(doc(), PositionSpan::new(3, 4), &values, &fox_results(), BTreeMap::new())
                .unwrap()
                .sort_key()
                .to_string()
        };
        assert_eq!(key(SortKeyKind::TargetPost), "fox jumps");
        assert_eq!(key(SortKeyKind::Target), "fox");
        assert_eq!(key(SortKeyKind::Pre), "quick brown");
        assert_eq!(key(SortKeyKind::PreReversed), "brown quick");
        assert_eq!(key(SortKeyKind::Post), "jumps");
        assert_eq!(key(SortKeyKind::Doc), "00000000000000000007 0000000003");
    }

    #[test]
    fn custom_normalizer() {
        let values = vec!["The Quick".to_string()];
        let mut results = OffsetResults::default();
        results.insert(0, offset(0, 0, 3));
        results.insert(1, offset(0, 4, 9));
        let builder = WindowBuilder::new(config(0, 1)).with_normalizer(str::to_uppercase);
        let window = builder
            .build(doc(), PositionSpan::new(0, 1), &values, &results, BTreeMap::new())
            .unwrap();
        assert_eq!(window.sort_key(), "THE QUICK");
    }

    #[test]
    fn default_normalizer_folds_case_and_space() {
        assert_eq!(default_sort_normalizer("  Brown\n\tFOX "), "brown fox");
    }

    #[test]
    fn mapper_compresses_newlines() {
        let mapper = FieldValueMapper {
            trim: false,
            compress_newlines: true,
            filter_nulls: false,
        };
        assert_eq!(mapper.map_text("a\r\n   b\n\t\n\n\nc"), "a\nb\n\nc");
        assert_eq!(mapper.map_text("a\r  b"), "a\nb");
    }

    #[test]
    fn mapper_filters_empty_values() {
        let mapper = FieldValueMapper::default();
        assert_eq!(mapper.map_values([" x ", "  ", "y"]), vec!["x", "y"]);

        let keep = FieldValueMapper {
            filter_nulls: false,
            ..mapper
        };
        assert_eq!(keep.map_values([" x ", "  "]), vec!["x", ""]);
    }

    #[test]
    fn metadata_values_are_joined() {
        let builder = WindowBuilder::new(WindowConfig::default());
        assert_eq!(builder.metadata_value(["Ann", " ", "Bo"]), "Ann | Bo");
    }

    #[test]
    fn window_serializes() {
        let builder = WindowBuilder::new(config(1, 1));
        let values = vec!["the quick brown fox jumps".to_string()];
        let mut metadata = BTreeMap::new();
        metadata.insert("title".to_string(), "Fables".to_string());
        let window = builder
            .build(doc(), PositionSpan::new(2, 4), &values, &fox_results(), metadata)
            .unwrap();
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["target"], "brown fox");
        assert_eq!(json["metadata"]["title"], "Fables");
        assert_eq!(json["doc"]["global"], 7);
    }
}
