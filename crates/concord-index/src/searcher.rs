//! Concordance search.
//!
//! A search normalizes the query once, then walks the segments in order. In
//! each segment the span cursor and the optional document filter are merged by
//! a [`SegmentCrawler`]; every document it emits is windowed before the crawl
//! moves on, so a collector that stops early saves all remaining work.

use std::collections::BTreeMap;

use concord_config::Config;
use concord_query::{Query, SpanQuery, normalize};
use log::{debug, warn};
use tantivy::{
    Searcher, TantivyDocument,
    query::{BooleanQuery, EnableScoring, Occur, Query as TantivyQuery},
    schema::Field,
};

use crate::{
    ConcordanceError, ConcordanceIndex,
    collector::WindowCollector,
    compile::QueryFilterCompiler,
    crawler::{QueryFilter, SegmentCrawler},
    offsets::{DocTokenOffsets, OffsetRequests, OffsetResults},
    overlap::remove_overlaps,
    reader::values_of,
    resolver::{OffsetResolver, ReanalyzingOffsetResolver},
    spans::{DEFAULT_MAX_EXPANSIONS, SpanBuilder},
    window::{WindowBuilder, WindowConfig},
};

/// Produces concordance windows from a [`ConcordanceIndex`].
///
/// Holds per-document scratch buffers, so a searcher serves one search at a
/// time.
pub struct ConcordanceSearcher<'a> {
    /// Index being searched.
    index: &'a ConcordanceIndex,
    /// Window assembly.
    builder: WindowBuilder,
    /// Keep overlapping hits instead of pruning them.
    allow_overlaps: bool,
    /// Cap on terms a multi-term span expands to per segment.
    max_expansions: usize,
    /// Spans of the current document.
    doc_offsets: DocTokenOffsets,
    /// Positions the current document's windows need.
    requests: OffsetRequests,
    /// Resolved offsets for the current document.
    results: OffsetResults,
}

/// Per-search state shared by every document.
struct SearchContext<'s> {
    /// Searcher snapshot.
    searcher: &'s Searcher,
    /// Windowed field name.
    field_name: &'s str,
    /// Windowed field handle.
    field: Field,
    /// Metadata field names and handles.
    metadata: Vec<(String, Field)>,
    /// Offset resolver for the windowed field.
    resolver: ReanalyzingOffsetResolver,
}

impl<'a> ConcordanceSearcher<'a> {
    /// Creates a searcher with the given window shape.
    pub fn new(index: &'a ConcordanceIndex, config: WindowConfig) -> Self {
        Self {
            index,
            builder: WindowBuilder::new(config),
            allow_overlaps: false,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            doc_offsets: DocTokenOffsets::default(),
            requests: OffsetRequests::default(),
            results: OffsetResults::default(),
        }
    }

    /// Creates a searcher from the merged configuration.
    pub fn from_config(index: &'a ConcordanceIndex, config: &Config) -> Self {
        let mut window = WindowConfig::from_settings(&config.window);
        if let Some(id_field) = &config.search.id_field {
            if !window.metadata_fields.contains(id_field) {
                window.metadata_fields.insert(0, id_field.clone());
            }
        }
        Self::new(index, window).allow_overlaps(config.search.allow_overlaps)
    }

    /// Keeps overlapping hits instead of pruning them.
    pub fn allow_overlaps(mut self, allow: bool) -> Self {
        self.allow_overlaps = allow;
        self
    }

    /// Sets the per-segment expansion cap for multi-term spans.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Replaces the sort key normalizer.
    pub fn with_normalizer(mut self, normalizer: impl Fn(&str) -> String + 'static) -> Self {
        self.builder = self.builder.with_normalizer(normalizer);
        self
    }

    /// Windows every match of `query` inside `field`.
    ///
    /// Documents must also match the document-level form of `query` and, when
    /// given, `filter`. A query that is already in span form is not turned into
    /// a document filter.
    pub fn search(
        &mut self,
        query: &Query,
        field: &str,
        filter: Option<&dyn TantivyQuery>,
        collector: &mut dyn WindowCollector,
    ) -> Result<(), ConcordanceError> {
        let span = normalize(field, query)?;
        let query_filter = match query {
            Query::Span { .. } => None,
            other => Some(QueryFilterCompiler::new(self.index.schema()).compile(other)?),
        };
        let filter = combine(query_filter, filter);
        self.run(&span, field, filter, collector)
    }

    /// Windows every match of an already normalized span query.
    ///
    /// A span bound to another field matches nothing.
    pub fn search_span(
        &mut self,
        span: &SpanQuery,
        field: &str,
        filter: Option<&dyn TantivyQuery>,
        collector: &mut dyn WindowCollector,
    ) -> Result<(), ConcordanceError> {
        if span.field()?.is_some_and(|f| f != field) {
            debug!("span query is not bound to field {field}");
            return Ok(());
        }
        self.run(span, field, combine(None, filter), collector)
    }

    /// Crawls every segment in order.
    fn run(
        &mut self,
        span: &SpanQuery,
        field: &str,
        filter: Option<Box<dyn TantivyQuery>>,
        collector: &mut dyn WindowCollector,
    ) -> Result<(), ConcordanceError> {
        let index = self.index;
        let searcher = index.searcher();
        let handle = index.field(field)?;
        let metadata = self
            .builder
            .config()
            .metadata_fields
            .iter()
            .map(|name| Ok((name.clone(), index.field(name)?)))
            .collect::<Result<Vec<_>, ConcordanceError>>()?;
        if span.is_empty() {
            debug!("query has no span form in field {field}");
            return Ok(());
        }

        let weight = filter
            .map(|f| f.weight(EnableScoring::disabled_from_searcher(&searcher)))
            .transpose()?;
        let mut context = SearchContext {
            searcher: &searcher,
            field_name: field,
            field: handle,
            metadata,
            resolver: ReanalyzingOffsetResolver::new(index.analyzer_for(field)?),
        };

        let mut doc_base = 0u64;
        for (ord, segment) in searcher.segment_readers().iter().enumerate() {
            debug!(
                "crawling segment {ord}: {} docs, base {doc_base}",
                segment.num_docs()
            );
            let spans = SpanBuilder::new(segment, handle)?
                .with_max_expansions(self.max_expansions)
                .build(span)?;
            let segment_filter = weight
                .as_deref()
                .map(|w| QueryFilter::new(w, segment))
                .transpose()?;
            let segment_ord = u32::try_from(ord).unwrap_or(u32::MAX);
            let mut crawler = SegmentCrawler::new(spans, segment_filter, segment_ord, doc_base);

            while crawler.next_doc(&mut self.doc_offsets)? {
                if collector.hit_max() || !self.window_document(&mut context, collector)? {
                    debug!("collector is full; stopping");
                    return Ok(());
                }
            }
            doc_base += u64::from(segment.max_doc());
        }
        Ok(())
    }

    /// Windows the document in `doc_offsets`. Returns false once the
    /// collector refuses a window.
    fn window_document(
        &mut self,
        context: &mut SearchContext<'_>,
        collector: &mut dyn WindowCollector,
    ) -> Result<bool, ConcordanceError> {
        let Some(doc) = self.doc_offsets.doc else {
            return Ok(true);
        };
        remove_overlaps(&mut self.doc_offsets.spans, self.allow_overlaps);

        let document: TantivyDocument = context.searcher.doc(doc.address())?;
        let values = values_of(&document, context.field);
        if values.is_empty() {
            let err = ConcordanceError::MissingField {
                doc: doc.address(),
                field: context.field_name.to_string(),
                available: self.index.available_fields(&document),
            };
            warn!("skipping document: {err}");
            return Ok(true);
        }

        collector.start_document();
        self.requests.clear();
        for span in &self.doc_offsets.spans {
            self.builder.add_requests(*span, &mut self.requests);
        }
        context
            .resolver
            .resolve(&values, &self.requests, &mut self.results);
        let metadata = self.metadata(&document, &context.metadata);

        for span in &self.doc_offsets.spans {
            match self
                .builder
                .build(doc, *span, &values, &self.results, metadata.clone())
            {
                Ok(window) => {
                    if !collector.collect(window) {
                        return Ok(false);
                    }
                }
                Err(err @ ConcordanceError::TargetNotFound { .. }) => {
                    warn!("skipping hit: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }

    /// Mapped metadata values of a document. Fields with no remaining value
    /// are left out.
    fn metadata(
        &self,
        document: &TantivyDocument,
        fields: &[(String, Field)],
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        for (name, field) in fields {
            let values = values_of(document, *field);
            let mapped = self
                .builder
                .config()
                .mapper
                .map_values(values.iter().map(String::as_str));
            if !mapped.is_empty() {
                let separator = &self.builder.config().metadata_separator;
                metadata.insert(name.clone(), mapped.join(separator));
            }
        }
        metadata
    }
}

/// ANDs the compiled query filter with the caller's filter.
fn combine(
    query_filter: Option<Box<dyn TantivyQuery>>,
    filter: Option<&dyn TantivyQuery>,
) -> Option<Box<dyn TantivyQuery>> {
    match (query_filter, filter) {
        (None, None) => None,
        (Some(q), None) => Some(q),
        (None, Some(f)) => Some(f.box_clone()),
        (Some(q), Some(f)) => Some(Box::new(BooleanQuery::new(vec![
            (Occur::Must, q),
            (Occur::Must, f.box_clone()),
        ]))),
    }
}
