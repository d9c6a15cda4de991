//! Tantivy-backed concordance windows for concord.
//!
//! This crate turns a query into keyword-in-context windows:
//! - Span matching (term, near, or and multi-term spans) over Tantivy postings
//! - A merge-join of span documents against a document filter
//! - Offset recovery by re-analyzing stored values
//! - Overlap pruning, window assembly and collection with a hit cap
//! - Term statistics and IDF over the same index
//!
//! # Example
//!
//! ```no_run
//! use concord_index::{ConcordanceIndex, ConcordanceSearcher, ListCollector, WindowConfig};
//! use concord_query::Query;
//!
//! let index = ConcordanceIndex::open("./corpus".as_ref()).unwrap();
//! let query = Query::Phrase {
//!     field: "body".to_string(),
//!     terms: vec!["brown".to_string(), "fox".to_string()],
//!     positions: Vec::new(),
//!     slop: 0,
//! };
//!
//! let mut collector = ListCollector::new(Some(100));
//! ConcordanceSearcher::new(&index, WindowConfig::default())
//!     .search(&query, "body", None, &mut collector)
//!     .unwrap();
//! for window in collector.windows() {
//!     println!("{} [{}] {}", window.pre(), window.target(), window.post());
//! }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod collector;
mod compile;
mod crawler;
mod error;
mod idf;
mod manifest;
mod offsets;
mod overlap;
mod reader;
mod resolver;
mod schema;
mod searcher;
mod spans;
mod term_stats;
mod window;
mod writer;

pub use analyzer::{
    CONCORD_TOKENIZER, analyze, analyze_with_positions, build_analyzer, parse_language,
};
pub use collector::{
    CallbackCollector, CollectorStats, ListCollector, SortedCollector, WindowCollector,
};
pub use compile::QueryFilterCompiler;
pub use crawler::{FilterCursor, QueryFilter, SegmentCrawler, SortedDocIds};
pub use error::{ConcordanceError, IndexError};
pub use idf::{IdfCalculator, TermSetStats};
pub use manifest::{CorpusManifest, MANIFEST_FILENAME};
pub use offsets::{
    DocKey, DocTokenOffsets, OffsetRequests, OffsetResults, PositionSpan, TokenOffset,
};
pub use overlap::remove_overlaps;
pub use reader::ConcordanceIndex;
pub use resolver::{OffsetResolver, ReanalyzingOffsetResolver};
pub use schema::{CorpusField, FieldKind, build_schema};
pub use searcher::ConcordanceSearcher;
pub use spans::{
    DEFAULT_MAX_EXPANSIONS, EmptySpans, NearSpans, OrSpans, SpanBuilder, SpanCursor, TermSpans,
    expand_terms,
};
pub use term_stats::{
    FieldStats, TermCount, TermDumpReport, TopTermsRequest, field_stats, load_word_list,
    top_terms, write_top_terms,
};
pub use window::{
    ConcordanceWindow, FieldValueMapper, WindowBuilder, WindowConfig, default_sort_normalizer,
};
pub use writer::{CorpusDocument, CorpusWriter};
