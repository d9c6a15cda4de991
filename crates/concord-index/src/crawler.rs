//! Merge-join of a span cursor with a document filter.
//!
//! The crawler walks one segment. It only advances when the consumer asks for
//! the next document, and drains each emitted document's spans into a reused
//! [`DocTokenOffsets`].

use tantivy::{
    DocId, DocSet, SegmentReader, TERMINATED,
    query::{Scorer, Weight},
};

use crate::{
    ConcordanceError,
    offsets::{DocKey, DocTokenOffsets},
    spans::SpanCursor,
};

/// An ascending cursor over the documents a search is restricted to.
pub trait FilterCursor {
    /// Moves to the first document at or after `target` and returns it, or
    /// [`TERMINATED`] when no such document exists.
    fn seek(&mut self, target: DocId) -> DocId;
}

/// Filter over an explicit, ascending list of doc ids.
#[derive(Debug, Clone)]
pub struct SortedDocIds {
    /// Allowed documents, ascending.
    docs: Vec<DocId>,
    /// Index of the current document.
    cursor: usize,
}

impl SortedDocIds {
    /// Creates a filter; `docs` are sorted and deduplicated.
    pub fn new(mut docs: Vec<DocId>) -> Self {
        docs.sort_unstable();
        docs.dedup();
        Self { docs, cursor: 0 }
    }
}

impl FilterCursor for SortedDocIds {
    fn seek(&mut self, target: DocId) -> DocId {
        while self.docs.get(self.cursor).is_some_and(|&d| d < target) {
            self.cursor += 1;
        }
        self.docs.get(self.cursor).copied().unwrap_or(TERMINATED)
    }
}

/// Filter backed by a Tantivy query's scorer for one segment.
pub struct QueryFilter {
    /// Scorer positioned on the current filter document.
    scorer: Box<dyn Scorer>,
}

impl QueryFilter {
    /// Builds the scorer of `weight` for `segment`.
    pub fn new(weight: &dyn Weight, segment: &SegmentReader) -> Result<Self, ConcordanceError> {
        Ok(Self {
            scorer: weight.scorer(segment, 1.0)?,
        })
    }
}

impl FilterCursor for QueryFilter {
    fn seek(&mut self, target: DocId) -> DocId {
        let doc = self.scorer.doc();
        if doc >= target {
            return doc;
        }
        self.scorer.seek(target)
    }
}

/// Where the crawler is in its merge-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlState {
    /// Bring the filter up to the span document.
    AdvanceFilter,
    /// Move spans past the document just emitted.
    AdvanceSpan,
    /// Span and filter agree on a document.
    Emit,
    /// Either side is exhausted.
    Done,
}

/// Lazily yields the documents of one segment matched by both the spans and
/// the optional filter.
pub struct SegmentCrawler<S, F> {
    /// Span matches.
    spans: S,
    /// Restriction, or `None` to emit every span document.
    filter: Option<F>,
    /// Ordinal of the segment being crawled.
    segment_ord: u32,
    /// Global ordinal of the segment's first document.
    doc_base: u64,
    /// Current state.
    state: CrawlState,
}

impl<S: SpanCursor, F: FilterCursor> SegmentCrawler<S, F> {
    /// Creates a crawler over a freshly built span cursor.
    pub fn new(spans: S, filter: Option<F>, segment_ord: u32, doc_base: u64) -> Self {
        Self {
            spans,
            filter,
            segment_ord,
            doc_base,
            state: CrawlState::AdvanceFilter,
        }
    }

    /// Moves to the next matching document and drains its spans into `out`.
    ///
    /// Returns `Ok(false)` once the segment is exhausted.
    pub fn next_doc(&mut self, out: &mut DocTokenOffsets) -> Result<bool, ConcordanceError> {
        loop {
            match self.state {
                CrawlState::AdvanceFilter => {
                    let span_doc = self.spans.doc();
                    if span_doc == TERMINATED {
                        self.state = CrawlState::Done;
                        continue;
                    }
                    let Some(filter) = self.filter.as_mut() else {
                        self.state = CrawlState::Emit;
                        continue;
                    };
                    let filter_doc = filter.seek(span_doc);
                    if filter_doc == TERMINATED {
                        self.state = CrawlState::Done;
                    } else if filter_doc < span_doc {
                        self.state = CrawlState::Done;
                        return Err(ConcordanceError::MisorderedFilter {
                            filter_doc,
                            span_doc,
                        });
                    } else if filter_doc == span_doc {
                        self.state = CrawlState::Emit;
                    } else {
                        self.spans.seek(filter_doc);
                    }
                }
                CrawlState::Emit => {
                    let doc_id = self.spans.doc();
                    out.reset(DocKey {
                        segment_ord: self.segment_ord,
                        doc_id,
                        global: self.doc_base + u64::from(doc_id),
                    });
                    out.spans.extend_from_slice(self.spans.spans());
                    self.state = CrawlState::AdvanceSpan;
                    return Ok(true);
                }
                CrawlState::AdvanceSpan => {
                    self.spans.advance();
                    self.state = CrawlState::AdvanceFilter;
                }
                CrawlState::Done => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::spans::VecSpans;

    fn crawl(mut crawler: SegmentCrawler<VecSpans, SortedDocIds>) -> Vec<DocId> {
        let mut out = DocTokenOffsets::default();
        let mut docs = Vec::new();
        while crawler.next_doc(&mut out).unwrap() {
            docs.push(out.doc.unwrap().doc_id);
        }
        docs
    }

    fn spans_on(docs: &[DocId]) -> VecSpans {
        let entries: Vec<(DocId, &[u32])> = docs.iter().map(|&d| (d, &[0u32][..])).collect();
        VecSpans::positions(&entries)
    }

    #[test]
    fn filter_restricts_documents() {
        let crawler = SegmentCrawler::new(
            spans_on(&[1, 2, 3, 5, 8]),
            Some(SortedDocIds::new(vec![2, 5, 9])),
            0,
            0,
        );
        assert_eq!(crawl(crawler), vec![2, 5]);
    }

    #[test]
    fn no_filter_emits_everything() {
        let crawler: SegmentCrawler<_, SortedDocIds> =
            SegmentCrawler::new(spans_on(&[1, 4, 6]), None, 0, 0);
        assert_eq!(crawl(crawler), vec![1, 4, 6]);
    }

    #[test]
    fn emitted_document_carries_spans_and_global_key() {
        let spans = VecSpans::new(&[(3, &[(0, 2), (5, 6)])]);
        let mut crawler: SegmentCrawler<_, SortedDocIds> = SegmentCrawler::new(spans, None, 2, 100);
        let mut out = DocTokenOffsets::default();
        assert!(crawler.next_doc(&mut out).unwrap());
        let key = out.doc.unwrap();
        assert_eq!((key.segment_ord, key.doc_id, key.global), (2, 3, 103));
        assert_eq!(out.spans.len(), 2);
        assert!(!crawler.next_doc(&mut out).unwrap());
        assert!(!crawler.next_doc(&mut out).unwrap());
    }

    /// A filter that always reports the same document.
    struct StuckFilter(DocId);

    impl FilterCursor for StuckFilter {
        fn seek(&mut self, _target: DocId) -> DocId {
            self.0
        }
    }

    #[test]
    fn backwards_filter_is_fatal() {
        let mut crawler = SegmentCrawler::new(spans_on(&[4, 7]), Some(StuckFilter(4)), 0, 0);
        let mut out = DocTokenOffsets::default();
        assert!(crawler.next_doc(&mut out).unwrap());
        let err = crawler.next_doc(&mut out).unwrap_err();
        assert!(matches!(
            err,
            ConcordanceError::MisorderedFilter {
                filter_doc: 4,
                span_doc: 7
            }
        ));
    }

    proptest! {
        #[test]
        fn crawl_is_intersection(
            span_docs in prop::collection::btree_set(0u32..200, 0..60),
            filter_docs in prop::collection::btree_set(0u32..200, 0..60),
        ) {
            let spans: Vec<DocId> = span_docs.iter().copied().collect();
            let filter: Vec<DocId> = filter_docs.iter().copied().collect();
            let crawler = SegmentCrawler::new(
                spans_on(&spans),
                Some(SortedDocIds::new(filter)),
                0,
                0,
            );
            let expected: Vec<DocId> = span_docs.intersection(&filter_docs).copied().collect();
            prop_assert_eq!(crawl(crawler), expected);
        }
    }
}
