//! Term span cursor.

use tantivy::{
    DocId, DocSet, TERMINATED,
    fastfield::AliveBitSet,
    postings::{Postings, SegmentPostings},
};

use super::SpanCursor;
use crate::offsets::PositionSpan;

/// Every occurrence of one term, as single-position spans.
pub struct TermSpans {
    /// Postings with positions.
    postings: SegmentPostings,
    /// Deleted documents to skip.
    alive: Option<AliveBitSet>,
    /// Scratch buffer for positions.
    positions: Vec<u32>,
    /// Spans of the current document.
    spans: Vec<PositionSpan>,
}

impl TermSpans {
    /// Wraps postings read with positions, skipping deleted documents.
    pub fn new(postings: SegmentPostings, alive: Option<AliveBitSet>) -> Self {
        let mut spans = Self {
            postings,
            alive,
            positions: Vec::new(),
            spans: Vec::new(),
        };
        spans.settle();
        spans
    }

    /// Skips deleted documents and loads the spans of the current one.
    fn settle(&mut self) -> DocId {
        loop {
            let doc = self.postings.doc();
            if doc == TERMINATED {
                self.spans.clear();
                return doc;
            }
            if self.alive.as_ref().is_some_and(|a| a.is_deleted(doc)) {
                self.postings.advance();
                continue;
            }
            self.postings.positions(&mut self.positions);
            self.spans.clear();
            self.spans
                .extend(self.positions.iter().map(|&p| PositionSpan::new(p, p + 1)));
            return doc;
        }
    }
}

impl SpanCursor for TermSpans {
    fn doc(&self) -> DocId {
        self.postings.doc()
    }

    fn advance(&mut self) -> DocId {
        if self.postings.doc() == TERMINATED {
            return TERMINATED;
        }
        self.postings.advance();
        self.settle()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.postings.doc() >= target {
            return self.postings.doc();
        }
        self.postings.seek(target);
        self.settle()
    }

    fn spans(&self) -> &[PositionSpan] {
        &self.spans
    }
}
