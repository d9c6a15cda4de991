//! Positional span matching over Tantivy postings.
//!
//! Tantivy scores documents but has no notion of span queries, so this module
//! builds a cursor tree from a [`SpanQuery`] for one segment. Every cursor
//! follows the Tantivy `DocSet` conventions: it is positioned on its first
//! document when built, `doc()` returns [`TERMINATED`] once exhausted, and
//! `seek` never moves backwards.
//!
//! Cursor kinds:
//! - [`TermSpans`] - one single-position span per occurrence of a term
//! - [`NearSpans`] - clauses within `slop` of each other, ordered or not
//! - [`OrSpans`] - union of the clauses' spans
//! - multi-term - an `OrSpans` over the terms a pattern expands to in the segment
//! - [`EmptySpans`] - matches nothing

mod multi_term;
mod near;
mod or;
mod term;

use std::sync::Arc;

use concord_query::SpanQuery;
use log::debug;
use tantivy::{
    DocId, InvertedIndexReader, SegmentReader, TERMINATED, Term,
    fastfield::AliveBitSet,
    schema::{Field, IndexRecordOption},
};

pub use multi_term::{DEFAULT_MAX_EXPANSIONS, expand_terms};
pub(crate) use multi_term::{MAX_FUZZY_DISTANCE, prefix_to_regex, wildcard_to_regex};
pub use near::NearSpans;
pub use or::OrSpans;
pub use term::TermSpans;

use crate::{ConcordanceError, offsets::PositionSpan};

/// Iterates the documents of a segment that contain a span match.
pub trait SpanCursor {
    /// Current document, or [`TERMINATED`].
    fn doc(&self) -> DocId;

    /// Moves to the next matching document and returns it.
    fn advance(&mut self) -> DocId;

    /// Moves to the first matching document at or after `target`.
    ///
    /// Does nothing when already at or past `target`.
    fn seek(&mut self, target: DocId) -> DocId;

    /// Spans of the current document, sorted by `(start, end)` without
    /// duplicates. Empty once exhausted.
    fn spans(&self) -> &[PositionSpan];
}

impl<C: SpanCursor + ?Sized> SpanCursor for Box<C> {
    fn doc(&self) -> DocId {
        (**self).doc()
    }

    fn advance(&mut self) -> DocId {
        (**self).advance()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        (**self).seek(target)
    }

    fn spans(&self) -> &[PositionSpan] {
        (**self).spans()
    }
}

/// A cursor without documents.
#[derive(Debug, Default)]
pub struct EmptySpans;

impl SpanCursor for EmptySpans {
    fn doc(&self) -> DocId {
        TERMINATED
    }

    fn advance(&mut self) -> DocId {
        TERMINATED
    }

    fn seek(&mut self, _target: DocId) -> DocId {
        TERMINATED
    }

    fn spans(&self) -> &[PositionSpan] {
        &[]
    }
}

/// Builds span cursors for one field of one segment.
pub struct SpanBuilder {
    /// Inverted index of the field in this segment.
    inverted_index: Arc<InvertedIndexReader>,
    /// The field every span node is bound to.
    field: Field,
    /// Deleted documents of the segment, if any.
    alive: Option<AliveBitSet>,
    /// Upper bound on terms a multi-term node expands to.
    max_expansions: usize,
}

impl SpanBuilder {
    /// Creates a builder for `field` in `segment`.
    pub fn new(segment: &SegmentReader, field: Field) -> Result<Self, ConcordanceError> {
        Ok(Self {
            inverted_index: segment.inverted_index(field)?,
            field,
            alive: segment.alive_bitset().cloned(),
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        })
    }

    /// Sets the multi-term expansion limit.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Builds the cursor tree for `query`.
    ///
    /// The query must already be bound to this builder's field; node field
    /// names are not re-checked here.
    pub fn build(&self, query: &SpanQuery) -> Result<Box<dyn SpanCursor>, ConcordanceError> {
        match query {
            SpanQuery::Term { text, .. } => self.term(text),
            SpanQuery::Near {
                clauses,
                slop,
                in_order,
            } => {
                if query.is_empty() {
                    return Ok(Box::new(EmptySpans));
                }
                let mut cursors = clauses
                    .iter()
                    .map(|c| self.build(c))
                    .collect::<Result<Vec<_>, _>>()?;
                if cursors.len() == 1 {
                    return Ok(cursors.remove(0));
                }
                Ok(Box::new(NearSpans::new(cursors, *slop, *in_order)))
            }
            SpanQuery::Or { clauses } => {
                let cursors = clauses
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| self.build(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(or_of(cursors))
            }
            SpanQuery::MultiTerm(multi) => {
                let terms =
                    expand_terms(&self.inverted_index, &multi.pattern, self.max_expansions)?;
                debug!(
                    "{} expanded to {} terms in segment",
                    multi.pattern,
                    terms.len()
                );
                let cursors = terms
                    .iter()
                    .map(|t| self.term(t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(or_of(cursors))
            }
            SpanQuery::Empty => Ok(Box::new(EmptySpans)),
        }
    }

    /// Builds a cursor over the postings of one term.
    fn term(&self, text: &str) -> Result<Box<dyn SpanCursor>, ConcordanceError> {
        let term = Term::from_field_text(self.field, text);
        let postings = self
            .inverted_index
            .read_postings(&term, IndexRecordOption::WithFreqsAndPositions)?;
        Ok(match postings {
            Some(postings) => Box::new(TermSpans::new(postings, self.alive.clone())),
            None => Box::new(EmptySpans),
        })
    }
}

/// Collapses a list of cursors into the smallest equivalent cursor.
fn or_of(mut cursors: Vec<Box<dyn SpanCursor>>) -> Box<dyn SpanCursor> {
    match cursors.len() {
        0 => Box::new(EmptySpans),
        1 => cursors.remove(0),
        _ => Box::new(OrSpans::new(cursors)),
    }
}

/// Cursor over an in-memory list of documents, for tests.
#[cfg(test)]
pub(crate) struct VecSpans {
    /// `(doc, spans)` entries in ascending doc order.
    docs: Vec<(DocId, Vec<PositionSpan>)>,
    /// Index of the current entry.
    cursor: usize,
}

#[cfg(test)]
impl VecSpans {
    /// Creates a cursor from `(doc, [(start, end)])` entries.
    pub(crate) fn new(docs: &[(DocId, &[(u32, u32)])]) -> Self {
        let docs = docs
            .iter()
            .map(|(doc, spans)| {
                let mut spans: Vec<_> = spans
                    .iter()
                    .map(|&(s, e)| PositionSpan::new(s, e))
                    .collect();
                spans.sort_unstable();
                spans.dedup();
                (*doc, spans)
            })
            .collect();
        Self { docs, cursor: 0 }
    }

    /// Creates a cursor with one single-position span per given position.
    pub(crate) fn positions(docs: &[(DocId, &[u32])]) -> Self {
        let docs = docs
            .iter()
            .map(|(doc, positions)| {
                let spans = positions.iter().map(|&p| PositionSpan::new(p, p + 1)).collect();
                (*doc, spans)
            })
            .collect();
        Self { docs, cursor: 0 }
    }
}

#[cfg(test)]
impl SpanCursor for VecSpans {
    fn doc(&self) -> DocId {
        self.docs.get(self.cursor).map_or(TERMINATED, |(doc, _)| *doc)
    }

    fn advance(&mut self) -> DocId {
        if self.cursor < self.docs.len() {
            self.cursor += 1;
        }
        self.doc()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        while self.doc() < target {
            self.advance();
        }
        self.doc()
    }

    fn spans(&self) -> &[PositionSpan] {
        self.docs.get(self.cursor).map_or(&[], |(_, spans)| spans)
    }
}

/// Drains a cursor into `(doc, [(start, end)])` entries, for tests.
#[cfg(test)]
pub(crate) fn drain(cursor: &mut dyn SpanCursor) -> Vec<(DocId, Vec<(u32, u32)>)> {
    let mut out = Vec::new();
    while cursor.doc() != TERMINATED {
        let spans = cursor.spans().iter().map(|s| (s.start, s.end)).collect();
        out.push((cursor.doc(), spans));
        cursor.advance();
    }
    out
}
