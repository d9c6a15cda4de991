//! Token position and offset bookkeeping.
//!
//! Positions are the analyzer's token positions, continuous across the stored
//! values of a field (each value starts one past the previous value's end).
//! Offsets are byte offsets into a single stored value.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tantivy::{DocAddress, DocId};

/// A half-open range of token positions `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionSpan {
    /// First position of the span.
    pub start: u32,
    /// One past the last position of the span.
    pub end: u32,
}

impl PositionSpan {
    /// Creates a span. `end` must be greater than `start`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start < end, "empty span {start}..{end}");
        Self { start, end }
    }

    /// Number of positions covered.
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// Last position inside the span.
    pub fn last(&self) -> u32 {
        self.end - 1
    }

    /// Whether the two spans share a position.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Identifies a document across segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocKey {
    /// Segment ordinal within the searcher.
    pub segment_ord: u32,
    /// Doc id inside the segment.
    pub doc_id: DocId,
    /// Segment doc base plus doc id; unique for one searcher.
    pub global: u64,
}

impl DocKey {
    /// The Tantivy address of this document.
    pub fn address(&self) -> DocAddress {
        DocAddress::new(self.segment_ord, self.doc_id)
    }
}

/// Spans found in one document, reused from document to document.
#[derive(Debug, Default)]
pub struct DocTokenOffsets {
    /// The current document.
    pub doc: Option<DocKey>,
    /// Spans matched in it, ascending.
    pub spans: Vec<PositionSpan>,
}

impl DocTokenOffsets {
    /// Clears the accumulator for `doc`, keeping the span allocation.
    pub fn reset(&mut self, doc: DocKey) {
        self.doc = Some(doc);
        self.spans.clear();
    }
}

/// Token positions whose offsets are needed for the current document.
///
/// Held as disjoint half-open ranges, so wide context windows cost one entry
/// per window rather than one per position.
#[derive(Debug, Default)]
pub struct OffsetRequests {
    /// Requested ranges keyed by start, mapping to their end. Never adjacent.
    ranges: BTreeMap<u32, u32>,
}

impl OffsetRequests {
    /// Removes all requests.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Requests a single position.
    pub fn add(&mut self, position: u32) {
        self.add_range(position, position.saturating_add(1));
    }

    /// Requests every position in `[start, end)`, merging with touching ranges.
    fn add_range(&mut self, mut start: u32, mut end: u32) {
        if start >= end {
            return;
        }
        if let Some((&s, &e)) = self.ranges.range(..start).next_back()
            && e >= start
        {
            start = s;
            end = end.max(e);
        }
        while let Some((&s, &e)) = self.ranges.range(start..=end).next() {
            self.ranges.remove(&s);
            end = end.max(e);
        }
        self.ranges.insert(start, end);
    }

    /// Requests the positions a window around `span` needs: every context
    /// position plus the first and last target positions.
    pub fn add_span(&mut self, span: PositionSpan, before: u32, after: u32) {
        self.add_range(span.start.saturating_sub(before), span.start.saturating_add(1));
        self.add(span.last());
        self.add_range(span.end, span.end.saturating_add(after));
    }

    /// Whether `position` was requested.
    pub fn contains(&self, position: u32) -> bool {
        self.ranges
            .range(..=position)
            .next_back()
            .is_some_and(|(_, &end)| position < end)
    }

    /// Largest requested position.
    pub fn max(&self) -> Option<u32> {
        self.ranges.last_key_value().map(|(_, &end)| end - 1)
    }

    /// Whether nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of requested positions.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|(&s, &e)| (e - s) as usize).sum()
    }
}

/// Byte range of one token inside a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenOffset {
    /// Index of the stored value the token is in.
    pub value_index: usize,
    /// Byte offset of the token start.
    pub start: usize,
    /// Byte offset one past the token end.
    pub end: usize,
}

/// Resolved offsets for requested positions.
#[derive(Debug, Default)]
pub struct OffsetResults {
    /// Offsets keyed by position.
    offsets: HashMap<u32, TokenOffset>,
    /// Largest resolved position.
    last: Option<u32>,
}

impl OffsetResults {
    /// Removes all results.
    pub fn clear(&mut self) {
        self.offsets.clear();
        self.last = None;
    }

    /// Records the offset for `position`.
    pub fn insert(&mut self, position: u32, offset: TokenOffset) {
        self.offsets.insert(position, offset);
        self.last = self.last.max(Some(position));
    }

    /// Largest resolved position.
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Offset of `position`, if it was resolved.
    pub fn get(&self, position: u32) -> Option<TokenOffset> {
        self.offsets.get(&position).copied()
    }

    /// Number of resolved positions.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
