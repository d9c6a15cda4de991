//! Proximity span cursor.
//!
//! A near match picks one span from every clause. Its slop is the number of
//! positions inside the match window not covered by the chosen spans.
//!
//! Ordered matching walks the first clause's spans and, for each, greedily
//! takes the earliest-ending span of the next clause that starts at or after
//! the previous span's end. Unordered matching sweeps all clauses together,
//! always advancing the clause with the smallest start, and rejects windows
//! where two clauses chose the very same span.

use tantivy::{DocId, TERMINATED};

use super::SpanCursor;
use crate::offsets::PositionSpan;

/// Clauses occurring within `slop` positions of each other.
pub struct NearSpans {
    /// Sub-cursors, in query order.
    clauses: Vec<Box<dyn SpanCursor>>,
    /// Maximum uncovered positions in a match.
    slop: u32,
    /// Whether clauses must appear in order.
    in_order: bool,
    /// Current document.
    doc: DocId,
    /// Matches in the current document.
    spans: Vec<PositionSpan>,
}

impl NearSpans {
    /// Creates a near cursor. Expects at least two clauses.
    pub fn new(clauses: Vec<Box<dyn SpanCursor>>, slop: u32, in_order: bool) -> Self {
        let mut spans = Self {
            clauses,
            slop,
            in_order,
            doc: TERMINATED,
            spans: Vec::new(),
        };
        spans.settle();
        spans
    }

    /// Aligns every clause on one document that has at least one match.
    fn settle(&mut self) -> DocId {
        loop {
            let target = self
                .clauses
                .iter()
                .map(|c| c.doc())
                .max()
                .unwrap_or(TERMINATED);
            if target == TERMINATED {
                self.doc = TERMINATED;
                self.spans.clear();
                return TERMINATED;
            }

            let mut aligned = true;
            for clause in &mut self.clauses {
                if clause.seek(target) != target {
                    aligned = false;
                    break;
                }
            }
            if !aligned {
                continue;
            }

            let lists: Vec<&[PositionSpan]> = self.clauses.iter().map(|c| c.spans()).collect();
            self.spans.clear();
            if self.in_order {
                ordered_matches(&lists, self.slop, &mut self.spans);
            } else {
                unordered_matches(&lists, self.slop, &mut self.spans);
            }
            self.spans.sort_unstable();
            self.spans.dedup();

            if !self.spans.is_empty() {
                self.doc = target;
                return target;
            }
            if let Some(first) = self.clauses.first_mut() {
                first.advance();
            }
        }
    }
}

impl SpanCursor for NearSpans {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> DocId {
        if self.doc == TERMINATED {
            return TERMINATED;
        }
        if let Some(first) = self.clauses.first_mut() {
            first.advance();
        }
        self.settle()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.doc >= target {
            return self.doc;
        }
        if let Some(first) = self.clauses.first_mut() {
            first.seek(target);
        }
        self.settle()
    }

    fn spans(&self) -> &[PositionSpan] {
        &self.spans
    }
}

/// Ordered, non-overlapping matches: at most one per span of the first clause.
pub(crate) fn ordered_matches(clauses: &[&[PositionSpan]], slop: u32, out: &mut Vec<PositionSpan>) {
    let Some((first, rest)) = clauses.split_first() else {
        return;
    };
    'outer: for head in *first {
        let mut prev_end = head.end;
        let mut gaps = 0u64;
        for spans in rest {
            // Next span in start order, however far it stretches.
            let from = spans.partition_point(|s| s.start < prev_end);
            let Some(&next) = spans.get(from) else {
                continue 'outer;
            };
            gaps += u64::from(next.start - prev_end);
            if gaps > u64::from(slop) {
                continue 'outer;
            }
            prev_end = next.end;
        }
        out.push(PositionSpan::new(head.start, prev_end));
    }
}

/// Unordered matches found by sweeping all clauses by start position.
pub(crate) fn unordered_matches(
    clauses: &[&[PositionSpan]],
    slop: u32,
    out: &mut Vec<PositionSpan>,
) {
    if clauses.is_empty() || clauses.iter().any(|c| c.is_empty()) {
        return;
    }
    let mut cursor = vec![0usize; clauses.len()];
    let mut chosen: Vec<PositionSpan> = Vec::with_capacity(clauses.len());
    loop {
        chosen.clear();
        chosen.extend(clauses.iter().zip(&cursor).map(|(spans, &i)| spans[i]));

        let mut lead = 0;
        for (i, span) in chosen.iter().enumerate() {
            if (span.start, span.end) < (chosen[lead].start, chosen[lead].end) {
                lead = i;
            }
        }
        let start = chosen[lead].start;
        let end = chosen.iter().map(|s| s.end).max().unwrap_or(start);
        let covered: u64 = chosen.iter().map(|s| u64::from(s.width())).sum();
        let distinct = chosen
            .iter()
            .enumerate()
            .all(|(i, a)| chosen[i + 1..].iter().all(|b| a != b));

        if distinct && u64::from(end - start) <= covered + u64::from(slop) {
            out.push(PositionSpan::new(start, end));
        }

        cursor[lead] += 1;
        if cursor[lead] == clauses[lead].len() {
            return;
        }
    }
}
