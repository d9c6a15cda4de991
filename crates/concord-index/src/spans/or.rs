//! Disjunction span cursor.

use tantivy::{DocId, TERMINATED};

use super::SpanCursor;
use crate::offsets::PositionSpan;

/// Union of the spans of several cursors.
pub struct OrSpans {
    /// Alternatives.
    clauses: Vec<Box<dyn SpanCursor>>,
    /// Smallest clause document.
    doc: DocId,
    /// Merged spans of the current document.
    spans: Vec<PositionSpan>,
}

impl OrSpans {
    /// Creates a disjunction over `clauses`.
    pub fn new(clauses: Vec<Box<dyn SpanCursor>>) -> Self {
        let mut spans = Self {
            clauses,
            doc: TERMINATED,
            spans: Vec::new(),
        };
        spans.settle();
        spans
    }

    /// Moves to the smallest clause document and merges its spans.
    fn settle(&mut self) -> DocId {
        self.doc = self
            .clauses
            .iter()
            .map(|c| c.doc())
            .min()
            .unwrap_or(TERMINATED);
        self.spans.clear();
        let doc = self.doc;
        if doc != TERMINATED {
            for clause in self.clauses.iter().filter(|c| c.doc() == doc) {
                self.spans.extend_from_slice(clause.spans());
            }
            self.spans.sort_unstable();
            self.spans.dedup();
        }
        self.doc
    }
}

impl SpanCursor for OrSpans {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> DocId {
        if self.doc == TERMINATED {
            return TERMINATED;
        }
        let current = self.doc;
        for clause in &mut self.clauses {
            if clause.doc() == current {
                clause.advance();
            }
        }
        self.settle()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.doc >= target {
            return self.doc;
        }
        for clause in &mut self.clauses {
            clause.seek(target);
        }
        self.settle()
    }

    fn spans(&self) -> &[PositionSpan] {
        &self.spans
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spans::{VecSpans, drain};

    #[test]
    fn merges_documents_and_spans() {
        let mut spans = OrSpans::new(vec![
            Box::new(VecSpans::positions(&[(1, &[3]), (4, &[0, 2])])),
            Box::new(VecSpans::positions(&[(1, &[1, 3]), (2, &[5])])),
        ]);
        assert_eq!(
            drain(&mut spans),
            vec![
                (1, vec![(1, 2), (3, 4)]),
                (2, vec![(5, 6)]),
                (4, vec![(0, 1), (2, 3)]),
            ]
        );
    }

    #[test]
    fn seek_skips_ahead() {
        let mut spans = OrSpans::new(vec![
            Box::new(VecSpans::positions(&[(1, &[0]), (7, &[0])])),
            Box::new(VecSpans::positions(&[(3, &[0]), (9, &[0])])),
        ]);
        assert_eq!(spans.seek(4), 7);
        assert_eq!(spans.seek(2), 7);
        assert_eq!(spans.advance(), 9);
        assert_eq!(spans.advance(), TERMINATED);
        assert!(spans.spans().is_empty());
    }
}
