//! Window collectors.
//!
//! A collector receives windows as the searcher produces them and decides when
//! to stop: once `max_hits` windows are accepted, `collect` returns false and
//! the searcher abandons the rest of the crawl. Accepted windows are never
//! taken back.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::window::ConcordanceWindow;

/// Counters shared by every collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Documents that produced at least one candidate window.
    pub documents: usize,
    /// Windows accepted.
    pub windows: usize,
    /// Hard cap on accepted windows.
    pub max_hits: Option<usize>,
}

impl CollectorStats {
    /// Creates counters with the given cap.
    pub fn new(max_hits: Option<usize>) -> Self {
        Self {
            max_hits,
            ..Self::default()
        }
    }

    /// Whether the cap has been reached.
    pub fn hit_max(&self) -> bool {
        self.max_hits.is_some_and(|max| self.windows >= max)
    }

    /// Counts a window if there is room; returns whether it was accepted.
    fn accept(&mut self) -> bool {
        if self.hit_max() {
            return false;
        }
        self.windows += 1;
        true
    }
}

/// Receives concordance windows.
pub trait WindowCollector {
    /// Offers a window. Returns false when the search should stop.
    fn collect(&mut self, window: ConcordanceWindow) -> bool;

    /// Notes that a new document is being windowed.
    fn start_document(&mut self);

    /// Current counters.
    fn stats(&self) -> CollectorStats;

    /// Whether no further windows will be accepted.
    fn hit_max(&self) -> bool {
        self.stats().hit_max()
    }
}

/// Keeps windows in discovery order.
#[derive(Debug, Default)]
pub struct ListCollector {
    /// Counters.
    stats: CollectorStats,
    /// Accepted windows.
    windows: Vec<ConcordanceWindow>,
}

impl ListCollector {
    /// Creates a collector accepting at most `max_hits` windows.
    pub fn new(max_hits: Option<usize>) -> Self {
        Self {
            stats: CollectorStats::new(max_hits),
            windows: Vec::new(),
        }
    }

    /// Accepted windows, in discovery order.
    pub fn windows(&self) -> &[ConcordanceWindow] {
        &self.windows
    }

    /// Consumes the collector, returning its windows.
    pub fn into_windows(self) -> Vec<ConcordanceWindow> {
        self.windows
    }
}

impl WindowCollector for ListCollector {
    fn collect(&mut self, window: ConcordanceWindow) -> bool {
        if !self.stats.accept() {
            return false;
        }
        self.windows.push(window);
        !self.stats.hit_max()
    }

    fn start_document(&mut self) {
        self.stats.documents += 1;
    }

    fn stats(&self) -> CollectorStats {
        self.stats
    }
}

/// Heap entry ordering windows by sort key, then document, then offset.
#[derive(Debug)]
struct Ranked(ConcordanceWindow);

impl Ranked {
    /// Ordering tuple.
    fn key(&self) -> (&str, u64, usize) {
        (self.0.sort_key(), self.0.doc().global, self.0.target_start())
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Keeps the `top` smallest windows by sort key.
///
/// With `top` unset every accepted window is kept. Output is sorted.
#[derive(Debug, Default)]
pub struct SortedCollector {
    /// Counters.
    stats: CollectorStats,
    /// How many windows to retain.
    top: Option<usize>,
    /// Max-heap of the retained windows.
    heap: BinaryHeap<Ranked>,
}

impl SortedCollector {
    /// Creates a collector keeping the best `top` of at most `max_hits`
    /// accepted windows.
    pub fn new(top: Option<usize>, max_hits: Option<usize>) -> Self {
        Self {
            stats: CollectorStats::new(max_hits),
            top,
            heap: BinaryHeap::new(),
        }
    }

    /// Consumes the collector, returning the retained windows in sort order.
    pub fn into_sorted_windows(self) -> Vec<ConcordanceWindow> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|r| r.0)
            .collect()
    }
}

impl WindowCollector for SortedCollector {
    fn collect(&mut self, window: ConcordanceWindow) -> bool {
        if !self.stats.accept() {
            return false;
        }
        if self.top == Some(0) {
            return !self.stats.hit_max();
        }
        self.heap.push(Ranked(window));
        if self.top.is_some_and(|top| self.heap.len() > top) {
            self.heap.pop();
        }
        !self.stats.hit_max()
    }

    fn start_document(&mut self) {
        self.stats.documents += 1;
    }

    fn stats(&self) -> CollectorStats {
        self.stats
    }
}

/// Hands every window to a callback and keeps nothing.
pub struct CallbackCollector<F> {
    /// Counters.
    stats: CollectorStats,
    /// Receives each accepted window.
    callback: F,
}

impl<F: FnMut(&ConcordanceWindow)> CallbackCollector<F> {
    /// Creates a collector calling `callback` for at most `max_hits` windows.
    pub fn new(max_hits: Option<usize>, callback: F) -> Self {
        Self {
            stats: CollectorStats::new(max_hits),
            callback,
        }
    }
}

impl<F: FnMut(&ConcordanceWindow)> WindowCollector for CallbackCollector<F> {
    fn collect(&mut self, window: ConcordanceWindow) -> bool {
        if !self.stats.accept() {
            return false;
        }
        (self.callback)(&window);
        !self.stats.hit_max()
    }

    fn start_document(&mut self) {
        self.stats.documents += 1;
    }

    fn stats(&self) -> CollectorStats {
        self.stats
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        offsets::{DocKey, OffsetResults, PositionSpan, TokenOffset},
        window::{WindowBuilder, WindowConfig},
    };

    /// A window whose target and sort key are `word`.
    fn window(doc: u32, word: &str) -> ConcordanceWindow {
        let mut results = OffsetResults::default();
        results.insert(
            0,
            TokenOffset {
                value_index: 0,
                start: 0,
                end: word.len(),
            },
        );
        let config = WindowConfig {
            tokens_before: 0,
            tokens_after: 0,
            ..WindowConfig::default()
        };
        WindowBuilder::new(config)
            .build(
                DocKey {
                    segment_ord: 0,
                    doc_id: doc,
                    global: u64::from(doc),
                },
                PositionSpan::new(0, 1),
                &[word.to_string()],
                &results,
                BTreeMap::new(),
            )
            .unwrap()
    }

    #[test]
    fn list_stops_at_max() {
        let mut collector = ListCollector::new(Some(3));
        assert!(collector.collect(window(0, "a")));
        assert!(collector.collect(window(1, "b")));
        assert!(!collector.collect(window(2, "c")));
        assert!(!collector.collect(window(3, "d")));
        assert!(collector.hit_max());
        assert_eq!(collector.stats().windows, 3);
        let targets: Vec<_> = collector.windows().iter().map(|w| w.target().to_string()).collect();
        assert_eq!(targets, vec!["a", "b", "c"]);
    }

    #[test]
    fn zero_max_accepts_nothing() {
        let mut collector = ListCollector::new(Some(0));
        assert!(!collector.collect(window(0, "a")));
        assert!(collector.into_windows().is_empty());
    }

    #[test]
    fn unbounded_list() {
        let mut collector = ListCollector::new(None);
        for i in 0..50 {
            assert!(collector.collect(window(i, "x")));
        }
        collector.start_document();
        assert_eq!(collector.stats().windows, 50);
        assert_eq!(collector.stats().documents, 1);
        assert!(!collector.hit_max());
    }

    #[test]
    fn sorted_keeps_top_k() {
        let mut collector = SortedCollector::new(Some(2), None);
        for (doc, word) in ["pear", "apple", "fig", "banana"].into_iter().enumerate() {
            assert!(collector.collect(window(doc as u32, word)));
        }
        let targets: Vec<_> = collector
            .into_sorted_windows()
            .iter()
            .map(|w| w.target().to_string())
            .collect();
        assert_eq!(targets, vec!["apple", "banana"]);
    }

    #[test]
    fn sorted_ties_break_by_document() {
        let mut collector = SortedCollector::new(None, None);
        collector.collect(window(5, "same"));
        collector.collect(window(2, "same"));
        let docs: Vec<_> = collector
            .into_sorted_windows()
            .iter()
            .map(|w| w.doc().doc_id)
            .collect();
        assert_eq!(docs, vec![2, 5]);
    }

    #[test]
    fn callback_sees_each_window() {
        let mut seen = Vec::new();
        let mut collector = CallbackCollector::new(Some(2), |w: &ConcordanceWindow| {
            seen.push(w.target().to_string());
        });
        assert!(collector.collect(window(0, "a")));
        assert!(!collector.collect(window(1, "b")));
        assert!(!collector.collect(window(2, "c")));
        drop(collector);
        assert_eq!(seen, vec!["a", "b"]);
    }
}
