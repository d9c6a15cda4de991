//! Overlap pruning for the spans of one document.

use crate::offsets::PositionSpan;

/// Sorts `spans` by start, longest first, and unless `allow_overlaps` is set
/// drops every span that overlaps an earlier kept one.
///
/// Among spans sharing a start the longest wins; equal spans keep their input
/// order, so exact duplicates collapse to the first.
pub fn remove_overlaps(spans: &mut Vec<PositionSpan>, allow_overlaps: bool) {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    if allow_overlaps {
        return;
    }
    let mut kept_end: Option<u32> = None;
    spans.retain(|span| {
        if kept_end.is_some_and(|end| span.start < end) {
            return false;
        }
        kept_end = Some(span.end);
        true
    });
}
