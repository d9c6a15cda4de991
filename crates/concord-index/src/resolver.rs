//! Recovering character offsets for token positions.
//!
//! The index keeps positions, not offsets, so the stored values are run back
//! through the analyzer. Values of a multi-valued field share one position
//! space: each value starts one position past the furthest token end of the
//! previous value, matching how Tantivy assigns positions at index time.

use tantivy::tokenizer::{TextAnalyzer, TokenStream};

use crate::offsets::{OffsetRequests, OffsetResults, TokenOffset};

/// Positions skipped between consecutive values of a field.
const POSITION_GAP: u32 = 1;

/// Resolves requested token positions into byte offsets.
pub trait OffsetResolver {
    /// Fills `results` with the offsets of every requested position found in
    /// `values`. Previous results are discarded.
    fn resolve(
        &mut self,
        values: &[String],
        requests: &OffsetRequests,
        results: &mut OffsetResults,
    );
}

/// Resolver that re-tokenizes stored values with the index analyzer.
///
/// Tokenization stops as soon as the largest requested position is passed.
pub struct ReanalyzingOffsetResolver {
    /// Analyzer the field was indexed with.
    analyzer: TextAnalyzer,
}

impl ReanalyzingOffsetResolver {
    /// Creates a resolver around the field's analyzer.
    pub fn new(analyzer: TextAnalyzer) -> Self {
        Self { analyzer }
    }
}

impl OffsetResolver for ReanalyzingOffsetResolver {
    fn resolve(
        &mut self,
        values: &[String],
        requests: &OffsetRequests,
        results: &mut OffsetResults,
    ) {
        results.clear();
        let Some(max) = requests.max() else {
            return;
        };

        let mut base = 0u32;
        for (value_index, value) in values.iter().enumerate() {
            let mut end = base;
            let mut stream = self.analyzer.token_stream(value);
            while let Some(token) = stream.next() {
                let position = base + token.position as u32;
                if position > max {
                    return;
                }
                if requests.contains(position) {
                    results.insert(
                        position,
                        TokenOffset {
                            value_index,
                            start: token.offset_from,
                            end: token.offset_to,
                        },
                    );
                }
                end = end.max(position + token.position_length as u32);
            }
            base = end + POSITION_GAP;
            if base > max {
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use concord_config::AnalysisSettings;

    use super::*;
    use crate::{analyzer::build_analyzer, offsets::PositionSpan};

    fn resolver(stop_words: &[&str]) -> ReanalyzingOffsetResolver {
        let settings = AnalysisSettings {
            stop_words: stop_words.iter().map(|w| (*w).to_string()).collect(),
            ..AnalysisSettings::default()
        };
        ReanalyzingOffsetResolver::new(build_analyzer(&settings).unwrap())
    }

    fn values(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| (*v).to_string()).collect()
    }

    fn offset(results: &OffsetResults, position: u32) -> Option<(usize, usize, usize)> {
        results
            .get(position)
            .map(|o| (o.value_index, o.start, o.end))
    }

    #[test]
    fn resolves_requested_positions() {
        let mut requests = OffsetRequests::default();
        requests.add(1);
        requests.add(2);
        let mut results = OffsetResults::default();
        resolver(&[]).resolve(&values(&["the quick brown fox"]), &requests, &mut results);

        assert_eq!(results.len(), 2);
        assert_eq!(offset(&results, 1), Some((0, 4, 9)));
        assert_eq!(offset(&results, 2), Some((0, 10, 15)));
    }

    #[test]
    fn positions_continue_across_values() {
        // "a b" covers 0..2, so "c" starts at 3.
        let mut requests = OffsetRequests::default();
        requests.add_span(PositionSpan::new(3, 5), 2, 0);
        let mut results = OffsetResults::default();
        resolver(&[]).resolve(&values(&["a b", "c d"]), &requests, &mut results);

        assert_eq!(offset(&results, 1), Some((0, 2, 3)));
        assert_eq!(offset(&results, 2), None);
        assert_eq!(offset(&results, 3), Some((1, 0, 1)));
        assert_eq!(offset(&results, 4), Some((1, 2, 3)));
    }

    #[test]
    fn empty_values_still_take_a_gap() {
        let mut requests = OffsetRequests::default();
        requests.add(3);
        let mut results = OffsetResults::default();
        resolver(&[]).resolve(&values(&["a", "", "b"]), &requests, &mut results);
        assert_eq!(offset(&results, 3), Some((2, 0, 1)));
    }

    #[test]
    fn stop_words_leave_holes() {
        let mut requests = OffsetRequests::default();
        for p in 0..5 {
            requests.add(p);
        }
        let mut results = OffsetResults::default();
        let text = values(&["the king of the hill"]);
        resolver(&["the", "of"]).resolve(&text, &requests, &mut results);

        assert_eq!(results.len(), 2);
        assert_eq!(offset(&results, 1), Some((0, 4, 8)));
        assert_eq!(offset(&results, 4), Some((0, 16, 20)));
    }

    #[test]
    fn multibyte_offsets_are_byte_offsets() {
        let mut requests = OffsetRequests::default();
        requests.add(1);
        let mut results = OffsetResults::default();
        resolver(&[]).resolve(&values(&["café noir"]), &requests, &mut results);
        assert_eq!(offset(&results, 1), Some((0, 6, 10)));
    }

    #[test]
    fn nothing_requested() {
        let mut results = OffsetResults::default();
        results.insert(
            9,
            TokenOffset {
                value_index: 0,
                start: 0,
                end: 1,
            },
        );
        resolver(&[]).resolve(&values(&["a b"]), &OffsetRequests::default(), &mut results);
        assert!(results.is_empty());
    }
}
