//! Term dictionary expansion for multi-term spans.

use std::str;

use concord_query::TermPattern;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, SINK_STATE};
use log::warn;
use tantivy::{InvertedIndexReader, termdict::TermStreamer};
use tantivy_fst::{Automaton, Regex};

use crate::IndexError;

/// Default cap on the number of terms one pattern expands to per segment.
pub const DEFAULT_MAX_EXPANSIONS: usize = 1024;

/// Largest supported fuzzy edit distance.
pub(crate) const MAX_FUZZY_DISTANCE: u8 = 2;

/// Wrapper that implements `tantivy_fst::Automaton` for `levenshtein_automata::DFA`.
struct LevenshteinDfa(levenshtein_automata::DFA);

impl Automaton for LevenshteinDfa {
    type State = u32;

    fn start(&self) -> Self::State {
        self.0.initial_state()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &Self::State) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        self.0.transition(*state, byte)
    }
}

/// Lists the indexed terms of a segment matching `pattern`, in term order.
///
/// At most `limit` terms are returned; a truncated expansion is logged.
pub fn expand_terms(
    inverted_index: &InvertedIndexReader,
    pattern: &TermPattern,
    limit: usize,
) -> Result<Vec<String>, IndexError> {
    let terms = inverted_index.terms();
    let mut out = Vec::new();
    let truncated = match pattern {
        TermPattern::Prefix { prefix } => {
            let stream = terms.range().ge(prefix.as_bytes()).into_stream()?;
            collect(stream, limit, &mut out, |key| key.starts_with(prefix.as_bytes()))
        }
        TermPattern::Wildcard { pattern } => {
            let regex = compile_regex(&wildcard_to_regex(pattern), pattern)?;
            collect(terms.search(regex).into_stream()?, limit, &mut out, |_| true)
        }
        TermPattern::Regex { pattern } => {
            let regex = compile_regex(pattern, pattern)?;
            collect(terms.search(regex).into_stream()?, limit, &mut out, |_| true)
        }
        TermPattern::Fuzzy {
            text,
            distance,
            transpositions,
        } => {
            let distance = (*distance).min(MAX_FUZZY_DISTANCE);
            let dfa = LevenshteinAutomatonBuilder::new(distance, *transpositions).build_dfa(text);
            let stream = terms.search(LevenshteinDfa(dfa)).into_stream()?;
            collect(stream, limit, &mut out, |_| true)
        }
        TermPattern::Range {
            lower,
            upper,
            include_lower,
            include_upper,
        } => {
            let mut builder = terms.range();
            if let Some(lower) = lower {
                builder = if *include_lower {
                    builder.ge(lower.as_bytes())
                } else {
                    builder.gt(lower.as_bytes())
                };
            }
            if let Some(upper) = upper {
                builder = if *include_upper {
                    builder.le(upper.as_bytes())
                } else {
                    builder.lt(upper.as_bytes())
                };
            }
            collect(builder.into_stream()?, limit, &mut out, |_| true)
        }
    };

    if truncated {
        warn!("{pattern} matches more than {limit} terms; expansion truncated");
    }
    Ok(out)
}

/// Drains `stream` into `out` while `keep` accepts keys.
///
/// Returns true when the limit cut the stream short.
fn collect<A>(
    mut stream: TermStreamer<'_, A>,
    limit: usize,
    out: &mut Vec<String>,
    keep: impl Fn(&[u8]) -> bool,
) -> bool
where
    A: Automaton,
    A::State: Clone,
{
    while stream.advance() {
        let key = stream.key();
        if !keep(key) {
            return false;
        }
        if out.len() == limit {
            return true;
        }
        if let Ok(text) = str::from_utf8(key) {
            out.push(text.to_string());
        }
    }
    false
}

/// Compiles a term regex, reporting `original` on failure.
fn compile_regex(regex: &str, original: &str) -> Result<Regex, IndexError> {
    Regex::new(regex).map_err(|e| IndexError::InvalidPattern {
        pattern: original.to_string(),
        message: e.to_string(),
    })
}

/// Translates a glob-style wildcard into an anchored term regex.
///
/// `*` matches any run of characters and `?` a single character; everything
/// else is literal.
pub(crate) fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c => push_literal(&mut regex, c),
        }
    }
    regex
}

/// Regex matching every term that starts with `prefix`.
pub(crate) fn prefix_to_regex(prefix: &str) -> String {
    let mut regex = String::with_capacity(prefix.len() + 2);
    for c in prefix.chars() {
        push_literal(&mut regex, c);
    }
    regex.push_str(".*");
    regex
}

/// Appends `c`, escaped when it is a regex metacharacter.
fn push_literal(regex: &mut String, c: char) {
    if "\\.+*?()|[]{}^$".contains(c) {
        regex.push('\\');
    }
    regex.push(c);
}
