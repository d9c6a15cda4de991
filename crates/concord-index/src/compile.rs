//! Document filter compiler.
//!
//! Span matching decides where the windows are; the document filter decides
//! which documents are allowed to produce them. The filter is compiled from the
//! full query tree so that constraints the span form cannot carry (negated
//! clauses, conditions on other fields) still apply. Positional structure is
//! relaxed to plain conjunctions, so the filter never rejects a document the
//! spans could match.

use std::ops::Bound;

use concord_query::{NormalizeError, Occur as ClauseOccur, Query, SpanQuery, TermPattern};
use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, DisjunctionMaxQuery, EmptyQuery, FuzzyTermQuery, Occur,
        Query as TantivyQuery, RangeQuery, RegexQuery, TermQuery,
    },
    schema::{Field, IndexRecordOption, Schema},
};

use crate::{
    ConcordanceError, IndexError,
    spans::{MAX_FUZZY_DISTANCE, prefix_to_regex, wildcard_to_regex},
};

/// Compiles query trees into Tantivy document filters.
pub struct QueryFilterCompiler {
    /// Schema used to resolve field names.
    schema: Schema,
}

impl QueryFilterCompiler {
    /// Creates a compiler for an index with this schema.
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Compiles `query` into a filter matching a superset of the documents
    /// its span form can match.
    pub fn compile(&self, query: &Query) -> Result<Box<dyn TantivyQuery>, ConcordanceError> {
        match query {
            Query::Term { field, text } => self.term(field, text),

            Query::Phrase { field, terms, .. } => {
                let clauses = terms
                    .iter()
                    .map(|t| self.term(field, t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(conjunction(clauses))
            }

            Query::MultiPhrase { field, terms, .. } => {
                let mut slots = Vec::with_capacity(terms.len());
                for alternatives in terms.iter().filter(|a| !a.is_empty()) {
                    let options = alternatives
                        .iter()
                        .map(|t| self.term(field, t))
                        .collect::<Result<Vec<_>, _>>()?;
                    slots.push(disjunction(options));
                }
                Ok(conjunction(slots))
            }

            Query::Boolean { clauses } => {
                let mut compiled = Vec::with_capacity(clauses.len() + 1);
                for clause in clauses {
                    let occur = match clause.occur {
                        ClauseOccur::Must | ClauseOccur::Filter => Occur::Must,
                        ClauseOccur::Should => Occur::Should,
                        ClauseOccur::MustNot => Occur::MustNot,
                    };
                    compiled.push((occur, self.compile(&clause.query)?));
                }
                if !compiled.is_empty() && compiled.iter().all(|(o, _)| *o == Occur::MustNot) {
                    compiled.push((Occur::Must, Box::new(AllQuery)));
                }
                Ok(Box::new(BooleanQuery::new(compiled)))
            }

            Query::DisjunctionMax { disjuncts } => {
                let compiled = disjuncts
                    .iter()
                    .map(|d| self.compile(d))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(DisjunctionMaxQuery::new(compiled)))
            }

            Query::MultiTerm { field, pattern } => self.multi_term(field, pattern),

            Query::ConstantScore { query } | Query::Boost { query, .. } => self.compile(query),

            Query::MatchAll => Ok(Box::new(AllQuery)),

            Query::Span { query } => self.span(query),

            Query::Exists { .. } => Err(unsupported("exists")),
            Query::NumericRange { .. } => Err(unsupported("numeric_range")),
        }
    }

    /// Compiles a span tree, ignoring positions.
    pub fn span(&self, span: &SpanQuery) -> Result<Box<dyn TantivyQuery>, ConcordanceError> {
        match span {
            SpanQuery::Term { field, text } => self.term(field, text),
            SpanQuery::Near { clauses, .. } => {
                let compiled = clauses
                    .iter()
                    .map(|c| self.span(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(conjunction(compiled))
            }
            SpanQuery::Or { clauses } => {
                let compiled = clauses
                    .iter()
                    .map(|c| self.span(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(disjunction(compiled))
            }
            SpanQuery::MultiTerm(multi) => self.multi_term(&multi.field, &multi.pattern),
            SpanQuery::Empty => Ok(Box::new(EmptyQuery)),
        }
    }

    /// Resolves a field name.
    fn field(&self, name: &str) -> Result<Field, ConcordanceError> {
        self.schema
            .get_field(name)
            .map_err(|_| ConcordanceError::UnknownField(name.to_string()))
    }

    /// Documents containing one indexed term.
    fn term(&self, field: &str, text: &str) -> Result<Box<dyn TantivyQuery>, ConcordanceError> {
        let term = Term::from_field_text(self.field(field)?, text);
        Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)))
    }

    /// Documents containing any term matching `pattern`.
    fn multi_term(
        &self,
        field: &str,
        pattern: &TermPattern,
    ) -> Result<Box<dyn TantivyQuery>, ConcordanceError> {
        let handle = self.field(field)?;
        match pattern {
            TermPattern::Prefix { prefix } => regex(&prefix_to_regex(prefix), prefix, handle),
            TermPattern::Wildcard { pattern } => {
                regex(&wildcard_to_regex(pattern), pattern, handle)
            }
            TermPattern::Regex { pattern } => regex(pattern, pattern, handle),
            TermPattern::Fuzzy {
                text,
                distance,
                transpositions,
            } => {
                let term = Term::from_field_text(handle, text);
                Ok(Box::new(FuzzyTermQuery::new(
                    term,
                    (*distance).min(MAX_FUZZY_DISTANCE),
                    *transpositions,
                )))
            }
            TermPattern::Range {
                lower,
                upper,
                include_lower,
                include_upper,
            } => {
                let lower = bound(lower.as_deref(), *include_lower);
                let upper = bound(upper.as_deref(), *include_upper);
                Ok(Box::new(RangeQuery::new_str_bounds(
                    field.to_string(),
                    lower,
                    upper,
                )))
            }
        }
    }
}

/// All clauses must match. A single clause is returned unwrapped.
fn conjunction(mut clauses: Vec<Box<dyn TantivyQuery>>) -> Box<dyn TantivyQuery> {
    match clauses.len() {
        0 => Box::new(EmptyQuery),
        1 => clauses.remove(0),
        _ => Box::new(BooleanQuery::new(
            clauses.into_iter().map(|c| (Occur::Must, c)).collect(),
        )),
    }
}

/// Any clause may match. A single clause is returned unwrapped.
fn disjunction(mut clauses: Vec<Box<dyn TantivyQuery>>) -> Box<dyn TantivyQuery> {
    match clauses.len() {
        0 => Box::new(EmptyQuery),
        1 => clauses.remove(0),
        _ => Box::new(BooleanQuery::new(
            clauses.into_iter().map(|c| (Occur::Should, c)).collect(),
        )),
    }
}

/// Builds a term regex query, reporting the user's pattern on failure.
fn regex(
    regex: &str,
    original: &str,
    field: Field,
) -> Result<Box<dyn TantivyQuery>, ConcordanceError> {
    let query = RegexQuery::from_pattern(regex, field).map_err(|e| IndexError::InvalidPattern {
        pattern: original.to_string(),
        message: e.to_string(),
    })?;
    Ok(Box::new(query))
}

/// Converts an optional range endpoint.
fn bound(value: Option<&str>, inclusive: bool) -> Bound<&str> {
    match value {
        None => Bound::Unbounded,
        Some(v) if inclusive => Bound::Included(v),
        Some(v) => Bound::Excluded(v),
    }
}

/// Error for query kinds that have no document filter.
fn unsupported(kind: &'static str) -> ConcordanceError {
    ConcordanceError::Normalize(NormalizeError::UnsupportedQueryKind { kind })
}

#[cfg(test)]
mod tests {
    use concord_config::AnalysisSettings;
    use concord_query::Clause;
    use tantivy::collector::DocSetCollector;

    use super::*;
    use crate::{ConcordanceIndex, CorpusDocument, CorpusField, CorpusWriter};

    fn corpus() -> ConcordanceIndex {
        let fields = [CorpusField::text("body"), CorpusField::keyword("lang")];
        let mut writer =
            CorpusWriter::create_in_ram(&fields, &AnalysisSettings::default()).unwrap();
        for (body, lang) in [
            ("the quick brown fox", "en"),
            ("a lazy brown dog", "en"),
            ("quick thinking", "fr"),
        ] {
            writer
                .add_document(&CorpusDocument::new().with("body", body).with("lang", lang))
                .unwrap();
        }
        writer.finish().unwrap()
    }

    fn matching(query: &Query) -> Vec<u32> {
        let index = corpus();
        let compiled = QueryFilterCompiler::new(index.schema()).compile(query).unwrap();
        let searcher = index.searcher();
        let mut docs: Vec<u32> = searcher
            .search(compiled.as_ref(), &DocSetCollector)
            .unwrap()
            .into_iter()
            .map(|a| a.doc_id)
            .collect();
        docs.sort_unstable();
        docs
    }

    fn term(field: &str, text: &str) -> Query {
        Query::Term {
            field: field.to_string(),
            text: text.to_string(),
        }
    }

    fn clause(occur: ClauseOccur, query: Query) -> Clause {
        Clause { occur, query }
    }

    #[test]
    fn term_filter() {
        assert_eq!(matching(&term("body", "brown")), vec![0, 1]);
    }

    #[test]
    fn phrase_relaxes_to_conjunction() {
        let phrase = Query::Phrase {
            field: "body".to_string(),
            terms: vec!["fox".to_string(), "brown".to_string()],
            positions: Vec::new(),
            slop: 0,
        };
        assert_eq!(matching(&phrase), vec![0]);
    }

    #[test]
    fn only_negative_clauses_match_the_rest() {
        let query = Query::Boolean {
            clauses: vec![clause(ClauseOccur::MustNot, term("lang", "fr"))],
        };
        assert_eq!(matching(&query), vec![0, 1]);
    }

    #[test]
    fn negation_across_fields() {
        let query = Query::Boolean {
            clauses: vec![
                clause(ClauseOccur::Must, term("body", "quick")),
                clause(ClauseOccur::MustNot, term("lang", "fr")),
            ],
        };
        assert_eq!(matching(&query), vec![0]);
    }

    #[test]
    fn multi_term_patterns() {
        let prefix = Query::MultiTerm {
            field: "body".to_string(),
            pattern: TermPattern::Prefix {
                prefix: "qu".to_string(),
            },
        };
        assert_eq!(matching(&prefix), vec![0, 2]);

        let fuzzy = Query::MultiTerm {
            field: "body".to_string(),
            pattern: TermPattern::Fuzzy {
                text: "dug".to_string(),
                distance: 1,
                transpositions: true,
            },
        };
        assert_eq!(matching(&fuzzy), vec![1]);

        let range = Query::MultiTerm {
            field: "body".to_string(),
            pattern: TermPattern::Range {
                lower: Some("la".to_string()),
                upper: Some("lb".to_string()),
                include_lower: true,
                include_upper: false,
            },
        };
        assert_eq!(matching(&range), vec![1]);
    }

    #[test]
    fn span_near_is_conjunction() {
        let span = SpanQuery::near(
            vec![SpanQuery::term("body", "quick"), SpanQuery::term("body", "brown")],
            0,
            true,
        );
        assert_eq!(matching(&Query::Span { query: span }), vec![0]);
    }

    #[test]
    fn match_all_and_wrappers() {
        assert_eq!(matching(&Query::MatchAll), vec![0, 1, 2]);
        let boosted = Query::Boost {
            query: Box::new(term("lang", "fr")),
            factor: 2.0,
        };
        assert_eq!(matching(&boosted), vec![2]);
    }

    #[test]
    fn unknown_field() {
        let index = corpus();
        let err = QueryFilterCompiler::new(index.schema())
            .compile(&term("nope", "x"))
            .err()
            .unwrap();
        assert!(matches!(err, ConcordanceError::UnknownField(name) if name == "nope"));
    }

    #[test]
    fn exists_is_unsupported() {
        let index = corpus();
        let err = QueryFilterCompiler::new(index.schema())
            .compile(&Query::Exists {
                field: "body".to_string(),
            })
            .err()
            .unwrap();
        assert!(matches!(err, ConcordanceError::Normalize(_)));
    }
}
