//! Span-form queries.
//!
//! A span query matches ordered position ranges rather than whole documents.
//! Every node is bound to a single field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ast::TermPattern, error::NormalizeError};

/// A term-set pattern bound to a field, expanded against a segment's term
/// dictionary when the span is executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTermQuery {
    /// Field name.
    pub field: String,
    /// Pattern selecting the terms.
    pub pattern: TermPattern,
}

/// A positional query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpanQuery {
    /// Every occurrence of one term; each span covers a single position.
    Term {
        /// Field name.
        field: String,
        /// Indexed term text.
        text: String,
    },

    /// Clauses matching close to each other.
    Near {
        /// Sub-spans, in query order.
        clauses: Vec<Self>,
        /// Maximum number of positions between the sub-spans.
        slop: u32,
        /// Whether the sub-spans must appear in clause order.
        in_order: bool,
    },

    /// Union of the clauses' spans.
    Or {
        /// The alternatives.
        clauses: Vec<Self>,
    },

    /// Union of the spans of every term matching a pattern.
    MultiTerm(MultiTermQuery),

    /// Matches nothing.
    Empty,
}

impl SpanQuery {
    /// Creates a term span.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Creates a near span.
    pub fn near(clauses: Vec<Self>, slop: u32, in_order: bool) -> Self {
        Self::Near {
            clauses,
            slop,
            in_order,
        }
    }

    /// Creates a disjunction of spans.
    pub fn or(clauses: Vec<Self>) -> Self {
        Self::Or { clauses }
    }

    /// Creates a multi-term span.
    pub fn multi_term(field: impl Into<String>, pattern: TermPattern) -> Self {
        Self::MultiTerm(MultiTermQuery {
            field: field.into(),
            pattern,
        })
    }

    /// Returns true when the span can never match.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Near { clauses, .. } => clauses.is_empty() || clauses.iter().any(Self::is_empty),
            Self::Or { clauses } => clauses.iter().all(Self::is_empty),
            Self::Term { .. } | Self::MultiTerm(_) => false,
        }
    }

    /// Returns the single field this span is bound to.
    ///
    /// `Ok(None)` means the tree contains no field-bound node at all.
    pub fn field(&self) -> Result<Option<&str>, NormalizeError> {
        let mut found = None;
        self.collect_field(&mut found)?;
        Ok(found)
    }

    /// Walks the tree, checking every bound field against `found`.
    fn collect_field<'a>(&'a self, found: &mut Option<&'a str>) -> Result<(), NormalizeError> {
        let own = match self {
            Self::Term { field, .. } | Self::MultiTerm(MultiTermQuery { field, .. }) => field,
            Self::Near { clauses, .. } | Self::Or { clauses } => {
                for clause in clauses {
                    clause.collect_field(found)?;
                }
                return Ok(());
            }
            Self::Empty => return Ok(()),
        };
        match found {
            Some(existing) if *existing != own.as_str() => Err(NormalizeError::MixedFields {
                first: (*existing).to_string(),
                second: own.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                *found = Some(own);
                Ok(())
            }
        }
    }

    /// Minimum number of positions a single match of this span covers.
    pub fn min_width(&self) -> u32 {
        match self {
            Self::Term { .. } | Self::MultiTerm(_) => 1,
            Self::Near { clauses, .. } => clauses.iter().map(Self::min_width).sum(),
            Self::Or { clauses } => clauses.iter().map(Self::min_width).min().unwrap_or(0),
            Self::Empty => 0,
        }
    }
}

/// Writes a comma separated clause list.
fn fmt_clauses(f: &mut fmt::Formatter<'_>, clauses: &[SpanQuery]) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{clause}")?;
    }
    Ok(())
}

impl fmt::Display for SpanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term { field, text } => write!(f, "{field}:{text}"),
            Self::Near {
                clauses,
                slop,
                in_order,
            } => {
                f.write_str("spanNear([")?;
                fmt_clauses(f, clauses)?;
                write!(f, "], {slop}, {in_order})")
            }
            Self::Or { clauses } => {
                f.write_str("spanOr([")?;
                fmt_clauses(f, clauses)?;
                f.write_str("])")
            }
            Self::MultiTerm(MultiTermQuery { field, pattern }) => {
                write!(f, "spanMulti({field}:{pattern})")
            }
            Self::Empty => f.write_str("spanEmpty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_lucene_shape() {
        let span = SpanQuery::near(
            vec![
                SpanQuery::term("body", "brown"),
                SpanQuery::or(vec![
                    SpanQuery::term("body", "fox"),
                    SpanQuery::multi_term(
                        "body",
                        TermPattern::Prefix {
                            prefix: "dog".into(),
                        },
                    ),
                ]),
            ],
            1,
            true,
        );
        assert_eq!(
            span.to_string(),
            "spanNear([body:brown, spanOr([body:fox, spanMulti(body:dog*)])], 1, true)"
        );
    }

    #[test]
    fn field_of_single_field_tree() {
        let span = SpanQuery::or(vec![
            SpanQuery::term("body", "a"),
            SpanQuery::Empty,
            SpanQuery::term("body", "b"),
        ]);
        assert_eq!(span.field(), Ok(Some("body")));
        assert_eq!(SpanQuery::Empty.field(), Ok(None));
    }

    #[test]
    fn mixed_fields_are_rejected() {
        let span = SpanQuery::near(
            vec![SpanQuery::term("body", "a"), SpanQuery::term("title", "b")],
            0,
            true,
        );
        assert_eq!(
            span.field(),
            Err(NormalizeError::MixedFields {
                first: "body".into(),
                second: "title".into(),
            })
        );
    }

    #[test]
    fn emptiness_is_structural() {
        assert!(SpanQuery::Empty.is_empty());
        assert!(SpanQuery::or(vec![SpanQuery::Empty]).is_empty());
        assert!(SpanQuery::near(vec![], 0, true).is_empty());
        assert!(
            SpanQuery::near(vec![SpanQuery::term("f", "a"), SpanQuery::Empty], 0, true).is_empty()
        );
        assert!(!SpanQuery::or(vec![SpanQuery::Empty, SpanQuery::term("f", "a")]).is_empty());
    }

    #[test]
    fn min_width_sums_near_clauses() {
        let span = SpanQuery::near(
            vec![
                SpanQuery::term("f", "a"),
                SpanQuery::or(vec![
                    SpanQuery::term("f", "b"),
                    SpanQuery::near(
                        vec![SpanQuery::term("f", "c"), SpanQuery::term("f", "d")],
                        0,
                        true,
                    ),
                ]),
            ],
            0,
            true,
        );
        assert_eq!(span.min_width(), 2);
    }

    #[test]
    fn serializes_with_type_tag() {
        let span = SpanQuery::multi_term(
            "body",
            TermPattern::Wildcard {
                pattern: "f?x".into(),
            },
        );
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["type"], "multi_term");
        assert_eq!(json["field"], "body");
        assert_eq!(json["pattern"]["kind"], "wildcard");
        let back: SpanQuery = serde_json::from_value(json).unwrap();
        assert_eq!(back, span);
    }
}
