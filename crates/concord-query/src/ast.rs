//! Source query tree.
//!
//! This is the already-parsed query the concordance searcher consumes. It is
//! serde-friendly so callers can hand it over as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::SpanQuery;

/// How a boolean clause participates in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match.
    Should,
    /// The clause must not match.
    MustNot,
    /// The clause must match but does not contribute to scoring.
    Filter,
}

/// One clause of a boolean query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Participation of the clause.
    pub occur: Occur,
    /// The clause's query.
    pub query: Query,
}

impl Clause {
    /// Creates a `Must` clause.
    pub fn must(query: Query) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    /// Creates a `Should` clause.
    pub fn should(query: Query) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    /// Creates a `MustNot` clause.
    pub fn must_not(query: Query) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }
}

/// Term-set patterns resolved against the term dictionary at search time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermPattern {
    /// Every term starting with `prefix`.
    Prefix {
        /// Required term prefix.
        prefix: String,
    },
    /// Glob-style pattern: `*` matches any run, `?` matches one character.
    Wildcard {
        /// The wildcard pattern.
        pattern: String,
    },
    /// Regular expression over whole terms.
    Regex {
        /// The regular expression.
        pattern: String,
    },
    /// Terms within a Levenshtein distance of `text`.
    Fuzzy {
        /// Reference term.
        text: String,
        /// Maximum edit distance.
        distance: u8,
        /// Whether a transposition counts as a single edit.
        #[serde(default = "default_transpositions")]
        transpositions: bool,
    },
    /// Terms within a lexicographic range.
    Range {
        /// Lower bound, unbounded when absent.
        #[serde(default)]
        lower: Option<String>,
        /// Upper bound, unbounded when absent.
        #[serde(default)]
        upper: Option<String>,
        /// Whether `lower` itself is included.
        #[serde(default = "default_inclusive")]
        include_lower: bool,
        /// Whether `upper` itself is included.
        #[serde(default)]
        include_upper: bool,
    },
}

/// Default for [`TermPattern::Fuzzy::transpositions`].
fn default_transpositions() -> bool {
    true
}

/// Default for [`TermPattern::Range::include_lower`].
fn default_inclusive() -> bool {
    true
}

impl fmt::Display for TermPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix { prefix } => write!(f, "{prefix}*"),
            Self::Wildcard { pattern } => write!(f, "{pattern}"),
            Self::Regex { pattern } => write!(f, "/{pattern}/"),
            Self::Fuzzy { text, distance, .. } => write!(f, "{text}~{distance}"),
            Self::Range {
                lower,
                upper,
                include_lower,
                include_upper,
            } => {
                let open = if *include_lower { '[' } else { '{' };
                let close = if *include_upper { ']' } else { '}' };
                write!(
                    f,
                    "{open}{} TO {}{close}",
                    lower.as_deref().unwrap_or("*"),
                    upper.as_deref().unwrap_or("*")
                )
            }
        }
    }
}

/// A parsed query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// A single term in a field.
    Term {
        /// Field name.
        field: String,
        /// Analyzed term text.
        text: String,
    },

    /// An ordered phrase. When `positions` is empty the terms occupy
    /// consecutive positions starting at 0.
    Phrase {
        /// Field name.
        field: String,
        /// Analyzed term texts.
        terms: Vec<String>,
        /// Explicit position of each term.
        #[serde(default)]
        positions: Vec<u32>,
        /// Allowed positional distance.
        #[serde(default)]
        slop: u32,
    },

    /// A phrase where each position may hold several alternative terms.
    MultiPhrase {
        /// Field name.
        field: String,
        /// Alternatives for each position.
        terms: Vec<Vec<String>>,
        /// Explicit position of each alternative set.
        #[serde(default)]
        positions: Vec<u32>,
        /// Allowed positional distance.
        #[serde(default)]
        slop: u32,
    },

    /// Boolean combination of clauses.
    Boolean {
        /// The clauses.
        clauses: Vec<Clause>,
    },

    /// Disjunction scored by its best-matching child.
    DisjunctionMax {
        /// The alternatives.
        disjuncts: Vec<Self>,
    },

    /// Prefix, wildcard, regex, fuzzy or range term set.
    MultiTerm {
        /// Field name.
        field: String,
        /// The term pattern.
        pattern: TermPattern,
    },

    /// Constant-score wrapper.
    ConstantScore {
        /// Wrapped query.
        query: Box<Self>,
    },

    /// Boosted wrapper.
    Boost {
        /// Wrapped query.
        query: Box<Self>,
        /// Score multiplier.
        factor: f32,
    },

    /// Matches every document.
    MatchAll,

    /// A query already in span form.
    Span {
        /// The span query.
        query: SpanQuery,
    },

    /// Documents having any value in `field`.
    Exists {
        /// Field name.
        field: String,
    },

    /// Numeric range over a fast field.
    NumericRange {
        /// Field name.
        field: String,
        /// Inclusive lower bound.
        #[serde(default)]
        lower: Option<i64>,
        /// Exclusive upper bound.
        #[serde(default)]
        upper: Option<i64>,
    },
}

impl Query {
    /// Creates a term query.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Creates an exact phrase with consecutive positions.
    pub fn phrase(field: impl Into<String>, terms: &[&str]) -> Self {
        Self::Phrase {
            field: field.into(),
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
            positions: Vec::new(),
            slop: 0,
        }
    }

    /// Creates a phrase with explicit positions and slop.
    pub fn phrase_at(
        field: impl Into<String>,
        terms: &[(&str, u32)],
        slop: u32,
    ) -> Self {
        Self::Phrase {
            field: field.into(),
            terms: terms.iter().map(|(t, _)| (*t).to_string()).collect(),
            positions: terms.iter().map(|(_, p)| *p).collect(),
            slop,
        }
    }

    /// Creates a boolean query.
    pub fn boolean(clauses: Vec<Clause>) -> Self {
        Self::Boolean { clauses }
    }

    /// Creates a multi-term query.
    pub fn multi_term(field: impl Into<String>, pattern: TermPattern) -> Self {
        Self::MultiTerm {
            field: field.into(),
            pattern,
        }
    }

    /// Short name of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Term { .. } => "term",
            Self::Phrase { .. } => "phrase",
            Self::MultiPhrase { .. } => "multi_phrase",
            Self::Boolean { .. } => "boolean",
            Self::DisjunctionMax { .. } => "disjunction_max",
            Self::MultiTerm { .. } => "multi_term",
            Self::ConstantScore { .. } => "constant_score",
            Self::Boost { .. } => "boost",
            Self::MatchAll => "match_all",
            Self::Span { .. } => "span",
            Self::Exists { .. } => "exists",
            Self::NumericRange { .. } => "numeric_range",
        }
    }

    /// Formats the query as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term { field, text } => writeln!(f, "{prefix}Term({field}:{text})"),
            Self::Phrase {
                field, terms, slop, ..
            } => writeln!(f, "{prefix}Phrase({field}:{terms:?}~{slop})"),
            Self::MultiPhrase {
                field, terms, slop, ..
            } => writeln!(f, "{prefix}MultiPhrase({field}:{terms:?}~{slop})"),
            Self::Boolean { clauses } => {
                writeln!(f, "{prefix}Boolean")?;
                for clause in clauses {
                    writeln!(f, "{prefix}  {:?}", clause.occur)?;
                    clause.query.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::DisjunctionMax { disjuncts } => {
                writeln!(f, "{prefix}DisjunctionMax")?;
                for d in disjuncts {
                    d.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::MultiTerm { field, pattern } => {
                writeln!(f, "{prefix}MultiTerm({field}:{pattern})")
            }
            Self::ConstantScore { query } => {
                writeln!(f, "{prefix}ConstantScore")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Boost { query, factor } => {
                writeln!(f, "{prefix}Boost({factor})")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::MatchAll => writeln!(f, "{prefix}MatchAll"),
            Self::Span { query } => writeln!(f, "{prefix}Span({query})"),
            Self::Exists { field } => writeln!(f, "{prefix}Exists({field})"),
            Self::NumericRange {
                field,
                lower,
                upper,
            } => writeln!(f, "{prefix}NumericRange({field}: {lower:?}..{upper:?})"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
