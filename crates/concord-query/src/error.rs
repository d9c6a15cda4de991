//! Error types for span-form normalization.

use thiserror::Error;

/// Errors raised while rewriting a query tree into span form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The query node has no positional interpretation.
    #[error("query kind `{kind}` cannot be converted to a span query")]
    UnsupportedQueryKind {
        /// Name of the offending node kind.
        kind: &'static str,
    },

    /// A span tree references more than one field.
    #[error("span query mixes fields `{first}` and `{second}`")]
    MixedFields {
        /// First field encountered.
        first: String,
        /// Conflicting field.
        second: String,
    },

    /// A phrase declares a different number of positions than terms.
    #[error("phrase on `{field}` has {terms} terms but {positions} positions")]
    MismatchedPositions {
        /// Field of the phrase.
        field: String,
        /// Number of terms.
        terms: usize,
        /// Number of positions.
        positions: usize,
    },
}
