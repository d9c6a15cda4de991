//! Query trees and span-form normalization for concord.
//!
//! Concordance windows are cut around *positions*, so every query handed to
//! the concordance searcher is first rewritten into an ordered-position form:
//!
//! - **Terms** become single-position spans
//! - **Phrases** become near spans whose slop absorbs removed tokens
//! - **Booleans** become span disjunctions (prohibited clauses are dropped)
//! - **Prefix / wildcard / fuzzy / range** queries stay opaque until they are
//!   expanded against a live term dictionary
//!
//! Clauses targeting a different field than the one being windowed normalize
//! to [`SpanQuery::Empty`].
//!
//! # Example
//!
//! ```
//! use concord_query::{Clause, Query, SpanQuery, normalize};
//!
//! let query = Query::boolean(vec![
//!     Clause::must(Query::phrase("body", &["brown", "fox"])),
//!     Clause::must_not(Query::term("body", "lazy")),
//! ]);
//! let span = normalize("body", &query).unwrap();
//! assert_eq!(
//!     span,
//!     SpanQuery::near(
//!         vec![SpanQuery::term("body", "brown"), SpanQuery::term("body", "fox")],
//!         0,
//!         true,
//!     )
//! );
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod normalize;
mod span;

pub use ast::{Clause, Occur, Query, TermPattern};
pub use error::NormalizeError;
pub use normalize::normalize;
pub use span::{MultiTermQuery, SpanQuery};
