//! concord: keyword-in-context concordances.
//!
//! concord reads a Tantivy corpus and prints every occurrence of a query as a
//! window of surrounding tokens. Alongside search it reports term statistics
//! and IDF values for the same corpus.

#![warn(missing_docs)]

pub mod cli;
