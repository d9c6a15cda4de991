//! Corpus schema definition.
//!
//! A concord corpus has two kinds of fields:
//! - **text** fields are analyzed with positions and stored, so windows can be
//!   cut from them
//! - **keyword** fields are indexed verbatim and stored, for ids and metadata

use serde::{Deserialize, Serialize};
use tantivy::schema::{IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions};

use crate::analyzer::CONCORD_TOKENIZER;

/// How a corpus field is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Analyzed text with positions, stored.
    Text,
    /// Untokenized string, stored.
    Keyword,
}

/// A named corpus field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusField {
    /// Field name.
    pub name: String,
    /// Indexing mode.
    pub kind: FieldKind,
}

impl CorpusField {
    /// Creates an analyzed text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
        }
    }

    /// Creates a keyword field.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Keyword,
        }
    }
}

/// Builds the Tantivy schema for a list of corpus fields.
pub fn build_schema(fields: &[CorpusField]) -> Schema {
    let mut builder = Schema::builder();
    for field in fields {
        match field.kind {
            FieldKind::Text => {
                let options = TextOptions::default()
                    .set_indexing_options(
                        TextFieldIndexing::default()
                            .set_tokenizer(CONCORD_TOKENIZER)
                            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                    )
                    .set_stored();
                builder.add_text_field(&field.name, options);
            }
            FieldKind::Keyword => {
                builder.add_text_field(&field.name, STRING | STORED);
            }
        }
    }
    builder.build()
}
