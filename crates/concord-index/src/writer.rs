//! Corpus writer for materializing concord indexes.
//!
//! Writing is not part of the concordance pipeline proper; the writer exists so
//! tests and the CLI can build a corpus with the analyzer the searcher expects.

use std::{collections::HashMap, fs, path::Path};

use concord_config::AnalysisSettings;
use tantivy::{
    Index, IndexWriter, TantivyDocument, Term, directory::MmapDirectory, schema::Field,
};

use crate::{
    IndexError,
    analyzer::{CONCORD_TOKENIZER, build_analyzer},
    manifest::CorpusManifest,
    reader::ConcordanceIndex,
    schema::{CorpusField, build_schema},
};

/// Default heap size for the index writer (50 MB).
const DEFAULT_HEAP_SIZE: usize = 50_000_000;

/// One document to be written: an ordered list of `(field, value)` pairs.
///
/// A field may appear several times; its values are stored in insertion order
/// and indexed with a position gap between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusDocument {
    /// Field values in insertion order.
    values: Vec<(String, String)>,
}

impl CorpusDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the document.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(field, value);
        self
    }

    /// Adds a value for `field`.
    pub fn add(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.push((field.into(), value.into()));
    }

    /// Iterates over `(field, value)` pairs in insertion order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }
}

/// Writes documents into a concord corpus.
///
/// The writer runs a single indexing thread, so documents receive ascending
/// doc ids in the order they are added.
pub struct CorpusWriter {
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: IndexWriter,
    /// Field handles by name.
    fields: HashMap<String, Field>,
    /// Layout and analysis, persisted for on-disk indexes.
    manifest: CorpusManifest,
}

impl CorpusWriter {
    /// Creates a new corpus at `path`.
    ///
    /// Fails if the directory already holds an index with a different schema.
    pub fn create(
        path: &Path,
        fields: &[CorpusField],
        analysis: &AnalysisSettings,
    ) -> Result<Self, IndexError> {
        let manifest = CorpusManifest {
            fields: fields.to_vec(),
            analysis: analysis.clone(),
        };

        fs::create_dir_all(path)?;
        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;
        let index = Index::open_or_create(dir, build_schema(fields))
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;
        manifest.save(path)?;

        Self::from_index(index, manifest)
    }

    /// Creates a corpus held entirely in memory.
    pub fn create_in_ram(
        fields: &[CorpusField],
        analysis: &AnalysisSettings,
    ) -> Result<Self, IndexError> {
        let manifest = CorpusManifest {
            fields: fields.to_vec(),
            analysis: analysis.clone(),
        };
        let index = Index::create_in_ram(build_schema(fields));
        Self::from_index(index, manifest)
    }

    /// Registers the analyzer and opens a single-threaded writer.
    fn from_index(index: Index, manifest: CorpusManifest) -> Result<Self, IndexError> {
        index
            .tokenizers()
            .register(CONCORD_TOKENIZER, build_analyzer(&manifest.analysis)?);
        let writer = index
            .writer_with_num_threads(1, DEFAULT_HEAP_SIZE)
            .map_err(|e| IndexError::write(&e))?;

        let schema = index.schema();
        let fields = manifest
            .fields
            .iter()
            .filter_map(|f| schema.get_field(&f.name).ok().map(|h| (f.name.clone(), h)))
            .collect();

        Ok(Self {
            index,
            writer,
            fields,
            manifest,
        })
    }

    /// Looks up a field handle by name.
    fn field(&self, name: &str) -> Result<Field, IndexError> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| IndexError::Write(format!("unknown field '{name}'")))
    }

    /// Stages a document. It becomes visible after [`commit`](Self::commit).
    pub fn add_document(&mut self, doc: &CorpusDocument) -> Result<(), IndexError> {
        let mut tantivy_doc = TantivyDocument::new();
        for (name, value) in doc.values() {
            tantivy_doc.add_text(self.field(name)?, value);
        }
        self.writer
            .add_document(tantivy_doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Deletes every document whose keyword field `field` equals `value`.
    pub fn delete_term(&mut self, field: &str, value: &str) -> Result<(), IndexError> {
        let term = Term::from_field_text(self.field(field)?, value);
        self.writer.delete_term(term);
        Ok(())
    }

    /// Commits all pending changes.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Commits, waits for merges, and opens the corpus for reading.
    pub fn finish(mut self) -> Result<ConcordanceIndex, IndexError> {
        self.commit()?;
        self.writer
            .wait_merging_threads()
            .map_err(|e| IndexError::commit(&e))?;
        ConcordanceIndex::from_index(self.index, self.manifest)
    }
}
