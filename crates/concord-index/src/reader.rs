//! Read access to a concord corpus.

use std::path::Path;

use tantivy::{
    DocAddress, Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument, Term,
    directory::MmapDirectory,
    schema::{Field, Schema, Value},
    tokenizer::TextAnalyzer,
};

use crate::{
    ConcordanceError, IndexError,
    analyzer::{CONCORD_TOKENIZER, analyze, build_analyzer},
    manifest::CorpusManifest,
    schema::FieldKind,
};

/// An opened corpus: Tantivy index, reader and the manifest it was written with.
pub struct ConcordanceIndex {
    /// The Tantivy index.
    index: Index,
    /// Reader producing point-in-time searchers.
    reader: IndexReader,
    /// Field layout and analysis settings.
    manifest: CorpusManifest,
}

impl ConcordanceIndex {
    /// Opens an on-disk corpus written by [`CorpusWriter`](crate::CorpusWriter).
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::OpenIndex {
                path: path.to_path_buf(),
                message: "index directory does not exist".to_string(),
            });
        }
        let manifest = CorpusManifest::load(path)?;

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;
        let index = Index::open(dir).map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        Self::from_index(index, manifest)
    }

    /// Wraps an existing Tantivy index, registering the corpus analyzer.
    pub(crate) fn from_index(index: Index, manifest: CorpusManifest) -> Result<Self, IndexError> {
        index
            .tokenizers()
            .register(CONCORD_TOKENIZER, build_analyzer(&manifest.analysis)?);
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(IndexError::read)?;
        Ok(Self {
            index,
            reader,
            manifest,
        })
    }

    /// Returns a point-in-time searcher.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Picks up commits made since the corpus was opened.
    pub fn reload(&self) -> Result<(), IndexError> {
        self.reader.reload().map_err(IndexError::read)
    }

    /// Returns the Tantivy schema.
    pub fn schema(&self) -> Schema {
        self.index.schema()
    }

    /// Returns the manifest the corpus was written with.
    pub fn manifest(&self) -> &CorpusManifest {
        &self.manifest
    }

    /// Resolves a field handle by name.
    pub fn field(&self, name: &str) -> Result<Field, ConcordanceError> {
        self.index
            .schema()
            .get_field(name)
            .map_err(|_| ConcordanceError::UnknownField(name.to_string()))
    }

    /// Names of all fields, in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.manifest.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Names of the analyzed text fields, in declaration order.
    pub fn text_fields(&self) -> Vec<String> {
        self.manifest
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Text)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> u64 {
        self.searcher().num_docs()
    }

    /// Number of documents containing the indexed term `text` in `field`.
    ///
    /// `text` is looked up verbatim; run it through [`analyze`](Self::analyze)
    /// first for text fields.
    pub fn doc_freq(&self, field: &str, text: &str) -> Result<u64, ConcordanceError> {
        let term = Term::from_field_text(self.field(field)?, text);
        Ok(self.searcher().doc_freq(&term)?)
    }

    /// Returns a fresh copy of the analyzer used for `field`.
    pub fn analyzer_for(&self, field: &str) -> Result<TextAnalyzer, ConcordanceError> {
        Ok(self.index.tokenizer_for_field(self.field(field)?)?)
    }

    /// Analyzes `text` the way `field` was indexed.
    pub fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>, ConcordanceError> {
        let mut analyzer = self.analyzer_for(field)?;
        Ok(analyze(&mut analyzer, text))
    }

    /// Loads a stored document.
    pub fn stored_document(
        &self,
        searcher: &Searcher,
        doc: DocAddress,
    ) -> Result<TantivyDocument, ConcordanceError> {
        Ok(searcher.doc(doc)?)
    }

    /// Stored values of `field` for `doc`, in insertion order.
    pub fn stored_values(
        &self,
        searcher: &Searcher,
        doc: DocAddress,
        field: &str,
    ) -> Result<Vec<String>, ConcordanceError> {
        let handle = self.field(field)?;
        let document = self.stored_document(searcher, doc)?;
        Ok(values_of(&document, handle))
    }

    /// Names of the fields `document` has at least one stored value for.
    pub fn available_fields(&self, document: &TantivyDocument) -> Vec<String> {
        let schema = self.index.schema();
        self.manifest
            .fields
            .iter()
            .filter(|f| {
                schema
                    .get_field(&f.name)
                    .is_ok_and(|h| document.get_first(h).is_some())
            })
            .map(|f| f.name.clone())
            .collect()
    }
}

/// String values of `field` in a stored document.
pub(crate) fn values_of(document: &TantivyDocument, field: Field) -> Vec<String> {
    document
        .get_all(field)
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect()
}
