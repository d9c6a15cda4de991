//! Corpus manifest stored alongside the Tantivy index files.
//!
//! Stored text is re-analyzed at search time to recover token offsets, which
//! only works when the analyzer is exactly the one the corpus was written with.
//! The manifest records the field layout and analysis settings so an index can
//! be reopened without the configuration that created it.

use std::{fs, path::Path};

use concord_config::AnalysisSettings;
use serde::{Deserialize, Serialize};

use crate::{IndexError, schema::CorpusField};

/// File name of the manifest inside an index directory.
pub const MANIFEST_FILENAME: &str = "concord.json";

/// Field layout and analysis settings of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusManifest {
    /// Fields in declaration order.
    pub fields: Vec<CorpusField>,
    /// Analysis the text fields were indexed with.
    pub analysis: AnalysisSettings,
}

impl CorpusManifest {
    /// Loads the manifest from an index directory.
    pub fn load(index_dir: &Path) -> Result<Self, IndexError> {
        let path = index_dir.join(MANIFEST_FILENAME);
        if !path.exists() {
            return Err(IndexError::OpenIndex {
                path: index_dir.to_path_buf(),
                message: format!("no {MANIFEST_FILENAME}; not a concord index"),
            });
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes the manifest into an index directory.
    pub fn save(&self, index_dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(index_dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(index_dir.join(MANIFEST_FILENAME), contents)?;
        Ok(())
    }
}
