//! Inverse document frequency over indexed terms.

use crate::{ConcordanceError, ConcordanceIndex};

/// IDF sum and rarest document frequency of a whitespace-separated term list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermSetStats {
    /// Sum of the individual term IDFs.
    pub idf_sum: f64,
    /// Smallest document frequency among the terms; `None` for no terms.
    pub min_doc_freq: Option<u64>,
}

/// Computes IDF values against a fixed snapshot of the document count.
///
/// Terms are looked up verbatim, so callers analyze them first. A term that
/// was never indexed, a removed stop word for instance, has frequency 0 and
/// gets the highest IDF.
pub struct IdfCalculator<'a> {
    /// Index the frequencies come from.
    index: &'a ConcordanceIndex,
    /// Live documents when the calculator was created.
    num_docs: u64,
}

impl<'a> IdfCalculator<'a> {
    /// Creates a calculator over `index`.
    pub fn new(index: &'a ConcordanceIndex) -> Self {
        Self {
            index,
            num_docs: index.num_docs(),
        }
    }

    /// IDF for a document frequency: `ln((N + 1) / (df + 1)) + 1`.
    pub fn idf(&self, doc_freq: u64) -> f64 {
        ((self.num_docs as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0
    }

    /// IDF of one indexed term.
    pub fn single_term_idf(&self, field: &str, term: &str) -> Result<f64, ConcordanceError> {
        Ok(self.idf(self.index.doc_freq(field, term)?))
    }

    /// Sum of the IDFs of the whitespace-separated terms of `text`.
    ///
    /// Treating the terms as independent makes this an upper bound on the IDF
    /// of the phrase.
    pub fn multi_term_idf_sum(&self, field: &str, text: &str) -> Result<f64, ConcordanceError> {
        Ok(self.multi_term_stats(field, text)?.idf_sum)
    }

    /// IDF sum and minimum document frequency of the terms of `text`.
    pub fn multi_term_stats(
        &self,
        field: &str,
        text: &str,
    ) -> Result<TermSetStats, ConcordanceError> {
        let mut stats = TermSetStats {
            idf_sum: 0.0,
            min_doc_freq: None,
        };
        for term in text.split_whitespace() {
            let doc_freq = self.index.doc_freq(field, term)?;
            stats.idf_sum += self.idf(doc_freq);
            stats.min_doc_freq = Some(stats.min_doc_freq.map_or(doc_freq, |m| m.min(doc_freq)));
        }
        Ok(stats)
    }
}
