//! Text analysis pipeline for concord indexes.
//!
//! The same pipeline is used when a corpus is written and when stored text is
//! re-analyzed to recover token offsets, so both must be built from the same
//! [`AnalysisSettings`]:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - drops tokens over `max_token_length` bytes
//! 4. `StopWordFilter` - drops configured stop words, leaving position holes
//! 5. `Stemmer` - language-specific stemming, unless the stemmer is "none"

use concord_config::AnalysisSettings;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer, TokenStream,
};

use crate::IndexError;

/// Name of the custom tokenizer registered with Tantivy.
pub const CONCORD_TOKENIZER: &str = "concord_text";

/// Parses a stemmer language string into a Tantivy `Language`.
///
/// `"none"` (any case) disables stemming and yields `None`.
pub fn parse_language(name: &str) -> Result<Option<Language>, IndexError> {
    let language = match name.to_lowercase().as_str() {
        "none" => return Ok(None),
        "arabic" => Language::Arabic,
        "danish" => Language::Danish,
        "dutch" => Language::Dutch,
        "english" => Language::English,
        "finnish" => Language::Finnish,
        "french" => Language::French,
        "german" => Language::German,
        "greek" => Language::Greek,
        "hungarian" => Language::Hungarian,
        "italian" => Language::Italian,
        "norwegian" => Language::Norwegian,
        "portuguese" => Language::Portuguese,
        "romanian" => Language::Romanian,
        "russian" => Language::Russian,
        "spanish" => Language::Spanish,
        "swedish" => Language::Swedish,
        "tamil" => Language::Tamil,
        "turkish" => Language::Turkish,
        other => return Err(IndexError::InvalidLanguage(other.to_string())),
    };
    Ok(Some(language))
}

/// Builds the concord text analyzer.
pub fn build_analyzer(settings: &AnalysisSettings) -> Result<TextAnalyzer, IndexError> {
    let mut builder = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(settings.max_token_length))
        .dynamic();

    if !settings.stop_words.is_empty() {
        let words = settings.stop_words.iter().map(|w| w.to_lowercase());
        builder = builder.filter_dynamic(StopWordFilter::remove(words));
    }
    if let Some(language) = parse_language(&settings.stemmer)? {
        builder = builder.filter_dynamic(Stemmer::new(language));
    }

    Ok(builder.build())
}

/// Runs `text` through `analyzer` and returns the token texts in order.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while let Some(token) = stream.next() {
        tokens.push(token.text.clone());
    }
    tokens
}

/// Like [`analyze`], but also returns each token's position.
pub fn analyze_with_positions(analyzer: &mut TextAnalyzer, text: &str) -> Vec<(String, u32)> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while let Some(token) = stream.next() {
        tokens.push((token.text.clone(), token.position as u32));
    }
    tokens
}

#[cfg(test)]
mod test {
    use super::*;

    fn settings(stemmer: &str, stop_words: &[&str]) -> AnalysisSettings {
        AnalysisSettings {
            stemmer: stemmer.to_string(),
            stop_words: stop_words.iter().map(|w| (*w).to_string()).collect(),
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn parse_languages() {
        assert_eq!(parse_language("english").unwrap(), Some(Language::English));
        assert_eq!(parse_language("FRENCH").unwrap(), Some(Language::French));
        assert_eq!(parse_language("None").unwrap(), None);
    }

    #[test]
    fn parse_invalid_language() {
        let err = parse_language("klingon").unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn default_pipeline_lowercases_without_stemming() {
        let mut analyzer = build_analyzer(&AnalysisSettings::default()).unwrap();
        assert_eq!(
            analyze(&mut analyzer, "The Running, DOGS!"),
            vec!["the", "running", "dogs"]
        );
    }

    #[test]
    fn stemming_when_configured() {
        let mut analyzer = build_analyzer(&settings("english", &[])).unwrap();
        assert_eq!(analyze(&mut analyzer, "handling running"), vec!["handl", "run"]);
    }

    #[test]
    fn stop_words_leave_position_holes() {
        let mut analyzer = build_analyzer(&settings("none", &["The", "of"])).unwrap();
        assert_eq!(
            analyze_with_positions(&mut analyzer, "the king of the hill"),
            vec![("king".to_string(), 1), ("hill".to_string(), 4)]
        );
    }

    #[test]
    fn long_tokens_are_removed() {
        let mut analyzer = build_analyzer(&AnalysisSettings::default()).unwrap();
        let text = format!("short {} word", "a".repeat(60));
        assert_eq!(
            analyze_with_positions(&mut analyzer, &text),
            vec![("short".to_string(), 0), ("word".to_string(), 2)]
        );
    }

    #[test]
    fn invalid_stemmer_fails_build() {
        assert!(build_analyzer(&settings("elvish", &[])).is_err());
    }
}
