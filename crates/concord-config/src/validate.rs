//! Configuration validation.
//!
//! Reports settings that load fine but probably do not do what the user wants.

use std::fmt;

use crate::Config;

/// Stemmer names understood by the analyzer, plus "none".
pub const KNOWN_STEMMERS: &[&str] = &[
    "none",
    "arabic",
    "danish",
    "dutch",
    "english",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "norwegian",
    "portuguese",
    "romanian",
    "russian",
    "spanish",
    "swedish",
    "tamil",
    "turkish",
];

/// Context sizes above this many tokens are reported as suspicious.
pub const MAX_CONTEXT_TOKENS: usize = 10_000;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The stemmer is not a known language.
    UnknownStemmer {
        /// Configured stemmer name.
        name: String,
    },
    /// Both context sizes are zero, so windows hold only the target.
    NoContext,
    /// A context size so large that windows hold whole documents.
    LargeWindow {
        /// The setting, `tokens_before` or `tokens_after`.
        setting: &'static str,
        /// Configured size.
        tokens: usize,
    },
    /// `max_hits = 0` means no window is ever returned.
    ZeroMaxHits,
    /// The windowed field is also copied as metadata.
    MetadataRepeatsSearchField {
        /// The field in question.
        field: String,
    },
    /// A stop word contains whitespace and can never match a single token.
    MultiWordStopWord {
        /// The stop word.
        word: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStemmer { name } => {
                write!(f, "unknown stemmer '{name}', stemming will fail")
            }
            Self::NoContext => {
                write!(f, "tokens_before and tokens_after are both 0")
            }
            Self::LargeWindow { setting, tokens } => {
                write!(f, "{setting} = {tokens} exceeds {MAX_CONTEXT_TOKENS} tokens")
            }
            Self::ZeroMaxHits => write!(f, "max_hits is 0, searches return nothing"),
            Self::MetadataRepeatsSearchField { field } => {
                write!(f, "metadata copies the searched field '{field}'")
            }
            Self::MultiWordStopWord { word } => {
                write!(f, "stop word '{word}' contains whitespace and never matches")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    let stemmer = config.analysis.stemmer.to_lowercase();
    if !KNOWN_STEMMERS.contains(&stemmer.as_str()) {
        warnings.push(ConfigWarning::UnknownStemmer {
            name: config.analysis.stemmer.clone(),
        });
    }

    if config.window.tokens_before == 0 && config.window.tokens_after == 0 {
        warnings.push(ConfigWarning::NoContext);
    }
    for (setting, tokens) in [
        ("tokens_before", config.window.tokens_before),
        ("tokens_after", config.window.tokens_after),
    ] {
        if tokens > MAX_CONTEXT_TOKENS {
            warnings.push(ConfigWarning::LargeWindow { setting, tokens });
        }
    }

    if config.search.max_hits == Some(0) {
        warnings.push(ConfigWarning::ZeroMaxHits);
    }

    if config.window.metadata.contains(&config.search.field) {
        warnings.push(ConfigWarning::MetadataRepeatsSearchField {
            field: config.search.field.clone(),
        });
    }

    for word in &config.analysis.stop_words {
        if word.split_whitespace().nth(1).is_some() {
            warnings.push(ConfigWarning::MultiWordStopWord { word: word.clone() });
        }
    }

    warnings
}
