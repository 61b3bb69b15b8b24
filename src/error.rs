//! Error types for the corpus pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    // Page-level extraction failures: the page is skipped and reported
    #[error("{page}: missing {landmark}")]
    MissingLandmark { page: String, landmark: &'static str },

    #[error("{page}: cannot parse sitting date from {text:?}")]
    UnparsableDate { page: String, text: String },

    #[error("{path}: cannot read: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    // Configuration errors, fatal before any page is processed
    #[error("No lexicon entry for language '{language}'")]
    UnknownLexiconLanguage { language: String },

    #[error("Unknown language code '{0}'")]
    UnknownLanguage(String),

    #[error("Invalid {key} pattern in lexicon '{language}': {source}")]
    InvalidPattern {
        language: String,
        key: &'static str,
        source: regex::Error,
    },

    #[error("Failed to parse lexicon: {0}")]
    Lexicon(#[from] toml::de::Error),

    // Corpus files
    #[error("{path}: malformed corpus XML: {reason}")]
    MalformedXml { path: String, reason: String },

    #[error("Failed to serialize proceeding {id}: {reason}")]
    Serialize { id: String, reason: String },

    #[error("Metadata table error: {0}")]
    Table(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CorpusError {
    /// Whether the error only concerns the page being processed.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            CorpusError::MissingLandmark { .. }
                | CorpusError::UnparsableDate { .. }
                | CorpusError::Unreadable { .. }
                | CorpusError::MalformedXml { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_landmark_names_page() {
        let error = CorpusError::MissingLandmark {
            page: "PV-2009-01-15".to_string(),
            landmark: "title cell",
        };
        assert_eq!(error.to_string(), "PV-2009-01-15: missing title cell");
        assert!(error.is_page_local());
    }

    #[test]
    fn test_lexicon_error_is_not_page_local() {
        let error = CorpusError::UnknownLexiconLanguage {
            language: "fi".to_string(),
        };
        assert!(error.to_string().contains("'fi'"));
        assert!(!error.is_page_local());
    }
}
