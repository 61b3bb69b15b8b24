use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// EU official languages, plus the sentinel for paragraphs whose source
/// language cannot be attributed (presiding officers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bg,
    Es,
    Cs,
    Da,
    De,
    Et,
    El,
    En,
    Fr,
    Ga,
    Hr,
    It,
    Lv,
    Lt,
    Hu,
    Mt,
    Nl,
    Pl,
    Pt,
    Ro,
    Sk,
    Sl,
    Fi,
    Sv,
    Unknown,
}

impl Language {
    /// The official languages, in the order the source pages list them.
    pub const OFFICIAL: [Language; 24] = [
        Language::Bg,
        Language::Es,
        Language::Cs,
        Language::Da,
        Language::De,
        Language::Et,
        Language::El,
        Language::En,
        Language::Fr,
        Language::Ga,
        Language::Hr,
        Language::It,
        Language::Lv,
        Language::Lt,
        Language::Hu,
        Language::Mt,
        Language::Nl,
        Language::Pl,
        Language::Pt,
        Language::Ro,
        Language::Sk,
        Language::Sl,
        Language::Fi,
        Language::Sv,
    ];

    /// Lowercase two-letter code (`unknown` for the sentinel)
    pub fn code(&self) -> &'static str {
        match self {
            Language::Bg => "bg",
            Language::Es => "es",
            Language::Cs => "cs",
            Language::Da => "da",
            Language::De => "de",
            Language::Et => "et",
            Language::El => "el",
            Language::En => "en",
            Language::Fr => "fr",
            Language::Ga => "ga",
            Language::Hr => "hr",
            Language::It => "it",
            Language::Lv => "lv",
            Language::Lt => "lt",
            Language::Hu => "hu",
            Language::Mt => "mt",
            Language::Nl => "nl",
            Language::Pl => "pl",
            Language::Pt => "pt",
            Language::Ro => "ro",
            Language::Sk => "sk",
            Language::Sl => "sl",
            Language::Fi => "fi",
            Language::Sv => "sv",
            Language::Unknown => "unknown",
        }
    }

    /// Parse a code case-insensitively. Only official codes and `unknown`
    /// are accepted.
    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim().to_ascii_lowercase();
        if code == "unknown" {
            return Some(Language::Unknown);
        }
        Language::OFFICIAL.iter().copied().find(|l| l.code() == code)
    }

    /// Parse an official code only; the sentinel is rejected.
    pub fn official(code: &str) -> Option<Language> {
        Language::from_code(code).filter(|l| *l != Language::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Language::Unknown
    }

    /// Regex alternation of the uppercase official codes, as they appear in
    /// the source markup (`BG|ES|...|SV`)
    pub fn code_alternation() -> String {
        Language::OFFICIAL
            .iter()
            .map(|l| l.code().to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| CorpusError::UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_parse_case_insensitively() {
        assert_eq!(Language::from_code("DE"), Some(Language::De));
        assert_eq!(Language::from_code(" sv "), Some(Language::Sv));
        assert_eq!(Language::from_code("unknown"), Some(Language::Unknown));
        assert_eq!(Language::from_code("xx"), None);
    }

    #[test]
    fn test_official_rejects_sentinel() {
        assert_eq!(Language::official("unknown"), None);
        assert_eq!(Language::official("EN"), Some(Language::En));
    }

    #[test]
    fn test_code_alternation() {
        let alternation = Language::code_alternation();
        assert!(alternation.starts_with("BG|ES|CS"));
        assert!(alternation.ends_with("FI|SV"));
        assert!(!alternation.contains("UNKNOWN"));
    }

    #[test]
    fn test_from_str_error() {
        let err = "zz".parse::<Language>().unwrap_err();
        assert!(matches!(err, CorpusError::UnknownLanguage(_)));
    }
}
