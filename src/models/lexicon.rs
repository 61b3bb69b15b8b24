use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::Language;
use crate::error::{CorpusError, Result};

/// Lexicon shipped with the crate (English, Spanish and German editions)
pub const DEFAULT_LEXICON: &str = include_str!("../../data/lexicon.toml");

/// Visual delimiters around inline annotations: whitespace, dashes, periods
const SEPARATORS: &str = r"[\s\-–−.]";

static TRAILING_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\-–−.]*\(([A-Z]{2})\)[\s\-–−.]*$").expect("valid trailing code regex")
});

/// One language's phrase tables, as written in the lexicon file.
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LexiconEntry {
    /// Inline role phrases (regex fragments)
    pub roles: Vec<String>,
    /// Presiding-officer aliases (regex fragments, matched against the
    /// whole caption)
    pub president: Vec<String>,
    /// Role recorded for a president caption
    pub president_label: Option<String>,
    /// "Delivered in writing" phrase (regex fragment, searched)
    pub in_writing: Option<String>,
    /// Paragraph-leading role patterns; capture group 1 is the role
    pub more_roles: Vec<String>,
    /// Sentence tokenizer exceptions, consumed by sentence splitting
    pub extra_abbreviations: Vec<String>,
    /// Month names (lowercase) to month numbers
    pub months: BTreeMap<String, u32>,
}

/// All lexicon entries, keyed by language
#[derive(Debug, Clone)]
pub struct LexiconSet {
    entries: BTreeMap<Language, LexiconEntry>,
}

impl LexiconSet {
    /// Load the embedded default lexicon
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_LEXICON)
    }

    /// Load a lexicon file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a lexicon document: one table per language code
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: HashMap<String, LexiconEntry> = toml::from_str(content)?;
        let mut entries = BTreeMap::new();
        for (code, entry) in raw {
            let language = Language::official(&code)
                .ok_or_else(|| CorpusError::UnknownLanguage(code.clone()))?;
            entries.insert(language, entry);
        }
        Ok(Self { entries })
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.entries.keys().copied()
    }

    pub fn entry(&self, language: Language) -> Option<&LexiconEntry> {
        self.entries.get(&language)
    }

    /// Compile the tables for one edition language. Month names of every
    /// other entry are kept as a fallback for the date header.
    pub fn compile(&self, language: Language) -> Result<Lexicon> {
        let entry = self
            .entries
            .get(&language)
            .ok_or_else(|| CorpusError::UnknownLexiconLanguage {
                language: language.to_string(),
            })?;

        let mut fallback_months = HashMap::new();
        for other in self.entries.values() {
            for (name, month) in &other.months {
                fallback_months
                    .entry(name.to_lowercase())
                    .or_insert(*month);
            }
        }

        Lexicon::compile(language, entry, fallback_months)
    }
}

/// Compiled, read-only phrase tables for one edition language
#[derive(Debug, Clone)]
pub struct Lexicon {
    language: Language,
    role_span: Option<Regex>,
    in_writing: Option<Regex>,
    president: Option<Regex>,
    president_label: Option<String>,
    more_roles: Vec<Regex>,
    months: HashMap<String, u32>,
    fallback_months: HashMap<String, u32>,
    extra_abbreviations: Vec<String>,
}

/// A role annotation found in an italic span
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSpan {
    pub role: String,
    /// Language code embedded in the annotation, if it is an official one
    pub language: Option<Language>,
}

impl Lexicon {
    fn compile(
        language: Language,
        entry: &LexiconEntry,
        fallback_months: HashMap<String, u32>,
    ) -> Result<Self> {
        let build = |key: &'static str, pattern: String| {
            Regex::new(&pattern).map_err(|source| CorpusError::InvalidPattern {
                language: language.to_string(),
                key,
                source,
            })
        };

        let role_span = if entry.roles.is_empty() {
            None
        } else {
            Some(build(
                "roles",
                format!(
                    r"^{sep}*(?P<role>{roles}){sep}*(?:\(?(?P<code>[A-Z]{{2}})\)?)?{sep}*$",
                    sep = SEPARATORS,
                    roles = alternation(&entry.roles),
                ),
            )?)
        };

        let in_writing = entry
            .in_writing
            .as_ref()
            .map(|p| build("in_writing", p.clone()))
            .transpose()?;

        let president = if entry.president.is_empty() {
            None
        } else {
            Some(build(
                "president",
                format!("^(?:{})$", alternation(&entry.president)),
            )?)
        };

        let more_roles = entry
            .more_roles
            .iter()
            .map(|p| build("more_roles", p.clone()))
            .collect::<Result<Vec<_>>>()?;

        let months = entry
            .months
            .iter()
            .map(|(name, month)| (name.to_lowercase(), *month))
            .collect();

        Ok(Self {
            language,
            role_span,
            in_writing,
            president,
            president_label: entry.president_label.clone(),
            more_roles,
            months,
            fallback_months,
            extra_abbreviations: entry.extra_abbreviations.clone(),
        })
    }

    /// Edition language these tables belong to
    pub fn language(&self) -> Language {
        self.language
    }

    /// Match an italic span's whole text against the role phrases
    pub fn match_role_span(&self, text: &str) -> Option<RoleSpan> {
        let caps = self.role_span.as_ref()?.captures(text)?;
        let mut role = caps.name("role").map(|m| m.as_str()).unwrap_or_default();
        let mut code = caps.name("code").map(|m| m.as_str());

        // A greedy phrase (`.+`) swallows a trailing "(XX)"
        if code.is_none() {
            if let Some(trailing) = TRAILING_CODE.captures(role) {
                code = trailing.get(1).map(|m| m.as_str());
                role = &role[..trailing.get(0).map_or(role.len(), |m| m.start())];
            }
        }

        let role = trim_separators(role);
        if role.is_empty() {
            return None;
        }
        Some(RoleSpan {
            role: role.to_string(),
            language: code.and_then(Language::official),
        })
    }

    /// Whether the text contains the "delivered in writing" phrase
    pub fn is_in_writing(&self, text: &str) -> bool {
        self.in_writing.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Whether the text, as a whole, is a presiding-officer alias
    pub fn is_president(&self, text: &str) -> bool {
        self.president
            .as_ref()
            .is_some_and(|re| re.is_match(text.trim()))
    }

    /// Role to record for a caption that is a president alias
    pub fn president_role(&self, caption: &str) -> String {
        self.president_label
            .clone()
            .unwrap_or_else(|| caption.trim().to_string())
    }

    /// Find a role phrase opening the paragraph. Returns the role and the
    /// byte offset where the remaining text starts.
    pub fn leading_role(&self, text: &str) -> Option<(String, usize)> {
        self.more_roles.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let whole = caps.get(0)?;
            if whole.start() != 0 || whole.is_empty() {
                return None;
            }
            let role = caps.get(1).unwrap_or(whole).as_str().trim().to_string();
            Some((role, whole.end()))
        })
    }

    /// Month number for a month name, this language first
    pub fn month(&self, name: &str) -> Option<u32> {
        let name = name.to_lowercase();
        self.months
            .get(&name)
            .or_else(|| self.fallback_months.get(&name))
            .copied()
    }

    pub fn extra_abbreviations(&self) -> &[String] {
        &self.extra_abbreviations
    }
}

fn alternation(patterns: &[String]) -> String {
    patterns
        .iter()
        .map(|p| format!("(?:{})", p))
        .collect::<Vec<_>>()
        .join("|")
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '−' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> Lexicon {
        LexiconSet::builtin().unwrap().compile(Language::En).unwrap()
    }

    #[test]
    fn test_builtin_languages() {
        let set = LexiconSet::builtin().unwrap();
        let languages: Vec<_> = set.languages().collect();
        assert_eq!(languages, vec![Language::Es, Language::De, Language::En]);
    }

    #[test]
    fn test_unknown_language_is_a_configuration_error() {
        let set = LexiconSet::builtin().unwrap();
        let err = set.compile(Language::Fi).unwrap_err();
        assert!(matches!(err, CorpusError::UnknownLexiconLanguage { .. }));
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let set = LexiconSet::from_toml("[fi]\n").unwrap();
        let lexicon = set.compile(Language::Fi).unwrap();
        assert!(lexicon.match_role_span("rapporteur").is_none());
        assert!(!lexicon.is_in_writing("kirjallinen"));
        assert!(!lexicon.is_president("Puhemies"));
        assert!(lexicon.leading_role("Komissio. – Kiitos").is_none());
        assert!(lexicon.extra_abbreviations().is_empty());
    }

    #[test]
    fn test_invalid_pattern_names_key() {
        let set = LexiconSet::from_toml("[en]\nroles = ['(unclosed']\n").unwrap();
        let err = set.compile(Language::En).unwrap_err();
        assert!(matches!(err, CorpusError::InvalidPattern { key: "roles", .. }));
    }

    #[test]
    fn test_role_span_with_language_code() {
        let lexicon = english();
        let found = lexicon.match_role_span(". – rapporteur. – (DE) ").unwrap();
        assert_eq!(found.role, "rapporteur");
        assert_eq!(found.language, Some(Language::De));
    }

    #[test]
    fn test_role_span_greedy_phrase_keeps_code() {
        let lexicon = english();
        let found = lexicon
            .match_role_span("rapporteur for the opinion of the Committee on Budgets. – (FR)")
            .unwrap();
        assert_eq!(
            found.role,
            "rapporteur for the opinion of the Committee on Budgets"
        );
        assert_eq!(found.language, Some(Language::Fr));
    }

    #[test]
    fn test_role_span_requires_whole_text() {
        let lexicon = english();
        assert!(lexicon
            .match_role_span("The Council has not yet replied")
            .is_none());
        let behalf = lexicon
            .match_role_span("on behalf of the PSE Group")
            .unwrap();
        assert_eq!(behalf.role, "on behalf of the PSE Group");
        assert_eq!(behalf.language, None);
    }

    #[test]
    fn test_president_alias_is_a_full_match() {
        let lexicon = english();
        assert!(lexicon.is_president("President"));
        assert!(lexicon.is_president("The President"));
        assert!(!lexicon.is_president("President-in-Office of the Council"));
        assert_eq!(lexicon.president_role("The President"), "President");

        let spanish = LexiconSet::builtin()
            .unwrap()
            .compile(Language::Es)
            .unwrap();
        assert!(spanish.is_president("La Presidenta"));
        assert_eq!(spanish.president_role("La Presidenta"), "La Presidenta");
    }

    #[test]
    fn test_leading_role() {
        let lexicon = english();
        let text = "Member of the Commission. – Mr President, honourable Members";
        let (role, end) = lexicon.leading_role(text).unwrap();
        assert_eq!(role, "Member of the Commission");
        assert_eq!(&text[end..], "Mr President, honourable Members");
        assert!(lexicon.leading_role("The Commission. – no").is_none());
    }

    #[test]
    fn test_month_fallback_across_languages() {
        let lexicon = english();
        assert_eq!(lexicon.month("January"), Some(1));
        assert_eq!(lexicon.month("marzo"), Some(3));
        assert_eq!(lexicon.month("Dezember"), Some(12));
        assert_eq!(lexicon.month("Brumaire"), None);
    }

    #[test]
    fn test_german_months_with_umlauts() {
        let german = LexiconSet::builtin()
            .unwrap()
            .compile(Language::De)
            .unwrap();
        assert_eq!(german.month("Jänner"), Some(1));
        assert_eq!(german.month("März"), Some(3));
        assert_eq!(german.month("MÄRZ"), Some(3));
    }

    #[test]
    fn test_in_writing() {
        let lexicon = english();
        assert!(lexicon.is_in_writing("in writing. – "));
        assert!(!lexicon.is_in_writing("in person"));
    }
}
