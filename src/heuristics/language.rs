use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::models::Language;

use super::markup::TurnMarkup;

static CODE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({})\b", Language::code_alternation()))
        .expect("valid language code regex")
});
static PARENTHETICAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\(({})\) *", Language::code_alternation()))
        .expect("valid parenthetical code regex")
});
static EXPLANATION_OF_VOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*EXPLANATIONS? OF VOTES?").expect("valid explanation of vote regex")
});

/// Turn-level facts used when a paragraph carries no language of its own
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnLanguage {
    /// The speaker chairs the sitting; their language is not attributable
    pub presiding: bool,
    /// Code carried by a role annotation
    pub role_hint: Option<Language>,
    /// Language of the edition being processed
    pub edition: Language,
}

impl TurnLanguage {
    /// Language of a turn's first paragraph when nothing marks it
    pub fn opening(&self) -> Language {
        if self.presiding {
            Language::Unknown
        } else {
            self.role_hint.unwrap_or(self.edition)
        }
    }
}

/// Fold over a turn's paragraphs: explicit markers win, then the opening
/// fallback for the first paragraph, then the previous paragraph's language.
#[derive(Debug, Clone)]
pub struct LanguageFold {
    fallback: TurnLanguage,
    previous: Option<Language>,
}

impl LanguageFold {
    pub fn new(fallback: TurnLanguage) -> Self {
        Self {
            fallback,
            previous: None,
        }
    }

    /// Resolve the next paragraph's language and advance the fold
    pub fn resolve(&mut self, explicit: Option<Language>) -> Language {
        let language = explicit
            .or(self.previous)
            .unwrap_or_else(|| self.fallback.opening());
        self.previous = Some(language);
        language
    }
}

/// Language tag in an italic span of the paragraph.
///
/// When the first tag-bearing span is the explanation-of-vote heading the
/// paragraph has no tag. Otherwise every tag-bearing span is consumed and
/// the first one gives the language.
pub fn tagged_language<'a>(
    markup: &mut TurnMarkup<'a>,
    paragraph: ElementRef<'a>,
) -> Option<Language> {
    let tagged: Vec<(ElementRef<'a>, String)> = markup
        .italic_spans(paragraph)
        .into_iter()
        .map(|span| (span, markup.text(span)))
        .filter(|(_, text)| CODE_TOKEN.is_match(text))
        .collect();

    let (_, first) = tagged.first()?;
    if EXPLANATION_OF_VOTE.is_match(first) {
        return None;
    }
    let language = CODE_TOKEN
        .captures(first)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Language::official(m.as_str()));
    for (span, _) in &tagged {
        markup.consume(*span);
    }
    language
}

/// Strip every `(XX)` marker from paragraph text. Returns the text and the
/// first marker's language.
pub fn strip_parenthetical_codes(text: &str) -> (String, Option<Language>) {
    let language = PARENTHETICAL_CODE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Language::official(m.as_str()));
    match language {
        Some(_) => (PARENTHETICAL_CODE.replace_all(text, "").into_owned(), language),
        None => (text.to_string(), None),
    }
}
