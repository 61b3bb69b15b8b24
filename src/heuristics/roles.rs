use tracing::debug;

use crate::models::{Language, Lexicon, Mode};

use super::markup::TurnMarkup;

/// Role annotations found in a turn's italic spans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleMatches {
    /// Role phrases in document order
    pub roles: Vec<String>,
    /// Language code carried by the last code-bearing annotation
    pub language_hint: Option<Language>,
}

impl RoleMatches {
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Detect statements submitted in writing.
///
/// Every italic span containing the lexicon's `in_writing` phrase is
/// consumed; a single one makes the whole turn written.
pub fn detect_written_mode(markup: &mut TurnMarkup<'_>, lexicon: &Lexicon) -> Mode {
    let mut mode = Mode::Spoken;
    for span in markup.italic_spans(markup.root()) {
        if markup.is_consumed(span) {
            continue;
        }
        if lexicon.is_in_writing(&markup.text(span)) {
            markup.consume(span);
            mode = Mode::Written;
        }
    }
    mode
}

/// Match italic spans against the role phrases of the lexicon.
///
/// Matching spans are consumed so their text never reaches a paragraph.
pub fn match_roles(markup: &mut TurnMarkup<'_>, lexicon: &Lexicon) -> RoleMatches {
    let mut matches = RoleMatches::default();
    for span in markup.italic_spans(markup.root()) {
        if markup.is_consumed(span) {
            continue;
        }
        let Some(found) = lexicon.match_role_span(&markup.text(span)) else {
            continue;
        };
        debug!("role annotation {:?} ({:?})", found.role, found.language);
        markup.consume(span);
        if !matches.roles.contains(&found.role) {
            matches.roles.push(found.role);
        }
        if found.language.is_some() {
            matches.language_hint = found.language;
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LexiconSet;
    use scraper::{Html, Selector};

    fn english() -> Lexicon {
        LexiconSet::builtin().unwrap().compile(Language::En).unwrap()
    }

    fn with_turn<F: FnOnce(TurnMarkup<'_>)>(body: &str, f: F) {
        let html = Html::parse_document(&format!(
            r#"<table cellpadding="5"><tr><td>{}</td></tr></table>"#,
            body
        ));
        let selector = Selector::parse("table").unwrap();
        let table = html.select(&selector).next().unwrap();
        f(TurnMarkup::new(table));
    }

    #[test]
    fn test_roles_in_document_order_with_last_hint() {
        let body = r#"<p class="contents">
            <span class="italic">rapporteur. – (FR)</span>
            <span class="italic">on behalf of the PSE Group. – (DE)</span>
            Text</p>"#;
        with_turn(body, |mut markup| {
            let matches = match_roles(&mut markup, &english());
            assert_eq!(
                matches.roles,
                vec!["rapporteur", "on behalf of the PSE Group"]
            );
            assert_eq!(matches.language_hint, Some(Language::De));
            assert!(markup.italic_spans(markup.root()).is_empty());
        });
    }

    #[test]
    fn test_non_role_spans_are_left_alone() {
        let body = r#"<p class="contents"><span class="italic">(DE)</span> Herr Präsident</p>"#;
        with_turn(body, |mut markup| {
            let matches = match_roles(&mut markup, &english());
            assert!(matches.is_empty());
            assert_eq!(markup.italic_spans(markup.root()).len(), 1);
        });
    }

    #[test]
    fn test_written_mode_consumes_span() {
        let body = r#"<p class="contents"><span class="italic">in writing. –</span> I voted in favour.</p>"#;
        with_turn(body, |mut markup| {
            assert_eq!(detect_written_mode(&mut markup, &english()), Mode::Written);
            let p = markup.root().select(&Selector::parse("p").unwrap()).next().unwrap();
            assert!(!markup.paragraph_text(p).contains("writing"));
        });
    }

    #[test]
    fn test_spoken_by_default() {
        with_turn(r#"<p class="contents">Thank you.</p>"#, |mut markup| {
            assert_eq!(detect_written_mode(&mut markup, &english()), Mode::Spoken);
        });
    }
}
