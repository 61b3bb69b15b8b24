pub mod language;
pub mod markup;
pub mod roles;
pub mod speaker;

pub use language::*;
pub use markup::*;
pub use roles::*;
pub use speaker::*;

use scraper::ElementRef;
use tracing::debug;

use crate::error::Result;
use crate::models::{Content, Intervention, Lexicon};
use crate::stages::normalize_text;

/// A speaker turn with its metadata resolved, before paragraphs are read
#[derive(Debug, Clone)]
pub struct AnnotatedTurn {
    pub intervention: Intervention,
    pub language: TurnLanguage,
}

/// Resolve the metadata of one speaker turn
///
/// Runs in a fixed order, each step consuming the spans it recognises:
/// 1. Delivery mode ("in writing" spans)
/// 2. Speaker photo and caption (a president caption becomes the role)
/// 3. Role annotations, appended after a caption role
pub fn annotate_turn(
    markup: &mut TurnMarkup<'_>,
    lexicon: &Lexicon,
    id: String,
    page: &str,
) -> Result<AnnotatedTurn> {
    let mode = detect_written_mode(markup, lexicon);
    let identity = resolve_speaker(markup, lexicon, page)?;

    let mut intervention = Intervention::new(id, identity.speaker_id, mode);
    intervention.name = identity.name;
    if let Some(role) = identity.role {
        intervention.add_role(&role);
    }

    let matches = match_roles(markup, lexicon);
    for role in &matches.roles {
        intervention.add_role(role);
    }

    // whole-alias match: "President-in-Office of the Council" is not presiding
    let presiding = intervention.roles().any(|role| lexicon.is_president(role));
    debug!(
        "turn {}: speaker={:?} name={:?} role={:?} mode={}",
        intervention.id,
        intervention.speaker_id,
        intervention.name,
        intervention.role,
        intervention.mode.as_str()
    );

    Ok(AnnotatedTurn {
        intervention,
        language: TurnLanguage {
            presiding,
            role_hint: matches.language_hint,
            edition: lexicon.language(),
        },
    })
}

/// Read one paragraph of a turn.
///
/// The language fold advances even when the paragraph turns out empty. A
/// role phrase opening the paragraph is stripped and recorded on the turn
/// unless the turn already has a role.
pub fn extract_paragraph<'a>(
    markup: &mut TurnMarkup<'a>,
    paragraph: ElementRef<'a>,
    fold: &mut LanguageFold,
    lexicon: &Lexicon,
    intervention: &mut Intervention,
) -> Option<Content> {
    let tagged = tagged_language(markup, paragraph);
    let rendered = markup.paragraph_text(paragraph);
    let (rendered, inline) = match tagged {
        Some(_) => (rendered, None),
        None => strip_parenthetical_codes(&rendered),
    };
    let language = fold.resolve(tagged.or(inline));

    let mut text = normalize_text(&rendered);
    if let Some((role, end)) = lexicon.leading_role(&text) {
        if intervention.role.is_none() {
            intervention.add_role(&role);
        }
        text = normalize_text(&text[end..]);
    }

    Content::from_text(text, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, LexiconSet, Mode};
    use scraper::{Html, Selector};

    fn english() -> Lexicon {
        LexiconSet::builtin().unwrap().compile(Language::En).unwrap()
    }

    /// Annotate the first turn of `body` and read all of its paragraphs
    fn read_turn(body: &str) -> Intervention {
        let html = Html::parse_document(&format!(
            r#"<table cellpadding="5"><tr><td>{}</td></tr></table>"#,
            body
        ));
        let table = html.select(&Selector::parse("table").unwrap()).next().unwrap();
        let lexicon = english();
        let mut markup = TurnMarkup::new(table);
        let turn = annotate_turn(&mut markup, &lexicon, "s-1".to_string(), "page").unwrap();

        let mut intervention = turn.intervention;
        let mut fold = LanguageFold::new(turn.language);
        let paragraphs: Vec<_> = table
            .select(&Selector::parse("p.contents").unwrap())
            .collect();
        for p in paragraphs {
            if let Some(content) =
                extract_paragraph(&mut markup, p, &mut fold, &lexicon, &mut intervention)
            {
                intervention.contents.push(content);
            }
        }
        intervention
    }

    #[test]
    fn test_name_and_role_coexist() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="/mepphoto/4321.jpg">
            <p class="contents"><span class="doc_subtitle_level1_bis">Jane Doe (PSE),</span> <span class="italic">rapporteur. – (DE)</span> Herr Präsident!</p>
            <p class="contents">Second paragraph.</p>"#,
        );
        assert_eq!(turn.speaker_id.as_deref(), Some("4321"));
        assert!(turn.is_mep);
        assert_eq!(turn.name.as_deref(), Some("Jane Doe"));
        assert_eq!(turn.role.as_deref(), Some("rapporteur"));
        assert_eq!(turn.mode, Mode::Spoken);

        let languages: Vec<_> = turn.paragraphs().map(|p| p.language).collect();
        assert_eq!(languages, vec![Language::De, Language::De]);
        assert_eq!(turn.contents[0].text(), "Herr Präsident!");
    }

    #[test]
    fn test_president_turn_is_unknown_until_tagged() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="photo_generic.gif">
            <p class="contents"><span class="doc_subtitle_level1_bis">President.</span> – The next item is the vote.</p>
            <p class="contents">(Applause)</p>
            <p class="contents">(IT) Grazie.</p>"#,
        );
        assert_eq!(turn.speaker_id, None);
        assert!(!turn.is_mep);
        assert_eq!(turn.name, None);
        assert_eq!(turn.role.as_deref(), Some("President"));

        assert_eq!(turn.contents.len(), 3);
        assert!(matches!(&turn.contents[1], Content::Remark(r) if r.text == "(Applause)"));
        let languages: Vec<_> = turn.paragraphs().map(|p| p.language).collect();
        assert_eq!(languages, vec![Language::Unknown, Language::It]);
        assert_eq!(turn.contents[2].text(), "Grazie.");
    }

    #[test]
    fn test_generic_speaker_keeps_name() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="photo_generic.gif">
            <p class="contents"><span class="doc_subtitle_level1_bis">Mr Smith .</span> Thank you Madam President . </p>"#,
        );
        assert_eq!(turn.speaker_id, None);
        assert!(!turn.is_mep);
        assert_eq!(turn.name.as_deref(), Some("Mr Smith"));
        assert_eq!(turn.contents.len(), 1);
        assert_eq!(turn.contents[0].text(), "Thank you Madam President");
    }

    #[test]
    fn test_leading_role_sets_missing_role() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="photo_generic.gif">
            <p class="contents"><span class="doc_subtitle_level1_bis">Olli Rehn,</span> Member of the Commission. – Mr President, honourable Members.</p>"#,
        );
        assert_eq!(turn.name.as_deref(), Some("Olli Rehn"));
        assert_eq!(turn.role.as_deref(), Some("Member of the Commission"));
        assert_eq!(turn.contents[0].text(), "Mr President, honourable Members.");
    }

    #[test]
    fn test_president_in_office_speaks_edition_language() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="photo_generic.gif">
            <p class="contents"><span class="doc_subtitle_level1_bis">Alexandr Vondra,</span> <span class="italic">President-in-Office of the Council. –</span> Mr President, thank you.</p>"#,
        );
        assert_eq!(turn.name.as_deref(), Some("Alexandr Vondra"));
        assert_eq!(turn.role.as_deref(), Some("President-in-Office of the Council"));
        assert_eq!(turn.paragraphs().next().unwrap().language, Language::En);
        assert_eq!(turn.contents[0].text(), "Mr President, thank you.");
    }

    #[test]
    fn test_leading_role_stripped_when_role_known() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="/mepphoto/4321.jpg">
            <p class="contents"><span class="doc_subtitle_level1_bis">Jane Doe (PSE),</span> <span class="italic">rapporteur. –</span> First point.</p>
            <p class="contents">Commission. – The Commission agrees.</p>"#,
        );
        assert_eq!(turn.role.as_deref(), Some("rapporteur"));
        assert_eq!(turn.contents.len(), 2);
        assert_eq!(turn.contents[1].text(), "The Commission agrees.");
    }

    #[test]
    fn test_written_statement() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="/mepphoto/99.jpg">
            <p class="contents"><span class="doc_subtitle_level1_bis">Anna Roe (PPE-DE),</span><span class="italic">in writing. –</span> I voted in favour.</p>"#,
        );
        assert_eq!(turn.mode, Mode::Written);
        assert_eq!(turn.name.as_deref(), Some("Anna Roe"));
        assert_eq!(turn.contents[0].text(), "I voted in favour.");
        assert_eq!(turn.paragraphs().next().unwrap().language, Language::En);
    }

    #[test]
    fn test_empty_turn_has_no_contents() {
        let turn = read_turn(
            r#"<img alt="MPphoto" src="/mepphoto/1.jpg">
            <p class="contents"><span class="doc_subtitle_level1_bis">Someone</span> . – </p>"#,
        );
        assert!(turn.contents.is_empty());
    }
}
