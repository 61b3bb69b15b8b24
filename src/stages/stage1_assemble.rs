use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::error::{CorpusError, Result};
use crate::heuristics::{
    LanguageFold, PHOTO, TurnMarkup, annotate_turn, extract_paragraph,
};
use crate::models::{Language, Lexicon, LexiconSet, Proceeding, Section};

static TITLE_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"td.doc_title[align="left"][valign="top"]"#).expect("valid title selector")
});
static EDITION_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"td.doc_title[align="right"][valign="top"]"#)
        .expect("valid edition selector")
});
static SECTION_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"table.doc_box_header[cellpadding="0"]"#).expect("valid section selector")
});
static SECTION_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.doc_title").expect("valid heading selector"));
static TURN_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"table[cellpadding="5"]"#).expect("valid turn selector")
});
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p.contents, p.doc_subtitle_level1").expect("valid paragraph selector")
});
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[name], a[id]").expect("valid anchor selector"));

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<date>.+?\d.*?)\s+[-–]\s+(?P<place>.+?)\s*$").expect("valid header regex")
});
static WRITTEN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<day>\d{1,2})\.?\s+(?:de\s+)?(?P<month>\p{L}+)\.?\s+(?:de\s+)?(?P<year>\d{4})",
    )
    .expect("valid written date regex")
});
static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<day>\d{1,2})[./](?P<month>\d{1,2})[./](?P<year>\d{4})\b")
        .expect("valid numeric date regex")
});
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})\b").expect("valid ISO regex")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Configuration for Stage 1 assembly
#[derive(Debug, Clone)]
pub struct Stage1Config {
    /// Edition language of the pages
    pub language: Language,
    /// Lexicon file replacing the embedded tables
    pub lexicon_path: Option<PathBuf>,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self {
            language: Language::En,
            lexicon_path: None,
        }
    }
}

impl Stage1Config {
    /// Compile the lexicon for the configured edition language. Fails when
    /// the lexicon has no entry for it.
    pub fn load_lexicon(&self) -> Result<Lexicon> {
        let set = match &self.lexicon_path {
            Some(path) => LexiconSet::from_file(path)?,
            None => LexiconSet::builtin()?,
        };
        set.compile(self.language)
    }
}

/// Result of Stage 1 assembly
#[derive(Debug)]
pub struct Stage1Result {
    /// Document tree, already pruned
    pub proceeding: Proceeding,
    /// Agenda items found on the page
    pub sections_found: usize,
    /// Speaker turns found on the page
    pub turns_found: usize,
    /// Turns dropped because no content survived cleanup
    pub turns_pruned: usize,
}

/// Sitting header of a page
#[derive(Debug, Clone, PartialEq)]
pub struct SittingHeader {
    pub date: NaiveDate,
    pub place: String,
    pub edition: String,
}

/// Execute Stage 1: assemble one page into a document tree
///
/// Walks the page from agenda items to speaker turns to paragraphs:
/// 1. Read the sitting header (fatal when absent or unparsable)
/// 2. Annotate each turn: mode, speaker, roles
/// 3. Read paragraphs through the language fold and the normalizer
/// 4. Prune empty turns and sections
pub fn execute_stage1(html: &str, page: &str, lexicon: &Lexicon) -> Result<Stage1Result> {
    let document = Html::parse_document(html);
    let header = parse_header(&document, page, lexicon)?;

    let mut proceeding = Proceeding {
        id: page.to_string(),
        language: lexicon.language(),
        date: header.date,
        place: header.place,
        edition: header.edition,
        sections: Vec::new(),
    };

    let mut turns_found = 0;
    for (index, table) in document.select(&SECTION_TABLE).enumerate() {
        let id = section_anchor(table).unwrap_or_else(|| format!("{}-{}", page, index + 1));
        let mut section = Section {
            id,
            title: section_title(table),
            interventions: Vec::new(),
        };

        for (turn_index, turn) in turn_tables(table).into_iter().enumerate() {
            let turn_id = format!("{}-{}", section.id, turn_index + 1);
            let mut markup = TurnMarkup::new(turn);
            let annotated = annotate_turn(&mut markup, lexicon, turn_id, page)?;

            let mut intervention = annotated.intervention;
            let mut fold = LanguageFold::new(annotated.language);
            for paragraph in turn.select(&PARAGRAPH) {
                if let Some(content) = extract_paragraph(
                    &mut markup,
                    paragraph,
                    &mut fold,
                    lexicon,
                    &mut intervention,
                ) {
                    intervention.contents.push(content);
                }
            }
            section.interventions.push(intervention);
        }

        turns_found += section.interventions.len();
        debug!(
            "section {} ({:?}): {} turns",
            section.id,
            section.title,
            section.interventions.len()
        );
        proceeding.sections.push(section);
    }

    let sections_found = proceeding.sections.len();
    proceeding.prune();
    let turns_kept = proceeding.interventions().count();

    info!(
        "{}: {} sections, {} turns ({} kept), {} paragraphs",
        page,
        sections_found,
        turns_found,
        turns_kept,
        proceeding.paragraph_count()
    );

    Ok(Stage1Result {
        proceeding,
        sections_found,
        turns_found,
        turns_pruned: turns_found - turns_kept,
    })
}

/// Read date, venue and edition label from the page header
pub fn parse_header(document: &Html, page: &str, lexicon: &Lexicon) -> Result<SittingHeader> {
    let missing = |landmark: &'static str| CorpusError::MissingLandmark {
        page: page.to_string(),
        landmark,
    };

    let title = document
        .select(&TITLE_CELL)
        .next()
        .map(|cell| collapse(&cell.text().collect::<String>()))
        .ok_or_else(|| missing("sitting title cell"))?;
    let caps = HEADER
        .captures(&title)
        .ok_or_else(|| missing("date and venue separator"))?;
    let date_text = &caps["date"];
    let date = parse_sitting_date(date_text, lexicon).ok_or_else(|| {
        CorpusError::UnparsableDate {
            page: page.to_string(),
            text: date_text.to_string(),
        }
    })?;

    let edition = document
        .select(&EDITION_CELL)
        .next()
        .map(|cell| collapse(&cell.text().collect::<String>()))
        .ok_or_else(|| missing("edition cell"))?;

    Ok(SittingHeader {
        date,
        place: caps["place"].to_string(),
        edition,
    })
}

/// Parse a sitting date such as "Thursday, 15 January 2009",
/// "jueves 15 de enero de 2009", "15.01.2009" or "2009-01-15"
pub fn parse_sitting_date(text: &str, lexicon: &Lexicon) -> Option<NaiveDate> {
    if let Some(caps) = WRITTEN_DATE.captures(text) {
        let date = lexicon.month(&caps["month"]).and_then(|month| {
            NaiveDate::from_ymd_opt(caps["year"].parse().ok()?, month, caps["day"].parse().ok()?)
        });
        if date.is_some() {
            return date;
        }
    }
    [&*NUMERIC_DATE, &*ISO_DATE].into_iter().find_map(|re| {
        let caps = re.captures(text)?;
        NaiveDate::from_ymd_opt(
            caps["year"].parse().ok()?,
            caps["month"].parse().ok()?,
            caps["day"].parse().ok()?,
        )
    })
}

/// Heading text of an agenda item
fn section_title(table: ElementRef<'_>) -> String {
    let raw: String = table
        .select(&SECTION_HEADING)
        .flat_map(|cell| cell.text())
        .collect();
    collapse(&raw.replace("(\n", "(").replace("\n,", ","))
}

/// Name of the anchor immediately preceding an agenda item. A preceding
/// table is another agenda item or turn, never a wrapper of the anchor.
fn section_anchor(table: ElementRef<'_>) -> Option<String> {
    for sibling in table.prev_siblings() {
        match sibling.value() {
            Node::Text(text) if text.trim().is_empty() => continue,
            Node::Comment(_) => continue,
            Node::Element(_) => {
                let element = ElementRef::wrap(sibling)?;
                let anchor = match element.value().name() {
                    "a" => Some(element),
                    "table" => None,
                    _ => element.select(&ANCHOR).last(),
                };
                return anchor.and_then(anchor_name);
            }
            _ => return None,
        }
    }
    None
}

fn anchor_name(anchor: ElementRef<'_>) -> Option<String> {
    let value = anchor.value();
    value
        .attr("name")
        .or_else(|| value.attr("id"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Speaker turn tables of an agenda item: tables that hold a speaker photo
/// and are not nested in another turn table
fn turn_tables(section: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let candidates: Vec<ElementRef<'_>> = section
        .select(&TURN_TABLE)
        .filter(|table| table.select(&PHOTO).next().is_some())
        .collect();
    candidates
        .iter()
        .copied()
        .filter(|table| {
            !table
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| candidates.contains(&ancestor))
        })
        .collect()
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
