use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CorpusError, Result};
use crate::models::Lexicon;
use crate::stages::{TextPass, run_passes};

use super::markup::{CAPTION, PHOTO, TurnMarkup};

/// Photo used for speakers who are not Members
pub const GENERIC_PHOTO: &str = "photo_generic";

/// Who is speaking, before role annotations are considered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerIdentity {
    pub speaker_id: Option<String>,
    pub name: Option<String>,
    /// Set when the caption names the presiding officer
    pub role: Option<String>,
}

/// Speaker identifier from a photo reference: the file name without its
/// extension. The generic photo identifies nobody.
pub fn photo_identifier(src: &str) -> Option<String> {
    let stem = Path::new(src.trim()).file_stem()?.to_str()?;
    if stem.is_empty() || stem == GENERIC_PHOTO {
        None
    } else {
        Some(stem.to_string())
    }
}

static GROUP_ABBREVIATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(\s*[\p{Lu}&][\p{Lu}\p{Ll}&/\-–]*(?:\s+[\p{Lu}&/\-–]+)*\s*\)")
        .expect("valid group abbreviation regex")
});
static TRAILING_LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*,[\s.,\-–—−]*$").expect("valid list separator regex")
});
static INITIAL_BEFORE_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\b\p{L}\.)\s*[\-–—−][\s.\-–—−]*$").expect("valid initial regex")
});
static TRAILING_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\.?\s*[\-–—−][\s.\-–—−]*$").expect("valid trailing dash regex")
});
static WORD_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w{2,})\s*\.\s*$").expect("valid word period regex"));
static DETACHED_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\.\s*$").expect("valid detached period regex"));
static COMMA_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid comma regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space regex"));

/// Caption cleanup chain, in order
pub const NAME_PASSES: &[TextPass] = &[
    TextPass { name: "markup_residue", apply: markup_residue },
    TextPass { name: "group_abbreviations", apply: group_abbreviations },
    TextPass { name: "trailing_list_separator", apply: trailing_list_separator },
    TextPass { name: "trailing_dash", apply: trailing_dash },
    TextPass { name: "trailing_period", apply: trailing_period },
    TextPass { name: "comma_spacing", apply: comma_spacing },
    TextPass { name: "collapse", apply: collapse },
];

/// Line breaks, soft hyphens and a literal `&amp;`
fn markup_residue(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
        .replace('\u{ad}', "")
        .replace("&amp;", "&")
}

/// `(PPE-DE)`, `(IND/DEM)`, `(NI)` and other group or country tags
fn group_abbreviations(text: &str) -> String {
    GROUP_ABBREVIATION.replace_all(text, "").into_owned()
}

fn trailing_list_separator(text: &str) -> String {
    TRAILING_LIST_SEPARATOR.replace(text, "").into_owned()
}

/// `Smith. –` loses the dash and the period, `J. –` keeps the initial's period
fn trailing_dash(text: &str) -> String {
    if INITIAL_BEFORE_DASH.is_match(text) {
        return INITIAL_BEFORE_DASH.replace(text, "${1}").into_owned();
    }
    TRAILING_DASH.replace(text, "").into_owned()
}

fn trailing_period(text: &str) -> String {
    let text = WORD_PERIOD.replace(text, "${1}");
    DETACHED_PERIOD.replace(&text, "").into_owned()
}

fn comma_spacing(text: &str) -> String {
    COMMA_SPACING.replace_all(text, ", ").into_owned()
}

fn collapse(text: &str) -> String {
    SPACES.replace_all(text, " ").trim().to_string()
}

/// Clean a caption into a display name; empty results are absent
pub fn clean_name(raw: &str) -> Option<String> {
    let name = run_passes(NAME_PASSES, raw);
    if name.is_empty() { None } else { Some(name) }
}

/// Resolve identifier and name of a turn's speaker.
///
/// A caption that is a presiding-officer alias becomes the role and leaves
/// the name empty.
pub fn resolve_speaker(
    markup: &TurnMarkup<'_>,
    lexicon: &Lexicon,
    page: &str,
) -> Result<SpeakerIdentity> {
    let photo = markup
        .root()
        .select(&PHOTO)
        .next()
        .ok_or_else(|| CorpusError::MissingLandmark {
            page: page.to_string(),
            landmark: "speaker photo",
        })?;
    let src = photo
        .value()
        .attr("src")
        .ok_or_else(|| CorpusError::MissingLandmark {
            page: page.to_string(),
            landmark: "speaker photo source",
        })?;

    let caption: String = markup
        .root()
        .select(&CAPTION)
        .filter(|span| !markup.is_consumed(*span))
        .map(|span| markup.text(span))
        .collect();

    let mut identity = SpeakerIdentity {
        speaker_id: photo_identifier(src),
        ..Default::default()
    };
    match clean_name(&caption) {
        Some(name) if lexicon.is_president(&name) => {
            identity.role = Some(lexicon.president_role(&name));
        }
        name => identity.name = name,
    }
    Ok(identity)
}
