use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::CorpusError;
use crate::models::{Content, Language, Proceeding};

/// Source languages a filter run keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Every source language other than the edition's own
    All,
    Only(Language),
}

impl FromStr for SourceLanguage {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SourceLanguage::All);
        }
        Language::official(s)
            .map(SourceLanguage::Only)
            .ok_or_else(|| CorpusError::UnknownLanguage(s.to_string()))
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLanguage::All => f.write_str("all"),
            SourceLanguage::Only(language) => write!(f, "{}", language),
        }
    }
}

/// Configuration for the source-language filter
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub source: SourceLanguage,
    /// Keep only paragraphs whose speaker's nationality goes with the
    /// paragraph language
    pub native: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            source: SourceLanguage::All,
            native: false,
        }
    }
}

/// Result of a filter run on one proceeding
#[derive(Debug, Default)]
pub struct FilterResult {
    pub paragraphs_kept: usize,
    pub paragraphs_removed: usize,
    /// Interventions left without contents and pruned
    pub interventions_pruned: usize,
}

/// Nationalities whose speakers count as native for a language
pub fn native_nationalities(language: Language) -> &'static [&'static str] {
    match language {
        Language::Bg => &["Bulgaria"],
        Language::Es => &["Spain"],
        Language::Cs => &["Czech Republic", "Slovakia"],
        Language::Da => &["Denmark"],
        Language::De => &["Germany", "Austria", "Belgium", "Luxembourg", "Italy"],
        Language::Et => &["Estonia"],
        Language::El => &["Greece"],
        Language::En => &["United Kingdom", "Ireland", "Malta"],
        Language::Fr => &["France", "Belgium", "Luxembourg", "Italy"],
        Language::Ga => &["Ireland", "United Kingdom"],
        Language::Hr => &["Croatia"],
        Language::It => &["Italy", "Croatia", "Slovenia"],
        Language::Lv => &["Latvia"],
        Language::Lt => &["Lithuania", "Lituania"],
        Language::Hu => &["Hungary"],
        Language::Mt => &["Malta"],
        Language::Nl => &["Netherlands"],
        Language::Pl => &["Poland"],
        Language::Pt => &["Portugal"],
        Language::Ro => &["Romania"],
        Language::Sk => &["Slovakia", "Czech Republic"],
        Language::Sl => &["Slovenia"],
        Language::Fi => &["Finland"],
        Language::Sv => &["Sweden", "Finland"],
        Language::Unknown => &[],
    }
}

/// Languages whose paragraphs are removed from an edition
pub fn languages_to_remove(source: SourceLanguage, edition: Language) -> BTreeSet<Language> {
    let mut removed = BTreeSet::from([Language::Unknown]);
    match source {
        // covers the edition language too unless it is the target
        SourceLanguage::Only(target) => {
            removed.extend(Language::OFFICIAL.iter().filter(|l| **l != target));
        }
        SourceLanguage::All => {
            removed.insert(edition);
        }
    }
    removed
}

/// Execute the source-language filter on one proceeding, then prune
/// emptied interventions and sections
pub fn execute_filter(proceeding: &mut Proceeding, config: &FilterConfig) -> FilterResult {
    let removed = languages_to_remove(config.source, proceeding.language);
    debug!(
        "{}: removing {:?}",
        proceeding.id,
        removed.iter().map(Language::code).collect::<Vec<_>>()
    );

    let mut result = FilterResult::default();
    let before = proceeding.interventions().count();

    for intervention in proceeding.interventions_mut() {
        let nationality = intervention.biography.nationality.clone();
        let had_paragraphs = intervention.paragraphs().next().is_some();
        let mut kept = Vec::with_capacity(intervention.contents.len());
        for content in std::mem::take(&mut intervention.contents) {
            let keep = match &content {
                Content::Paragraph(p) => {
                    keep_paragraph(p.language, nationality.as_deref(), &removed, config)
                }
                Content::Remark(_) => true,
            };
            match (&content, keep) {
                (Content::Paragraph(_), true) => result.paragraphs_kept += 1,
                (Content::Paragraph(_), false) => result.paragraphs_removed += 1,
                _ => {}
            }
            if keep {
                kept.push(content);
            }
        }
        // remarks only accompany paragraphs
        if had_paragraphs && !kept.iter().any(|c| matches!(c, Content::Paragraph(_))) {
            kept.clear();
        }
        intervention.contents = kept;
    }

    proceeding.prune();
    result.interventions_pruned = before - proceeding.interventions().count();
    result
}

fn keep_paragraph(
    language: Language,
    nationality: Option<&str>,
    removed: &BTreeSet<Language>,
    config: &FilterConfig,
) -> bool {
    if removed.contains(&language) {
        return false;
    }
    if !config.native {
        return true;
    }
    match (config.source, nationality) {
        (SourceLanguage::Only(_), None) => false,
        (SourceLanguage::All, None) => true,
        (_, Some(nationality)) => native_nationalities(language).contains(&nationality),
    }
}
