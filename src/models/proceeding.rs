use chrono::NaiveDate;
use serde::Serialize;

use super::Language;

/// One transcript for one sitting date in one language edition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proceeding {
    /// Identifier (the source page's file stem)
    pub id: String,
    /// Edition language
    pub language: Language,
    /// Sitting date
    pub date: NaiveDate,
    /// Venue of the sitting
    pub place: String,
    /// Edition label (e.g. "Provisional edition")
    pub edition: String,
    /// Agenda items in document order
    pub sections: Vec<Section>,
}

/// One agenda item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: String,
    /// Heading text, may be empty
    pub title: String,
    pub interventions: Vec<Intervention>,
}

/// Delivery mode of a speaker turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Spoken,
    Written,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Spoken => "spoken",
            Mode::Written => "written",
        }
    }

    pub fn parse(value: &str) -> Option<Mode> {
        match value {
            "spoken" => Some(Mode::Spoken),
            "written" => Some(Mode::Written),
            _ => None,
        }
    }
}

/// Speaker biography attributes attached by the metadata merge
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Biography {
    pub nationality: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub n_party: Option<String>,
    pub p_group: Option<String>,
    pub m_state: Option<String>,
}

impl Biography {
    /// Attribute names in serialization order
    pub const KEYS: [&'static str; 6] = [
        "nationality",
        "birth_date",
        "birth_place",
        "n_party",
        "p_group",
        "m_state",
    ];

    /// Present attributes as (name, value) pairs
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        Self::KEYS
            .iter()
            .zip([
                &self.nationality,
                &self.birth_date,
                &self.birth_place,
                &self.n_party,
                &self.p_group,
                &self.m_state,
            ])
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect()
    }

    /// Set an attribute by name. Returns false for unknown names.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "nationality" => &mut self.nationality,
            "birth_date" => &mut self.birth_date,
            "birth_place" => &mut self.birth_place,
            "n_party" => &mut self.n_party,
            "p_group" => &mut self.p_group,
            "m_state" => &mut self.m_state,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A speaker turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intervention {
    pub id: String,
    /// Photo-derived identifier; `None` for the generic photo
    pub speaker_id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub mode: Mode,
    pub is_mep: bool,
    pub biography: Biography,
    pub contents: Vec<Content>,
}

impl Intervention {
    pub fn new(id: impl Into<String>, speaker_id: Option<String>, mode: Mode) -> Self {
        let is_mep = speaker_id.is_some();
        Self {
            id: id.into(),
            speaker_id,
            name: None,
            role: None,
            mode,
            is_mep,
            biography: Biography::default(),
            contents: Vec::new(),
        }
    }

    /// Attach a role. An equal role confirms the current one, a different
    /// role is appended after it. The name is never touched.
    pub fn add_role(&mut self, role: &str) {
        let role = role.trim();
        if role.is_empty() {
            return;
        }
        match &mut self.role {
            None => self.role = Some(role.to_string()),
            Some(current) => {
                if !current.split(ROLE_SEPARATOR).any(|part| part == role) {
                    current.push_str(ROLE_SEPARATOR);
                    current.push_str(role);
                }
            }
        }
    }

    /// Role components in the order they were discovered
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.role
            .as_deref()
            .into_iter()
            .flat_map(|r| r.split(ROLE_SEPARATOR))
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.contents.iter().filter_map(|c| match c {
            Content::Paragraph(p) => Some(p),
            Content::Remark(_) => None,
        })
    }

    pub fn remarks(&self) -> impl Iterator<Item = &Remark> {
        self.contents.iter().filter_map(|c| match c {
            Content::Remark(r) => Some(r),
            Content::Paragraph(_) => None,
        })
    }
}

/// Separator between role components discovered at different points
pub const ROLE_SEPARATOR: &str = ", ";

/// Child of an intervention
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Content {
    Paragraph(Paragraph),
    Remark(Remark),
}

impl Content {
    /// Classify cleaned paragraph text: a single parenthetical aside becomes
    /// a remark, empty text yields nothing.
    pub fn from_text(text: String, language: Language) -> Option<Content> {
        if text.is_empty() {
            None
        } else if is_remark(&text) {
            Some(Content::Remark(Remark { text }))
        } else {
            Some(Content::Paragraph(Paragraph { language, text }))
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Content::Paragraph(p) => &p.text,
            Content::Remark(r) => &r.text,
        }
    }
}

/// `^\(.+\)$`
fn is_remark(text: &str) -> bool {
    text.len() > 2 && text.starts_with('(') && text.ends_with(')')
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    /// Source language the paragraph was delivered in
    pub language: Language,
    pub text: String,
}

/// Editorial parenthetical such as "(Applause)"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Remark {
    pub text: String,
}

impl Proceeding {
    /// Drop interventions without contents, then sections without
    /// interventions.
    pub fn prune(&mut self) {
        for section in &mut self.sections {
            section.interventions.retain(|i| !i.contents.is_empty());
        }
        self.sections.retain(|s| !s.interventions.is_empty());
    }

    pub fn interventions(&self) -> impl Iterator<Item = &Intervention> {
        self.sections.iter().flat_map(|s| s.interventions.iter())
    }

    pub fn interventions_mut(&mut self) -> impl Iterator<Item = &mut Intervention> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.interventions.iter_mut())
    }

    pub fn paragraph_count(&self) -> usize {
        self.interventions().map(|i| i.paragraphs().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervention(id: &str, texts: &[&str]) -> Intervention {
        let mut turn = Intervention::new(id, Some("1234".to_string()), Mode::Spoken);
        turn.contents = texts
            .iter()
            .filter_map(|t| Content::from_text(t.to_string(), Language::En))
            .collect();
        turn
    }

    fn proceeding(sections: Vec<Section>) -> Proceeding {
        Proceeding {
            id: "p".to_string(),
            language: Language::En,
            date: NaiveDate::from_ymd_opt(2009, 1, 15).unwrap(),
            place: "Strasbourg".to_string(),
            edition: "Provisional edition".to_string(),
            sections,
        }
    }

    #[test]
    fn test_remark_classification() {
        assert!(matches!(
            Content::from_text("(Applause)".to_string(), Language::En),
            Some(Content::Remark(_))
        ));
        assert!(matches!(
            Content::from_text("(Applause) Thank you".to_string(), Language::En),
            Some(Content::Paragraph(_))
        ));
        assert!(matches!(
            Content::from_text("()".to_string(), Language::En),
            Some(Content::Paragraph(_))
        ));
        assert!(Content::from_text(String::new(), Language::En).is_none());
    }

    #[test]
    fn test_prune_drops_empty_sections() {
        let mut p = proceeding(vec![
            Section {
                id: "s1".to_string(),
                title: "Empty".to_string(),
                interventions: vec![intervention("s1-1", &["", ""])],
            },
            Section {
                id: "s2".to_string(),
                title: "Kept".to_string(),
                interventions: vec![
                    intervention("s2-1", &[""]),
                    intervention("s2-2", &["(Applause)"]),
                ],
            },
        ]);
        p.prune();

        assert_eq!(p.sections.len(), 1);
        assert_eq!(p.sections[0].id, "s2");
        assert_eq!(p.sections[0].interventions.len(), 1);
        assert_eq!(p.sections[0].interventions[0].remarks().count(), 1);
    }

    #[test]
    fn test_prune_keeps_header_when_everything_is_empty() {
        let mut p = proceeding(vec![Section {
            id: "s1".to_string(),
            title: String::new(),
            interventions: vec![intervention("s1-1", &[""])],
        }]);
        p.prune();

        assert!(p.sections.is_empty());
        assert_eq!(p.place, "Strasbourg");
    }

    #[test]
    fn test_add_role_appends_and_confirms() {
        let mut turn = Intervention::new("t", None, Mode::Spoken);
        assert!(!turn.is_mep);
        turn.name = Some("Mr Smith".to_string());
        turn.add_role("rapporteur");
        turn.add_role("rapporteur");
        turn.add_role("on behalf of the PSE Group");

        assert_eq!(turn.name.as_deref(), Some("Mr Smith"));
        assert_eq!(
            turn.role.as_deref(),
            Some("rapporteur, on behalf of the PSE Group")
        );
        assert_eq!(turn.roles().count(), 2);
    }

    #[test]
    fn test_biography_attributes_in_order() {
        let mut bio = Biography::default();
        assert!(bio.set("p_group", "PSE".to_string()));
        assert!(bio.set("nationality", "Spain".to_string()));
        assert!(!bio.set("shoe_size", "42".to_string()));

        assert_eq!(
            bio.attributes(),
            vec![("nationality", "Spain"), ("p_group", "PSE")]
        );
    }
}
