use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{CorpusError, Result};
use crate::models::{
    Biography, Content, Intervention, Language, Mode, Paragraph, Proceeding, Remark, Section,
};

/// Files in `dir` matching a glob pattern, sorted
pub fn collect_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = dir.join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full).map_err(|e| {
        CorpusError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("bad pattern {:?}: {}", full, e),
        ))
    })?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Page identifier: the file name without its extension
pub fn page_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn unreadable(path: &Path) -> impl FnOnce(std::io::Error) -> CorpusError + '_ {
    move |source| CorpusError::Unreadable {
        path: path.display().to_string(),
        source,
    }
}

/// Read an HTML page. Invalid UTF-8 is replaced rather than rejected.
pub fn read_html_page(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(unreadable(path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a corpus XML file back into a proceeding
pub fn parse_proceeding_file(path: &Path) -> Result<Proceeding> {
    let content = std::fs::read_to_string(path).map_err(unreadable(path))?;
    parse_proceeding_xml(&content, &path.display().to_string())
}

/// Parse corpus XML. `source` names the document in errors.
pub fn parse_proceeding_xml(xml: &str, source: &str) -> Result<Proceeding> {
    let malformed = |reason: String| CorpusError::MalformedXml {
        path: source.to_string(),
        reason,
    };

    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut proceeding: Option<Proceeding> = None;
    let mut section: Option<Section> = None;
    let mut intervention: Option<Intervention> = None;
    let mut paragraph: Option<Paragraph> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let attrs = Attributes::read(e).map_err(malformed)?;
                match e.name().as_ref() {
                    b"text" => {
                        proceeding = Some(attrs.proceeding().map_err(malformed)?);
                    }
                    b"section" => {
                        let section_new = Section {
                            id: attrs.required("id").map_err(malformed)?,
                            title: attrs.get("title").unwrap_or_default(),
                            interventions: Vec::new(),
                        };
                        if empty {
                            push_section(&mut proceeding, section_new).map_err(malformed)?;
                        } else {
                            section = Some(section_new);
                        }
                    }
                    b"intervention" => {
                        let parsed = attrs.intervention().map_err(malformed)?;
                        if empty {
                            push_intervention(&mut section, parsed).map_err(malformed)?;
                        } else {
                            intervention = Some(parsed);
                        }
                    }
                    b"p" => {
                        let code = attrs.required("sl").map_err(malformed)?;
                        let language = Language::from_code(&code)
                            .ok_or_else(|| malformed(format!("unknown language {:?}", code)))?;
                        let parsed = Paragraph {
                            language,
                            text: String::new(),
                        };
                        if empty {
                            push_content(&mut intervention, Content::Paragraph(parsed))
                                .map_err(malformed)?;
                        } else {
                            paragraph = Some(parsed);
                        }
                    }
                    b"remark" => {
                        let text = attrs.required("text").map_err(malformed)?;
                        push_content(&mut intervention, Content::Remark(Remark { text }))
                            .map_err(malformed)?;
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if let Some(p) = paragraph.as_mut() {
                    let text = e.unescape().map_err(|e| malformed(e.to_string()))?;
                    if !p.text.is_empty() {
                        p.text.push(' ');
                    }
                    p.text.push_str(text.trim());
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        push_content(&mut intervention, Content::Paragraph(p))
                            .map_err(malformed)?;
                    }
                }
                b"intervention" => {
                    if let Some(i) = intervention.take() {
                        push_intervention(&mut section, i).map_err(malformed)?;
                    }
                }
                b"section" => {
                    if let Some(s) = section.take() {
                        push_section(&mut proceeding, s).map_err(malformed)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    proceeding.ok_or_else(|| malformed("no text element".to_string()))
}

fn push_section(proceeding: &mut Option<Proceeding>, section: Section) -> std::result::Result<(), String> {
    let proceeding = proceeding
        .as_mut()
        .ok_or_else(|| format!("section {} outside text", section.id))?;
    proceeding.sections.push(section);
    Ok(())
}

fn push_intervention(
    section: &mut Option<Section>,
    intervention: Intervention,
) -> std::result::Result<(), String> {
    let section = section
        .as_mut()
        .ok_or_else(|| format!("intervention {} outside section", intervention.id))?;
    section.interventions.push(intervention);
    Ok(())
}

fn push_content(
    intervention: &mut Option<Intervention>,
    content: Content,
) -> std::result::Result<(), String> {
    let intervention = intervention
        .as_mut()
        .ok_or_else(|| "paragraph outside intervention".to_string())?;
    intervention.contents.push(content);
    Ok(())
}

/// Unescaped attributes of one element
#[derive(Debug)]
struct Attributes {
    element: String,
    pairs: Vec<(String, String)>,
}

impl Attributes {
    fn read(e: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| format!("<{}>: {}", element, err))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| format!("<{}> {}: {}", element, key, err))?
                .into_owned();
            pairs.push((key, value));
        }
        Ok(Self { element, pairs })
    }

    fn get(&self, key: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn required(&self, key: &str) -> std::result::Result<String, String> {
        self.get(key)
            .ok_or_else(|| format!("<{}> without {} attribute", self.element, key))
    }

    fn proceeding(&self) -> std::result::Result<Proceeding, String> {
        let code = self.required("lang")?;
        let language =
            Language::official(&code).ok_or_else(|| format!("unknown language {:?}", code))?;
        let date_text = self.required("date")?;
        let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
            .map_err(|e| format!("bad date {:?}: {}", date_text, e))?;
        Ok(Proceeding {
            id: self.required("id")?,
            language,
            date,
            place: self.get("place").unwrap_or_default(),
            edition: self.get("edition").unwrap_or_default(),
            sections: Vec::new(),
        })
    }

    fn intervention(&self) -> std::result::Result<Intervention, String> {
        let id = self.required("id")?;
        let mode = match self.get("mode") {
            Some(value) => Mode::parse(&value)
                .ok_or_else(|| format!("intervention {}: unknown mode {:?}", id, value))?,
            None => Mode::Spoken,
        };
        let mut intervention = Intervention::new(id, self.get("speaker_id"), mode);
        if let Some(is_mep) = self.get("is_mep") {
            intervention.is_mep = is_mep.eq_ignore_ascii_case("true");
        }
        intervention.name = self.get("name");
        intervention.role = self.get("role");

        let mut biography = Biography::default();
        for key in Biography::KEYS {
            if let Some(value) = self.get(key) {
                biography.set(key, value);
            }
        }
        intervention.biography = biography;
        Ok(intervention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::proceeding_to_xml;

    const CORPUS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<text id="PV-2009-01-15" lang="en" date="2009-01-15" place="Strasbourg" edition="Provisional edition">
<section id="creitem1" title="1. Opening &amp; agenda">
<intervention id="creitem1-1" is_mep="False" mode="spoken" role="President">
<p sl="unknown">
The sitting is open.
</p>
<remark text="(Applause)"/>
</intervention>
<intervention id="creitem1-2" speaker_id="28219" name="Jan Novák" is_mep="True" mode="written" nationality="Czech Republic" p_group="PPE-DE">
<p sl="CS">
Tom &amp; Jerry
</p>
</intervention>
</section>
</text>
"#;

    #[test]
    fn test_parse_corpus_xml() {
        let p = parse_proceeding_xml(CORPUS, "test.xml").unwrap();
        assert_eq!(p.id, "PV-2009-01-15");
        assert_eq!(p.language, Language::En);
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2009, 1, 15).unwrap());
        assert_eq!(p.sections.len(), 1);
        assert_eq!(p.sections[0].title, "1. Opening & agenda");

        let turns = &p.sections[0].interventions;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role.as_deref(), Some("President"));
        assert!(!turns[0].is_mep);
        assert_eq!(turns[0].contents.len(), 2);
        assert!(matches!(&turns[0].contents[1], Content::Remark(r) if r.text == "(Applause)"));

        assert_eq!(turns[1].speaker_id.as_deref(), Some("28219"));
        assert_eq!(turns[1].mode, Mode::Written);
        assert_eq!(turns[1].biography.p_group.as_deref(), Some("PPE-DE"));
        let paragraph = turns[1].paragraphs().next().unwrap();
        assert_eq!(paragraph.language, Language::Cs);
        assert_eq!(paragraph.text, "Tom & Jerry");
    }

    #[test]
    fn test_serializer_output_reads_back() {
        let p = parse_proceeding_xml(CORPUS, "test.xml").unwrap();
        let xml = proceeding_to_xml(&p).unwrap();
        let again = parse_proceeding_xml(&xml, "again.xml").unwrap();
        assert_eq!(again, p);
    }

    #[test]
    fn test_missing_required_attribute() {
        let xml = r#"<text id="x" lang="en" date="2009-01-15"><section id="s"><intervention id="i"><p>text</p></intervention></section></text>"#;
        let err = parse_proceeding_xml(xml, "bad.xml").unwrap_err();
        match err {
            CorpusError::MalformedXml { path, reason } => {
                assert_eq!(path, "bad.xml");
                assert!(reason.contains("sl"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_no_root_element() {
        let err = parse_proceeding_xml("<other/>", "empty.xml").unwrap_err();
        assert!(err.is_page_local());
    }

    #[test]
    fn test_unreadable_files_are_page_local() {
        let dir = tempfile::tempdir().unwrap();
        let invalid = dir.path().join("invalid.xml");
        std::fs::write(&invalid, b"<text id=\"x\" lang=\"en\" date=\"2009-01-15\">\xff</text>")
            .unwrap();

        let err = parse_proceeding_file(&invalid).unwrap_err();
        assert!(matches!(err, CorpusError::Unreadable { .. }));
        assert!(err.is_page_local());
        assert!(err.to_string().contains("invalid.xml"));

        let err = read_html_page(&dir.path().join("missing.html")).unwrap_err();
        assert!(err.is_page_local());

        let page = dir.path().join("latin1.html");
        std::fs::write(&page, b"<p>caf\xe9</p>").unwrap();
        assert_eq!(read_html_page(&page).unwrap(), "<p>caf\u{fffd}</p>");
    }

    #[test]
    fn test_collect_files_and_page_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.html"), "").unwrap();
        std::fs::write(dir.path().join("a.html"), "").unwrap();
        std::fs::write(dir.path().join("c.xml"), "").unwrap();

        let files = collect_files(dir.path(), "*.html").unwrap();
        let ids: Vec<_> = files.iter().map(|f| page_id(f)).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
