use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;

use crate::error::{CorpusError, Result};
use crate::models::{Content, Intervention, Mode, Proceeding};

/// Serialize a proceeding to corpus XML.
///
/// Every opening tag, text node and closing tag sits on its own line,
/// without indentation.
pub fn proceeding_to_xml(proceeding: &Proceeding) -> Result<String> {
    let mut out = LineWriter::new(&proceeding.id);
    out.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let date = proceeding.date.format("%Y-%m-%d").to_string();
    out.open(
        "text",
        &[
            ("id", proceeding.id.as_str()),
            ("lang", proceeding.language.code()),
            ("date", date.as_str()),
            ("place", proceeding.place.as_str()),
            ("edition", proceeding.edition.as_str()),
        ],
    )?;
    for section in &proceeding.sections {
        out.open(
            "section",
            &[("id", section.id.as_str()), ("title", section.title.as_str())],
        )?;
        for intervention in &section.interventions {
            out.open("intervention", &intervention_attributes(intervention))?;
            for content in &intervention.contents {
                match content {
                    Content::Paragraph(p) => {
                        out.open("p", &[("sl", p.language.code())])?;
                        out.write(Event::Text(BytesText::new(&p.text)))?;
                        out.close("p")?;
                    }
                    Content::Remark(r) => {
                        let mut remark = BytesStart::new("remark");
                        remark.push_attribute(("text", r.text.as_str()));
                        out.write(Event::Empty(remark))?;
                    }
                }
            }
            out.close("intervention")?;
        }
        out.close("section")?;
    }
    out.close("text")?;
    out.finish()
}

/// Write a proceeding's XML to a file
pub fn write_proceeding_xml(proceeding: &Proceeding, path: &Path) -> Result<()> {
    let xml = proceeding_to_xml(proceeding)?;
    std::fs::write(path, xml)?;
    Ok(())
}

fn intervention_attributes(intervention: &Intervention) -> Vec<(&'static str, &str)> {
    let mut attributes = vec![("id", intervention.id.as_str())];
    if let Some(speaker_id) = &intervention.speaker_id {
        attributes.push(("speaker_id", speaker_id.as_str()));
    }
    if let Some(name) = &intervention.name {
        attributes.push(("name", name.as_str()));
    }
    attributes.push(("is_mep", if intervention.is_mep { "True" } else { "False" }));
    attributes.push(("mode", intervention.mode.as_str()));
    if let Some(role) = &intervention.role {
        attributes.push(("role", role.as_str()));
    }
    attributes.extend(intervention.biography.attributes());
    attributes
}

/// quick-xml writer that ends every event with a line break
struct LineWriter<'a> {
    writer: Writer<Vec<u8>>,
    id: &'a str,
}

impl<'a> LineWriter<'a> {
    fn new(id: &'a str) -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            id,
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| serialize_error(self.id, e))?;
        self.writer.get_mut().push(b'\n');
        Ok(())
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.write(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| serialize_error(self.id, e))
    }
}

fn serialize_error(id: &str, error: impl Display) -> CorpusError {
    CorpusError::Serialize {
        id: id.to_string(),
        reason: error.to_string(),
    }
}

/// Plain-text reading view of a proceeding
pub struct PlainText<'a> {
    proceeding: &'a Proceeding,
}

impl<'a> PlainText<'a> {
    pub fn new(proceeding: &'a Proceeding) -> Self {
        Self { proceeding }
    }

    /// Format the proceeding as text: section headings, speaker labels and
    /// wrapped paragraphs
    pub fn format(&self) -> String {
        let p = self.proceeding;
        let mut output = format!(
            "{} - {} ({})\n\n",
            p.date.format("%Y-%m-%d"),
            p.place,
            p.edition
        );

        for section in &p.sections {
            if !section.title.is_empty() {
                output.push_str(&section.title);
                output.push_str("\n\n");
            }
            for intervention in &section.interventions {
                output.push_str(&speaker_label(intervention));
                output.push_str(":\n");
                for content in &intervention.contents {
                    output.push_str(&wrap_text(content.text(), 80));
                    output.push('\n');
                }
                output.push('\n');
            }
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.format())?;
        Ok(())
    }
}

fn speaker_label(intervention: &Intervention) -> String {
    let mut label = match (&intervention.name, &intervention.role) {
        (Some(name), Some(role)) => format!("{}, {}", name, role),
        (Some(name), None) => name.clone(),
        (None, Some(role)) => role.clone(),
        (None, None) => "Unidentified speaker".to_string(),
    };
    if intervention.mode == Mode::Written {
        label.push_str(" [written]");
    }
    label
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}

/// Counts describing one proceeding
#[derive(Debug, Clone, Serialize)]
pub struct ProceedingStats {
    pub id: String,
    pub language: String,
    pub date: NaiveDate,
    pub sections: usize,
    pub interventions: usize,
    /// Interventions by identified Members
    pub members: usize,
    pub spoken: usize,
    pub written: usize,
    pub paragraphs: usize,
    pub remarks: usize,
    /// Paragraph counts per source language
    pub paragraph_languages: BTreeMap<String, usize>,
}

impl ProceedingStats {
    pub fn from_proceeding(proceeding: &Proceeding) -> Self {
        let mut stats = Self {
            id: proceeding.id.clone(),
            language: proceeding.language.code().to_string(),
            date: proceeding.date,
            sections: proceeding.sections.len(),
            interventions: 0,
            members: 0,
            spoken: 0,
            written: 0,
            paragraphs: 0,
            remarks: 0,
            paragraph_languages: BTreeMap::new(),
        };

        for intervention in proceeding.interventions() {
            stats.interventions += 1;
            if intervention.is_mep {
                stats.members += 1;
            }
            match intervention.mode {
                Mode::Spoken => stats.spoken += 1,
                Mode::Written => stats.written += 1,
            }
            for paragraph in intervention.paragraphs() {
                stats.paragraphs += 1;
                *stats
                    .paragraph_languages
                    .entry(paragraph.language.code().to_string())
                    .or_insert(0) += 1;
            }
            stats.remarks += intervention.remarks().count();
        }

        stats
    }

    /// Human-readable report
    pub fn format_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Proceeding {} ({}, {})\n", self.id, self.language, self.date));
        output.push_str("==========\n");
        output.push_str(&format!("Sections: {}\n", self.sections));
        output.push_str(&format!(
            "Interventions: {} ({} by Members, {} spoken, {} written)\n",
            self.interventions, self.members, self.spoken, self.written
        ));
        output.push_str(&format!("Paragraphs: {}\n", self.paragraphs));
        output.push_str(&format!("Remarks: {}\n", self.remarks));
        for (language, count) in &self.paragraph_languages {
            output.push_str(&format!("  {}: {}\n", language, count));
        }
        output
    }
}
