use std::sync::LazyLock;

use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// Caption span carrying the speaker's name
pub const CAPTION_CLASS: &str = "doc_subtitle_level1_bis";

pub static ITALIC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.italic").expect("valid italic selector"));
pub static CAPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.doc_subtitle_level1_bis").expect("valid caption selector")
});
pub static PHOTO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"img[alt="MPphoto"]"#).expect("valid photo selector"));

/// Read-only view of one speaker turn's markup.
///
/// Annotation spans recognised as metadata are consumed rather than removed
/// from the document: consumed subtrees are skipped when text is rendered
/// and when later heuristics look for spans.
#[derive(Debug, Clone)]
pub struct TurnMarkup<'a> {
    root: ElementRef<'a>,
    consumed: Vec<ElementRef<'a>>,
}

impl<'a> TurnMarkup<'a> {
    pub fn new(root: ElementRef<'a>) -> Self {
        Self {
            root,
            consumed: Vec::new(),
        }
    }

    pub fn root(&self) -> ElementRef<'a> {
        self.root
    }

    /// Exclude an element and its subtree from rendered text
    pub fn consume(&mut self, element: ElementRef<'a>) {
        if !self.consumed.contains(&element) {
            self.consumed.push(element);
        }
    }

    /// Whether the element or one of its ancestors was consumed
    pub fn is_consumed(&self, element: ElementRef<'a>) -> bool {
        self.consumed.contains(&element)
            || element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| self.consumed.contains(&ancestor))
    }

    /// Italic annotation spans under `scope` that are still part of the text
    pub fn italic_spans(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope
            .select(&ITALIC)
            .filter(|span| !self.is_consumed(*span))
            .collect()
    }

    /// Rendered text of an element, without consumed subtrees
    pub fn text(&self, element: ElementRef<'a>) -> String {
        let mut out = String::new();
        self.render(element, false, &mut out);
        out
    }

    /// Rendered text of a paragraph: like [`TurnMarkup::text`], and the
    /// speaker caption is left out as well
    pub fn paragraph_text(&self, paragraph: ElementRef<'a>) -> String {
        let mut out = String::new();
        self.render(paragraph, true, &mut out);
        out
    }

    fn render(&self, element: ElementRef<'a>, skip_captions: bool, out: &mut String) {
        for child in element.children() {
            if let Node::Text(text) = child.value() {
                for c in text.chars() {
                    out.push(if c == '\n' || c == '\r' { ' ' } else { c });
                }
                continue;
            }
            let Some(child) = ElementRef::wrap(child) else {
                continue;
            };
            if self.consumed.contains(&child) {
                continue;
            }
            let value = child.value();
            match value.name() {
                "br" => out.push(' '),
                "sup" | "img" | "script" | "style" => {}
                _ if skip_captions && value.classes().any(|c| c == CAPTION_CLASS) => {}
                _ => self.render(child, skip_captions, out),
            }
        }
    }
}
