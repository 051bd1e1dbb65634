//! DOCX text extraction straight from `word/document.xml`.
//!
//! A DOCX file is a ZIP archive; the body text lives in `word/document.xml`
//! as `<w:p>` paragraphs made of `<w:r>` runs holding `<w:t>` text. We stream
//! that XML once with quick-xml and keep, per paragraph, its text and the few
//! properties that say what kind of block it is (style id, numbering,
//! left indent). Raw text and block structure are both derived from that one
//! pass.

use crate::error::ExtractionError;
use crate::pipeline::input::{has_ole_magic, has_zip_magic};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

/// The kind of block a DOCX paragraph represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "level")]
pub enum StructureKind {
    Paragraph,
    /// Heading level 1–6.
    Heading(u8),
    ListItem,
    Blockquote,
}

/// One non-empty paragraph of a DOCX body, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredBlock {
    pub kind: StructureKind,
    pub text: String,
}

/// A paragraph as read from the XML.
#[derive(Debug, Default)]
struct RawParagraph {
    text: String,
    style: Option<String>,
    numbered: bool,
    indent_left: Option<i32>,
}

impl RawParagraph {
    fn kind(&self) -> StructureKind {
        if let Some(style) = self.style.as_deref() {
            if let Some(level) = heading_level(style) {
                return StructureKind::Heading(level);
            }
            if matches!(style, "Quote" | "IntenseQuote") {
                return StructureKind::Blockquote;
            }
            if style == "ListParagraph" {
                return StructureKind::ListItem;
            }
        }
        if self.numbered {
            return StructureKind::ListItem;
        }
        if self.indent_left.is_some_and(|v| v > 0) {
            return StructureKind::Blockquote;
        }
        StructureKind::Paragraph
    }
}

fn heading_level(style: &str) -> Option<u8> {
    if style == "Title" {
        return Some(1);
    }
    let rest = style
        .strip_prefix("Heading")
        .or_else(|| style.strip_prefix("heading"))?;
    match rest.trim().parse::<u8>() {
        Ok(n @ 1..=6) => Some(n),
        _ => None,
    }
}

/// Raw text of a DOCX: paragraphs separated by a blank line, tabs and line
/// breaks kept.
pub fn raw_text(name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let paragraphs = read_paragraphs(name, bytes)?;
    Ok(paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Block layout of a DOCX, skipping empty paragraphs.
pub fn structure(name: &str, bytes: &[u8]) -> Result<Vec<StructuredBlock>, ExtractionError> {
    let paragraphs = read_paragraphs(name, bytes)?;
    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .map(|p| StructuredBlock {
            kind: p.kind(),
            text: p.text,
        })
        .collect())
}

/// Pull `word/document.xml` out of the archive.
fn document_xml(name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let corrupt = |detail: String| ExtractionError::Corrupt {
        name: name.to_string(),
        detail,
    };

    // Word wraps password-protected documents in an OLE compound file.
    if has_ole_magic(bytes) {
        return Err(corrupt(
            "encrypted or password-protected archive".to_string(),
        ));
    }
    if !has_zip_magic(bytes) {
        return Err(corrupt("not a ZIP archive".to_string()));
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(e.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| corrupt(format!("word/document.xml: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("word/document.xml: {e}")))?;
    Ok(xml)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn read_paragraphs(name: &str, bytes: &[u8]) -> Result<Vec<RawParagraph>, ExtractionError> {
    let xml = document_xml(name, bytes)?;
    parse_paragraphs(&xml).map_err(|detail| ExtractionError::Corrupt {
        name: name.to_string(),
        detail,
    })
}

/// Walk the body XML. Paragraphs nested in text boxes are kept on a stack
/// and emitted when they close.
fn parse_paragraphs(xml: &str) -> Result<Vec<RawParagraph>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut done: Vec<RawParagraph> = Vec::new();
    let mut open: Vec<RawParagraph> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at byte {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"w:p" => {
                        if is_empty {
                            done.push(RawParagraph::default());
                        } else {
                            open.push(RawParagraph::default());
                        }
                    }
                    b"w:r" if !is_empty => in_run = true,
                    b"w:t" if !is_empty => in_text = true,
                    b"w:tab" if in_run => push_text(&mut open, "\t"),
                    b"w:br" | b"w:cr" if in_run => push_text(&mut open, "\n"),
                    b"w:pStyle" => {
                        if let (Some(p), Some(val)) = (open.last_mut(), attr(e, b"w:val")) {
                            p.style = Some(val);
                        }
                    }
                    b"w:numPr" => {
                        if let Some(p) = open.last_mut() {
                            p.numbered = true;
                        }
                    }
                    b"w:ind" if !in_run => {
                        let left = attr(e, b"w:left").or_else(|| attr(e, b"w:start"));
                        if let (Some(p), Some(v)) = (open.last_mut(), left) {
                            p.indent_left = v.parse().ok();
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(p) = open.pop() {
                        done.push(p);
                    }
                }
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(ref t) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                push_text(&mut open, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(done)
}

fn push_text(open: &mut [RawParagraph], s: &str) {
    if let Some(p) = open.last_mut() {
        p.text.push_str(s);
    }
}
