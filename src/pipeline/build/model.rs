//! Format-neutral document model shared by the DOCX and PDF writers.
//!
//! HTML and plain text are first lowered into a flat list of [`Block`]s,
//! each holding styled [`TextRun`]s. The writers only ever see this model.
//!
//! ## HTML mapping
//!
//! | HTML                       | Block                                  |
//! |----------------------------|----------------------------------------|
//! | `p`                        | paragraph, one run per styled child    |
//! | `h1`–`h6`                  | heading level 1–6                      |
//! | `li` under `ol`            | numbered item                          |
//! | `li` elsewhere, or `data-list="bullet"` | bullet item               |
//! | `blockquote`               | indented quote                         |
//! | `br`                       | line break inside the current block    |
//! | anything else              | walked for the blocks inside it        |
//!
//! Loose text between blocks becomes its own paragraph. A document that
//! ends up with no blocks gets a single "Empty document" paragraph.

use super::html::{parse_fragment, HtmlNode};
use crate::pipeline::extract::StructureKind;

/// Text of the paragraph written for a document with no content.
pub const EMPTY_DOCUMENT_TEXT: &str = "Empty document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// Heading level 1–6.
    Heading(u8),
    Bullet,
    Numbered,
    Blockquote,
}

impl From<StructureKind> for BlockKind {
    fn from(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Paragraph => BlockKind::Paragraph,
            StructureKind::Heading(level) => BlockKind::Heading(level.clamp(1, 6)),
            StructureKind::ListItem => BlockKind::Bullet,
            StructureKind::Blockquote => BlockKind::Blockquote,
        }
    }
}

/// A span of text with uniform styling. `\n` inside `text` is a line break.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub runs: Vec<TextRun>,
}

impl Block {
    pub fn new(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        Self { kind, runs }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocModel {
    pub blocks: Vec<Block>,
}

impl DocModel {
    /// Lower an HTML fragment into blocks.
    pub fn from_html(html: &str) -> Self {
        let mut walker = Walker::default();
        for node in parse_fragment(html) {
            walker.walk(&node, None);
        }
        walker.flush();
        Self {
            blocks: walker.blocks,
        }
        .or_placeholder()
    }

    /// One paragraph per line.
    pub fn from_text(text: &str) -> Self {
        Self::from_text_with_hint(text, &[])
    }

    /// One block per line, the n-th non-blank line taking the kind of the
    /// n-th hint entry. Lines past the end of the hint, and blank lines, are
    /// plain paragraphs.
    pub fn from_text_with_hint(text: &str, hint: &[StructureKind]) -> Self {
        let mut kinds = hint.iter().copied();
        let blocks = if text.trim().is_empty() {
            Vec::new()
        } else {
            text.lines()
                .map(|line| {
                    if line.trim().is_empty() {
                        return Block::new(BlockKind::Paragraph, Vec::new());
                    }
                    let kind = kinds.next().map(BlockKind::from).unwrap_or(BlockKind::Paragraph);
                    Block::new(kind, vec![TextRun::plain(line.trim_end())])
                })
                .collect()
        };
        Self { blocks }.or_placeholder()
    }

    fn or_placeholder(mut self) -> Self {
        if self.blocks.is_empty() {
            self.blocks.push(Block::new(
                BlockKind::Paragraph,
                vec![TextRun::plain(EMPTY_DOCUMENT_TEXT)],
            ));
        }
        self
    }

    /// Flatten to text lines for writers without rich styling. Numbered
    /// items are counted per consecutive run of items.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut counter = 0usize;
        for block in &self.blocks {
            if block.kind == BlockKind::Numbered {
                counter += 1;
            } else {
                counter = 0;
            }
            let text = block.text();
            let prefix = match block.kind {
                BlockKind::Paragraph | BlockKind::Heading(_) => String::new(),
                BlockKind::Bullet => "- ".to_string(),
                BlockKind::Numbered => format!("{counter}. "),
                BlockKind::Blockquote => "    ".to_string(),
            };
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                lines.push(format!("{prefix}{first}"));
            }
            let pad = " ".repeat(prefix.chars().count());
            for rest in parts {
                lines.push(format!("{pad}{rest}"));
            }
        }
        lines
    }
}

// ── HTML walk ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Default)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

impl Style {
    fn apply(self, tag: &str) -> Self {
        let mut s = self;
        match tag {
            "strong" | "b" => s.bold = true,
            "em" | "i" => s.italic = true,
            "u" => s.underline = true,
            "s" | "strike" | "del" => s.strike = true,
            _ => {}
        }
        s
    }

    fn run(self, text: impl Into<String>) -> TextRun {
        TextRun {
            text: text.into(),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strike: self.strike,
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(n @ 1..=6) if digit.len() == 1 => Some(n),
        _ => None,
    }
}

fn is_list(tag: &str) -> bool {
    matches!(tag, "ul" | "ol")
}

/// Collect styled runs for the inline content of `nodes`.
fn inline_runs(nodes: &[HtmlNode], style: Style, out: &mut Vec<TextRun>) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => {
                if !t.is_empty() {
                    out.push(style.run(t.as_str()));
                }
            }
            HtmlNode::Element { tag, children, .. } => {
                if tag == "br" {
                    out.push(style.run("\n"));
                } else {
                    inline_runs(children, style.apply(tag), out);
                }
            }
        }
    }
}

/// Runs of a block element, dropping a lone trailing break (`<p><br></p>`
/// is how editors write an empty line).
fn block_runs(children: &[HtmlNode]) -> Vec<TextRun> {
    let mut runs = Vec::new();
    inline_runs(children, Style::default(), &mut runs);
    if runs.iter().all(|r| r.text == "\n") {
        runs.clear();
    }
    runs
}

#[derive(Default)]
struct Walker {
    blocks: Vec<Block>,
    pending: Vec<TextRun>,
}

impl Walker {
    /// Turn loose inline content into a paragraph if it has any text.
    fn flush(&mut self) {
        let runs = std::mem::take(&mut self.pending);
        if runs.iter().any(|r| !r.text.trim().is_empty()) {
            self.blocks.push(Block::new(BlockKind::Paragraph, runs));
        }
    }

    fn push(&mut self, kind: BlockKind, runs: Vec<TextRun>) {
        self.flush();
        self.blocks.push(Block::new(kind, runs));
    }

    fn walk(&mut self, node: &HtmlNode, parent: Option<&str>) {
        let (tag, children) = match node {
            HtmlNode::Text(t) => {
                self.pending.push(TextRun::plain(t.as_str()));
                return;
            }
            HtmlNode::Element { tag, children, .. } => (tag.as_str(), children.as_slice()),
        };

        match tag {
            "p" => self.push(BlockKind::Paragraph, block_runs(children)),
            "blockquote" => self.push(BlockKind::Blockquote, block_runs(children)),
            "li" => {
                let kind = if parent == Some("ol") && node.attr("data-list") != Some("bullet") {
                    BlockKind::Numbered
                } else {
                    BlockKind::Bullet
                };
                let (nested, inline): (Vec<&HtmlNode>, Vec<&HtmlNode>) = children
                    .iter()
                    .partition(|c| c.tag().is_some_and(is_list));
                let inline: Vec<HtmlNode> = inline.into_iter().cloned().collect();
                self.push(kind, block_runs(&inline));
                for list in nested {
                    self.walk(list, Some("li"));
                }
            }
            "br" => self.pending.push(TextRun::plain("\n")),
            "strong" | "b" | "em" | "i" | "u" | "s" | "strike" | "del" => {
                inline_runs(std::slice::from_ref(node), Style::default(), &mut self.pending);
            }
            _ => {
                if let Some(level) = heading_level(tag) {
                    self.push(BlockKind::Heading(level), block_runs(children));
                    return;
                }
                for child in children {
                    self.walk(child, Some(tag));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(model: &DocModel) -> Vec<BlockKind> {
        model.blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn strong_paragraph_is_one_bold_run() {
        let m = DocModel::from_html("<p><strong>x</strong></p>");
        assert_eq!(m.blocks.len(), 1);
        assert_eq!(m.blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(m.blocks[0].runs.len(), 1);
        assert_eq!(m.blocks[0].runs[0].text, "x");
        assert!(m.blocks[0].runs[0].bold);
        assert!(!m.blocks[0].runs[0].italic);
    }

    #[test]
    fn mixed_inline_styles() {
        let m = DocModel::from_html("<p>a <em>b</em> <u>c</u> <s>d</s> <b><i>e</i></b></p>");
        let runs = &m.blocks[0].runs;
        assert!(runs.iter().any(|r| r.text == "b" && r.italic));
        assert!(runs.iter().any(|r| r.text == "c" && r.underline));
        assert!(runs.iter().any(|r| r.text == "d" && r.strike));
        assert!(runs.iter().any(|r| r.text == "e" && r.bold && r.italic));
    }

    #[test]
    fn headings_lists_and_quotes() {
        let html = "<h1>T</h1><h3>S</h3><ul><li>a</li></ul><ol><li>b</li><li>c</li></ol><blockquote>q</blockquote>";
        let m = DocModel::from_html(html);
        assert_eq!(
            kinds(&m),
            vec![
                BlockKind::Heading(1),
                BlockKind::Heading(3),
                BlockKind::Bullet,
                BlockKind::Numbered,
                BlockKind::Numbered,
                BlockKind::Blockquote,
            ]
        );
    }

    #[test]
    fn editor_bullet_inside_ol() {
        let m = DocModel::from_html(r#"<ol><li data-list="bullet">x</li><li data-list="ordered">y</li></ol>"#);
        assert_eq!(kinds(&m), vec![BlockKind::Bullet, BlockKind::Numbered]);
    }

    #[test]
    fn empty_editor_paragraph_has_no_runs() {
        let m = DocModel::from_html("<p>one</p><p><br></p><p>two</p>");
        assert_eq!(m.blocks.len(), 3);
        assert!(m.blocks[1].runs.is_empty());
    }

    #[test]
    fn br_inside_paragraph_is_line_break() {
        let m = DocModel::from_html("<p>a<br>b</p>");
        assert_eq!(m.blocks[0].text(), "a\nb");
    }

    #[test]
    fn div_wrapper_is_transparent() {
        let m = DocModel::from_html("<div><h2>x</h2><div><p>y</p></div></div>");
        assert_eq!(kinds(&m), vec![BlockKind::Heading(2), BlockKind::Paragraph]);
    }

    #[test]
    fn loose_text_becomes_paragraph() {
        let m = DocModel::from_html("<div>Hello <b>world</b><p>next</p></div>");
        assert_eq!(m.blocks.len(), 2);
        assert_eq!(m.blocks[0].text(), "Hello world");
        assert!(m.blocks[0].runs[1].bold);
        assert_eq!(m.blocks[1].text(), "next");
    }

    #[test]
    fn whitespace_between_blocks_is_ignored() {
        let m = DocModel::from_html("<h1>a</h1>\n  \n<p>b</p>\n");
        assert_eq!(m.blocks.len(), 2);
    }

    #[test]
    fn empty_input_gets_placeholder() {
        for html in ["", "   ", "<div></div>"] {
            let m = DocModel::from_html(html);
            assert_eq!(m.blocks.len(), 1);
            assert_eq!(m.blocks[0].text(), EMPTY_DOCUMENT_TEXT);
        }
        assert_eq!(DocModel::from_text("").blocks[0].text(), EMPTY_DOCUMENT_TEXT);
    }

    #[test]
    fn text_is_one_paragraph_per_line() {
        let m = DocModel::from_text("Title\n\nBody line");
        assert_eq!(m.blocks.len(), 3);
        assert!(m.blocks.iter().all(|b| b.kind == BlockKind::Paragraph));
        assert_eq!(m.blocks[2].text(), "Body line");
    }

    #[test]
    fn hint_applies_to_non_blank_lines_in_order() {
        let hint = [StructureKind::Heading(1), StructureKind::ListItem];
        let m = DocModel::from_text_with_hint("Report\n\nFirst point\nClosing words", &hint);
        assert_eq!(
            kinds(&m),
            vec![
                BlockKind::Heading(1),
                BlockKind::Paragraph,
                BlockKind::Bullet,
                BlockKind::Paragraph,
            ]
        );
    }

    #[test]
    fn lines_number_consecutive_items() {
        let m = DocModel::from_html("<ol><li>a</li><li>b</li></ol><p>x</p><ol><li>c</li></ol><ul><li>d</li></ul>");
        assert_eq!(m.to_lines(), vec!["1. a", "2. b", "x", "1. c", "- d"]);
    }

    #[test]
    fn nested_list_items_follow_parent() {
        let m = DocModel::from_html("<ul><li>a<ul><li>b</li></ul></li></ul>");
        assert_eq!(m.blocks.len(), 2);
        assert_eq!(m.blocks[0].text(), "a");
        assert_eq!(m.blocks[1].text(), "b");
        assert_eq!(m.blocks[1].kind, BlockKind::Bullet);
    }
}
