//! DOCX writer over the document model, using `docx-rs`.

use super::model::{Block, BlockKind, DocModel, TextRun};
use crate::error::BuildError;
use docx_rs::{
    AbstractNumbering, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat,
    Numbering, NumberingId, Paragraph, Run, SpecialIndentType, Start, Style, StyleType,
};
use std::io::Cursor;

/// Numbering definition shared by every bullet item.
const BULLET_NUMBERING: usize = 1;
/// Numbering definition shared by every numbered item.
const DECIMAL_NUMBERING: usize = 2;

/// Left indent of block quotes and list items, in twentieths of a point.
pub const QUOTE_INDENT_TWIPS: i32 = 720;

/// Heading font sizes in half-points, h1 first.
const HEADING_SIZES: [usize; 6] = [32, 28, 26, 24, 22, 22];

fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 6))
}

fn list_level(format: &str, text: &str) -> Level {
    Level::new(
        0,
        Start::new(1),
        NumberFormat::new(format),
        LevelText::new(text),
        LevelJc::new("left"),
    )
    .indent(
        Some(QUOTE_INDENT_TWIPS),
        Some(SpecialIndentType::Hanging(360)),
        None,
        None,
    )
}

fn base_document() -> Docx {
    let mut docx = Docx::new()
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(list_level("bullet", "•")),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_abstract_numbering(
            AbstractNumbering::new(DECIMAL_NUMBERING).add_level(list_level("decimal", "%1.")),
        )
        .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING));

    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = (i + 1) as u8;
        docx = docx.add_style(
            Style::new(heading_style_id(level), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(*size)
                .bold(),
        );
    }
    docx
}

fn to_run(run: &TextRun) -> Run {
    let mut r = Run::new();
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            r = r.add_break(BreakType::TextWrapping);
        }
        if !line.is_empty() {
            r = r.add_text(line);
        }
    }
    if run.bold {
        r = r.bold();
    }
    if run.italic {
        r = r.italic();
    }
    if run.underline {
        r = r.underline("single");
    }
    if run.strike {
        r = r.strike();
    }
    r
}

fn to_paragraph(block: &Block) -> Paragraph {
    let mut p = block
        .runs
        .iter()
        .fold(Paragraph::new(), |p, run| p.add_run(to_run(run)));
    match block.kind {
        BlockKind::Paragraph => {}
        BlockKind::Heading(level) => p = p.style(&heading_style_id(level)),
        BlockKind::Bullet => {
            p = p.numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
        }
        BlockKind::Numbered => {
            p = p.numbering(NumberingId::new(DECIMAL_NUMBERING), IndentLevel::new(0))
        }
        BlockKind::Blockquote => p = p.indent(Some(QUOTE_INDENT_TWIPS), None, None, None),
    }
    p
}

/// Serialise the model as a `.docx` archive.
pub fn render_docx(model: &DocModel) -> Result<Vec<u8>, BuildError> {
    let docx = model
        .blocks
        .iter()
        .fold(base_document(), |d, block| d.add_paragraph(to_paragraph(block)));

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| BuildError::Upstream(e.to_string()))?;
    Ok(buf.into_inner())
}
