//! PDF writer: monospaced text on A4 pages, written with lopdf.
//!
//! Layout is measured in millimetres from the top-left corner and converted
//! to PDF points (origin bottom-left) only when emitting operators. Courier
//! is a standard-14 font, so no font program is embedded and every glyph
//! has the same advance (600/1000 em), which makes wrapping a matter of
//! counting characters.

use super::model::DocModel;
use crate::error::BuildError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

const PT_PER_MM: f64 = 72.0 / 25.4;
const COURIER_ADVANCE_EM: f64 = 0.6;

/// Page geometry and typography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfLayout {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_left_mm: f64,
    /// Baseline of the first line on each page.
    pub margin_top_mm: f64,
    /// A line whose baseline would fall below this starts a new page.
    pub bottom_limit_mm: f64,
    pub text_width_mm: f64,
    pub font_size_pt: f64,
    pub line_height_mm: f64,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_left_mm: 15.0,
            margin_top_mm: 20.0,
            bottom_limit_mm: 280.0,
            text_width_mm: 180.0,
            font_size_pt: 12.0,
            line_height_mm: 7.0,
        }
    }
}

impl PdfLayout {
    /// Characters that fit on one line.
    pub fn chars_per_line(&self) -> usize {
        let advance_mm = self.font_size_pt * COURIER_ADVANCE_EM / PT_PER_MM;
        ((self.text_width_mm / advance_mm).floor() as usize).max(1)
    }

    /// Split `lines` into pages of baseline positions (mm from top).
    fn paginate(&self, lines: Vec<String>) -> Vec<Vec<(f64, String)>> {
        let mut pages = vec![Vec::new()];
        let mut y = self.margin_top_mm;
        for line in lines {
            if y > self.bottom_limit_mm {
                pages.push(Vec::new());
                y = self.margin_top_mm;
            }
            if let Some(page) = pages.last_mut() {
                page.push((y, line));
            }
            y += self.line_height_mm;
        }
        pages
    }
}

/// Greedy word wrap to `width` characters. Words longer than a line are
/// split hard; blank lines are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for source_line in text.split('\n') {
        let mut line = String::new();
        let mut len = 0usize;
        for word in source_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            // Hard-split anything that cannot fit on a line by itself.
            while word.len() > width {
                if len > 0 {
                    out.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(width);
                out.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if len == 0 { word.len() } else { len + 1 + word.len() };
            if needed > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(word.iter());
            len += word.len();
        }
        out.push(line);
    }
    out
}

/// Encode text for a standard-14 font with WinAnsiEncoding.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn mm_to_pt(mm: f64) -> i64 {
    (mm * PT_PER_MM).round() as i64
}

/// Render the model with the default layout.
pub fn render_pdf(model: &DocModel) -> Result<Vec<u8>, BuildError> {
    render_pdf_with_layout(model, &PdfLayout::default())
}

/// Render the model with an explicit layout.
pub fn render_pdf_with_layout(model: &DocModel, layout: &PdfLayout) -> Result<Vec<u8>, BuildError> {
    let width = layout.chars_per_line();
    let lines: Vec<String> = model
        .to_lines()
        .iter()
        .flat_map(|l| wrap_text(l, width))
        .collect();
    render_lines(lines, layout)
}

fn render_lines(lines: Vec<String>, layout: &PdfLayout) -> Result<Vec<u8>, BuildError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let page_w = mm_to_pt(layout.page_width_mm);
    let page_h = mm_to_pt(layout.page_height_mm);
    let x = mm_to_pt(layout.margin_left_mm);
    let font_size = layout.font_size_pt.round() as i64;

    let mut kids: Vec<Object> = Vec::new();
    for page in layout.paginate(lines) {
        let mut operations = Vec::with_capacity(page.len() * 4);
        for (y_mm, line) in page {
            if line.is_empty() {
                continue;
            }
            let y = page_h - mm_to_pt(y_mm);
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec!["F1".into(), Object::Integer(font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(x), Object::Integer(y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&line), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| BuildError::Upstream(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(page_w),
                Object::Integer(page_h),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| BuildError::Upstream(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_fits_seventy_courier_chars() {
        assert_eq!(PdfLayout::default().chars_per_line(), 70);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_text("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn wrap_hard_splits_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn pagination_starts_new_page_past_bottom_limit() {
        let layout = PdfLayout::default();
        let lines: Vec<String> = (0..39).map(|i| format!("line {i}")).collect();
        let pages = layout.paginate(lines);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 38);
        assert_eq!(pages[1][0].0, layout.margin_top_mm);
    }

    #[test]
    fn win_ansi_maps_typographic_characters() {
        assert_eq!(win_ansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(win_ansi("é"), vec![0xE9]);
        assert_eq!(win_ansi("中"), vec![b'?']);
    }

    #[test]
    fn rendered_pdf_is_readable_by_lopdf() {
        let model = DocModel::from_text("alpha\nbeta");
        let bytes = render_pdf(&model).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_text_spans_pages() {
        let text: String = (0..100).map(|i| format!("row {i}\n")).collect();
        let bytes = render_pdf(&DocModel::from_text(&text)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }
}
