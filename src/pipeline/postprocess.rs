//! Post-processing: deterministic cleanup of model output.
//!
//! Instruction-tuned endpoints are inconsistent about what they send back:
//!
//! - some echo the whole prompt before the answer, even when asked not to
//! - some wrap the HTML in ```` ```html ```` fences or surround it with chat
//! - some return bare text with a stray opening or closing tag on its own line
//!
//! The rules here turn all of that into one predictable shape without
//! touching the content itself. Each rule is a pure `&str → String`
//! function with its own tests.

use crate::error::GenerationError;
use crate::pipeline::llm::ResponseFormat;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply the clean-up rules for `format` to already echo-stripped output.
///
/// Fails with [`GenerationError::EmptyResult`] when nothing usable is left.
pub fn finish(raw: &str, format: ResponseFormat) -> Result<String, GenerationError> {
    let text = normalise_line_endings(raw);
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResult);
    }
    Ok(match format {
        ResponseFormat::Html => extract_html_content(text),
        ResponseFormat::Text => strip_fences(text).trim().to_string(),
    })
}

// ── Rule 1: Drop the echoed prompt ───────────────────────────────────────────

/// Keep only what follows the last occurrence of the first delimiter found.
///
/// Delimiters are tried in order, so list the most specific one first
/// (`[/INST]</s>` before `[/INST]`).
pub fn strip_echo(text: &str, delimiters: &[String]) -> String {
    for delimiter in delimiters.iter().filter(|d| !d.is_empty()) {
        if let Some(idx) = text.rfind(delimiter.as_str()) {
            return text[idx + delimiter.len()..].trim().to_string();
        }
    }
    text.trim().to_string()
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Pull out the HTML block ──────────────────────────────────────────

static RE_BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(html|body|div|h[1-6]|p|ul|ol|li)\b[^>]*>").unwrap()
});

/// Return the HTML document inside model output.
///
/// Takes the first block-level opening tag that has a matching closing tag
/// later in the text and returns everything from that tag through the
/// *last* matching close, so sibling blocks of the same type stay together.
/// If no such block exists, fences and lone tag lines are removed and the
/// remaining text is wrapped in a `<div>`.
pub fn extract_html_content(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    for caps in RE_BLOCK_OPEN.captures_iter(text) {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let close = format!("</{}>", tag.as_str().to_ascii_lowercase());
        if let Some(end) = lower.rfind(&close) {
            if end >= whole.end() {
                return text[whole.start()..end + close.len()].to_string();
            }
        }
    }

    let body = remove_lone_tag_lines(&strip_fences(text));
    format!("<div>{}</div>", body.trim())
}

// ── Rule 4: Strip markdown fences ────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:html|markdown|text)?").unwrap());

fn strip_fences(input: &str) -> String {
    RE_FENCE.replace_all(input, "").to_string()
}

// ── Rule 5: Remove lines holding a single bare tag ───────────────────────────

static RE_LONE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*</?[A-Za-z][^>]*>\s*$").unwrap());

fn remove_lone_tag_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| !RE_LONE_TAG.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delims() -> Vec<String> {
        vec!["[/INST]</s>".to_string(), "[/INST]".to_string()]
    }

    #[test]
    fn echo_is_stripped_after_last_delimiter() {
        let raw = "<s>[INST] make a doc [/INST]</s>  <h1>Doc</h1>";
        assert_eq!(strip_echo(raw, &delims()), "<h1>Doc</h1>");
    }

    #[test]
    fn echo_falls_back_to_short_delimiter() {
        let raw = "[INST] prompt [/INST] answer";
        assert_eq!(strip_echo(raw, &delims()), "answer");
    }

    #[test]
    fn no_delimiter_leaves_text() {
        assert_eq!(strip_echo("  just text ", &delims()), "just text");
    }

    #[test]
    fn html_block_is_extracted_from_chatter() {
        let raw = "Sure! Here is your document:\n<h1>Title</h1>\nThanks!";
        assert_eq!(extract_html_content(raw), "<h1>Title</h1>");
    }

    #[test]
    fn html_extraction_is_greedy_to_last_close() {
        let raw = "<p>one</p>\n<p>two</p> trailing";
        assert_eq!(extract_html_content(raw), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn html_extraction_is_case_insensitive() {
        let raw = "<DIV class=\"x\"><P>hi</P></DIV>";
        assert_eq!(extract_html_content(raw), raw);
    }

    #[test]
    fn pre_is_not_mistaken_for_p() {
        let raw = "<pre>code</pre>";
        assert_eq!(extract_html_content(raw), "<div><pre>code</pre></div>");
    }

    #[test]
    fn unclosed_opening_falls_through_to_next_block() {
        let raw = "<p>dangling <ul><li>a</li></ul>";
        assert_eq!(extract_html_content(raw), "<ul><li>a</li></ul>");
    }

    #[test]
    fn fallback_wraps_plain_text() {
        let raw = "```html\n<section>\nHello there\n</section>\n```";
        assert_eq!(extract_html_content(raw), "<div>Hello there</div>");
    }

    #[test]
    fn finish_rejects_blank_output() {
        assert_eq!(
            finish("  \r\n ", ResponseFormat::Html),
            Err(GenerationError::EmptyResult)
        );
    }

    #[test]
    fn finish_text_strips_fences() {
        let out = finish("```\nTitle\nBody\n```", ResponseFormat::Text).unwrap();
        assert_eq!(out, "Title\nBody");
    }
}
