//! A small owned HTML tree, parsed with `scraper` (html5ever).
//!
//! The document model walks this tree instead of a browser DOM, so the
//! HTML → DOCX mapping runs anywhere and is testable with plain strings.
//! html5ever applies the same error recovery browsers do, which matters
//! because model output and editor content are rarely well-formed.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Class of the editable root that rich-text editors wrap their content in.
const EDITOR_ROOT: &str = ".ql-editor";

static EDITOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(EDITOR_ROOT).unwrap());

/// A node of the parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element {
        /// Lowercase tag name.
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<HtmlNode>,
    },
    Text(String),
}

impl HtmlNode {
    pub fn tag(&self) -> Option<&str> {
        match self {
            HtmlNode::Element { tag, .. } => Some(tag),
            HtmlNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            HtmlNode::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            HtmlNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[HtmlNode] {
        match self {
            HtmlNode::Element { children, .. } => children,
            HtmlNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Parse an HTML fragment and return the children of its content root.
///
/// The root is the first `.ql-editor` element when one exists, otherwise the
/// fragment itself.
pub fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let fragment = Html::parse_fragment(html);
    let root = fragment
        .select(&EDITOR_SELECTOR)
        .next()
        .unwrap_or_else(|| fragment.root_element());
    children_of(root)
}

fn children_of(el: ElementRef<'_>) -> Vec<HtmlNode> {
    el.children()
        .filter_map(|child| {
            if let Some(child_el) = ElementRef::wrap(child) {
                Some(convert(child_el))
            } else {
                child.value().as_text().map(|t| {
                    let s: &str = t;
                    HtmlNode::Text(s.to_string())
                })
            }
        })
        .collect()
}

fn convert(el: ElementRef<'_>) -> HtmlNode {
    let value = el.value();
    HtmlNode::Element {
        tag: value.name().to_ascii_lowercase(),
        attributes: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children: children_of(el),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_text() {
        let nodes = parse_fragment("<p>Hi <strong>there</strong></p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag(), Some("p"));
        assert_eq!(nodes[0].children().len(), 2);
        assert_eq!(nodes[0].text_content(), "Hi there");
    }

    #[test]
    fn editor_root_is_preferred() {
        let html = r#"<div class="toolbar">x</div><div class="ql-editor"><h1>T</h1></div>"#;
        let nodes = parse_fragment(html);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag(), Some("h1"));
    }

    #[test]
    fn attributes_are_kept() {
        let nodes = parse_fragment(r#"<ol><li data-list="bullet">a</li></ol>"#);
        let li = &nodes[0].children()[0];
        assert_eq!(li.attr("data-list"), Some("bullet"));
    }

    #[test]
    fn tag_names_are_lowercase() {
        let nodes = parse_fragment("<H2>Up</H2>");
        assert_eq!(nodes[0].tag(), Some("h2"));
    }
}
