//! Prompt templates for document generation and summarisation.
//!
//! Every instruction sent to a model is built here, so wording changes are
//! made in one place and unit tests can inspect prompts without a network
//! call. The templates produce model-agnostic instruction text;
//! [`wrap_instruction`] adds the `[INST]` markers the hosted Mixtral endpoint
//! expects, while chat providers receive the bare instruction.

/// Opening marker of an instruction block for instruction-tuned models.
pub const INST_OPEN: &str = "<s>[INST] ";

/// Closing marker of an instruction block. Models that echo the prompt
/// repeat everything up to and including this marker.
pub const INST_CLOSE: &str = " [/INST]</s>";

/// Instruction asking for a document rendered as HTML.
///
/// `{description}` is replaced with the composed user request.
pub const HTML_DOCUMENT_TEMPLATE: &str = "You are a document generation assistant.
Create a well-formatted document based on these instructions:

{description}

Generate the document as clean HTML content with appropriate tags (h1, h2, p, ul, ol, etc.).
Only provide the HTML content in your response, nothing else.";

/// Instruction asking for a document as plain text, one block per line.
pub const TEXT_DOCUMENT_TEMPLATE: &str = "You are a document generation assistant.
Create a well-formatted document based on these instructions:

{description}

Write the document as plain text. Put every heading, list item and paragraph on its own line, with no Markdown or HTML markup.
Only provide the document content in your response, nothing else.";

/// Instruction asking for a summary. `{source}` is `text` or `document`.
pub const SUMMARY_TEMPLATE: &str = "Please provide a concise and comprehensive summary of the following {source}.
Focus on the main points, key ideas, and essential information:

{text}";

/// Render the HTML document instruction.
pub fn html_document_instruction(description: &str) -> String {
    HTML_DOCUMENT_TEMPLATE.replace("{description}", description)
}

/// Render the plain-text document instruction.
pub fn text_document_instruction(description: &str) -> String {
    TEXT_DOCUMENT_TEMPLATE.replace("{description}", description)
}

/// Render the summary instruction.
pub fn summary_instruction(source: &str, text: &str) -> String {
    SUMMARY_TEMPLATE
        .replacen("{source}", source, 1)
        .replacen("{text}", text, 1)
}

/// Wrap an instruction in `<s>[INST] … [/INST]</s>`.
pub fn wrap_instruction(instruction: &str) -> String {
    format!("{INST_OPEN}{instruction}{INST_CLOSE}")
}
