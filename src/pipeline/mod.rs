//! Pipeline stages for turning instructions and uploads into documents.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the wizard only wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ postprocess ──▶ build
//! (upload)  (PDF/DOCX)  (model)  (clean-up)     (DOCX/PDF)
//! ```
//!
//! 1. [`input`]  : classify an upload as PDF, DOCX or unsupported
//! 2. [`extract`]: recover plain text (and DOCX layout) in `spawn_blocking`
//! 3. [`llm`]    : compose the prompt and make the single model call; the
//!    only stage with network I/O
//! 4. [`postprocess`]: strip prompt echoes and fences, isolate the HTML block
//! 5. [`build`]  : lower HTML or text to a document model and write bytes

pub mod build;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
