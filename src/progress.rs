//! Observer trait for wizard events.
//!
//! Attach an [`Arc<dyn WizardObserver>`] with
//! [`crate::Wizard::with_observer`] (or [`crate::Summarizer::with_observer`])
//! to hear about step changes, extraction results and the generation call.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: a host can forward
//! events to a terminal spinner, a channel, or a UI store without the library
//! knowing how it communicates. The CLI drives its `indicatif` spinner this
//! way.
//!
//! # Example
//!
//! ```rust
//! use docgen_wizard::{Step, WizardObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StepLog(Mutex<Vec<Step>>);
//!
//! impl WizardObserver for StepLog {
//!     fn on_step_changed(&self, _from: Step, to: Step) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let log = Arc::new(StepLog::default());
//! log.on_step_changed(Step::EnterText, Step::UploadDocument);
//! assert_eq!(log.0.lock().unwrap().as_slice(), &[Step::UploadDocument]);
//! ```

use crate::wizard::Step;
use std::sync::Arc;

/// Receives wizard and summarizer events.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Calls happen on the task driving the wizard, one at
/// a time.
pub trait WizardObserver: Send + Sync {
    /// The step cursor moved, including `reset` back to step 1.
    fn on_step_changed(&self, from: Step, to: Step) {
        let _ = (from, to);
    }

    /// Text was recovered from an upload.
    ///
    /// # Arguments
    /// * `chars`    : characters kept
    /// * `truncated`: a character or page cap cut the text short
    fn on_extraction_complete(&self, chars: usize, truncated: bool) {
        let _ = (chars, truncated);
    }

    /// Called just before the model request is sent.
    ///
    /// # Arguments
    /// * `prompt_chars`: characters of the composed description
    fn on_generation_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// The model answered with usable text.
    fn on_generation_complete(&self, output_chars: usize) {
        let _ = output_chars;
    }

    /// A step failed; `error` is the user-facing message.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need events.
///
/// This is the default when no observer is attached.
pub struct NoopObserver;

impl WizardObserver for NoopObserver {}

/// Convenience alias for the type stored in the wizard.
pub type SharedObserver = Arc<dyn WizardObserver>;
