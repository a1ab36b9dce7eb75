//! Draft text held by the input field.

use serde::{Deserialize, Serialize};

/// What the user did to submit the draft.
///
/// Both triggers go through the same submission path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    /// Enter pressed while the input had focus.
    #[default]
    EnterKey,
    /// The send button was clicked.
    SendButton,
}

/// The not-yet-submitted text plus a revision counter.
///
/// `revision` increases by one on every accepted submission. A client that
/// submits with a revision it already consumed is repeating itself, so the
/// submission is dropped. This keeps one Enter press to one submission even
/// when the key event reaches the server twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputController {
    draft: String,
    revision: u64,
}

impl InputController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft verbatim. No trimming, no validation.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether `revision` still names the current draft.
    ///
    /// `None` is a programmatic submission and always current.
    #[must_use]
    pub fn is_current(&self, revision: Option<u64>) -> bool {
        revision.is_none_or(|r| r == self.revision)
    }

    /// Take the draft for sending.
    ///
    /// Returns `None` (and leaves everything untouched) when the draft is
    /// blank or when `revision` is stale. Otherwise the draft is cleared
    /// before returning, and the returned text is exactly what was typed.
    pub fn submit(&mut self, revision: Option<u64>) -> Option<String> {
        if !self.is_current(revision) || self.draft.trim().is_empty() {
            return None;
        }
        self.revision += 1;
        Some(std::mem::take(&mut self.draft))
    }
}
