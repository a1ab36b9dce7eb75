//! Widget state and its transitions.
//!
//! All mutation goes through [`WidgetState::reduce`]: an [`Action`] comes in,
//! the state changes, and any network work is returned as an [`Effect`] for
//! the runtime to perform. The reducer itself never awaits.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::input::{InputController, SubmitTrigger};
use super::transcript::{ChatEntry, Transcript};

/// Identifier of one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(u64);

impl RequestId {
    #[cfg(test)]
    pub(crate) const fn first() -> Self {
        Self(0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// When the shared loading flag goes back to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    /// The first request to settle clears the flag, even if others are
    /// still outstanding.
    #[default]
    #[serde(alias = "first")]
    FirstSettlement,
    /// The flag clears once no request is outstanding.
    #[serde(alias = "all")]
    AllSettled,
}

impl LoadingPolicy {
    /// Canonical configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstSettlement => "first_settlement",
            Self::AllSettled => "all_settled",
        }
    }
}

impl std::str::FromStr for LoadingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_settlement" | "first" => Ok(Self::FirstSettlement),
            "all_settled" | "all" => Ok(Self::AllSettled),
            other => Err(format!("unknown loading policy: {other}")),
        }
    }
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The assistant answered with this text.
    Reply(String),
    /// Anything else. The detail has already been logged.
    Failed,
}

/// Something that happened to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The input text changed.
    EditDraft(String),
    /// The user asked to send.
    ///
    /// `draft`, when present, replaces the draft first; it is ignored along
    /// with the whole submission if `revision` is stale.
    Submit {
        trigger: SubmitTrigger,
        revision: Option<u64>,
        draft: Option<String>,
    },
    /// A dispatched request reached its final outcome.
    Settled { request: RequestId, outcome: Outcome },
}

/// Work the runtime must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send `text` to the remote assistant and report back as
    /// [`Action::Settled`] with the same `request`.
    Dispatch { request: RequestId, text: String },
}

/// Coarse widget status derived from the loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Awaiting,
}

/// The complete state of one widget.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    transcript: Transcript,
    input: InputController,
    loading: bool,
    outstanding: BTreeSet<RequestId>,
    next_request: u64,
    policy: LoadingPolicy,
}

impl WidgetState {
    #[must_use]
    pub fn new(policy: LoadingPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        self.input.draft()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.input.revision()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn status(&self) -> Status {
        if self.loading {
            Status::Awaiting
        } else {
            Status::Idle
        }
    }

    /// Requests dispatched but not yet settled.
    #[must_use]
    pub fn outstanding(&self) -> &BTreeSet<RequestId> {
        &self.outstanding
    }

    #[must_use]
    pub fn policy(&self) -> LoadingPolicy {
        self.policy
    }

    /// Apply one action and return the effects it produced.
    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::EditDraft(text) => {
                self.input.set_draft(text);
                Vec::new()
            }
            Action::Submit {
                trigger,
                revision,
                draft,
            } => self.submit(trigger, revision, draft).into_iter().collect(),
            Action::Settled { request, outcome } => {
                self.settle(request, outcome);
                Vec::new()
            }
        }
    }

    fn submit(
        &mut self,
        trigger: SubmitTrigger,
        revision: Option<u64>,
        draft: Option<String>,
    ) -> Option<Effect> {
        if !self.input.is_current(revision) {
            tracing::debug!(?trigger, ?revision, "Ignoring repeated submission");
            return None;
        }
        if let Some(text) = draft {
            self.input.set_draft(text);
        }

        let text = self.input.submit(revision)?;

        self.transcript.append(ChatEntry::user(text.clone()));
        self.loading = true;

        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.outstanding.insert(request);

        tracing::debug!(%request, ?trigger, outstanding = self.outstanding.len(), "Submitted");
        Some(Effect::Dispatch { request, text })
    }

    fn settle(&mut self, request: RequestId, outcome: Outcome) {
        // A request settles once; anything else is a stray report.
        if !self.outstanding.remove(&request) {
            tracing::warn!(%request, "Settlement for unknown request ignored");
            return;
        }

        let entry = match outcome {
            Outcome::Reply(text) => ChatEntry::bot(text),
            Outcome::Failed => ChatEntry::bot_error(),
        };
        self.transcript.append(entry);

        self.loading = match self.policy {
            LoadingPolicy::FirstSettlement => false,
            LoadingPolicy::AllSettled => !self.outstanding.is_empty(),
        };

        tracing::debug!(
            %request,
            outstanding = self.outstanding.len(),
            loading = self.loading,
            "Settled"
        );
    }
}
