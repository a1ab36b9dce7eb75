//! The widget's UI task.
//!
//! One task owns the [`WidgetState`] and applies actions strictly one at a
//! time, so the state needs no lock. Everything else talks to it through a
//! cloneable [`Widget`] handle: actions go in over an mpsc channel and every
//! transition publishes a fresh [`Snapshot`] on a `watch` channel.
//!
//! The task keeps running while any handle or in-flight request exists, so
//! a request dispatched just before the session ended still settles.
//! Handles hold no snapshot receiver of their own, so
//! [`Widget::subscriber_count`] counts only live subscribers such as an open
//! event stream.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use super::dispatcher::{ChatBackend, Dispatcher};
use super::input::SubmitTrigger;
use super::state::{Action, Effect, LoadingPolicy, Status, WidgetState};
use super::transcript::Transcript;
use crate::error::WidgetClosed;

/// An action plus an optional reply slot for the resulting snapshot.
#[derive(Debug)]
pub struct Command {
    action: Action,
    ack: Option<oneshot::Sender<Snapshot>>,
}

impl Command {
    /// Fire-and-forget command.
    pub(crate) fn notify(action: Action) -> Self {
        Self { action, ack: None }
    }

    #[cfg(test)]
    pub(crate) fn into_action(self) -> Action {
        self.action
    }
}

/// What the view needs to re-render. Changes to anything else (the draft)
/// do not move the transcript pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewKey {
    entries: usize,
    loading: bool,
}

/// Read-only copy of the widget state after a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Increases by one per applied action.
    pub version: u64,
    pub transcript: Transcript,
    pub draft: String,
    pub revision: u64,
    pub loading: bool,
    pub status: Status,
    pub outstanding: usize,
}

impl Snapshot {
    fn capture(state: &WidgetState, version: u64) -> Self {
        Self {
            version,
            transcript: state.transcript().clone(),
            draft: state.draft().to_string(),
            revision: state.revision(),
            loading: state.is_loading(),
            status: state.status(),
            outstanding: state.outstanding().len(),
        }
    }

    #[must_use]
    pub fn view_key(&self) -> ViewKey {
        ViewKey {
            entries: self.transcript.len(),
            loading: self.loading,
        }
    }
}

/// Handle to a running widget.
#[derive(Debug, Clone)]
pub struct Widget {
    commands: mpsc::UnboundedSender<Command>,
    publisher: Arc<watch::Sender<Snapshot>>,
}

impl Widget {
    /// Start a widget with an empty transcript.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(backend: Arc<dyn ChatBackend>, policy: LoadingPolicy) -> Self {
        let state = WidgetState::new(policy);
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publisher, _) = watch::channel(Snapshot::capture(&state, 0));
        let publisher = Arc::new(publisher);
        let dispatcher = Dispatcher::new(backend, &commands);

        tokio::spawn(run(state, inbox, dispatcher, Arc::clone(&publisher)));

        Self {
            commands,
            publisher,
        }
    }

    /// Apply `action` and wait for the snapshot it produced.
    pub async fn apply(&self, action: Action) -> Result<Snapshot, WidgetClosed> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(Command {
                action,
                ack: Some(ack),
            })
            .map_err(|_closed| WidgetClosed)?;
        reply.await.map_err(|_dropped| WidgetClosed)
    }

    /// Replace the draft.
    pub async fn edit_draft(&self, text: impl Into<String>) -> Result<Snapshot, WidgetClosed> {
        self.apply(Action::EditDraft(text.into())).await
    }

    /// Submit whatever the draft currently holds.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<Snapshot, WidgetClosed> {
        self.apply(Action::Submit {
            trigger,
            revision: None,
            draft: None,
        })
        .await
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.publisher.borrow().clone()
    }

    /// A receiver that sees every future snapshot.
    ///
    /// The receiver ends once the widget's task has stopped and every
    /// handle is gone.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    /// Number of receivers currently obtained through [`Widget::subscribe`].
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.publisher.receiver_count()
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one
    /// first.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, WidgetClosed> {
        let mut snapshots = self.publisher.subscribe();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_closed| WidgetClosed)?;
        Ok(snapshot.clone())
    }
}

async fn run(
    mut state: WidgetState,
    mut inbox: mpsc::UnboundedReceiver<Command>,
    dispatcher: Dispatcher,
    publisher: Arc<watch::Sender<Snapshot>>,
) {
    let mut version = 0;

    while let Some(Command { action, ack }) = inbox.recv().await {
        for effect in state.reduce(action) {
            match effect {
                Effect::Dispatch { request, text } => {
                    dispatcher.dispatch(request, text);
                }
            }
        }

        version += 1;
        let snapshot = Snapshot::capture(&state, version);
        publisher.send_replace(snapshot.clone());
        if let Some(ack) = ack {
            // The caller may have given up waiting; the state is updated anyway.
            let _ = ack.send(snapshot);
        }
    }

    tracing::debug!(entries = state.transcript().len(), "Widget stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    #[derive(Debug)]
    struct Echo;

    #[async_trait::async_trait]
    impl ChatBackend for Echo {
        async fn send(&self, message: &str) -> Result<String, DispatchError> {
            Ok(message.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_snapshot_versions_increase() {
        let widget = Widget::spawn(Arc::new(Echo), LoadingPolicy::default());
        assert_eq!(widget.snapshot().version, 0);

        let first = widget.edit_draft("a").await.unwrap();
        let second = widget.edit_draft("ab").await.unwrap();
        assert!(second.version > first.version);
        assert_eq!(second.draft, "ab");
    }

    #[tokio::test]
    async fn test_view_key_ignores_draft() {
        let widget = Widget::spawn(Arc::new(Echo), LoadingPolicy::default());
        let before = widget.snapshot().view_key();
        let after = widget.edit_draft("typing").await.unwrap().view_key();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_subscriber_count_tracks_receivers() {
        let widget = Widget::spawn(Arc::new(Echo), LoadingPolicy::default());
        let other_handle = widget.clone();
        assert_eq!(widget.subscriber_count(), 0);

        let events = other_handle.subscribe();
        assert_eq!(widget.subscriber_count(), 1);

        drop(events);
        assert_eq!(widget.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_arrives() {
        let widget = Widget::spawn(Arc::new(Echo), LoadingPolicy::default());
        widget.edit_draft("hi").await.unwrap();
        widget.submit(SubmitTrigger::SendButton).await.unwrap();

        let done = widget.wait_until(|s| !s.loading).await.unwrap();
        let texts: Vec<&str> = done.transcript.iter().map(|e| e.text()).collect();
        assert_eq!(texts, ["hi", "HI"]);
        assert_eq!(done.status, Status::Idle);
    }
}
