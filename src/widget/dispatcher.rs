//! Request dispatch to the remote assistant.
//!
//! The [`ChatBackend`] trait is the seam between the widget and the network.
//! [`HttpChatBackend`] is the production implementation: a JSON `POST` of
//! `{"message": ...}` expecting `{"reply": ...}` back.
//!
//! [`Dispatcher`] runs each request on its own task and always reports a
//! settlement to the widget, including when the backend panics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tracing::Instrument;
use url::Url;

use super::runtime::Command;
use super::state::{Action, Outcome, RequestId};
use crate::error::DispatchError;

/// Error bodies longer than this are cut before logging.
const MAX_ERROR_BODY: usize = 512;

/// Something that can answer a chat message.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    /// Send one message and wait for the reply text.
    async fn send(&self, message: &str) -> Result<String, DispatchError>;
}

/// Request body for the remote endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Success body from the remote endpoint. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: String,
}

/// [`ChatBackend`] that talks to a fixed HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpChatBackend {
    /// Create a backend for `endpoint`.
    ///
    /// Without a `timeout` the client's default applies.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, DispatchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    /// Create a backend with a caller-supplied client.
    #[must_use]
    pub fn with_client(endpoint: Url, http: reqwest::Client) -> Self {
        Self { http, endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: &str) -> Result<String, DispatchError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect(),
            });
        }

        let reply: ChatReply = serde_json::from_slice(&body)?;
        Ok(reply.reply)
    }
}

/// Reports a request's settlement exactly once.
///
/// If the guard is dropped without [`SettleGuard::settle`] having been
/// called (the backend panicked, or the task was torn down), it settles the
/// request as failed.
#[derive(Debug)]
struct SettleGuard {
    request: RequestId,
    commands: Option<UnboundedSender<Command>>,
}

impl SettleGuard {
    fn new(request: RequestId, commands: Option<UnboundedSender<Command>>) -> Self {
        Self { request, commands }
    }

    fn settle(mut self, outcome: Outcome) {
        self.report(outcome);
    }

    fn report(&mut self, outcome: Outcome) {
        if let Some(commands) = self.commands.take() {
            let action = Action::Settled {
                request: self.request,
                outcome,
            };
            if commands.send(Command::notify(action)).is_err() {
                tracing::warn!(request = %self.request, "Widget closed before settlement");
            }
        }
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.commands.is_some() {
            tracing::error!(request = %self.request, "Request ended without an outcome");
            self.report(Outcome::Failed);
        }
    }
}

/// Spawns one task per request against a shared backend.
///
/// Holds only a weak reference to the widget's inbox; each in-flight request
/// holds a strong one until it settles.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    backend: Arc<dyn ChatBackend>,
    commands: WeakUnboundedSender<Command>,
}

impl Dispatcher {
    pub(crate) fn new(backend: Arc<dyn ChatBackend>, commands: &UnboundedSender<Command>) -> Self {
        Self {
            backend,
            commands: commands.downgrade(),
        }
    }

    /// Send `text` in the background.
    ///
    /// The returned handle is only useful for tests; the widget learns the
    /// result through [`Action::Settled`].
    pub fn dispatch(&self, request: RequestId, text: String) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let commands = self.commands.upgrade();
        if commands.is_none() {
            tracing::warn!(%request, "Widget closed; reply will be discarded");
        }
        let guard = SettleGuard::new(request, commands);
        let span = tracing::info_span!("dispatch", %request);

        tokio::spawn(
            async move {
                let started = Instant::now();
                let outcome = match backend.send(&text).await {
                    Ok(reply) => {
                        tracing::info!(
                            elapsed_ms = started.elapsed().as_millis(),
                            reply_length = reply.len(),
                            "Reply received"
                        );
                        Outcome::Reply(reply)
                    }
                    Err(e) => {
                        tracing::error!(
                            elapsed_ms = started.elapsed().as_millis(),
                            error = %e,
                            "Error contacting assistant"
                        );
                        Outcome::Failed
                    }
                };
                guard.settle(outcome);
            }
            .instrument(span),
        )
    }
}
