//! Gemini Chat Widget
//!
//! A single-conversation chat widget served as HTML over Axum + HTMX. The
//! user's messages are relayed to a remote AI endpoint and both sides of the
//! conversation are kept in an append-only transcript.
//!
//! # Architecture
//!
//! - **Widget**: transcript, draft and loading flag owned by one task per
//!   session and updated through a reducer
//! - **Dispatch**: one spawned request per submission against a
//!   [`ChatBackend`](widget::ChatBackend), always settled exactly once
//! - **Server**: Axum routes for the page, form posts and an SSE stream of
//!   re-rendered fragments
//!
//! # Modules
//!
//! - [`widget`]: widget state, reducer, dispatcher and runtime
//! - [`session`]: per-browser sessions and idle expiry
//! - [`view`]: HTML rendering
//! - [`server`]: router and handlers
//! - [`config`]: layered configuration
//! - [`telemetry`]: tracing subscriber setup
//! - [`error`]: error types

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod view;
pub mod widget;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Session store; one widget per session.
    pub sessions: SessionStore,
}
