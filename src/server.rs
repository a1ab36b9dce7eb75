use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::session::{Session, SessionStore};
use crate::view;
use crate::widget::{Action, HttpChatBackend, Status, SubmitTrigger, Transcript};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let backend = HttpChatBackend::new(
        config.widget.endpoint.clone(),
        config.widget.request_timeout(),
    )?;

    info!(
        name: "widget.config.loaded",
        endpoint = %backend.endpoint(),
        loading_policy = ?config.widget.loading_policy,
        timeout_secs = ?config.widget.request_timeout_secs,
        "Widget configuration loaded"
    );

    let sessions = SessionStore::new(Arc::new(backend), config.widget.loading_policy);
    let sweeper = sessions.spawn_sweeper(
        config.session.sweep_interval(),
        config.session.idle_timeout(),
    );

    let state = AppState {
        config: Arc::clone(&config),
        sessions,
    };
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the router for the widget pages and API.
///
/// `/static` is served from `ui.static_dir` only when that directory exists.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.ui.static_dir.clone();

    let mut app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/widget/{id}", axum::routing::delete(end_session))
        .route("/widget/{id}/draft", post(edit_draft))
        .route("/widget/{id}/send", post(send_message))
        .route("/widget/{id}/transcript", get(transcript_fragment))
        .route("/widget/{id}/messages", get(list_messages))
        .route("/widget/{id}/events", get(widget_events))
        .with_state(state);

    if std::path::Path::new(&static_dir).is_dir() {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Start a session and render its page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let session = state.sessions.create();
    info!(
        session_id = %session.id(),
        live_sessions = state.sessions.len(),
        "Session started"
    );
    Html(view::page(
        &state.config.ui,
        session.id(),
        &session.widget().snapshot(),
    ))
}

/// Form body posted by the draft input.
#[derive(Debug, Deserialize)]
struct DraftForm {
    #[serde(default)]
    message: String,
}

/// POST /widget/{id}/draft - Mirror the input's value into the draft.
async fn edit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DraftForm>,
) -> StatusCode {
    let Some(session) = find_session(&state.sessions, &id) else {
        return StatusCode::NOT_FOUND;
    };

    match session.widget().edit_draft(form.message).await {
        Ok(_) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(session_id = %id, error = %e, "Draft edit rejected");
            StatusCode::GONE
        }
    }
}

/// Form body posted by Enter and by the send button.
#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    message: String,
    /// Revision of the composer that produced this submission.
    #[serde(default)]
    revision: Option<u64>,
    #[serde(default)]
    trigger: SubmitTrigger,
}

/// POST /widget/{id}/send - Submit the input's value and return the next
/// revision field.
///
/// The send button is left to the event stream so a reply that settles
/// before this response arrives cannot be overwritten by a stale button.
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SendForm>,
) -> Result<Html<String>, StatusCode> {
    let session = find_session(&state.sessions, &id).ok_or(StatusCode::NOT_FOUND)?;

    tracing::debug!(
        session_id = %id,
        trigger = ?form.trigger,
        revision = ?form.revision,
        message_length = form.message.len(),
        "Received submission"
    );

    let snapshot = session
        .widget()
        .apply(Action::Submit {
            trigger: form.trigger,
            revision: form.revision,
            draft: Some(form.message),
        })
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %id, error = %e, "Submission rejected");
            StatusCode::GONE
        })?;

    Ok(Html(view::revision_field(snapshot.revision)))
}

/// GET /widget/{id}/transcript - Transcript pane fragment.
async fn transcript_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let session = find_session(&state.sessions, &id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(view::transcript(&session.widget().snapshot())))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

/// GET /health - Liveness check.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
    })
}

/// Transcript DTO for API responses.
#[derive(Debug, Serialize)]
struct MessagesResponse {
    session_id: String,
    loading: bool,
    status: Status,
    messages: Transcript,
}

/// GET /widget/{id}/messages - Transcript as JSON.
async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessagesResponse>, StatusCode> {
    let session = find_session(&state.sessions, &id).ok_or(StatusCode::NOT_FOUND)?;
    let snapshot = session.widget().snapshot();

    Ok(Json(MessagesResponse {
        session_id: session.id().to_string(),
        loading: snapshot.loading,
        status: snapshot.status,
        messages: snapshot.transcript,
    }))
}

/// DELETE /widget/{id} - End a session.
async fn end_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// GET /widget/{id}/events - Re-rendered transcript pane and send button,
/// pushed whenever either would look different.
///
/// The first event carries the current state. The stream ends when the
/// session's widget stops.
async fn widget_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let session = find_session(&state.sessions, &id).ok_or(StatusCode::NOT_FOUND)?;
    let session_id = session.id().to_string();
    let mut snapshots = WatchStream::new(session.widget().subscribe());
    drop(session);

    tracing::debug!(session_id = %session_id, "Starting SSE stream");

    let stream = async_stream::stream! {
        let mut last_view = None;
        while let Some(snapshot) = snapshots.next().await {
            let view_key = snapshot.view_key();
            if last_view == Some(view_key) {
                continue;
            }
            last_view = Some(view_key);

            yield Ok::<Event, Infallible>(
                Event::default()
                    .event("transcript")
                    .data(view::transcript(&snapshot)),
            );
            yield Ok::<Event, Infallible>(
                Event::default()
                    .event("send-button")
                    .data(view::send_button(&session_id, snapshot.loading)),
            );
        }
        tracing::debug!(session_id = %session_id, "SSE stream finished");
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn find_session(sessions: &SessionStore, id: &str) -> Option<Session> {
    let session = sessions.get(id);
    if session.is_none() {
        tracing::debug!(session_id = %id, "Session not found");
    }
    session
}
