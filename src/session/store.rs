//! Session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::widget::{ChatBackend, LoadingPolicy, Widget};

/// A single browser session.
///
/// Cloning is cheap; clones share the same widget.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    /// The chat widget owned by this session.
    widget: Widget,
    /// Session creation time.
    created_at: DateTime<Utc>,
    /// Last activity time.
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(id: String, widget: Widget) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(SessionInner {
                id,
                widget,
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn widget(&self) -> &Widget {
        &self.inner.widget
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the last activity timestamp.
    pub fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    ///
    /// A session waiting on a reply, or with a page still subscribed to its
    /// events, is never idle.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let widget = self.widget();
        if widget.snapshot().outstanding > 0 || widget.subscriber_count() > 0 {
            return false;
        }
        // Negative duration means clock skew; treat as fresh.
        (Utc::now() - self.last_activity())
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// Get the session age.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.inner.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Thread-safe store for sessions.
///
/// New sessions get a widget wired to the store's backend.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    backend: Arc<dyn ChatBackend>,
    policy: LoadingPolicy,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, policy: LoadingPolicy) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                backend,
                policy,
            }),
        }
    }

    /// Start a new session with an empty transcript.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn create(&self) -> Session {
        let id = Uuid::new_v4().to_string();
        let widget = Widget::spawn(Arc::clone(&self.inner.backend), self.inner.policy);
        let session = Session::new(id.clone(), widget);

        self.write().insert(id, session.clone());
        tracing::debug!(session_id = %session.id(), "Session created");
        session
    }

    /// Get a session by ID and mark it active.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.read().get(id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Remove a session by ID.
    ///
    /// Requests still in flight finish in the background; their replies are
    /// discarded with the widget.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let removed = self.write().remove(id);
        if let Some(session) = &removed {
            tracing::debug!(
                session_id = %id,
                age_secs = session.age().as_secs(),
                "Session removed"
            );
        }
        removed
    }

    /// Get the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// Periodically drop idle sessions until the returned task is aborted.
    pub fn spawn_sweeper(&self, interval: Duration, timeout: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired_with_timeout(timeout);
                if removed > 0 {
                    tracing::info!(
                        name: "session.expired",
                        removed,
                        remaining = store.len(),
                        "Expired idle sessions"
                    );
                }
            }
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Session>> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
