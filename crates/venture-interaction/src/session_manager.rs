//! Session manager: the single source of truth for "who is signed in".
//!
//! Auth state is written only here; everyone else (route guard, HTTP
//! client, view layer) reads it through a watch channel or the
//! `TokenProvider` seam. Bootstrap failures are recorded, never fatal:
//! the runtime always reaches a non-loading state.

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;

use crate::identity::{IdentityBackend, Session, SessionChange, UserIdentity};

/// The published view of authentication state.
///
/// The session itself never leaves the manager; consumers get the derived
/// boolean, and the HTTP transport gets the raw token via `TokenProvider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<UserIdentity>,
    pub has_session: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AuthSnapshot {
    fn initial() -> Self {
        Self {
            user: None,
            has_session: false,
            is_loading: true,
            error: None,
        }
    }
}

/// Internal state, guarded by the manager's write discipline.
struct AuthState {
    session: Option<Session>,
    is_loading: bool,
    error: Option<String>,
}

impl AuthState {
    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            user: self.session.as_ref().map(|s| s.user.clone()),
            has_session: self.session.is_some(),
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

/// The seam the HTTP transport uses to resolve the current bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Owns authentication state for the process lifetime.
pub struct SessionManager {
    backend: Arc<dyn IdentityBackend>,
    state: RwLock<AuthState>,
    publisher: watch::Sender<AuthSnapshot>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        let (publisher, _) = watch::channel(AuthSnapshot::initial());
        Self {
            backend,
            state: RwLock::new(AuthState {
                session: None,
                is_loading: true,
                error: None,
            }),
            publisher,
            listener: Mutex::new(None),
        }
    }

    /// One-shot fetch of the current session from the identity backend.
    ///
    /// Success stores the session (or its absence); failure records the
    /// error for the UI to optionally display. Both paths clear
    /// `is_loading` — a failed bootstrap must never leave the application
    /// stuck in a loading state.
    pub async fn bootstrap(&self) {
        let result = self.backend.current_session().await;

        let mut state = self.state.write().await;
        match result {
            Ok(session) => {
                log::debug!(
                    "Session bootstrap resolved (signed {})",
                    if session.is_some() { "in" } else { "out" }
                );
                state.session = session;
            }
            Err(err) => {
                log::warn!("Session bootstrap failed: {}", err);
                state.error = Some(err.to_string());
            }
        }
        state.is_loading = false;
        self.publisher.send_replace(state.snapshot());
    }

    /// Spawns the task that applies backend change notifications.
    ///
    /// Every notification unconditionally overwrites the session and
    /// clears any recorded error; a later notification always wins over an
    /// earlier bootstrap result. There is deliberately no sequencing guard
    /// between the two — ordering is by write, not by timestamp.
    pub fn spawn_change_listener(self: &Arc<Self>) {
        let mut rx = self.backend.on_session_change();
        // The task holds a weak reference so dropping the manager still
        // tears the listener down.
        let manager = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let Some(manager) = Weak::upgrade(&manager) else {
                            break;
                        };
                        manager.apply_change(change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Session change listener lagged, skipped {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn apply_change(&self, change: SessionChange) {
        let mut state = self.state.write().await;
        state.session = match change {
            SessionChange::SignedIn(session) | SessionChange::TokenRefreshed(session) => {
                Some(session)
            }
            SessionChange::SignedOut => None,
        };
        // A live notification supersedes whatever bootstrap recorded.
        state.error = None;
        self.publisher.send_replace(state.snapshot());
    }

    /// Detaches the change listener. Also runs on drop.
    pub fn teardown(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            log::debug!("Session change listener detached");
        }
    }

    /// Subscribes to auth state updates.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.publisher.subscribe()
    }

    /// Returns the latest published auth state.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.publisher.borrow().clone()
    }

    /// Asks the backend to end the session.
    ///
    /// Fire-and-forget: the state change arrives through the notification
    /// stream, and a failed call is only logged.
    pub async fn sign_out(&self) {
        if let Err(err) = self.backend.sign_out().await {
            log::warn!("Sign-out request failed: {}", err);
        }
    }
}

#[async_trait]
impl TokenProvider for SessionManager {
    async fn bearer_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state.session.as_ref().map(|s| s.access_token.clone())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityError;
    use std::time::Duration;
    use tokio::sync::Notify;
    use uuid::Uuid;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            expires_at: None,
            user: UserIdentity {
                id: Uuid::new_v4(),
                email: format!("{}@example.com", token),
            },
        }
    }

    /// Scriptable identity backend for tests.
    struct MockBackend {
        response: Mutex<Result<Option<Session>, IdentityError>>,
        changes: broadcast::Sender<SessionChange>,
        /// When set, `current_session` waits for this before answering.
        gate: Option<Arc<Notify>>,
    }

    impl MockBackend {
        fn with_session(session: Option<Session>) -> Self {
            Self {
                response: Mutex::new(Ok(session)),
                changes: broadcast::channel(8).0,
                gate: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Mutex::new(Err(IdentityError::Unreachable(message.to_string()))),
                changes: broadcast::channel(8).0,
                gate: None,
            }
        }

        fn gated(session: Option<Session>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::with_session(session)
            }
        }

        fn notify(&self, change: SessionChange) {
            let _ = self.changes.send(change);
        }
    }

    #[async_trait]
    impl IdentityBackend for MockBackend {
        async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.response.lock().unwrap().clone()
        }

        fn on_session_change(&self) -> broadcast::Receiver<SessionChange> {
            self.changes.subscribe()
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            self.notify(SessionChange::SignedOut);
            Ok(())
        }
    }

    async fn settle() {
        // Lets spawned listener tasks run.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let backend = Arc::new(MockBackend::with_session(None));
        let manager = SessionManager::new(backend);

        let snapshot = manager.snapshot();
        assert!(snapshot.is_loading);
        assert!(!snapshot.has_session);
        assert!(snapshot.user.is_none());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_success_resolves_loading() {
        let backend = Arc::new(MockBackend::with_session(Some(session("alpha"))));
        let manager = SessionManager::new(backend);

        manager.bootstrap().await;

        let snapshot = manager.snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.has_session);
        assert_eq!(snapshot.user.unwrap().email, "alpha@example.com");
        assert_eq!(manager.bearer_token().await.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_still_resolves_loading() {
        let backend = Arc::new(MockBackend::failing("connection refused"));
        let manager = SessionManager::new(backend);

        manager.bootstrap().await;

        let snapshot = manager.snapshot();
        assert!(!snapshot.is_loading);
        assert!(!snapshot.has_session);
        assert!(snapshot.error.unwrap().contains("connection refused"));
        assert_eq!(manager.bearer_token().await, None);
    }

    #[tokio::test]
    async fn test_change_notification_overwrites_state_and_clears_error() {
        let backend = Arc::new(MockBackend::failing("boot failed"));
        let manager = Arc::new(SessionManager::new(backend.clone()));

        manager.bootstrap().await;
        manager.spawn_change_listener();
        assert!(manager.snapshot().error.is_some());

        backend.notify(SessionChange::SignedIn(session("beta")));
        settle().await;

        let snapshot = manager.snapshot();
        assert!(snapshot.has_session);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_loading);

        backend.notify(SessionChange::SignedOut);
        settle().await;
        assert!(!manager.snapshot().has_session);
    }

    #[tokio::test]
    async fn test_token_refresh_replaces_token() {
        let backend = Arc::new(MockBackend::with_session(Some(session("old"))));
        let manager = Arc::new(SessionManager::new(backend.clone()));

        manager.bootstrap().await;
        manager.spawn_change_listener();

        backend.notify(SessionChange::TokenRefreshed(session("fresh")));
        settle().await;

        assert_eq!(manager.bearer_token().await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_late_bootstrap_overwrites_earlier_notification() {
        // No sequencing guard: when the bootstrap response arrives after a
        // change notification, the bootstrap result wins purely because it
        // writes last.
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(MockBackend::gated(Some(session("stale")), gate.clone()));
        let manager = Arc::new(SessionManager::new(backend.clone()));
        manager.spawn_change_listener();

        let bootstrapping = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.bootstrap().await })
        };

        backend.notify(SessionChange::SignedIn(session("live")));
        settle().await;
        assert_eq!(manager.bearer_token().await.as_deref(), Some("live"));

        gate.notify_one();
        bootstrapping.await.unwrap();

        assert_eq!(manager.bearer_token().await.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_teardown_detaches_listener() {
        let backend = Arc::new(MockBackend::with_session(None));
        let manager = Arc::new(SessionManager::new(backend.clone()));

        manager.bootstrap().await;
        manager.spawn_change_listener();
        manager.teardown();
        settle().await;

        backend.notify(SessionChange::SignedIn(session("ghost")));
        settle().await;

        assert!(!manager.snapshot().has_session);
    }

    #[tokio::test]
    async fn test_watch_subscriber_sees_updates() {
        let backend = Arc::new(MockBackend::with_session(Some(session("gamma"))));
        let manager = SessionManager::new(backend);

        let mut rx = manager.subscribe();
        assert!(rx.borrow().is_loading);

        manager.bootstrap().await;
        rx.changed().await.unwrap();

        let snapshot = rx.borrow().clone();
        assert!(!snapshot.is_loading);
        assert!(snapshot.has_session);
    }
}
