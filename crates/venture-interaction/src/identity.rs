//! Identity backend contract.
//!
//! The identity service itself is an external collaborator; this module
//! pins down the surface the runtime consumes: a one-shot session fetch,
//! a change notification stream, and a fire-and-forget sign-out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// The signed-in identity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
}

/// Proof of an authenticated identity.
///
/// The token is opaque to the runtime; it is only ever forwarded as a
/// bearer credential. The user lives inside the session, so "session
/// present" and "user present" can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserIdentity,
}

impl Session {
    /// Whether the session has passed its reported expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// A session change reported by the identity backend.
#[derive(Debug, Clone)]
pub enum SessionChange {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

/// Errors reported by the identity backend.
#[derive(Error, Debug, Clone)]
pub enum IdentityError {
    /// The backend could not be reached.
    #[error("Identity backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with an error of its own.
    #[error("Identity backend error: {0}")]
    Backend(String),
}

/// The surface the runtime consumes from an identity service.
///
/// `on_session_change` hands out a broadcast receiver; dropping the
/// receiver detaches the subscription.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// One-shot fetch of the current session, if any.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Subscribes to sign-in/sign-out/refresh notifications.
    fn on_session_change(&self) -> broadcast::Receiver<SessionChange>;

    /// Ends the current session. Fire-and-forget from the runtime's
    /// perspective; the resulting `SignedOut` arrives as a change
    /// notification.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Placeholder backend for permissive deployments with no identity
/// configuration: no session, no errors, a change stream that never fires.
pub struct InertIdentityBackend {
    // Held so the change stream stays open instead of closing immediately.
    changes: broadcast::Sender<SessionChange>,
}

impl InertIdentityBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(8);
        Self { changes }
    }
}

impl Default for InertIdentityBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityBackend for InertIdentityBackend {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(None)
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}
