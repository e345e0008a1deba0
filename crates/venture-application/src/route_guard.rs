//! Route guard: gates access to protected views from auth state.
//!
//! A pure decision table over `{is_loading, has_session}`. While the
//! session bootstrap is pending no access decision is made; once resolved,
//! a missing session redirects to sign-in with the original target
//! captured so a later sign-in can return there.

use tokio::sync::watch;
use venture_interaction::AuthSnapshot;

/// What the view layer should render for a protected target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Auth state is still loading; render a placeholder, decide nothing.
    Placeholder,
    /// No session; go to sign-in, remembering where the user was headed.
    RedirectToSignIn { from: String },
    /// Signed in; the protected subtree may render.
    Allow,
}

/// The decision table itself. Stateless.
pub fn decide(auth: &AuthSnapshot, target: &str) -> RouteDecision {
    if auth.is_loading {
        return RouteDecision::Placeholder;
    }
    if !auth.has_session {
        return RouteDecision::RedirectToSignIn {
            from: target.to_string(),
        };
    }
    RouteDecision::Allow
}

/// Thin handle binding the decision table to live auth state.
#[derive(Clone)]
pub struct RouteGuard {
    auth: watch::Receiver<AuthSnapshot>,
}

impl RouteGuard {
    pub fn new(auth: watch::Receiver<AuthSnapshot>) -> Self {
        Self { auth }
    }

    /// Decides for `target` against the latest auth snapshot.
    pub fn decide(&self, target: &str) -> RouteDecision {
        decide(&self.auth.borrow(), target)
    }

    /// Waits until auth state changes, then returns the new decision.
    pub async fn next_decision(&mut self, target: &str) -> RouteDecision {
        if self.auth.changed().await.is_err() {
            // Publisher gone; fall back to the last seen snapshot.
            log::debug!("Auth publisher dropped; using last snapshot");
        }
        self.decide(target)
    }
}
