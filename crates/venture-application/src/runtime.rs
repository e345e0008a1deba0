//! Composition root for the client runtime.
//!
//! Wires the session manager, HTTP client, UI state store, and route guard
//! together from a `RuntimeConfig` plus an identity backend.

use std::path::PathBuf;
use std::sync::Arc;

use venture_core::config::RuntimeConfig;
use venture_core::error::{CoreError, Result};
use venture_infrastructure::paths::VenturePaths;
use venture_infrastructure::UiStateService;
use venture_interaction::{
    IdentityBackend, InertIdentityBackend, ResilientClient, SessionManager,
};

use crate::route_guard::RouteGuard;

/// The assembled client runtime.
///
/// Bootstrap errors never prevent construction; at worst the user starts
/// signed out with an error recorded on the auth snapshot.
pub struct ClientRuntime {
    session: Arc<SessionManager>,
    api: ResilientClient,
    ui_state: UiStateService,
}

impl std::fmt::Debug for ClientRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRuntime").finish_non_exhaustive()
    }
}

impl ClientRuntime {
    /// Starts the runtime with a caller-supplied identity backend, storing
    /// UI state at the platform default path.
    pub async fn start(config: RuntimeConfig, backend: Arc<dyn IdentityBackend>) -> Result<Self> {
        let ui_state_path = VenturePaths::ui_state_path()
            .map_err(|err| CoreError::config(err.to_string()))?;
        Self::start_at(config, backend, ui_state_path).await
    }

    /// Starts the runtime without a real identity backend.
    ///
    /// Permissive deployments use this when identity settings are absent;
    /// everything behaves as signed out.
    pub async fn start_detached(config: RuntimeConfig) -> Result<Self> {
        Self::start(config, Arc::new(InertIdentityBackend::new())).await
    }

    /// Starts the runtime with an explicit UI state location. Used by
    /// tests and embedders with their own storage layout.
    pub async fn start_at(
        config: RuntimeConfig,
        backend: Arc<dyn IdentityBackend>,
        ui_state_path: PathBuf,
    ) -> Result<Self> {
        config.validate()?;

        let session = Arc::new(SessionManager::new(backend));
        session.bootstrap().await;
        session.spawn_change_listener();

        let api = ResilientClient::new(config.api_base_url.clone(), session.clone());
        let ui_state = UiStateService::open(ui_state_path);

        log::debug!("Client runtime started against {}", config.api_base_url);

        Ok(Self {
            session,
            api,
            ui_state,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn api(&self) -> &ResilientClient {
        &self.api
    }

    pub fn ui_state(&self) -> &UiStateService {
        &self.ui_state
    }

    /// A route guard bound to this runtime's auth state.
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.subscribe())
    }

    /// Detaches the session change listener.
    pub fn shutdown(&self) {
        self.session.teardown();
    }
}
