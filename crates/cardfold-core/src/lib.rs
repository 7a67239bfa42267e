//! Core library for cardfold, a gift-card wallet client.
//!
//! The crate is the session and request layer a UI shell builds on:
//!
//! - `auth`: token persistence and the session lifecycle
//! - `api`: the request pipeline and typed endpoint facades
//! - `models`: data exchanged with the wallet service
//! - `config`: service URL and storage locations
//!
//! `Client` wires the pieces together. The application root constructs
//! exactly one and hands references to its consumers; there is no
//! global state.
//!
//! ```no_run
//! # async fn run() -> Result<(), cardfold_core::ApiError> {
//! use cardfold_core::{Client, Config};
//!
//! let client = Client::new(&Config::load().unwrap_or_default())?;
//! client.session().bootstrap().await;
//! if !client.session().is_authenticated() {
//!     client.session().sign_in("alice", "Secret123").await?;
//! }
//! let profile = client.session().profile();
//! # let _ = profile;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use api::{HttpTransport, RefreshCoordinator, RequestGateway, Transport};
use auth::{AuthState, FileStorage, Storage, TokenStore};

pub use api::{ApiClient, ApiError};
pub use auth::{
    MemoryStorage, SessionController, SessionState, StorageError, TokenPair,
};
pub use config::Config;

/// The wired client: one session controller and one API facade over a
/// shared token store and transport.
pub struct Client {
    session: SessionController,
    api: ApiClient,
}

impl Client {
    /// Client with the default collaborators: file-backed token storage
    /// under the platform data directory and a reqwest transport.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let data_dir = config.data_dir().map_err(|_| StorageError::NoDataDir)?;
        let storage = Arc::new(FileStorage::in_dir(data_dir));
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_parts(config, storage, transport))
    }

    /// Client over caller-supplied storage and transport. Used by
    /// embedders with their own persistence, and by tests.
    pub fn with_parts(
        config: &Config,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let store = TokenStore::new(storage);
        let auth = Arc::new(AuthState::new());
        let gateway = RequestGateway::new(transport, store.clone());
        let refresh = RefreshCoordinator::new(gateway.clone(), store.clone(), auth.clone());
        let api = ApiClient::new(gateway, refresh.clone(), config.base_url_trimmed());
        let session = SessionController::new(api.clone(), store, refresh, auth);
        Self { session, api }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
