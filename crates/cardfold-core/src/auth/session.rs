//! Session lifecycle: sign-in, sign-up, sign-out, startup restore.
//!
//! `SessionController` is the single authority on "am I signed in".
//! It is constructed once at the application root and handed by
//! reference to every consumer; screens read (or subscribe to) its
//! state instead of keeping their own flags.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, RefreshCoordinator};
use crate::models::{NewUser, UserProfile};

use super::token_store::TokenStore;

/// The one authoritative session state. Exactly one value holds at any
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Bootstrapping,
    SigningIn,
    SigningUp,
    Authenticated,
    SigningOut,
}

impl SessionState {
    /// True while a sign-in, sign-up, sign-out or startup restore is in
    /// progress - the states a UI renders as a spinner.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SessionState::Bootstrapping
                | SessionState::SigningIn
                | SessionState::SigningUp
                | SessionState::SigningOut
        )
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

/// Shared session state: the published `SessionState` plus the profile
/// of the signed-in user. Held by the controller and by the renewal
/// stage, which drops the session when renewal fails.
pub(crate) struct AuthState {
    state: watch::Sender<SessionState>,
    profile: Mutex<Option<UserProfile>>,
}

impl AuthState {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            state,
            profile: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(?prev, ?next, "session state changed");
        }
    }

    /// Move from `from` to `to` only if `from` currently holds.
    /// The check and the write are a single step, so two concurrent
    /// operations cannot both claim the transition.
    pub(crate) fn try_transition(&self, from: SessionState, to: SessionState) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!(?from, ?to, "session state changed");
        }
        moved
    }

    pub(crate) fn profile(&self) -> Option<UserProfile> {
        self.profile.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn set_profile(&self, profile: Option<UserProfile>) {
        *self.profile.lock().unwrap_or_else(|e| e.into_inner()) = profile;
    }

    /// Drop straight to signed-out: no profile, no loading state.
    pub(crate) fn force_unauthenticated(&self) {
        self.set_profile(None);
        self.set_state(SessionState::Unauthenticated);
    }
}

/// Orchestrates the session lifecycle over the token store and the
/// authentication endpoints.
pub struct SessionController {
    api: ApiClient,
    store: TokenStore,
    refresh: RefreshCoordinator,
    auth: Arc<AuthState>,
}

impl SessionController {
    pub(crate) fn new(
        api: ApiClient,
        store: TokenStore,
        refresh: RefreshCoordinator,
        auth: Arc<AuthState>,
    ) -> Self {
        Self {
            api,
            store,
            refresh,
            auth,
        }
    }

    /// Restore a persisted session at startup.
    ///
    /// With no stored tokens (or unreadable storage) this is a no-op
    /// and the state remains signed-out - the app starts at the login
    /// screen rather than crashing. With tokens present, the profile
    /// fetch both validates the session and populates the user; a
    /// failure clears the stored pair.
    pub async fn bootstrap(&self) {
        if self.auth.state() != SessionState::Unauthenticated {
            debug!(state = ?self.auth.state(), "bootstrap skipped");
            return;
        }

        match self.store.get().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("no persisted session");
                return;
            }
            Err(e) => {
                warn!(error = %e, "token storage unreadable, starting signed out");
                return;
            }
        }

        if !self
            .auth
            .try_transition(SessionState::Unauthenticated, SessionState::Bootstrapping)
        {
            return;
        }

        info!("restoring persisted session");
        match self.api.get_profile().await {
            Ok(profile) => {
                info!(username = %profile.username, "session restored");
                self.auth.set_profile(Some(profile));
                self.auth.set_state(SessionState::Authenticated);
            }
            Err(e) => {
                warn!(error = %e, "session restore failed, signing out");
                self.drop_session().await;
            }
        }
    }

    /// Exchange credentials for a token pair, persist it, and load the
    /// user profile. On any failure the state returns to signed-out and
    /// the error is handed to the caller untouched.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), ApiError> {
        if !self
            .auth
            .try_transition(SessionState::Unauthenticated, SessionState::SigningIn)
        {
            return Err(ApiError::Validation(
                "sign-in is only available while signed out".to_string(),
            ));
        }

        info!(username, "signing in");
        match self.establish_session(username, password).await {
            Ok(profile) => {
                info!(username = %profile.username, "sign-in complete");
                self.auth.set_profile(Some(profile));
                self.auth.set_state(SessionState::Authenticated);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.drop_session().await;
                Err(e)
            }
        }
    }

    /// Register a new account, then run the sign-in pipeline with the
    /// same credentials. A registration failure never attempts sign-in.
    pub async fn sign_up(&self, new_user: &NewUser) -> Result<(), ApiError> {
        if !self
            .auth
            .try_transition(SessionState::Unauthenticated, SessionState::SigningUp)
        {
            return Err(ApiError::Validation(
                "sign-up is only available while signed out".to_string(),
            ));
        }

        info!(username = %new_user.username, "registering account");
        let registered = match self.api.register(new_user).await {
            Ok(registered) => registered,
            Err(e) => {
                warn!(error = %e, "registration failed");
                self.drop_session().await;
                return Err(e);
            }
        };
        debug!(user_id = %registered.user_id, "account registered");

        match self
            .establish_session(&new_user.username, &new_user.password)
            .await
        {
            Ok(profile) => {
                info!(username = %profile.username, "sign-up complete");
                self.auth.set_profile(Some(profile));
                self.auth.set_state(SessionState::Authenticated);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sign-in after registration failed");
                self.drop_session().await;
                Err(e)
            }
        }
    }

    /// End the session. The logout request is best-effort: its failure
    /// is ignored and the stored tokens are cleared unconditionally. A
    /// renewal in flight is abandoned, so tokens it produces afterwards
    /// cannot resurrect the session.
    pub async fn sign_out(&self) {
        self.auth.set_state(SessionState::SigningOut);
        if let Err(e) = self.api.logout().await {
            debug!(error = %e, "logout request failed, clearing session anyway");
        }
        self.drop_session().await;
        info!("signed out");
    }

    /// Re-fetch the profile of the signed-in user. Success updates the
    /// cached profile without a state change; failure ends the session
    /// the same way sign-out does.
    pub async fn load_profile(&self) -> Result<UserProfile, ApiError> {
        match self.api.get_profile().await {
            Ok(profile) => {
                self.auth.set_profile(Some(profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                warn!(error = %e, "profile refresh failed, signing out");
                self.drop_session().await;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.auth.state()
    }

    /// Watch channel carrying every state change; the UI drives its
    /// navigation from this.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.auth.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.state().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.auth.state().is_loading()
    }

    /// The signed-in user, present exactly while authenticated.
    pub fn profile(&self) -> Option<UserProfile> {
        self.auth.profile()
    }

    /// login + persist + profile fetch, shared by sign-in and sign-up.
    /// Does not transition state; callers settle the outcome.
    async fn establish_session(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, ApiError> {
        let pair = self.api.login(username, password).await?;
        self.store.set(&pair).await?;
        self.api.get_profile().await
    }

    async fn drop_session(&self) {
        self.refresh.invalidate();
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear stored tokens");
        }
        self.auth.force_unauthenticated();
    }
}
