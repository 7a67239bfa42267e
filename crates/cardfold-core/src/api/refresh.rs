//! Session renewal on top of the gateway.
//!
//! A 401 means the access token is no longer accepted. This stage
//! converts that into a single renewal call - no matter how many
//! requests fail at once - and replays each failed request exactly once
//! with the new access token. A renewal failure of any kind ends the
//! session: tokens are cleared, the session state drops to signed-out,
//! and every waiting request fails with `AuthExpired`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::auth::{AuthState, TokenPair, TokenStore};

use super::client::TokenResponse;
use super::gateway::RequestGateway;
use super::request::{ApiRequest, ApiResponse};
use super::ApiError;

/// Path of the session renewal endpoint
const REFRESH_PATH: &str = "/auth/refresh";

/// Outcome of a settled renewal. Failure carries no detail on purpose:
/// every waiter reports `AuthExpired` regardless of the cause, which is
/// logged where it happened.
#[derive(Debug, Clone, Copy)]
struct RefreshFailed;

type SharedRenewal = Shared<BoxFuture<'static, Result<(), RefreshFailed>>>;

/// Intercepts 401 responses, renews the session at most once at a time,
/// and replays the rejected request.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: RequestGateway,
    store: TokenStore,
    auth: Arc<AuthState>,
    /// The renewal currently in flight, if any. All requests observing
    /// a 401 while it exists await the same future. The id lets the
    /// settling caller clear only its own entry.
    pending: Mutex<Option<(u64, SharedRenewal)>>,
    next_id: AtomicU64,
    /// Bumped by `invalidate`; a renewal that settles under a stale
    /// epoch discards its tokens instead of persisting them.
    epoch: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(gateway: RequestGateway, store: TokenStore, auth: Arc<AuthState>) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                auth,
                pending: Mutex::new(None),
                next_id: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Send a request, renewing the session and replaying once if the
    /// service rejects the credential. A second rejection on the replay
    /// surfaces as `AuthExpired` rather than another renewal cycle.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.inner.gateway.send(request.clone()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %request.path, "request rejected with 401, renewing session");
        self.renew().await?;

        let replayed = self.inner.gateway.send(request).await?;
        if replayed.status == StatusCode::UNAUTHORIZED {
            warn!("replayed request rejected again, session expired");
            return Err(ApiError::AuthExpired);
        }
        Ok(replayed)
    }

    /// Abandon any renewal in flight. Tokens it produces afterwards are
    /// discarded, and its waiters fail with `AuthExpired`. Called on
    /// sign-out so a late renewal cannot resurrect the session.
    pub fn invalidate(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let dropped = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if dropped.is_some() {
            debug!("pending session renewal abandoned");
        }
    }

    /// Await the in-flight renewal, starting one if none exists.
    async fn renew(&self) -> Result<(), ApiError> {
        let (id, renewal) = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.as_ref() {
                Some((id, renewal)) => {
                    debug!("joining session renewal already in flight");
                    (*id, renewal.clone())
                }
                None => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let epoch = self.inner.epoch.load(Ordering::SeqCst);
                    let renewal = run_renewal(Arc::clone(&self.inner), epoch)
                        .boxed()
                        .shared();
                    *pending = Some((id, renewal.clone()));
                    (id, renewal)
                }
            }
        };

        let result = renewal.await;

        // Only the entry this caller awaited is cleared; invalidate (or
        // a newer renewal) may already have replaced it.
        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(pending.as_ref(), Some((settled, _)) if *settled == id) {
            *pending = None;
        }
        drop(pending);

        result.map_err(|_| ApiError::AuthExpired)
    }
}

impl Inner {
    /// Terminal failure path: no usable credentials remain.
    async fn expire_session(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear tokens for expired session");
        }
        self.auth.force_unauthenticated();
    }
}

/// The single renewal attempt shared by every waiter.
async fn run_renewal(inner: Arc<Inner>, epoch: u64) -> Result<(), RefreshFailed> {
    let refresh_token = match inner.store.get().await {
        Ok(Some(pair)) => pair.refresh_token,
        Ok(None) => {
            warn!("no refresh token available, session expired");
            inner.expire_session().await;
            return Err(RefreshFailed);
        }
        Err(e) => {
            warn!(error = %e, "token storage unreadable during renewal");
            inner.expire_session().await;
            return Err(RefreshFailed);
        }
    };

    let request = ApiRequest::post(REFRESH_PATH).bearer(refresh_token);
    let response = match inner.gateway.send(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "session renewal request failed");
            inner.expire_session().await;
            return Err(RefreshFailed);
        }
    };

    if !response.status.is_success() {
        warn!(status = %response.status, "session renewal rejected");
        inner.expire_session().await;
        return Err(RefreshFailed);
    }

    let tokens: TokenResponse = match response.json() {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "unreadable session renewal response");
            inner.expire_session().await;
            return Err(RefreshFailed);
        }
    };
    let pair = TokenPair::new(tokens.access_token, tokens.refresh_token);

    // A sign-out while the call was in flight wins over the renewal.
    // Sign-out already settled the store and the state, so the tokens
    // are simply discarded.
    if inner.epoch.load(Ordering::SeqCst) != epoch {
        debug!("session invalidated while renewing, discarding new tokens");
        return Err(RefreshFailed);
    }

    if let Err(e) = inner.store.set(&pair).await {
        warn!(error = %e, "failed to persist renewed tokens");
        inner.expire_session().await;
        return Err(RefreshFailed);
    }

    // Re-check after the write: a sign-out that interleaved with it has
    // already cleared the store, and this write must not survive it.
    if inner.epoch.load(Ordering::SeqCst) != epoch {
        debug!("session invalidated during persist, discarding new tokens");
        if let Err(e) = inner.store.clear().await {
            warn!(error = %e, "failed to discard renewed tokens");
        }
        return Err(RefreshFailed);
    }

    info!("session renewed");
    Ok(())
}
