//! Credential attachment in front of the transport.

use std::sync::Arc;

use tracing::trace;

use crate::auth::TokenStore;

use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;
use super::ApiError;

/// Builds outgoing requests and forwards them to the transport.
///
/// When the store holds a token pair the access token is attached as a
/// bearer credential; a request-level override (the renewal call) wins.
/// Status codes are returned uninterpreted - session renewal is layered
/// on top, not performed here.
#[derive(Clone)]
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    store: TokenStore,
}

impl RequestGateway {
    pub fn new(transport: Arc<dyn Transport>, store: TokenStore) -> Self {
        Self { transport, store }
    }

    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.bearer.is_none() {
            request.bearer = self.store.access_token().await;
            trace!(
                path = %request.path,
                authenticated = request.bearer.is_some(),
                "credential attached"
            );
        }
        self.transport.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;

    use crate::auth::{MemoryStorage, TokenPair, TokenStore};
    use crate::testing::FakeTransport;

    use super::*;

    async fn store_with(pair: Option<TokenPair>) -> TokenStore {
        let store = TokenStore::new(Arc::new(MemoryStorage::new()));
        if let Some(pair) = pair {
            store.set(&pair).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_attaches_stored_access_token() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond("GET", "/users/me", StatusCode::OK, "{}");
        let gateway = RequestGateway::new(
            transport.clone(),
            store_with(Some(TokenPair::new("A1", "R1"))).await,
        );

        gateway.send(ApiRequest::get("/users/me")).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer.as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_no_token_sends_unauthenticated() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond("GET", "/health", StatusCode::OK, "{}");
        let gateway = RequestGateway::new(transport.clone(), store_with(None).await);

        gateway.send(ApiRequest::get("/health")).await.unwrap();

        assert_eq!(transport.sent()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_explicit_bearer_wins_over_store() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond("POST", "/auth/refresh", StatusCode::OK, "{}");
        let gateway = RequestGateway::new(
            transport.clone(),
            store_with(Some(TokenPair::new("A1", "R1"))).await,
        );

        gateway
            .send(ApiRequest::post("/auth/refresh").bearer("R1"))
            .await
            .unwrap();

        assert_eq!(transport.sent()[0].bearer.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_401_is_returned_uninterpreted() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond("GET", "/users/me", StatusCode::UNAUTHORIZED, "{}");
        let gateway = RequestGateway::new(transport.clone(), store_with(None).await);

        let resp = gateway.send(ApiRequest::get("/users/me")).await.unwrap();
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }
}
