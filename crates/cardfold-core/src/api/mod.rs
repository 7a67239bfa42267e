//! REST API client module for the gift-card wallet service.
//!
//! This module provides the request pipeline and the typed `ApiClient`
//! facades built on it:
//!
//! - `Transport` / `HttpTransport`: one request on the wire
//! - `RequestGateway`: bearer credential attachment
//! - `RefreshCoordinator`: 401 interception and session renewal
//! - `ApiClient`: typed endpoint facades
//!
//! The service uses JWT bearer authentication; the access token is
//! minted by the login endpoint and renewed with the refresh token.

pub mod client;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::RequestGateway;
pub use refresh::RefreshCoordinator;
pub use request::{ApiRequest, ApiResponse, FormField, RequestBody};
pub use transport::{HttpTransport, Transport};
