//! Authentication module: session lifecycle and token persistence.
//!
//! This module provides:
//! - `SessionController`: the single authority on session state
//! - `TokenStore`: durable persistence of the access/refresh pair
//!
//! Tokens are persisted under the app data directory and survive
//! restarts; the session is restored at startup by `bootstrap`.

pub mod session;
pub mod token_store;

pub(crate) use session::AuthState;
pub use session::{SessionController, SessionState};
pub use token_store::{
    FileStorage, MemoryStorage, Storage, StorageError, TokenPair, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
