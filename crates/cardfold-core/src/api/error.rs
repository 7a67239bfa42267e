use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::StorageError;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors surfaced by the request pipeline and the facades built on it.
///
/// Every failure a caller can observe is one of these variants; raw
/// transport or parsing exceptions never escape the crate.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status other than an
    /// expired-session 401. The body is kept unmodified; `Display`
    /// truncates it.
    #[error("HTTP {status}: {}", ApiError::truncate_body(.body))]
    Http { status: StatusCode, body: String },

    /// The session could not be renewed - the refresh token is missing,
    /// was rejected, or a replayed request was rejected again.
    #[error("session expired - please sign in again")]
    AuthExpired,

    /// Token persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller supplied input that cannot form a valid request.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The service answered with a body that does not match the
    /// documented shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// True when the error means the user must authenticate again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}
