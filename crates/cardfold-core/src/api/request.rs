//! Request and response shapes carried through the pipeline.
//!
//! Requests own all of their data (JSON values, form fields, in-memory
//! upload bytes) so the pipeline can rebuild and resend one after a
//! session renewal without touching the caller again.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use super::ApiError;

/// One field of a multipart form body.
#[derive(Debug, Clone)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// A request body the pipeline can materialize any number of times.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<FormField>),
}

/// An outgoing request, addressed by service-relative path.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Credential override; when set, the gateway sends this bearer
    /// instead of the stored access token. Used by the session renewal
    /// call, which authenticates with the refresh token.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// A response as seen by the pipeline: status plus the raw body bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Body decoded as UTF-8, lossily. Used for error reporting.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body into the expected response shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_query_pairs() {
        let req = ApiRequest::get("/vendors")
            .query("page", 2)
            .query("page_size", 20)
            .query("search", "coffee");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query.len(), 3);
        assert_eq!(req.query[0], ("page".to_string(), "2".to_string()));
        assert_eq!(req.query[2].1, "coffee");
    }

    #[test]
    fn test_bearer_override() {
        let req = ApiRequest::post("/auth/refresh").bearer("R1");
        assert_eq!(req.bearer.as_deref(), Some("R1"));
    }

    #[test]
    fn test_response_json_rejects_unexpected_shape() {
        let resp = ApiResponse::new(StatusCode::OK, b"not json".to_vec());
        let parsed: Result<serde_json::Value, _> = resp.json();
        assert!(matches!(parsed, Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_response_text_lossy() {
        let resp = ApiResponse::new(StatusCode::OK, vec![0xff, 0xfe]);
        assert!(!resp.text().is_empty());
    }
}
