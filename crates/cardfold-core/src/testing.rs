//! Scripted doubles for the pipeline seams, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::api::{ApiError, ApiRequest, ApiResponse, RequestBody, Transport};
use crate::auth::{Storage, StorageError};

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub(crate) struct SentRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

struct Reply {
    method: String,
    path: String,
    status: StatusCode,
    body: Vec<u8>,
    gate: Option<Arc<Notify>>,
}

/// Transport double that answers from a scripted queue and records
/// every request. Replies are matched by method and path, consumed in
/// the order they were scripted.
#[derive(Default)]
pub(crate) struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, path: &str, status: StatusCode, body: &str) {
        self.respond_bytes(method, path, status, body.as_bytes().to_vec());
    }

    pub fn respond_bytes(&self, method: &str, path: &str, status: StatusCode, body: Vec<u8>) {
        self.push(Reply {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body,
            gate: None,
        });
    }

    /// Script a reply that is held back until the returned gate is
    /// notified. Lets a test keep a call in flight while other
    /// operations interleave.
    pub fn respond_gated(
        &self,
        method: &str,
        path: &str,
        status: StatusCode,
        body: &str,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(Reply {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body: body.as_bytes().to_vec(),
            gate: Some(gate.clone()),
        });
        gate
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How many requests were sent to the given endpoint.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.sent()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentRequest {
                method: request.method.to_string(),
                path: request.path.clone(),
                query: request.query.clone(),
                bearer: request.bearer.clone(),
                body: request.body.clone(),
            });

        let reply = {
            let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
            let position = replies
                .iter()
                .position(|r| r.method == request.method.as_str() && r.path == request.path);
            match position {
                Some(position) => replies.remove(position),
                None => None,
            }
        };

        let reply = reply.unwrap_or_else(|| {
            panic!(
                "no scripted response for {} {}",
                request.method, request.path
            )
        });

        if let Some(ref gate) = reply.gate {
            gate.notified().await;
        }

        Ok(ApiResponse::new(reply.status, reply.body))
    }
}

/// Storage double whose reads and writes always fail.
pub(crate) struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk unavailable")))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk unavailable")))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk unavailable")))
    }
}
