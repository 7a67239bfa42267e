//! HTTP transport for the request pipeline.
//!
//! The `Transport` trait is the seam between the pipeline and the
//! network. `HttpTransport` is the reqwest-backed implementation; tests
//! substitute a scripted double.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::config::Config;

use super::request::{ApiRequest, ApiResponse, FormField, RequestBody};
use super::ApiError;

/// Dispatches one request and reports either a response (any status
/// code) or a `Network` error. Never interprets status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url_trimmed().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_multipart(fields: &[FormField]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for field in fields {
            match field {
                FormField::Text { name, value } => {
                    form = form.text(name.clone(), value.clone());
                }
                FormField::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    let part = Part::bytes(bytes.clone())
                        .file_name(filename.clone())
                        .mime_str(content_type)
                        .map_err(|e| {
                            ApiError::Validation(format!(
                                "invalid content type {content_type:?}: {e}"
                            ))
                        })?;
                    form = form.part(name.clone(), part);
                }
            }
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "dispatching request");

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(ref value) => builder.json(value),
            RequestBody::Form(ref fields) => builder.form(fields),
            RequestBody::Multipart(ref fields) => {
                builder.multipart(Self::build_multipart(fields)?)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(status = %status, bytes = body.len(), "response received");

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let config = Config {
            base_url: "https://wallet.example.com/".to_string(),
            ..Config::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.url("/gift-cards/abc"),
            "https://wallet.example.com/gift-cards/abc"
        );
    }

    #[test]
    fn test_build_multipart_rejects_bad_content_type() {
        let fields = vec![FormField::File {
            name: "logo".to_string(),
            filename: "logo.png".to_string(),
            content_type: "not a mime".to_string(),
            bytes: vec![1, 2, 3],
        }];
        assert!(matches!(
            HttpTransport::build_multipart(&fields),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_build_multipart_accepts_text_and_file_fields() {
        let fields = vec![
            FormField::Text {
                name: "company_name".to_string(),
                value: "Beanhouse".to_string(),
            },
            FormField::File {
                name: "logo".to_string(),
                filename: "logo.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            },
        ];
        assert!(HttpTransport::build_multipart(&fields).is_ok());
    }
}
