//! HTTP transport abstraction
//!
//! The resilient client talks to the network only through the `Transport`
//! trait, so retry and readiness behavior can be exercised with a scripted
//! transport. `ReqwestTransport` is the real implementation.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::data::ErrorBody;

/// Network-level failures; every variant is considered transient
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// No complete response arrived within the per-call timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Any other failure while sending or reading the response
    #[error("request failed: {0}")]
    Request(String),
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A GET request without a body
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }
}

/// A fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 4xx and 5xx statuses
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    /// Parses the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Extracts the `error` field of an error body, if there is one
    pub fn error_message(&self) -> Option<String> {
        self.json::<ErrorBody>().ok().map(|body| body.error)
    }
}

/// Sends a single HTTP request with a per-call timeout
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest, timeout: Duration) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn classify(error: reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(timeout)
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest, timeout: Duration) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;
        let status = response.status();
        // The body is read inside the same timeout; a dropped connection here is a network error too
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_error_message_reads_error_field() {
        let response = ApiResponse::new(StatusCode::NOT_FOUND, r#"{"error": "book not found"}"#);

        assert!(response.is_error());
        assert_eq!(response.error_message().as_deref(), Some("book not found"));
    }

    #[test]
    fn test_error_message_none_for_non_json_body() {
        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom");

        assert!(response.error_message().is_none());
    }

    #[tokio::test]
    async fn test_reqwest_transport_returns_error_status_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "book not found"})))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let response = transport
            .send(
                ApiRequest::get(format!("{}/api/books/999", server.uri())),
                Duration::from_secs(2),
            )
            .await
            .expect("A 404 is a response, not a transport error");

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error_message().as_deref(), Some("book not found"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/books"))
            .and(wiremock::matchers::body_json(serde_json::json!({"title": "T"})))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let response = transport
            .send(
                ApiRequest {
                    method: Method::POST,
                    url: format!("{}/api/books", server.uri()),
                    body: Some(serde_json::json!({"title": "T"})),
                },
                Duration::from_secs(2),
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_reqwest_transport_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let result = transport
            .send(ApiRequest::get(server.uri()), Duration::from_millis(50))
            .await;

        assert_eq!(result, Err(TransportError::Timeout(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_refused() {
        // Bind then drop a listener to get a port nobody is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new();
        let result = transport
            .send(ApiRequest::get(format!("http://{}/api", addr)), Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
