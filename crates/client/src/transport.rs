//! HTTP transport seam.
//!
//! [`Transport`] sends one request and returns the raw status and body; it
//! only fails when no response was received. Status classification happens
//! in [`ResourceClient`](crate::client::ResourceClient). Tests substitute a
//! scripted in-memory implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Reads may be retried; writes may not.
    pub fn is_read(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without a leading slash, e.g. `"departments/d1/status"`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn with_query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body. `Value::Null` means no body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = (!body.is_null()).then_some(body);
        self
    }
}

/// A raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// [`Transport`] backed by [`reqwest`].
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport with the configured timeout and bearer token.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            config.api_token.clone(),
        ))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let request_id = Uuid::new_v4();

        let mut builder = self
            .client
            .request(method, self.url(&request.path))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            %request_id,
            "Sending request",
        );

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            %request_id,
            status,
            "Received response",
        );

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_body_is_omitted() {
        let req = ApiRequest::new(Method::Patch, "users/u1/verify").with_body(serde_json::Value::Null);
        assert_eq!(req.body, None);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let t = HttpTransport::with_client(
            reqwest::Client::new(),
            "http://localhost:5000/api/v1/".into(),
            None,
        );
        assert_eq!(t.url("/departments"), "http://localhost:5000/api/v1/departments");
        assert_eq!(t.url("courses/c1"), "http://localhost:5000/api/v1/courses/c1");
    }

    #[test]
    fn only_get_is_a_read() {
        assert!(Method::Get.is_read());
        for m in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            assert!(!m.is_read());
        }
    }
}
