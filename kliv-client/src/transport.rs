//! Shared request helper used by every resource client.
//!
//! One `reqwest::Client` (connection pool + cookie jar) is shared by all
//! clones, so a session cookie set by a sign-in is sent on every later
//! database, content and function call.

use crate::config::ClientConfig;
use crate::error::{error_message, ClientError, ClientResult};
use kliv_types::Params;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const JSON: &str = "application/json";

/// Handle to the HTTP transport. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ClientConfig,
    api_root: String,
    client: Client,
}

impl Transport {
    /// Validates `config` and builds the underlying HTTP client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        let api_root = config.normalized_root().to_string();

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                api_root,
                client,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.client
    }

    /// `<api-root><base>[/<resource>]`, with the resource percent-encoded.
    pub fn endpoint(&self, base: &str, resource: Option<&str>) -> String {
        match resource {
            Some(name) => format!(
                "{}{}/{}",
                self.inner.api_root,
                base,
                urlencoding::encode(name)
            ),
            None => format!("{}{}", self.inner.api_root, base),
        }
    }

    /// Starts a request with no default headers applied.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(method = method.as_str(), %url, "sending request");
        self.inner.client.request(method, url)
    }

    /// Sends a request and buffers the response.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> ClientResult<ApiResponse> {
        let response = request.send().await?;
        ApiResponse::read(response).await
    }

    /// Sends a JSON request: `Accept: application/json`, optional query
    /// parameters, and an optional pre-encoded JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        params: Option<&Params>,
        body: Option<Vec<u8>>,
    ) -> ClientResult<ApiResponse> {
        let url = with_query(url, params);
        let mut request = self.request(method, &url).header(ACCEPT, JSON);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, JSON).body(body);
        }
        self.execute(request).await
    }
}

/// Appends `?<query>` when `params` carries at least one present value.
pub fn with_query(url: &str, params: Option<&Params>) -> String {
    match params.filter(|p| p.has_values()) {
        Some(params) => format!("{url}?{}", params.to_query_string()),
        None => url.to_string(),
    }
}

/// Serializes a request body exactly as the caller's value encodes.
pub fn encode_body<T: Serialize + ?Sized>(data: &T) -> ClientResult<Vec<u8>> {
    Ok(serde_json::to_vec(data)?)
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    async fn read(response: Response) -> ClientResult<Self> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the declared content type is JSON.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(JSON))
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> ClientResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Parses the body as JSON, or `Null` when it is not JSON.
    pub fn json_lenient(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// Builds a `Request` error from this response.
    pub(crate) fn request_error(&self, fallback: &str) -> ClientError {
        ClientError::Request {
            status: self.status.as_u16(),
            message: error_message(&self.json_lenient(), fallback),
        }
    }

    /// Builds an `Auth` error from this response.
    pub(crate) fn auth_error(&self, fallback: &str) -> ClientError {
        ClientError::Auth {
            status: self.status.as_u16(),
            message: error_message(&self.json_lenient(), fallback),
        }
    }
}
