//! Client configuration.

use crate::error::{ClientError, ClientResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration shared by every resource client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the backend API (e.g. `https://app.example.com/api`).
    /// Resource paths such as `/v2/database` are appended to it.
    pub api_root: String,
    /// Request timeout in seconds. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Default headers for function invocations.
    pub function_headers: BTreeMap<String, String>,
    /// Chunk size for streamed uploads; one progress event per chunk.
    pub upload_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: "http://localhost:8080/api".to_string(),
            timeout_secs: None,
            user_agent: concat!("kliv-client/", env!("CARGO_PKG_VERSION")).to_string(),
            function_headers: BTreeMap::new(),
            upload_chunk_size: 64 * 1024, // 64 KiB
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given API root with defaults elsewhere.
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            ..Default::default()
        }
    }

    /// The API root without trailing slashes.
    pub fn normalized_root(&self) -> &str {
        self.api_root.trim().trim_end_matches('/')
    }

    /// Checks the configuration before any client is built.
    pub fn validate(&self) -> ClientResult<()> {
        let root = self.normalized_root();
        let url = Url::parse(root)
            .map_err(|e| ClientError::Config(format!("invalid api_root '{root}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api_root must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.upload_chunk_size == 0 {
            return Err(ClientError::Config(
                "upload_chunk_size must be greater than zero".to_string(),
            ));
        }
        self.function_header_map()?;
        Ok(())
    }

    /// Builds the default function headers.
    pub fn function_header_map(&self) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.function_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid value for header '{name}'")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}
