//! Remote function invocation.

use crate::error::{first_message, ClientError, ClientResult};
use crate::transport::{encode_body, with_query, Transport};
use kliv_types::Params;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};

const FUNCTION_PATH: &str = "/v2/function";
const INVOCATION_FAILED: &str = "Function invocation failed";

/// Success body of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResponse {
    /// The function declared a JSON content type.
    Json(Value),
    /// Anything else, returned as raw text.
    Text(String),
}

impl FunctionResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FunctionResponse::Json(value) => Some(value),
            FunctionResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FunctionResponse::Text(text) => Some(text),
            FunctionResponse::Json(_) => None,
        }
    }

    /// Converts to a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            FunctionResponse::Json(value) => value,
            FunctionResponse::Text(text) => Value::String(text),
        }
    }
}

/// Per-call options for [`FunctionsClient::invoke`].
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Overrides the method inferred from the presence of data.
    pub method: Option<Method>,
    /// Merged over the configured default headers; these win.
    pub headers: HeaderMap,
    pub query: Params,
}

impl InvokeOptions {
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }
}

/// Client for remote functions.
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    transport: Transport,
    default_headers: HeaderMap,
}

impl FunctionsClient {
    pub fn new(transport: Transport) -> ClientResult<Self> {
        let default_headers = transport.config().function_header_map()?;
        Ok(Self {
            transport,
            default_headers,
        })
    }

    /// Invokes the function `name`.
    ///
    /// Without an explicit method, calls with `data` are POSTed and calls
    /// without are sent as GET. `data` is never attached to a GET.
    pub async fn invoke(
        &self,
        name: &str,
        data: Option<&Value>,
        options: InvokeOptions,
    ) -> ClientResult<FunctionResponse> {
        if name.trim().is_empty() {
            return Err(ClientError::Argument("function name is required".to_string()));
        }
        let method = options.method.unwrap_or(match data {
            Some(_) => Method::POST,
            None => Method::GET,
        });

        let url = with_query(
            &self.transport.endpoint(FUNCTION_PATH, Some(name)),
            Some(&options.query),
        );
        let mut headers = self.default_headers.clone();
        headers.extend(options.headers);
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }

        let mut request = self.transport.request(method.clone(), &url);
        if let Some(data) = data.filter(|_| method != Method::GET) {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            request = request.body(encode_body(data)?);
        }
        let response = self.transport.execute(request.headers(headers)).await?;

        if !response.is_success() {
            let status = response.status.as_u16();
            let details = serde_json::from_str::<Value>(&response.body)
                .unwrap_or_else(|_| json!({ "error": INVOCATION_FAILED, "status": status }));
            let message = first_message(&details, &["error", "message"])
                .unwrap_or(INVOCATION_FAILED)
                .to_string();
            return Err(ClientError::Function {
                status,
                message,
                details,
            });
        }

        if response.is_json() {
            Ok(FunctionResponse::Json(response.json()?))
        } else {
            Ok(FunctionResponse::Text(response.body))
        }
    }

    pub async fn get(&self, name: &str, query: Params) -> ClientResult<FunctionResponse> {
        let options = InvokeOptions::default()
            .with_method(Method::GET)
            .with_query(query);
        self.invoke(name, None, options).await
    }

    pub async fn post(&self, name: &str, data: &Value) -> ClientResult<FunctionResponse> {
        let options = InvokeOptions::default().with_method(Method::POST);
        self.invoke(name, Some(data), options).await
    }

    pub async fn put(&self, name: &str, data: &Value) -> ClientResult<FunctionResponse> {
        let options = InvokeOptions::default().with_method(Method::PUT);
        self.invoke(name, Some(data), options).await
    }

    pub async fn delete(&self, name: &str, data: Option<&Value>) -> ClientResult<FunctionResponse> {
        let options = InvokeOptions::default().with_method(Method::DELETE);
        self.invoke(name, data, options).await
    }
}
