//! Session management and user administration.
//!
//! The signed-in user is cached in a single slot shared by every clone of
//! the client. Mutating calls replace the slot wholesale; there is no
//! version check, so concurrent sign-in/sign-out race and the last write
//! wins.

use crate::error::ClientResult;
use crate::transport::{encode_body, ApiResponse, Transport};
use kliv_types::{Params, Record};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const AUTH_PATH: &str = "/v2/auth";

/// Registration request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl SignUp {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Paging and search options for [`AuthClient::list_users`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListUsersOptions {
    pub start_row: Option<u64>,
    pub end_row: Option<u64>,
    /// Sent as JSON text in the `search` parameter.
    pub search: Option<Value>,
}

impl ListUsersOptions {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with_opt("startRow", self.start_row)
            .with_opt("endRow", self.end_row)
            .with_opt("search", self.search.as_ref().map(Value::to_string))
    }
}

/// Client for the auth service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: Transport,
    session: Arc<RwLock<Option<Record>>>,
}

impl AuthClient {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            session: Arc::new(RwLock::new(None)),
        }
    }

    fn url(&self, action: &str) -> String {
        format!("{}/{action}", self.transport.endpoint(AUTH_PATH, None))
    }

    fn user_url(&self, user_uuid: &str) -> String {
        format!("{}/{}", self.url("users"), urlencoding::encode(user_uuid))
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        params: Option<&Params>,
        body: Option<Vec<u8>>,
        fallback: &str,
    ) -> ClientResult<Value> {
        let response = self.transport.send_json(method, url, params, body).await?;
        if !response.is_success() {
            return Err(response.auth_error(fallback));
        }
        response.json()
    }

    async fn replace_session(&self, user: Option<Record>) {
        *self.session.write().await = user;
    }

    /// Stores the `user` of a successful response and returns it.
    async fn adopt_user(&self, data: &Value) -> Option<Record> {
        let user = user_from(data);
        self.replace_session(user.clone()).await;
        user
    }

    /// Registers a new account and signs it in.
    pub async fn sign_up(&self, request: &SignUp) -> ClientResult<Option<Record>> {
        let body = encode_body(request)?;
        let data = self
            .call(Method::POST, &self.url("signup"), None, Some(body), "Signup failed")
            .await?;
        info!(email = %request.email, "signed up");
        Ok(self.adopt_user(&data).await)
    }

    /// Signs in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Option<Record>> {
        let body = encode_body(&json!({ "email": email, "password": password }))?;
        let data = self
            .call(Method::POST, &self.url("signin"), None, Some(body), "Sign in failed")
            .await?;
        info!(%email, "signed in");
        Ok(self.adopt_user(&data).await)
    }

    /// Signs out. Best effort: the response is not inspected, transport
    /// failures are logged, and the cached user is always cleared.
    pub async fn sign_out(&self) {
        let result = self
            .transport
            .send_json(Method::POST, &self.url("signout"), None, Some(b"{}".to_vec()))
            .await;
        match result {
            Ok(response) if !response.is_success() => {
                debug!(status = response.status.as_u16(), "sign-out returned non-success status");
            }
            Ok(_) => {}
            Err(e) => warn!("sign-out request failed: {e}"),
        }
        self.replace_session(None).await;
        info!("signed out");
    }

    /// Returns the current user.
    ///
    /// Without `force_refresh` a cached user is returned with no request.
    /// A failed lookup clears the cache and yields `Ok(None)`: being signed
    /// out is not an error. Transport failures still propagate.
    pub async fn get_user(&self, force_refresh: bool) -> ClientResult<Option<Record>> {
        if !force_refresh {
            if let Some(user) = self.session.read().await.as_ref() {
                return Ok(Some(user.clone()));
            }
        }

        let response: ApiResponse = self
            .transport
            .send_json(Method::GET, &self.url("user"), None, None)
            .await?;
        if !response.is_success() {
            warn!(status = response.status.as_u16(), "current user lookup failed");
            self.replace_session(None).await;
            return Ok(None);
        }
        Ok(self.adopt_user(&response.json()?).await)
    }

    /// Updates the current user's email, password, name or metadata.
    pub async fn update_user<T: Serialize + ?Sized>(&self, updates: &T) -> ClientResult<Option<Record>> {
        let body = encode_body(updates)?;
        let data = self
            .call(Method::PUT, &self.url("user"), None, Some(body), "Update failed")
            .await?;
        Ok(self.adopt_user(&data).await)
    }

    /// Starts a password reset. The session is not touched.
    pub async fn request_password_reset(&self, email: &str) -> ClientResult<Value> {
        let body = encode_body(&json!({ "email": email }))?;
        self.call(
            Method::POST,
            &self.url("password-reset"),
            None,
            Some(body),
            "Password reset request failed",
        )
        .await
    }

    /// Completes a password reset with the emailed token.
    pub async fn complete_password_reset(&self, token: &str, password: &str) -> ClientResult<Value> {
        let body = encode_body(&json!({ "token": token, "password": password }))?;
        self.call(
            Method::POST,
            &self.url("password-reset-complete"),
            None,
            Some(body),
            "Password reset failed",
        )
        .await
    }

    /// Whether a user is cached. Never makes a request.
    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// The cached user, if any. Never makes a request.
    pub async fn cached_user(&self) -> Option<Record> {
        self.session.read().await.clone()
    }

    // ── Administration ──────────────────────────────────────────
    //
    // Authorization is enforced by the server only.

    pub async fn list_users(&self, options: &ListUsersOptions) -> ClientResult<Value> {
        let params = options.to_params();
        self.call(
            Method::GET,
            &self.url("users"),
            Some(&params),
            None,
            "Failed to list users",
        )
        .await
    }

    pub async fn get_user_by_uuid(&self, user_uuid: &str) -> ClientResult<Value> {
        self.call(Method::GET, &self.user_url(user_uuid), None, None, "Failed to get user")
            .await
    }

    pub async fn update_user_by_uuid<T: Serialize + ?Sized>(
        &self,
        user_uuid: &str,
        updates: &T,
    ) -> ClientResult<Value> {
        let body = encode_body(updates)?;
        self.call(
            Method::PUT,
            &self.user_url(user_uuid),
            None,
            Some(body),
            "Failed to update user",
        )
        .await
    }

    pub async fn delete_user(&self, user_uuid: &str) -> ClientResult<Value> {
        self.call(
            Method::DELETE,
            &self.user_url(user_uuid),
            None,
            None,
            "Failed to delete user",
        )
        .await
    }

    pub async fn list_groups(&self) -> ClientResult<Value> {
        self.call(Method::GET, &self.url("groups"), None, None, "Failed to list groups")
            .await
    }
}

fn user_from(data: &Value) -> Option<Record> {
    match data.get("user") {
        Some(Value::Object(map)) => Some(Record::from_map(map.clone())),
        _ => None,
    }
}
