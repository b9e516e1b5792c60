//! Client for the Kliv backend API.
//!
//! Four resource clients share one HTTP transport:
//! - [`DatabaseClient`]: PostgREST-style table access under `/v2/database`
//! - [`AuthClient`]: sign-in, session cache and user administration
//! - [`ContentClient`]: file listing and multipart uploads with progress
//! - [`FunctionsClient`]: remote function invocation
//!
//! # Sessions
//!
//! The transport keeps a cookie jar, so the session cookie set by
//! [`AuthClient::sign_in`] authenticates every later call made through any
//! client built from the same [`KlivClient`].
//!
//! # Errors
//!
//! Server errors surface the server's own message: a `404` with body
//! `{"message":"Table not found"}` displays as `Table not found`.

mod auth;
mod config;
pub mod content;
mod database;
mod error;
mod functions;
mod transport;

pub use auth::{AuthClient, ListUsersOptions, SignUp};
pub use config::ClientConfig;
pub use content::{
    BatchUploadOptions, CancelSignal, ContentClient, FilePayload, UploadOptions, UploadProgress,
};
pub use database::DatabaseClient;
pub use error::{error_message, ClientError, ClientResult, UploadError};
pub use functions::{FunctionResponse, FunctionsClient, InvokeOptions};
pub use transport::{encode_body, with_query, ApiResponse, Transport};

pub use kliv_types::{Params, Record, SortDirection, UploadedFile};
pub use reqwest::Method;

/// Entry point bundling the four resource clients.
///
/// Construct once and pass around; clones share the transport and the
/// session cache.
#[derive(Debug, Clone)]
pub struct KlivClient {
    database: DatabaseClient,
    auth: AuthClient,
    content: ContentClient,
    functions: FunctionsClient,
}

impl KlivClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Transport::new(config)?;
        Ok(Self {
            database: DatabaseClient::new(transport.clone()),
            auth: AuthClient::new(transport.clone()),
            content: ContentClient::new(transport.clone()),
            functions: FunctionsClient::new(transport)?,
        })
    }

    pub fn database(&self) -> &DatabaseClient {
        &self.database
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn content(&self) -> &ContentClient {
        &self.content
    }

    pub fn functions(&self) -> &FunctionsClient {
        &self.functions
    }
}
