//! Transport-level data model for the Kliv resource client.
//!
//! This crate defines the schema-agnostic types shared by every resource
//! client:
//! - Ordered query/filter parameters (`Params`)
//! - Opaque table rows with reserved system fields (`Record`)
//! - Upload results whose URL key varies by server version (`UploadedFile`)
//!
//! Domain tables (posts, profiles, categories, ...) are never modelled here.
//! The server owns their shape.

mod params;
mod record;
mod upload;

pub use params::{Params, SortDirection};
pub use record::{
    Record, CREATED_AT, CREATED_BY, DELETED, ROW_ID, SYSTEM_FIELDS, UPDATED_AT,
};
pub use upload::UploadedFile;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building transport values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter '{0}': expected key=value")]
    InvalidPair(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
