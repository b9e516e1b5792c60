//! Upload results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level keys probed for the file URL, in priority order.
const URL_KEYS: [&str; 4] = ["contentUrl", "url", "fileUrl", "path"];

/// Keys probed under a `data` wrapper, in priority order.
const NESTED_URL_KEYS: [&str; 3] = ["contentUrl", "url", "path"];

/// Metadata returned by the content service for an uploaded file.
///
/// The response shape differs between server versions, so the URL is
/// resolved by probing instead of through a fixed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadedFile(Value);

impl UploadedFile {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolves the retrievable URL of the file.
    ///
    /// Order: `contentUrl`, `url`, `fileUrl`, `path`, a bare string body,
    /// then `data.contentUrl`, `data.url`, `data.path`. Empty strings are
    /// skipped.
    #[must_use]
    pub fn content_url(&self) -> Option<&str> {
        if let Value::String(s) = &self.0 {
            return non_empty(s);
        }
        first_string(&self.0, &URL_KEYS)
            .or_else(|| self.0.get("data").and_then(|d| first_string(d, &NESTED_URL_KEYS)))
    }
}

fn first_string<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find_map(non_empty)
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

impl From<Value> for UploadedFile {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
