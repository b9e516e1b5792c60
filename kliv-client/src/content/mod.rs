//! Content filesystem: listing, uploading, moving and deleting files.
//!
//! Every path argument is normalized under `/content/` before use.

mod path;
mod upload;

pub use path::{normalize_path, CONTENT_ROOT, DEFAULT_UPLOAD_DIR};
pub use upload::{
    BatchUploadOptions, CancelSignal, FileCompleteFn, FilePayload, FileProgressFn, ProgressFn,
    UploadOptions, UploadProgress,
};

use crate::error::{first_message, ClientError, ClientResult, UploadError};
use crate::transport::{encode_body, Transport};
use kliv_types::{Params, UploadedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};
use upload::progress_body;

const CONTENT_PATH: &str = "/v2/content";

/// Client for the content service.
#[derive(Debug, Clone)]
pub struct ContentClient {
    transport: Transport,
}

impl ContentClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
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
            return Err(response.request_error(fallback));
        }
        response.json()
    }

    /// Lists files, optionally under `prefix`.
    pub async fn list_files(&self, prefix: Option<&str>) -> ClientResult<Value> {
        let params = Params::new().with_opt("prefix", prefix.map(normalize_path));
        let url = self.transport.endpoint(CONTENT_PATH, None);
        self.call(Method::GET, &url, Some(&params), None, "Failed to list files")
            .await
    }

    /// Deletes the file at `path`.
    pub async fn delete_file(&self, path: &str) -> ClientResult<Value> {
        let params = Params::new().with("path", normalize_path(path));
        let url = self.transport.endpoint(CONTENT_PATH, None);
        self.call(Method::DELETE, &url, Some(&params), None, "Delete failed")
            .await
    }

    /// Moves or renames a file.
    pub async fn move_file(&self, old_path: &str, new_path: &str) -> ClientResult<Value> {
        let body = encode_body(&json!({
            "oldPath": normalize_path(old_path),
            "newPath": normalize_path(new_path),
        }))?;
        let url = format!("{}/move", self.transport.endpoint(CONTENT_PATH, None));
        self.call(Method::POST, &url, None, Some(body), "Move failed")
            .await
    }

    /// Uploads one file into `directory` as multipart form data.
    ///
    /// Progress is reported per streamed chunk. Cancelling `options.cancel`
    /// drops the in-flight request and fails with `Upload cancelled`.
    pub async fn upload_file(
        &self,
        file: &FilePayload,
        directory: &str,
        options: UploadOptions,
    ) -> ClientResult<UploadedFile> {
        if options.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Err(UploadError::Cancelled.into());
        }

        let directory = normalize_path(directory);
        let chunk_size = self.transport.config().upload_chunk_size;
        let body = progress_body(file.bytes().clone(), chunk_size, options.on_progress.clone());

        let mut part = Part::stream_with_length(body, file.len() as u64).file_name(file.name().to_string());
        if let Some(mime) = file.mime() {
            part = part
                .mime_str(mime)
                .map_err(|_| ClientError::Argument(format!("invalid MIME type '{mime}'")))?;
        }
        let form = Form::new().part("file", part).text("directory", directory.clone());

        let url = self.transport.endpoint(CONTENT_PATH, None);
        debug!(file = file.name(), %directory, bytes = file.len(), "uploading file");

        let exchange = async {
            let response = self
                .transport
                .http()
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(UploadError::Network)?;
            let status = response.status();
            let body = response.text().await.map_err(UploadError::Network)?;
            Ok::<_, UploadError>((status, body))
        };

        let (status, body) = match &options.cancel {
            Some(signal) => tokio::select! {
                biased;
                () = signal.cancelled() => return Err(UploadError::Cancelled.into()),
                result = exchange => result?,
            },
            None => exchange.await?,
        };

        let uploaded = parse_upload_response(status, &body)?;
        info!(file = file.name(), %directory, "uploaded file");
        Ok(uploaded)
    }

    /// Reads a local file and uploads it into `directory`.
    pub async fn upload_from_path(
        &self,
        path: impl AsRef<Path>,
        directory: &str,
        options: UploadOptions,
    ) -> ClientResult<UploadedFile> {
        let file = FilePayload::from_path(path).await?;
        self.upload_file(&file, directory, options).await
    }

    /// Uploads `files` one at a time, in order.
    ///
    /// The completion callback fires after each success, before the next
    /// file starts. The first failure ends the batch: later files are never
    /// attempted. Cancellation stops the in-flight upload and the rest of
    /// the queue.
    pub async fn upload_multiple(
        &self,
        files: &[FilePayload],
        directory: &str,
        options: BatchUploadOptions,
    ) -> ClientResult<Vec<UploadedFile>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let uploaded = self
                .upload_file(file, directory, options.for_file(file))
                .await?;
            if let Some(on_complete) = &options.on_complete {
                on_complete(file, &uploaded);
            }
            results.push(uploaded);
        }
        Ok(results)
    }
}

/// Interprets an upload response. Only `200 OK` counts as success.
fn parse_upload_response(status: StatusCode, body: &str) -> Result<UploadedFile, UploadError> {
    if status != StatusCode::OK {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(error) => first_message(&error, &["message"])
                .unwrap_or("Upload failed")
                .to_string(),
            Err(_) => format!("Upload failed with status {}", status.as_u16()),
        };
        return Err(UploadError::Status {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str::<Value>(body)
        .map(UploadedFile::new)
        .map_err(|_| UploadError::InvalidResponse)
}
