//! Upload payloads, progress reporting and cancellation.

use crate::error::ClientResult;
use bytes::Bytes;
use futures::StreamExt;
use kliv_types::UploadedFile;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// A file to upload: name, bytes and optional MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    name: String,
    bytes: Bytes,
    mime: Option<String>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Reads a local file. The payload name is the file name component.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bytes handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.loaded as f64 / self.total as f64 * 100.0
    }
}

pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;
pub type FileProgressFn = Arc<dyn Fn(&FilePayload, UploadProgress) + Send + Sync>;
pub type FileCompleteFn = Arc<dyn Fn(&FilePayload, &UploadedFile) + Send + Sync>;

/// Cancellation signal shared between a caller and in-flight uploads.
///
/// Cloning yields a handle to the same signal. Once cancelled it stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`CancelSignal::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // sender outlives the borrow of self
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for a single upload.
#[derive(Clone, Default)]
pub struct UploadOptions {
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelSignal>,
}

impl UploadOptions {
    #[must_use]
    pub fn with_progress(mut self, f: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Options for [`ContentClient::upload_multiple`](super::ContentClient::upload_multiple).
#[derive(Clone, Default)]
pub struct BatchUploadOptions {
    pub on_file_progress: Option<FileProgressFn>,
    pub on_complete: Option<FileCompleteFn>,
    pub cancel: Option<CancelSignal>,
}

impl BatchUploadOptions {
    #[must_use]
    pub fn with_file_progress(
        mut self,
        f: impl Fn(&FilePayload, UploadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_file_progress = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_complete(mut self, f: impl Fn(&FilePayload, &UploadedFile) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Per-file options for `file`, binding the batch callbacks to it.
    pub(crate) fn for_file(&self, file: &FilePayload) -> UploadOptions {
        let on_progress = self.on_file_progress.clone().map(|callback| {
            let file = file.clone();
            Arc::new(move |progress: UploadProgress| callback(&file, progress)) as ProgressFn
        });
        UploadOptions {
            on_progress,
            cancel: self.cancel.clone(),
        }
    }
}

impl fmt::Debug for BatchUploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchUploadOptions")
            .field("on_file_progress", &self.on_file_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Streams `bytes` in `chunk_size` pieces, reporting progress as the
/// transport pulls each piece.
pub(crate) fn progress_body(
    bytes: Bytes,
    chunk_size: usize,
    on_progress: Option<ProgressFn>,
) -> reqwest::Body {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(chunk_size.max(1))
        .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
        .collect();

    let mut loaded = 0u64;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        if let Some(callback) = &on_progress {
            callback(UploadProgress { loaded, total });
        }
        Ok::<_, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}
