//! Virtual path normalization for the content filesystem.

/// Root of the content filesystem.
pub const CONTENT_ROOT: &str = "/content/";

/// Default directory for uploads.
pub const DEFAULT_UPLOAD_DIR: &str = "/content/uploads/";

/// Normalizes a user-supplied path so it is rooted at `/content/`.
///
/// ```
/// use kliv_client::content::normalize_path;
///
/// assert_eq!(normalize_path(""), "/content/");
/// assert_eq!(normalize_path("/content/a.png"), "/content/a.png");
/// assert_eq!(normalize_path("content/a.png"), "/content/a.png");
/// assert_eq!(normalize_path("/uploads/a.png"), "/content/uploads/a.png");
/// assert_eq!(normalize_path("uploads/a.png"), "/content/uploads/a.png");
/// ```
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return CONTENT_ROOT.to_string();
    }
    if path.starts_with(CONTENT_ROOT) {
        return path.to_string();
    }
    if path.starts_with(&CONTENT_ROOT[1..]) {
        return format!("/{path}");
    }
    if path.starts_with('/') {
        return format!("{}{path}", CONTENT_ROOT.trim_end_matches('/'));
    }
    format!("{CONTENT_ROOT}{path}")
}
