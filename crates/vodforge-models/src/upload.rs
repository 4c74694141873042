//! Uploaded file handle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An uploaded source file as handed over by the API layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadedFile {
    /// Filename as provided by the client
    pub filename: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Declared media type (e.g. "video/mp4")
    pub content_type: String,
    /// Local path of the staged upload
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        size_bytes: u64,
        content_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
            content_type: content_type.into(),
            path: path.into(),
        }
    }

    /// Filename extension, lowercased, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
