//! Upload validation.
//!
//! Pure checks against the format allow-list and operational limits;
//! no side effects. All violated rules are aggregated into a single
//! error so callers see the complete picture, not just the first
//! failure.

use std::fmt;

use thiserror::Error;

use vodforge_models::{Limits, UploadedFile};

/// Declared media types accepted for ingestion.
pub const SUPPORTED_FORMATS: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
    "video/x-matroska",
];

/// Recognized filename extensions (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mpeg", "mpg", "mov", "avi", "webm", "mkv"];

/// One violated validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    /// Declared media type is not in the allow-list.
    UnsupportedFormat(String),
    /// Filename has no extension at all.
    MissingExtension(String),
    /// Extension present but not recognized.
    UnrecognizedExtension(String),
    /// Upload exceeds the maximum file size.
    FileTooLarge { size: u64, max: u64 },
    /// Source runs longer than the maximum duration (checked after
    /// probing).
    DurationTooLong { duration: f64, max: f64 },
    /// A caller-supplied quality override was empty.
    EmptyQualityList,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnsupportedFormat(t) => {
                write!(f, "unsupported format '{}'", t)
            }
            ValidationIssue::MissingExtension(name) => {
                write!(f, "filename '{}' has no extension", name)
            }
            ValidationIssue::UnrecognizedExtension(ext) => {
                write!(f, "unrecognized extension '{}'", ext)
            }
            ValidationIssue::FileTooLarge { size, max } => {
                write!(f, "file size {} exceeds maximum {}", size, max)
            }
            ValidationIssue::DurationTooLong { duration, max } => {
                write!(f, "duration {:.1}s exceeds maximum {:.1}s", duration, max)
            }
            ValidationIssue::EmptyQualityList => {
                write!(f, "quality override must not be empty")
            }
        }
    }
}

/// Upload rejected; carries every violated rule.
#[derive(Debug, Clone, Error)]
pub struct ValidationError {
    pub violations: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(violations: Vec<ValidationIssue>) -> Self {
        Self { violations }
    }

    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            violations: vec![issue],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upload validation failed: ")?;
        for (i, issue) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

/// Validate an upload against the allow-list and size limit.
///
/// Checks run in order (media type, extension, size) and every failed
/// check is collected. Duration is not checked here: it is unknown
/// until the file has been probed.
pub fn validate_upload(file: &UploadedFile, limits: &Limits) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if !SUPPORTED_FORMATS.contains(&file.content_type.as_str()) {
        violations.push(ValidationIssue::UnsupportedFormat(
            file.content_type.clone(),
        ));
    }

    match file.extension() {
        None => violations.push(ValidationIssue::MissingExtension(file.filename.clone())),
        Some(ext) if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => {
            violations.push(ValidationIssue::UnrecognizedExtension(ext));
        }
        Some(_) => {}
    }

    if file.size_bytes > limits.max_file_size {
        violations.push(ValidationIssue::FileTooLarge {
            size: file.size_bytes,
            max: limits.max_file_size,
        });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}
