//! Error types for the interview_report crate.
//!
//! Only [`RenderError`] ever reaches a caller of
//! [`ReportRenderer::render`](crate::builder::ReportRenderer::render). The other types describe
//! failures of optional page sections; the renderer logs them and carries on with the rest of
//! the page.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while producing a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF writer failed to serialize the finished document.
    #[error("failed to finalize PDF document: {0}")]
    Finalize(String),

    /// The serialized document could not be flushed into the output buffer.
    #[error("failed to flush PDF output: {0}")]
    Flush(#[from] std::io::Error),

    /// Not even the builtin fallback font could be added to the document.
    #[error("failed to register fallback font: {0}")]
    Font(#[from] FontError),
}

/// Failures while registering the custom report font.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("font file not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read font file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font file {} is not a usable TrueType font: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("failed to embed font '{name}' into the document: {reason}")]
    Embed { name: String, reason: String },
}

/// Failures of static page assets such as the background template.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to decode image {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Failures while fetching or placing the candidate photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("unsupported photo URL '{0}': only http and https are fetched")]
    UnsupportedScheme(String),

    #[error("photo download from '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("photo download from '{url}' failed: {reason}")]
    Download { url: String, reason: String },

    #[error("failed to decode photo: {0}")]
    Decode(String),
}
