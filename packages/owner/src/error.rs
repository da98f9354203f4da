//! Error types for the plot owner service.
//!
//! Only whole-request failures are represented here. Problems with a single
//! record, right or collective member are logged and skipped by the
//! extractor and resolver instead of surfacing as an `OwnerError`.

use thiserror::Error;

/// Main error type for the plot owner library.
#[derive(Debug, Error)]
pub enum OwnerError {
    /// Invalid EGRID format.
    #[error("Invalid EGRID format: '{0}'. Expected CH followed by 12 digits (e.g., CH207506973252)")]
    InvalidEgrid(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed (connection, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream service answered with a non-success status.
    #[error("{service} error (status {status}):\n\n{body}")]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// Composite record number with an unexpected layout.
    #[error("Malformed record number '{0}': expected 5 colon-separated fields")]
    MalformedRecordNumber(String),

    /// Record referenced by id is not present in its lookup table.
    #[error("Could not find {kind} {id}")]
    ReferenceNotFound { kind: &'static str, id: String },

    /// Requested EGRID is not part of the registry response.
    #[error("EGRID {0} not found")]
    NotFound(String),

    /// Captcha token was rejected or could not be verified.
    #[error("Captcha verification failed")]
    CaptchaRejected,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OwnerError {
    /// Whether the error was caused by an unreachable or failing upstream service.
    #[must_use]
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::UpstreamStatus { .. })
    }
}

/// Result type alias for plot owner operations.
pub type Result<T> = std::result::Result<T, OwnerError>;
