use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering local failures: configuration, files, and client setup.
///
/// Failures reported by the survey service itself travel as [`RemoteError`]
/// inside a [`RemoteResult`](crate::result::RemoteResult) and only become a
/// `ToolError` when a caller explicitly converts them.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the CSV writer.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when an XML document cannot be parsed or written.
    #[error("XML error: {0}")]
    Xml(String),

    /// Raised when the HTTP client cannot be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when required connection settings are missing or invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A remote failure the caller chose to treat as fatal.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Failure reported while talking to the survey service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service could not be reached or answered with a SOAP fault.
    #[error("remote fault: {0}")]
    Fault(String),

    /// A prerequisite call of a composite operation did not succeed.
    #[error("{operation} failed: {reason}")]
    Dependency { operation: String, reason: String },

    /// `SetPreloadData` answered with a body, which signals rejection.
    #[error("preload data rejected: {0}")]
    Rejected(String),

    /// A request could not be built, e.g. a parameter name that is not a
    /// valid XML element name. Nothing was sent.
    #[error("invalid parameter name '{0}'")]
    InvalidParameter(String),

    /// The payload did not have the shape the operation expects.
    #[error("malformed {operation} response: {reason}")]
    Malformed { operation: String, reason: String },
}
