//! Error types for the file server
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Serve Error Enum ==
/// Unified error type for the file server.
///
/// None of these reach the client as a payload: every failure ends the
/// connection early, so a client only ever observes a closed or truncated
/// stream.
#[derive(Error, Debug)]
pub enum ServeError {
    /// Requested file does not exist under the serve root
    #[error("File not found: {0}")]
    NotFound(String),

    /// Requested name resolves to a directory
    #[error("Is a directory: {0}")]
    IsDirectory(String),

    /// Requested name escapes the serve root or is empty
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    /// Request frame was shorter than the fixed name width
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Writing the response to the client failed part way
    #[error("Stream write failure: {0}")]
    StreamWriteFailure(String),

    /// Captured bytes could not be turned into a cache entry
    #[error("Cache drain failure: {0}")]
    CacheDrainFailure(String),

    /// The cache coordinator task is no longer running
    #[error("Cache coordinator unavailable")]
    CoordinatorUnavailable,

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the file server.
pub type Result<T> = std::result::Result<T, ServeError>;
