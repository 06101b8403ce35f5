//! Error types for the log tail library.

use thiserror::Error;

/// The main error type for log tail operations.
///
/// Construction failures are returned from the `TailStream` constructors.
/// Failures of the running decode loop are recorded once and read back
/// through `TailStream::error` after the line stream has ended.
#[derive(Error, Debug)]
pub enum Error {
    /// Read failures of the producer's byte stream, or file metadata failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// The target exists but cannot be followed.
    #[error("Invalid file path: {message}")]
    InvalidPath { message: String },

    /// The target file does not exist.
    #[error("File does not exist: {path}")]
    FileNotFound { path: String },

    /// Rejected configuration values.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The line source could not be started or its output not attached.
    #[error("Failed to start line source '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A single line did not fit in the decoder buffer.
    #[error("Buffer size is too small: line exceeds {capacity} bytes")]
    BufferTooSmall { capacity: usize },

    /// The byte stream of a line source was already handed out.
    #[error("Stream closed")]
    StreamClosed,
}

/// A convenient Result type for log tail operations.
pub type Result<T> = std::result::Result<T, Error>;
