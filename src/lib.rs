//! Follow a growing file and stream its newly appended lines.
//!
//! A [`TailStream`] owns a line source (the external `tail` by default, or an
//! in-process follower) and a background decode loop that splits its bytes
//! into lines and queues them for the caller. [`TailStream::stop`] interrupts
//! the source, and kills it if it has not finished within the stop timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use log_tail::tail_file;
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tail = tail_file("app.log", 4096).await?;
//!
//!     while let Some(line) = tail.next().await {
//!         println!("{}", line);
//!     }
//!
//!     if let Some(err) = tail.error() {
//!         eprintln!("tail ended: {}", err);
//!     }
//!     tail.stop().await;
//!
//!     Ok(())
//! }
//! ```

mod config;
mod decoder;
mod error;
mod source;
mod stream;
mod watcher;

#[cfg(test)]
mod test_helpers;

pub use config::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_STOP_TIMEOUT, DEFAULT_TAIL_PROGRAM, SourceConfig, TailConfig,
    default_start_options,
};
pub use error::{Error, Result};
pub use source::{ByteStream, LineSource, NativeSource, ProcessSource};
pub use stream::{StopOutcome, TailStream};

use std::path::Path;

/// Follows `path` from its first byte.
///
/// `buffer_capacity` bounds the longest line that can be decoded.
///
/// # Example
///
/// ```rust,no_run
/// use log_tail::tail_file;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut tail = tail_file("app.log", 4096).await?;
///
///     while let Some(line) = tail.next_line().await {
///         println!("{}", line);
///     }
///
///     Ok(())
/// }
/// ```
pub async fn tail_file<P: AsRef<Path>>(path: P, buffer_capacity: usize) -> Result<TailStream> {
    TailStream::start(path, buffer_capacity).await
}

/// Follows `path`, passing `start_options` to the external `tail` verbatim.
pub async fn tail_file_custom<P: AsRef<Path>>(
    start_options: Vec<String>,
    path: P,
    buffer_capacity: usize,
) -> Result<TailStream> {
    TailStream::start_custom(start_options, path, buffer_capacity).await
}
