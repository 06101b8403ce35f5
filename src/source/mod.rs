//! Producers of the raw byte stream that a tail stream decodes.
//!
//! A [`LineSource`] hands its byte stream to the decode loop once, and keeps
//! the control half so `TailStream::stop` can ask it to finish.

mod native;
mod process;

pub use native::NativeSource;
pub use process::ProcessSource;

use crate::config::SourceConfig;
use crate::error::Result;
use std::io;
use std::path::Path;
use tokio::io::AsyncRead;

/// Raw bytes of the followed file, in append order.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Capability interface for whatever follows the file.
pub trait LineSource: Send {
    /// Takes the byte stream; `None` once it has been taken.
    fn take_stream(&mut self) -> Option<ByteStream>;

    /// Asks the source to finish and close its byte stream.
    fn request_graceful_stop(&mut self) -> io::Result<()>;

    /// Terminates the source unconditionally.
    fn force_stop(&mut self) -> io::Result<()>;
}

impl LineSource for Box<dyn LineSource> {
    fn take_stream(&mut self) -> Option<ByteStream> {
        (**self).take_stream()
    }

    fn request_graceful_stop(&mut self) -> io::Result<()> {
        (**self).request_graceful_stop()
    }

    fn force_stop(&mut self) -> io::Result<()> {
        (**self).force_stop()
    }
}

/// Starts the source described by `config` for `path`.
pub(crate) fn spawn(path: &Path, config: &SourceConfig) -> Result<Box<dyn LineSource>> {
    match config {
        SourceConfig::Process { program, args } => {
            Ok(Box::new(ProcessSource::spawn(program, args, path)?))
        }
        SourceConfig::Native {
            start_offset,
            follow,
        } => Ok(Box::new(NativeSource::spawn(path, *start_offset, *follow)?)),
    }
}
