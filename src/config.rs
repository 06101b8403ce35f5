//! Configuration for a tail stream and the line source behind it.

use crate::error::{Error, Result};
use std::time::Duration;

/// Maximum number of decoded lines waiting for the consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Grace period between the interrupt request and the forced kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// External follower used by [`SourceConfig::Process`].
pub const DEFAULT_TAIL_PROGRAM: &str = "tail";

/// Arguments handed to the external follower: start at byte 1, follow forever.
pub fn default_start_options() -> Vec<String> {
    vec!["-c".to_string(), "+1".to_string(), "-f".to_string()]
}

/// Which line source produces the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// Spawn `program` with `args` followed by the file path.
    Process { program: String, args: Vec<String> },
    /// Follow the file in-process.
    Native { start_offset: u64, follow: bool },
}

impl SourceConfig {
    /// External `tail` with the given start options.
    pub fn process(args: Vec<String>) -> Self {
        SourceConfig::Process {
            program: DEFAULT_TAIL_PROGRAM.to_string(),
            args,
        }
    }

    /// In-process follower reading from the start of the file.
    pub fn native() -> Self {
        SourceConfig::Native {
            start_offset: 0,
            follow: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::process(default_start_options())
    }
}

/// Settings for a [`TailStream`](crate::TailStream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// Decoder buffer size; bounds the longest line that can be read.
    pub buffer_capacity: usize,
    /// Lines buffered ahead of the consumer before the decoder blocks.
    pub queue_capacity: usize,
    /// How long `stop` waits after the interrupt before killing the source.
    pub stop_timeout: Duration,
    pub source: SourceConfig,
}

impl TailConfig {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer_capacity,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            source: SourceConfig::default(),
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Use the external follower with custom start options.
    pub fn with_start_options(self, args: Vec<String>) -> Self {
        self.with_source(SourceConfig::process(args))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(invalid("buffer capacity must be greater than zero"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue capacity must be greater than zero"));
        }
        if let SourceConfig::Process { program, .. } = &self.source {
            if program.trim().is_empty() {
                return Err(invalid("line source program must not be empty"));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig {
        message: message.to_string(),
    }
}
