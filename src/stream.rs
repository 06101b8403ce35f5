//! The tail stream: a decode loop publishing lines from a line source, plus
//! the interrupt-then-kill shutdown protocol.

use crate::config::TailConfig;
use crate::decoder::LineDecoder;
use crate::error::{Error, Result};
use crate::source::{self, ByteStream, LineSource};
use futures::Stream;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// How [`TailStream::stop`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The source closed its stream after the interrupt.
    Graceful,
    /// The source ignored the interrupt and was killed after the timeout.
    Forced,
    /// `stop` had already been called; nothing was done.
    AlreadyStopped,
}

/// Lines appended to a file, in order, as a [`Stream`].
///
/// The decode loop runs in a background task from construction on. The stream
/// ends once the line source's byte stream ends, a read fails, or a line does
/// not fit in the buffer; [`error`](Self::error) then tells which.
///
/// The line source is not terminated when this value is dropped. Call
/// [`stop`](Self::stop) to shut it down.
pub struct TailStream {
    path: PathBuf,
    receiver: mpsc::Receiver<String>,
    drained: VecDeque<String>,
    failure: Arc<OnceLock<Error>>,
    source: Box<dyn LineSource>,
    done: Option<oneshot::Receiver<()>>,
    stop_timeout: Duration,
    _task_handle: JoinHandle<()>,
}

impl TailStream {
    /// Follows `path` from its first byte with the external `tail`.
    pub async fn start<P: AsRef<Path>>(path: P, buffer_capacity: usize) -> Result<Self> {
        Self::with_config(path, TailConfig::new(buffer_capacity)).await
    }

    /// Like [`start`](Self::start), passing `start_options` to `tail`
    /// verbatim before the path.
    pub async fn start_custom<P: AsRef<Path>>(
        start_options: Vec<String>,
        path: P,
        buffer_capacity: usize,
    ) -> Result<Self> {
        let config = TailConfig::new(buffer_capacity).with_start_options(start_options);
        Self::with_config(path, config).await
    }

    /// Checks that `path` is an existing file, starts the configured line
    /// source and the decode loop.
    pub async fn with_config<P: AsRef<Path>>(path: P, config: TailConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        check_target(path).await?;

        let source = source::spawn(path, &config.source)?;
        Self::from_source(path, config, source)
    }

    /// Starts the decode loop over a caller-supplied line source.
    ///
    /// No existence check is made for `path`; it only names the stream.
    /// Must be called from within a Tokio runtime.
    pub fn from_source<P, S>(path: P, config: TailConfig, mut source: S) -> Result<Self>
    where
        P: AsRef<Path>,
        S: LineSource + 'static,
    {
        config.validate()?;
        let stream = source.take_stream().ok_or(Error::StreamClosed)?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let failure = Arc::new(OnceLock::new());

        let task_handle = tokio::spawn(decode_loop(
            stream,
            config.buffer_capacity,
            tx,
            failure.clone(),
            done_tx,
        ));

        let path = path.as_ref().to_path_buf();
        debug!(
            path = %path.display(),
            buffer_capacity = config.buffer_capacity,
            queue_capacity = config.queue_capacity,
            "tail stream started"
        );

        Ok(Self {
            path,
            receiver: rx,
            drained: VecDeque::new(),
            failure,
            source: Box::new(source),
            done: Some(done_rx),
            stop_timeout: config.stop_timeout,
            _task_handle: task_handle,
        })
    }

    /// The file being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Why the decode loop ended; `None` for a clean end of stream.
    ///
    /// Only meaningful once the stream has yielded `None`: before that the
    /// loop may still be running and this returns `None`.
    pub fn error(&self) -> Option<&Error> {
        self.failure.get()
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.done.is_none()
    }

    /// Next line, or `None` once the stream has ended and been drained.
    pub async fn next_line(&mut self) -> Option<String> {
        if let Some(line) = self.drained.pop_front() {
            return Some(line);
        }
        self.receiver.recv().await
    }

    /// Stops the line source and waits for the decode loop to exit.
    ///
    /// Sends an interrupt, waits up to the configured stop timeout, then kills
    /// the source and waits without limit. Lines decoded meanwhile are kept and
    /// still yielded by the stream. Kill failures are logged, not returned.
    /// Calling this again returns [`StopOutcome::AlreadyStopped`].
    pub async fn stop(&mut self) -> StopOutcome {
        let Some(mut done) = self.done.take() else {
            warn!(path = %self.path.display(), "stop called on an already stopped tail stream");
            return StopOutcome::AlreadyStopped;
        };

        if let Err(e) = self.source.request_graceful_stop() {
            debug!(path = %self.path.display(), error = %e, "interrupt failed");
        }

        let receiver = &mut self.receiver;
        let drained = &mut self.drained;
        let mut queue_open = true;

        let deadline = tokio::time::sleep(self.stop_timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut done => break StopOutcome::Graceful,
                _ = &mut deadline => break StopOutcome::Forced,
                line = receiver.recv(), if queue_open => match line {
                    Some(line) => drained.push_back(line),
                    None => queue_open = false,
                },
            }
        };

        if outcome == StopOutcome::Forced {
            warn!(
                path = %self.path.display(),
                timeout = ?self.stop_timeout,
                "line source ignored interrupt, killing it"
            );
            if let Err(e) = self.source.force_stop() {
                warn!(path = %self.path.display(), error = %e, "failed to kill line source");
            }

            loop {
                tokio::select! {
                    biased;
                    _ = &mut done => break,
                    line = receiver.recv(), if queue_open => match line {
                        Some(line) => drained.push_back(line),
                        None => queue_open = false,
                    },
                }
            }
        }

        debug!(path = %self.path.display(), ?outcome, "tail stream stopped");
        outcome
    }

    /// Check if the line queue has been closed by the decode loop
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl fmt::Debug for TailStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TailStream")
            .field("path", &self.path)
            .finish()
    }
}

impl Stream for TailStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(line) = self.drained.pop_front() {
            return Poll::Ready(Some(line));
        }
        self.receiver.poll_recv(cx)
    }
}

/// Rejects missing paths and directories before anything is spawned.
async fn check_target(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(Error::Io(e)),
    };

    if metadata.is_dir() {
        return Err(Error::InvalidPath {
            message: format!("{} is a directory", path.display()),
        });
    }
    Ok(())
}

/// Background task: decodes lines and publishes them until the byte stream
/// ends or fails. Records the failure, closes the queue, then signals done.
async fn decode_loop(
    stream: ByteStream,
    buffer_capacity: usize,
    tx: mpsc::Sender<String>,
    failure: Arc<OnceLock<Error>>,
    done: oneshot::Sender<()>,
) {
    let mut decoder = LineDecoder::new(stream, buffer_capacity);
    let mut published = 0u64;

    let outcome = loop {
        match decoder.next_line().await {
            Ok(Some(line)) => {
                trace!(len = line.len(), "publishing line");
                if tx.send(line).await.is_err() {
                    debug!("line consumer dropped, ending decode loop");
                    break Ok(());
                }
                published += 1;
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    match outcome {
        Ok(()) => debug!(published, "decode loop reached end of stream"),
        Err(e) => {
            debug!(published, error = %e, "decode loop failed");
            let _ = failure.set(e);
        }
    }

    drop(tx);
    let _ = done.send(());
}
