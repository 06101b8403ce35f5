//! In-process follower: reads the file directly and waits on change events.

use super::{ByteStream, LineSource};
use crate::error::{Error, Result};
use crate::watcher::{FileChange, FileWatcher};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// In-memory pipe between the pump task and the decode loop.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Bytes read from the file per syscall.
const READ_CHUNK: usize = 8 * 1024;

/// Re-check for growth even when no change event arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Failure recorded by the pump, surfaced by the reader at end of stream.
type FailureSlot = Arc<Mutex<Option<io::Error>>>;

/// Follows a file without spawning a process.
///
/// A background task copies bytes from `start_offset` onward into a pipe. With
/// `follow` set it keeps waiting for appends until stopped or until the file
/// is removed; otherwise it ends at the current end of file. Truncation and
/// rotation are not detected.
pub struct NativeSource {
    path: PathBuf,
    stream: Option<ByteStream>,
    shutdown: Option<oneshot::Sender<()>>,
    pump: JoinHandle<()>,
}

impl NativeSource {
    pub fn spawn(path: &Path, start_offset: u64, follow: bool) -> Result<Self> {
        let spawn_error = |source: io::Error| Error::Spawn {
            program: "native follower".to_string(),
            source,
        };

        let file = std::fs::File::open(path).map_err(spawn_error)?;
        let watcher = if follow {
            Some(FileWatcher::watch(path)?)
        } else {
            None
        };

        let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let failure = FailureSlot::default();

        let pump_failure = failure.clone();
        let pump_path = path.to_path_buf();
        let pump = tokio::spawn(async move {
            let file = File::from_std(file);
            if let Err(e) = pump_file(file, start_offset, writer, watcher, shutdown_rx).await {
                debug!(path = %pump_path.display(), error = %e, "native follower failed");
                if let Ok(mut slot) = pump_failure.lock() {
                    *slot = Some(e);
                }
            }
        });

        debug!(path = %path.display(), start_offset, follow, "started native follower");

        Ok(Self {
            path: path.to_path_buf(),
            stream: Some(Box::new(PumpReader { inner: reader, failure })),
            shutdown: Some(shutdown_tx),
            pump,
        })
    }
}

impl LineSource for NativeSource {
    fn take_stream(&mut self) -> Option<ByteStream> {
        self.stream.take()
    }

    fn request_graceful_stop(&mut self) -> io::Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            // The pump may already be gone; nothing left to stop then.
            let _ = shutdown.send(());
        }
        Ok(())
    }

    fn force_stop(&mut self) -> io::Result<()> {
        debug!(path = %self.path.display(), "aborting native follower");
        self.pump.abort();
        Ok(())
    }
}

/// Copies file content into `writer` until stopped, removed, or caught up
/// when not following. Dropping `writer` on return ends the byte stream.
async fn pump_file(
    mut file: File,
    start_offset: u64,
    mut writer: DuplexStream,
    mut watcher: Option<FileWatcher>,
    mut shutdown: oneshot::Receiver<()>,
) -> io::Result<()> {
    file.seek(io::SeekFrom::Start(start_offset)).await?;
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        // Drain everything appended so far.
        loop {
            let read = tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(()),
                read = file.read(&mut chunk) => read?,
            };
            if read == 0 {
                break;
            }
            trace!(bytes = read, "read from followed file");

            let written = tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(()),
                written = writer.write_all(&chunk[..read]) => written,
            };
            if let Err(e) = written {
                // Reader side dropped: nobody is listening anymore.
                if e.kind() == io::ErrorKind::BrokenPipe {
                    return Ok(());
                }
                return Err(e);
            }
        }

        let Some(watcher) = watcher.as_mut() else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(()),
            event = watcher.next_event() => match event {
                Some(Ok(event)) => {
                    if watcher.classify(&event) == FileChange::Removed {
                        debug!("followed file removed");
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(io::Error::other(e)),
                None => return Ok(()),
            },
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
    }
}

/// Read half of the pipe that reports a pump failure instead of a clean EOF.
struct PumpReader {
    inner: DuplexStream,
    failure: FailureSlot,
}

impl AsyncRead for PumpReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;

        let at_eof = buf.filled().len() == before && buf.remaining() > 0;
        if at_eof {
            let failure = self.failure.lock().ok().and_then(|mut slot| slot.take());
            if let Some(e) = failure {
                return Poll::Ready(Err(e));
            }
        }
        Poll::Ready(Ok(()))
    }
}
