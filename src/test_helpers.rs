//! Test utilities for temporary log files and hand-driven line sources.

use crate::source::{ByteStream, LineSource};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncWriteExt, DuplexStream};

pub struct TempLogFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TempLogFile {
    /// Create a new, empty temporary log file
    pub fn new() -> io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("test.log");

        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary log file with one initial line
    pub fn with_content(content: &str) -> io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_content(content)?;
        Ok(temp_file)
    }

    /// Append a line (newline added)
    pub fn append_content(&self, content: &str) -> io::Result<()> {
        self.append_raw(&format!("{}\n", content))
    }

    /// Append bytes exactly as given
    pub fn append_raw(&self, content: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Counts how often the stop hooks of a [`ScriptedSource`] were called.
#[derive(Clone, Default)]
pub struct StopCalls {
    graceful: Arc<AtomicUsize>,
    forced: Arc<AtomicUsize>,
}

impl StopCalls {
    pub fn graceful(&self) -> usize {
        self.graceful.load(Ordering::SeqCst)
    }

    pub fn forced(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }
}

/// A line source fed from memory.
///
/// The stream stays open after the initial bytes until the source is
/// stopped. A source that ignores interrupts only ends on `force_stop`.
pub struct ScriptedSource {
    stream: Option<ByteStream>,
    writer: Option<DuplexStream>,
    honors_interrupt: bool,
    calls: StopCalls,
}

impl ScriptedSource {
    pub async fn new(initial: &[u8], honors_interrupt: bool) -> Self {
        let (mut writer, reader) = tokio::io::duplex(64 * 1024);
        writer
            .write_all(initial)
            .await
            .expect("initial bytes fit in the pipe");

        Self {
            stream: Some(Box::new(reader)),
            writer: Some(writer),
            honors_interrupt,
            calls: StopCalls::default(),
        }
    }

    /// A source whose stream has already ended after `initial`.
    pub async fn finished(initial: &[u8]) -> Self {
        let mut source = Self::new(initial, true).await;
        source.writer = None;
        source
    }

    pub fn calls(&self) -> StopCalls {
        self.calls.clone()
    }
}

impl LineSource for ScriptedSource {
    fn take_stream(&mut self) -> Option<ByteStream> {
        self.stream.take()
    }

    fn request_graceful_stop(&mut self) -> io::Result<()> {
        self.calls.graceful.fetch_add(1, Ordering::SeqCst);
        if self.honors_interrupt {
            self.writer = None;
        }
        Ok(())
    }

    fn force_stop(&mut self) -> io::Result<()> {
        self.calls.forced.fetch_add(1, Ordering::SeqCst);
        self.writer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_append_content_and_raw() {
        let temp_file = TempLogFile::with_content("line 1").unwrap();
        temp_file.append_raw("partial").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 1\npartial");
    }

    #[tokio::test]
    async fn test_finished_source_reaches_eof() {
        let mut source = ScriptedSource::finished(b"a\n").await;
        let mut stream = source.take_stream().unwrap();

        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "a\n");
    }

    #[tokio::test]
    async fn test_ignored_interrupt_keeps_stream_open() {
        let mut source = ScriptedSource::new(b"", false).await;
        let calls = source.calls();

        source.request_graceful_stop().unwrap();
        assert!(source.writer.is_some());
        source.force_stop().unwrap();
        assert!(source.writer.is_none());

        assert_eq!(calls.graceful(), 1);
        assert_eq!(calls.forced(), 1);
    }
}
