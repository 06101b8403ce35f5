//! Splitting a raw byte stream into newline-delimited lines.

use crate::error::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads lines from `reader` through a fixed-size buffer.
///
/// A line together with its `\n` terminator must fit in the buffer; a longer
/// line fails with [`Error::BufferTooSmall`] and none of it is returned.
pub(crate) struct LineDecoder<R> {
    reader: R,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
}

impl<R: AsyncRead + Unpin> LineDecoder<R> {
    pub(crate) fn new(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    /// Returns the next line, or `None` once the stream has ended.
    ///
    /// An unterminated final line is returned before `None`.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(offset) = find_newline(&self.buf[self.start..self.end]) {
                let line = decode_line(&self.buf[self.start..self.start + offset]);
                self.start += offset + 1;
                return Ok(Some(line));
            }

            if self.end - self.start == self.buf.len() {
                return Err(Error::BufferTooSmall {
                    capacity: self.buf.len(),
                });
            }

            self.compact();

            let read = self.reader.read(&mut self.buf[self.end..]).await?;
            if read == 0 {
                if self.start == self.end {
                    return Ok(None);
                }
                let line = decode_line(&self.buf[self.start..self.end]);
                self.start = self.end;
                return Ok(Some(line));
            }
            self.end += read;
        }
    }

    /// Moves pending bytes to the front of the buffer.
    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }
}

fn find_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == b'\n')
}

/// Drops a trailing carriage return and decodes lossily.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
