//! External follower process, `tail -c +1 -f` by default.

use super::{ByteStream, LineSource};
use crate::error::{Error, Result};
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// A child process whose stdout is the byte stream.
///
/// The child is not killed when this value is dropped; call
/// `TailStream::stop` to terminate it.
pub struct ProcessSource {
    program: String,
    child: Child,
    stdout: Option<ByteStream>,
}

impl ProcessSource {
    /// Runs `program args... path` with stdout piped.
    pub fn spawn(program: &str, args: &[String], path: &Path) -> Result<Self> {
        let spawn_error = |source: io::Error| Error::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(io::Error::other("stdout was not captured")))?;

        debug!(program, ?args, path = %path.display(), pid = ?child.id(), "spawned line source");

        Ok(Self {
            program: program.to_string(),
            child,
            stdout: Some(Box::new(stdout)),
        })
    }

    /// OS process id, `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

impl LineSource for ProcessSource {
    fn take_stream(&mut self) -> Option<ByteStream> {
        self.stdout.take()
    }

    #[cfg(unix)]
    fn request_graceful_stop(&mut self) -> io::Result<()> {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            debug!(program = %self.program, "line source already exited");
            return Ok(());
        };
        signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn request_graceful_stop(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn force_stop(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}
