//! Change notifications for a followed file using the notify crate.

use crate::error::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// What a file system event means for the followed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileChange {
    /// The event concerns some other entry in the directory.
    Unrelated,
    /// The file may have grown.
    Modified,
    /// The file was removed or renamed away.
    Removed,
}

/// Watches the parent directory of a file and reports events for it.
pub(crate) struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
}

impl FileWatcher {
    /// Starts watching the directory that contains `path`.
    pub(crate) fn watch<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&watch_dir(file_path), RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name: file_path.file_name().map(OsString::from).unwrap_or_default(),
        })
    }

    /// Returns the next file system event.
    pub(crate) async fn next_event(&mut self) -> Option<notify::Result<Event>> {
        self.receiver.recv().await
    }

    pub(crate) fn classify(&self, event: &Event) -> FileChange {
        classify_event(event, &self.file_name)
    }
}

/// Directory to register with notify; a bare file name lives in `.`.
fn watch_dir(file_path: &Path) -> PathBuf {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn classify_event(event: &Event, file_name: &OsString) -> FileChange {
    let touches_file = event
        .paths
        .iter()
        .any(|path| path.file_name().is_some_and(|name| name == file_name.as_os_str()));

    if !touches_file {
        return FileChange::Unrelated;
    }

    match event.kind {
        EventKind::Remove(_) => FileChange::Removed,
        EventKind::Modify(notify::event::ModifyKind::Name(notify::event::RenameMode::From)) => {
            FileChange::Removed
        }
        _ => FileChange::Modified,
    }
}
