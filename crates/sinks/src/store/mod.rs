//! File store - the write/rotate primitive
//!
//! Every persisted record goes through [`FileStore::write`]. The two
//! execution forms wrap that one primitive:
//!
//! - [`FileStore::persist`] schedules it on the blocking pool and returns at once
//! - [`FileStore::persist_blocking`] runs it on the calling thread
//!
//! # Modes
//!
//! ```text
//! write:   rm <file>.prev ; mv <file> <file>.prev ; write <file>
//! append:  open <file> (append) ; write <line>\n ; flush ; close
//! ```
//!
//! Overwrite is not atomic. A crash between the rename and the write leaves
//! only `<file>.prev`. The store itself does not serialize writers; the
//! filer orders its own appends.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use civic_config::StoreMode;
use tokio::task::JoinHandle;

use crate::error::{Result, StoreError};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Suffix given to the previous version of an overwritten file
pub const PREV_FILE_SUFFIX: &str = ".prev";

/// One record's worth of content and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Target directory, created if absent
    pub dir: PathBuf,

    /// File name inside `dir`
    pub name: String,

    /// Serialized record
    pub content: String,
}

impl WriteRequest {
    /// Create a request
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Full path of the target file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// Writes records to disk in one [`StoreMode`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStore {
    mode: StoreMode,
}

impl FileStore {
    /// Create a store for the given mode
    pub const fn new(mode: StoreMode) -> Self {
        Self { mode }
    }

    /// The store mode
    #[inline]
    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Write one request on the current thread
    ///
    /// Returns the path written.
    pub fn write(&self, request: &WriteRequest) -> Result<PathBuf> {
        fs::create_dir_all(&request.dir).map_err(|e| StoreError::create_dir(&request.dir, e))?;

        let path = request.path();
        match self.mode {
            StoreMode::Overwrite => overwrite(&path, &request.content)?,
            StoreMode::Append => append(&path, &request.content)?,
        }

        tracing::trace!(
            path = %path.display(),
            mode = %self.mode,
            bytes = request.content.len(),
            "record written"
        );
        Ok(path)
    }

    /// Schedule the write on the blocking pool
    ///
    /// Must be called from within a tokio runtime. The caller may drop the
    /// handle; the write still completes.
    pub fn persist(&self, request: WriteRequest) -> JoinHandle<Result<PathBuf>> {
        let store = *self;
        tokio::task::spawn_blocking(move || store.write(&request))
    }

    /// Write and return only once the file is on disk
    pub fn persist_blocking(&self, request: &WriteRequest) -> Result<PathBuf> {
        self.write(request)
    }
}

/// Path of the previous version of `path`
pub fn prev_path(path: &Path) -> PathBuf {
    let mut prev = OsString::from(path.as_os_str());
    prev.push(PREV_FILE_SUFFIX);
    PathBuf::from(prev)
}

fn overwrite(path: &Path, content: &str) -> Result<()> {
    let prev = prev_path(path);

    // Either file may legitimately be missing
    if let Err(e) = fs::remove_file(&prev)
        && e.kind() != io::ErrorKind::NotFound
    {
        tracing::debug!(path = %prev.display(), error = %e, "could not remove previous file");
    }
    if let Err(e) = fs::rename(path, &prev)
        && e.kind() != io::ErrorKind::NotFound
    {
        tracing::debug!(path = %path.display(), error = %e, "could not rotate current file");
    }

    fs::write(path, content.as_bytes()).map_err(|e| StoreError::io(path, e))
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;

    let mut line = String::with_capacity(content.len() + 1);
    line.push_str(content);
    line.push('\n');

    file.write_all(line.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| StoreError::io(path, e))
}
