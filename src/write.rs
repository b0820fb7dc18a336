//! The output boundary: rendered documents become `{path, contents}` records
//! and are handed to a [`Sink`]. The filesystem sink writes under the output
//! root; the in-memory sink backs tests and doubles as a collision detector
//! for the whole-build output set.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One output document. `path` is relative to the output root, always with
/// forward-slash-safe components (it's derived from a
/// [`crate::url::RelativeUrl`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Destination for rendered documents. Implementations must tolerate
/// concurrent writers; the render pool calls `write` from multiple threads.
pub trait Sink {
    fn write(&self, file: OutputFile) -> Result<()>;
}

/// Writes output files beneath a root directory, creating parent directories
/// as needed.
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: &Path) -> FsSink {
        FsSink {
            root: root.to_owned(),
        }
    }
}

impl Sink for FsSink {
    fn write(&self, file: OutputFile) -> Result<()> {
        let path = self.root.join(&file.path);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Io {
                path: dir.to_owned(),
                err,
            })?;
        }
        std::fs::write(&path, file.contents).map_err(|err| Error::Io { path, err })
    }
}

/// Collects output files in memory, rejecting writes that target an
/// already-written path. Used by tests to assert on the exact output set.
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// Consumes the sink and returns the collected files.
    pub fn into_files(self) -> BTreeMap<PathBuf, String> {
        self.files.into_inner().unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn write(&self, file: OutputFile) -> Result<()> {
        let mut files = match self.files.lock() {
            Ok(files) => files,
            Err(poisoned) => poisoned.into_inner(),
        };
        if files.contains_key(&file.path) {
            return Err(Error::Duplicate { path: file.path });
        }
        files.insert(file.path, file.contents);
        Ok(())
    }
}

/// The result of a write operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing an output file.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems writing a file or creating its directory.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when two documents target the same output path.
    Duplicate { path: PathBuf },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Writing `{}`: {}", path.display(), err)
            }
            Error::Duplicate { path } => {
                write!(f, "Duplicate output path `{}`", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Duplicate { .. } => None,
        }
    }
}
