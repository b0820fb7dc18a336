//! Reads raw source files from the input directory. The output of this
//! module is the stream of raw records the content pipeline consumes:
//! `{path, contents, ctime}`, where `path` is relative to the source root and
//! `ctime` is the filesystem creation time when the platform reports one.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// One raw input record, prior to any normalization.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Path relative to the source root.
    pub path: PathBuf,

    /// Raw file contents, front matter included.
    pub contents: String,

    /// Filesystem creation time, if available.
    pub ctime: Option<DateTime<Utc>>,
}

/// Walks `source_directory` and reads every markdown file beneath it, in a
/// deterministic (sorted) order so that normalization ids are reproducible
/// across runs on the same corpus.
pub fn read_source(source_directory: &Path) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for result in WalkDir::new(source_directory).sort_by_file_name() {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some(MARKDOWN_EXTENSION) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_directory)
            // walkdir only yields descendants of its root
            .unwrap()
            .to_owned();
        let contents = std::fs::read_to_string(entry.path()).map_err(|err| Error::Read {
            path: entry.path().to_owned(),
            err,
        })?;
        let ctime = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.created().ok())
            .map(DateTime::<Utc>::from);
        files.push(SourceFile {
            path: relative,
            contents,
            ctime,
        });
    }
    Ok(files)
}

/// The result of a source-reading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading source files.
#[derive(Debug)]
pub enum Error {
    /// Returned for directory-walking I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file can't be read (including files that aren't
    /// valid UTF-8).
    Read { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "Reading source file `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for directory-walking operations.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
