//! Read-only access to jar archives.
//!
//! The extractor needs two capabilities from an archive, each behind its own
//! trait so tests can substitute fakes:
//! - [`EntryIndex`]: read one named entry's metadata from the central index.
//! - [`ArchiveMount`]: mount the archive as a directory tree and stat a path.
//!
//! Every call opens the archive, does its work and drops the handles before
//! returning.

mod central;
pub mod extra;
pub mod fs;
pub mod index;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use zip::ZipArchive;

pub use fs::{ArchiveFs, EntryAttributes, ZipMount};
pub use index::ZipEntryIndex;

/// The only path ever read inside an archive.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no archive file attached")]
    NoFile,

    #[error("archive does not exist: {}", path.display())]
    Missing { path: PathBuf },

    #[error("could not open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid zip archive {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("could not read local header of {entry} in {}", path.display())]
    LocalHeader {
        path: PathBuf,
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// The bytes were read but the zip reader rejected their layout.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Corrupt {
                source: zip::result::ZipError::InvalidArchive(_)
                    | zip::result::ZipError::UnsupportedArchive(_),
                ..
            }
        )
    }
}

/// Reads one named entry's metadata from an archive index.
pub trait EntryIndex {
    /// Creation time stored with `entry`; `None` when the entry or the value
    /// is absent.
    fn entry_creation_time(
        &self,
        archive: &Path,
        entry: &str,
    ) -> Result<Option<DateTime<Utc>>, ArchiveError>;
}

/// Mounts an archive as a filesystem and stats a path inside it.
pub trait ArchiveMount {
    /// The `creation_time` attribute of `path`; `None` when the path does not
    /// exist or carries no such attribute.
    fn creation_time(
        &self,
        archive: &Path,
        path: &str,
    ) -> Result<Option<DateTime<Utc>>, ArchiveError>;
}

pub(crate) type ZipReader = ZipArchive<BufReader<File>>;

pub(crate) fn open_file(path: &Path) -> Result<File, ArchiveError> {
    File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArchiveError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArchiveError::Open {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub(crate) fn open_zip(path: &Path) -> Result<ZipReader, ArchiveError> {
    let file = open_file(path)?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| corrupt(path, source))
}

pub(crate) fn corrupt(path: &Path, source: zip::result::ZipError) -> ArchiveError {
    ArchiveError::Corrupt {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_zip(&dir.path().join("absent.jar")).unwrap_err();
        assert!(matches!(err, ArchiveError::Missing { .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jar");
        std::fs::write(&path, b"definitely not a zip file").unwrap();
        let err = open_zip(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt { .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn io_failures_are_not_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_zip(&dir.path().join("absent.jar")).unwrap_err();
        assert!(!err.is_format_error());
    }
}
