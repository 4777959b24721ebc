//! A mounted archive viewed as a read-only directory tree.
//!
//! Paths are `/`-separated and relative to the archive root; a leading `/`,
//! empty segments and `.` segments are ignored. Directories exist whenever an
//! entry lives below them, with or without an explicit directory entry.
//!
//! Attributes are synthesized the way a filesystem provider would. The
//! modification time comes from the NTFS field, then either copy of the
//! extended timestamp, then the DOS stamp. The creation time is the stored
//! ctime when there is one and the modification time otherwise.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use super::central::{CentralDirectory, CentralEntry};
use super::extra::{self, EntryTimes};
use super::{ArchiveError, ArchiveMount, open_file};

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const LOCAL_HEADER_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Directory { index: Option<usize> },
    File { index: usize },
}

/// File attributes of one path in a mounted archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryAttributes {
    pub is_dir: bool,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
}

pub struct ArchiveFs {
    path: PathBuf,
    directory: CentralDirectory,
    headers: File,
    tree: BTreeMap<String, Node>,
}

impl ArchiveFs {
    /// Mount the archive at `path`.
    pub fn mount(path: &Path) -> Result<Self, ArchiveError> {
        let directory = CentralDirectory::read(path)?;
        let headers = open_file(path)?;

        let mut tree = BTreeMap::new();
        tree.insert(String::new(), Node::Directory { index: None });
        for (index, entry) in directory.entries().iter().enumerate() {
            let normalized = normalize(&entry.name);
            if normalized.is_empty() {
                continue;
            }
            for ancestor in ancestors(&normalized) {
                tree.entry(ancestor)
                    .or_insert(Node::Directory { index: None });
            }
            let node = if entry.name.ends_with('/') {
                Node::Directory { index: Some(index) }
            } else {
                Node::File { index }
            };
            // Duplicate names resolve to the first record, as lookups do.
            tree.entry(normalized).or_insert(node);
        }
        trace!(archive = %path.display(), paths = tree.len(), "mounted archive");

        Ok(Self {
            path: path.to_path_buf(),
            directory,
            headers,
            tree,
        })
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.tree.contains_key(&normalize(path))
    }

    /// Attributes of `path`, `None` if it does not exist.
    pub fn metadata(&mut self, path: &str) -> Result<Option<EntryAttributes>, ArchiveError> {
        let normalized = normalize(path);
        let Some(node) = self.tree.get(&normalized).copied() else {
            return Ok(None);
        };
        let (is_dir, index) = match node {
            Node::Directory { index: None } => {
                return Ok(Some(EntryAttributes {
                    is_dir: true,
                    size: 0,
                    created: None,
                    modified: None,
                    accessed: None,
                }));
            }
            Node::Directory { index: Some(index) } => (true, index),
            Node::File { index } => (false, index),
        };
        let Some(entry) = self.directory.entries().get(index).cloned() else {
            return Ok(None);
        };
        let times = self.entry_times(&entry)?;
        Ok(Some(EntryAttributes {
            is_dir,
            size: if is_dir { 0 } else { entry.size },
            created: times.created,
            modified: times.modified,
            accessed: times.accessed,
        }))
    }

    fn entry_times(&mut self, entry: &CentralEntry) -> Result<EntryTimes, ArchiveError> {
        let local = self
            .local_extra(entry.header_start)
            .map_err(|source| ArchiveError::LocalHeader {
                path: self.path.clone(),
                entry: entry.name.clone(),
                source,
            })?;

        let ntfs = extra::ntfs_times(&entry.extra);
        let central_extended = extra::extended_times(&entry.extra);
        let local_extended = extra::extended_times(&local);
        let modified = ntfs
            .modified
            .or(central_extended.modified)
            .or(local_extended.modified)
            .or(entry.modified);
        Ok(EntryTimes {
            created: ntfs
                .created
                .or(local_extended.created)
                .or(central_extended.created)
                .or(modified),
            modified,
            accessed: ntfs
                .accessed
                .or(local_extended.accessed)
                .or(central_extended.accessed),
        })
    }

    fn local_extra(&mut self, header_start: u64) -> std::io::Result<Vec<u8>> {
        self.headers.seek(SeekFrom::Start(header_start))?;
        let mut header = [0u8; LOCAL_HEADER_LEN];
        self.headers.read_exact(&mut header)?;
        let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if signature != LOCAL_HEADER_SIGNATURE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("bad local header signature {signature:#010x}"),
            ));
        }
        let name_len = u16::from_le_bytes([header[26], header[27]]);
        let extra_len = u16::from_le_bytes([header[28], header[29]]);
        self.headers.seek(SeekFrom::Current(i64::from(name_len)))?;
        let mut extra = vec![0u8; usize::from(extra_len)];
        self.headers.read_exact(&mut extra)?;
        Ok(extra)
    }
}

/// [`ArchiveMount`] over [`ArchiveFs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipMount;

impl ArchiveMount for ZipMount {
    fn creation_time(
        &self,
        archive: &Path,
        path: &str,
    ) -> Result<Option<DateTime<Utc>>, ArchiveError> {
        let mut fs = ArchiveFs::mount(archive)?;
        if !fs.exists(path) {
            return Ok(None);
        }
        Ok(fs.metadata(path)?.and_then(|attributes| attributes.created))
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Proper ancestors of a normalized path, root excluded.
fn ancestors(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(at, _)| path[..at].to_string())
        .collect()
}
