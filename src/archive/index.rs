//! Entry lookups against the central directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::trace;

use super::central::CentralDirectory;
use super::{ArchiveError, EntryIndex, extra};

/// [`EntryIndex`] over the archive's central directory. Only the central
/// copy of the extra field is consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipEntryIndex;

impl EntryIndex for ZipEntryIndex {
    fn entry_creation_time(
        &self,
        archive: &Path,
        entry: &str,
    ) -> Result<Option<DateTime<Utc>>, ArchiveError> {
        let directory = CentralDirectory::read(archive)?;
        let Some(found) = directory.find(entry) else {
            trace!(archive = %archive.display(), entry, "entry not in index");
            return Ok(None);
        };
        Ok(extra::entry_times(&found.extra).created)
    }
}
