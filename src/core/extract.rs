//! Archive timestamp extraction.
//!
//! Two tiers, the second consulted only when the first yields nothing:
//! 1. the manifest entry's own creation time, read from the archive index;
//! 2. the `creation_time` attribute of the manifest path in the archive
//!    mounted as a filesystem, which falls back to the modification time
//!    and finally the DOS stamp when no creation time is stored.

use std::path::Path;

use tracing::debug;

use crate::archive::{
    ArchiveError, ArchiveMount, EntryIndex, MANIFEST_PATH, ZipEntryIndex, ZipMount,
};

use super::model::{ExtractionOutcome, ResolvedDependency};

/// Only jar-style archives are inspected.
pub const JAR_EXTENSION: &str = "jar";

pub struct TimestampExtractor {
    index: Box<dyn EntryIndex>,
    mount: Box<dyn ArchiveMount>,
    filesystem_fallback: bool,
}

impl Default for TimestampExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampExtractor {
    /// Zip-backed extractor with the filesystem fallback enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(Box::new(ZipEntryIndex), Box::new(ZipMount))
    }

    #[must_use]
    pub fn with_capabilities(index: Box<dyn EntryIndex>, mount: Box<dyn ArchiveMount>) -> Self {
        Self {
            index,
            mount,
            filesystem_fallback: true,
        }
    }

    /// Disabling the fallback leaves the index read as the only tier.
    #[must_use]
    pub const fn with_filesystem_fallback(mut self, enabled: bool) -> Self {
        self.filesystem_fallback = enabled;
        self
    }

    pub fn extract(&self, dependency: &ResolvedDependency) -> ExtractionOutcome {
        let coordinates = &dependency.coordinates;
        if coordinates.extension != JAR_EXTENSION {
            debug!(dependency = %coordinates, extension = %coordinates.extension, "not a jar, skipping");
            return ExtractionOutcome::NotFound;
        }
        let Some(path) = dependency.file.as_deref() else {
            return ExtractionOutcome::Failed(ArchiveError::NoFile);
        };
        self.extract_archive(path)
    }

    /// Both tiers against one archive file, whatever its packaging.
    pub fn extract_archive(&self, path: &Path) -> ExtractionOutcome {
        if !path.is_file() {
            return ExtractionOutcome::Failed(ArchiveError::Missing {
                path: path.to_path_buf(),
            });
        }

        match self.index.entry_creation_time(path, MANIFEST_PATH) {
            Ok(Some(created)) => {
                debug!(archive = %path.display(), tier = "index", "creation time found");
                return ExtractionOutcome::Found(created.into());
            }
            Ok(None) => {}
            Err(err) => return ExtractionOutcome::Failed(err),
        }

        if !self.filesystem_fallback {
            return ExtractionOutcome::NotFound;
        }

        match self.mount.creation_time(path, MANIFEST_PATH) {
            Ok(Some(created)) => {
                debug!(archive = %path.display(), tier = "filesystem", "creation time found");
                ExtractionOutcome::Found(created.into())
            }
            Ok(None) => ExtractionOutcome::NotFound,
            Err(err) => ExtractionOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::archive::extra::encode;
    use crate::core::model::{ArtifactCoordinates, CreationTimestamp, Scope};
    use crate::test_utils::fixtures::{JarBuilder, JarEntry};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2007, 2, d, 12, 0, 0).single().unwrap()
    }

    fn dependency(extension: &str, file: Option<PathBuf>) -> ResolvedDependency {
        ResolvedDependency {
            coordinates: ArtifactCoordinates {
                group: "g".to_string(),
                name: "a".to_string(),
                version: "1".to_string(),
                extension: extension.to_string(),
                classifier: None,
            },
            scope: Scope::Compile,
            file,
        }
    }

    /// Answers from a fixed value and counts how often it was asked.
    #[derive(Clone)]
    struct Fake {
        answer: Option<DateTime<Utc>>,
        fail: bool,
        calls: Rc<Cell<usize>>,
    }

    impl Fake {
        fn answering(answer: Option<DateTime<Utc>>) -> Self {
            Self {
                answer,
                fail: false,
                calls: Rc::new(Cell::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                fail: true,
                calls: Rc::new(Cell::new(0)),
            }
        }

        fn respond(&self, archive: &Path) -> Result<Option<DateTime<Utc>>, ArchiveError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ArchiveError::Open {
                    path: archive.to_path_buf(),
                    source: std::io::Error::other("boom"),
                });
            }
            Ok(self.answer)
        }
    }

    impl EntryIndex for Fake {
        fn entry_creation_time(
            &self,
            archive: &Path,
            entry: &str,
        ) -> Result<Option<DateTime<Utc>>, ArchiveError> {
            assert_eq!(entry, MANIFEST_PATH);
            self.respond(archive)
        }
    }

    impl ArchiveMount for Fake {
        fn creation_time(
            &self,
            archive: &Path,
            path: &str,
        ) -> Result<Option<DateTime<Utc>>, ArchiveError> {
            assert_eq!(path, MANIFEST_PATH);
            self.respond(archive)
        }
    }

    /// Any existing file satisfies the extractor's pre-check when fakes do
    /// the reading.
    fn placeholder() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a-1.jar");
        std::fs::write(&path, b"placeholder").unwrap();
        (dir, path)
    }

    fn extractor(index: &Fake, mount: &Fake) -> TimestampExtractor {
        TimestampExtractor::with_capabilities(Box::new(index.clone()), Box::new(mount.clone()))
    }

    #[test]
    fn index_value_wins_and_mount_is_never_consulted() {
        let (_dir, path) = placeholder();
        let index = Fake::answering(Some(day(16)));
        let mount = Fake::answering(Some(day(1)));

        let outcome = extractor(&index, &mount).extract(&dependency("jar", Some(path)));

        assert_eq!(outcome.timestamp(), Some(CreationTimestamp::new(day(16))));
        assert_eq!(index.calls.get(), 1);
        assert_eq!(mount.calls.get(), 0);
    }

    #[test]
    fn falls_back_to_mount_when_index_has_nothing() {
        let (_dir, path) = placeholder();
        let index = Fake::answering(None);
        let mount = Fake::answering(Some(day(3)));

        let outcome = extractor(&index, &mount).extract(&dependency("jar", Some(path)));

        assert_eq!(outcome.timestamp(), Some(CreationTimestamp::new(day(3))));
        assert_eq!(mount.calls.get(), 1);
    }

    #[test]
    fn neither_tier_is_not_found() {
        let (_dir, path) = placeholder();
        let outcome = extractor(&Fake::answering(None), &Fake::answering(None))
            .extract(&dependency("jar", Some(path)));
        assert!(outcome.is_not_found());
    }

    #[test]
    fn fallback_can_be_disabled() {
        let (_dir, path) = placeholder();
        let mount = Fake::answering(Some(day(3)));
        let outcome = extractor(&Fake::answering(None), &mount)
            .with_filesystem_fallback(false)
            .extract(&dependency("jar", Some(path)));
        assert!(outcome.is_not_found());
        assert_eq!(mount.calls.get(), 0);
    }

    #[test]
    fn non_jar_is_not_found_without_reading() {
        let index = Fake::answering(Some(day(16)));
        let mount = Fake::answering(Some(day(16)));
        let outcome = extractor(&index, &mount).extract(&dependency("pom", None));
        assert!(outcome.is_not_found());
        assert_eq!(index.calls.get() + mount.calls.get(), 0);
    }

    #[test]
    fn missing_handle_or_file_is_failed() {
        let ex = extractor(&Fake::answering(None), &Fake::answering(None));
        assert!(matches!(
            ex.extract(&dependency("jar", None)),
            ExtractionOutcome::Failed(ArchiveError::NoFile)
        ));
        assert!(matches!(
            ex.extract(&dependency("jar", Some(PathBuf::from("/nonexistent/a-1.jar")))),
            ExtractionOutcome::Failed(ArchiveError::Missing { .. })
        ));
    }

    #[test]
    fn read_errors_in_either_tier_are_failed() {
        let (_dir, path) = placeholder();
        let dep = dependency("jar", Some(path));
        assert!(extractor(&Fake::failing(), &Fake::answering(None)).extract(&dep).is_failed());
        assert!(extractor(&Fake::answering(None), &Fake::failing()).extract(&dep).is_failed());
    }

    #[test]
    fn zip_backed_tiers_on_real_archives() {
        let dir = tempfile::tempdir().unwrap();
        let central = JarBuilder::new()
            .entry(JarEntry::file(MANIFEST_PATH).central_created(day(16)))
            .write_to(&dir.path().join("central.jar"));
        let local = JarBuilder::new()
            .entry(JarEntry::file(MANIFEST_PATH).local_created(day(17)))
            .write_to(&dir.path().join("local.jar"));
        let bare = JarBuilder::new()
            .entry(JarEntry::file("Main.class"))
            .write_to(&dir.path().join("bare.jar"));
        let corrupt = dir.path().join("corrupt.jar");
        std::fs::write(&corrupt, b"PK\x03\x04 truncated").unwrap();

        let ex = TimestampExtractor::new();
        let date = |path: PathBuf| ex.extract(&dependency("jar", Some(path))).timestamp();

        assert_eq!(date(central), Some(CreationTimestamp::new(day(16))));
        assert_eq!(date(local.clone()), Some(CreationTimestamp::new(day(17))));
        assert!(ex.extract(&dependency("jar", Some(bare))).is_not_found());
        assert!(ex.extract(&dependency("jar", Some(corrupt))).is_failed());

        // Same archive, same answer.
        assert_eq!(date(local.clone()), date(local));
    }

    #[test]
    fn dos_stamp_dates_the_manifest_through_the_mount() {
        let dir = tempfile::tempdir().unwrap();
        let jar = JarBuilder::new()
            .entry(JarEntry::file(MANIFEST_PATH).modified(day(16)))
            .write_to(&dir.path().join("dos.jar"));
        let dep = dependency("jar", Some(jar));

        let outcome = TimestampExtractor::new().extract(&dep);
        assert_eq!(outcome.timestamp(), Some(CreationTimestamp::new(day(16))));

        let outcome = TimestampExtractor::new()
            .with_filesystem_fallback(false)
            .extract(&dep);
        assert!(outcome.is_not_found());
    }

    #[test]
    fn unusual_ntfs_block_on_another_entry_is_tolerated() {
        let mut ntfs = encode::ntfs(Some(day(1)), None, Some(day(1)));
        ntfs.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        ntfs[2..4].copy_from_slice(&36u16.to_le_bytes());

        let dir = tempfile::tempdir().unwrap();
        let jar = JarBuilder::new()
            .entry(JarEntry::file("Main.class").raw_central_extra(&ntfs))
            .entry(JarEntry::file(MANIFEST_PATH).central_created(day(16)))
            .write_to(&dir.path().join("ntfs.jar"));

        let outcome = TimestampExtractor::new().extract(&dependency("jar", Some(jar)));
        assert_eq!(outcome.timestamp(), Some(CreationTimestamp::new(day(16))));
    }
}
