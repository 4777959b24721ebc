//! The central directory of an archive, read once per lookup.
//!
//! The `zip` crate is tried first. When it rejects the archive as malformed
//! (it validates every extra field it knows, and some archivers write NTFS
//! blocks it cannot parse) the central directory records are walked
//! directly. Only names, extra data, offsets, sizes and DOS stamps are taken
//! from them; entry contents are never read.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tracing::debug;

use super::{ArchiveError, corrupt, open_file, open_zip};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = 0xffff;
const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
const CENTRAL_LEN: usize = 46;

/// One central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CentralEntry {
    pub name: String,
    pub extra: Vec<u8>,
    pub header_start: u64,
    pub size: u64,
    /// The DOS date and time, read as local wall-clock time.
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CentralDirectory {
    entries: Vec<CentralEntry>,
}

impl CentralDirectory {
    pub fn read(path: &Path) -> Result<Self, ArchiveError> {
        match Self::from_zip(path) {
            Err(err) if err.is_format_error() => {
                let file = open_file(path)?;
                match walk(file) {
                    Ok(entries) => {
                        debug!(archive = %path.display(), error = %err, "read central directory directly");
                        Ok(Self { entries })
                    }
                    Err(walk_err) => {
                        debug!(archive = %path.display(), error = %walk_err, "central directory walk failed");
                        Err(err)
                    }
                }
            }
            other => other,
        }
    }

    fn from_zip(path: &Path) -> Result<Self, ArchiveError> {
        let mut zip = open_zip(path)?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip
                .by_index_raw(index)
                .map_err(|source| corrupt(path, source))?;
            entries.push(CentralEntry {
                name: file.name().to_string(),
                extra: file.extra_data().map(<[u8]>::to_vec).unwrap_or_default(),
                header_start: file.header_start(),
                size: file.size(),
                modified: file
                    .last_modified()
                    .and_then(|stamp| dos_datetime(stamp.datepart(), stamp.timepart())),
            });
        }
        Ok(Self { entries })
    }

    /// The first record named exactly `name`.
    pub fn find(&self, name: &str) -> Option<&CentralEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[CentralEntry] {
        &self.entries
    }
}

fn walk<R: Read + Seek>(mut reader: R) -> io::Result<Vec<CentralEntry>> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let tail_len = file_len.min((EOCD_LEN + MAX_COMMENT_LEN) as u64);
    let tail_start = file_len - tail_len;
    reader.seek(SeekFrom::Start(tail_start))?;
    let mut tail = Vec::with_capacity(usize::try_from(tail_len).map_err(invalid)?);
    reader.by_ref().take(tail_len).read_to_end(&mut tail)?;

    let eocd_at = (0..=tail.len().saturating_sub(EOCD_LEN))
        .rev()
        .find(|&at| u32_at(&tail, at) == Some(EOCD_SIGNATURE))
        .ok_or_else(|| invalid("no end of central directory record"))?;
    let eocd = &tail[eocd_at..];
    let count = u16_at(eocd, 10).ok_or_else(|| invalid("truncated end record"))?;
    let cd_size = u32_at(eocd, 12).ok_or_else(|| invalid("truncated end record"))?;
    let cd_offset = u32_at(eocd, 16).ok_or_else(|| invalid("truncated end record"))?;
    if cd_offset == u32::MAX || count == u16::MAX {
        return Err(invalid("zip64 archives are not walked"));
    }

    // Bytes prepended to the archive shift every recorded offset.
    let eocd_pos = tail_start + eocd_at as u64;
    let prefix = eocd_pos
        .checked_sub(u64::from(cd_offset) + u64::from(cd_size))
        .ok_or_else(|| invalid("central directory overlaps end record"))?;

    reader.seek(SeekFrom::Start(prefix + u64::from(cd_offset)))?;
    let mut directory = vec![0u8; usize::try_from(cd_size).map_err(invalid)?];
    reader.read_exact(&mut directory)?;

    let mut entries = Vec::with_capacity(usize::from(count));
    let mut at = 0usize;
    for _ in 0..count {
        let record = directory
            .get(at..at + CENTRAL_LEN)
            .ok_or_else(|| invalid("truncated central directory"))?;
        if u32_at(record, 0) != Some(CENTRAL_SIGNATURE) {
            return Err(invalid("bad central directory signature"));
        }
        let field = |offset| u16_at(record, offset).map(usize::from).unwrap_or_default();
        let wide = |offset| u32_at(record, offset).unwrap_or_default();
        let (name_len, extra_len, comment_len) = (field(28), field(30), field(32));

        let name_start = at + CENTRAL_LEN;
        let extra_start = name_start + name_len;
        let name = directory
            .get(name_start..extra_start)
            .ok_or_else(|| invalid("truncated entry name"))?;
        let extra = directory
            .get(extra_start..extra_start + extra_len)
            .ok_or_else(|| invalid("truncated extra field"))?;

        entries.push(CentralEntry {
            name: String::from_utf8_lossy(name).into_owned(),
            extra: extra.to_vec(),
            header_start: prefix + u64::from(wide(42)),
            size: u64::from(wide(24)),
            modified: dos_datetime(
                u16_at(record, 14).unwrap_or_default(),
                u16_at(record, 12).unwrap_or_default(),
            ),
        });
        at = extra_start + extra_len + comment_len;
    }
    Ok(entries)
}

/// An MS-DOS date and time as the instant it names on this machine.
pub(crate) fn dos_datetime(date: u16, time: u16) -> Option<DateTime<Utc>> {
    let day = NaiveDate::from_ymd_opt(
        i32::from(date >> 9) + 1980,
        u32::from((date >> 5) & 0x0f),
        u32::from(date & 0x1f),
    )?;
    let wall = day.and_hms_opt(
        u32::from(time >> 11),
        u32::from((time >> 5) & 0x3f),
        u32::from(time & 0x1f) * 2,
    )?;
    Local
        .from_local_datetime(&wall)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
}

fn invalid<E: ToString>(reason: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason.to_string())
}

fn u16_at(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn u32_at(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
