//! Timestamps stored in zip extra fields.
//!
//! Two layouts carry per-entry times:
//! - NTFS (`0x000a`): 64-bit FILETIME values for modification, access and
//!   creation, held in attribute tag `0x0001`.
//! - Info-ZIP extended timestamp (`0x5455`): a flag byte followed by the
//!   32-bit Unix times the flags announce, in mtime/atime/ctime order. Writers
//!   usually keep only the mtime in the central directory copy, so the
//!   creation time is often present in the local header alone.
//!
//! Parsing is lenient: truncated or malformed blocks are skipped, never
//! reported, since many archivers write sloppy extra data.

use chrono::{DateTime, Utc};

pub const NTFS_TAG: u16 = 0x000a;
pub const EXTENDED_TIMESTAMP_TAG: u16 = 0x5455;

const NTFS_TIMES_ATTRIBUTE: u16 = 0x0001;
const NTFS_TIMES_SIZE: usize = 24;

/// 100ns ticks between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET: i128 = 116_444_736_000_000_000;
const FILETIME_TICKS_PER_SECOND: i128 = 10_000_000;

const FLAG_MODIFIED: u8 = 0x01;
const FLAG_ACCESSED: u8 = 0x02;
const FLAG_CREATED: u8 = 0x04;

/// Times recovered from one extra-field block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryTimes {
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

impl EntryTimes {
    /// Keep the values already set, fill the gaps from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            modified: self.modified.or(fallback.modified),
            accessed: self.accessed.or(fallback.accessed),
            created: self.created.or(fallback.created),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.modified.is_none() && self.accessed.is_none() && self.created.is_none()
    }
}

/// Iterator over `(header id, payload)` pairs of an extra-field block.
pub struct ExtraFields<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for ExtraFields<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.len() < 4 {
            return None;
        }
        let id = read_u16(self.remaining, 0)?;
        let size = usize::from(read_u16(self.remaining, 2)?);
        let body = self.remaining.get(4..4 + size)?;
        self.remaining = &self.remaining[4 + size..];
        Some((id, body))
    }
}

#[must_use]
pub const fn fields(extra: &[u8]) -> ExtraFields<'_> {
    ExtraFields { remaining: extra }
}

/// Times from the NTFS field, if the block carries one.
#[must_use]
pub fn ntfs_times(extra: &[u8]) -> EntryTimes {
    fields(extra)
        .filter(|(id, _)| *id == NTFS_TAG)
        .find_map(|(_, body)| parse_ntfs(body))
        .unwrap_or_default()
}

/// Times from the extended timestamp field, if the block carries one.
#[must_use]
pub fn extended_times(extra: &[u8]) -> EntryTimes {
    fields(extra)
        .filter(|(id, _)| *id == EXTENDED_TIMESTAMP_TAG)
        .find_map(|(_, body)| parse_extended(body))
        .unwrap_or_default()
}

/// Everything a block says about an entry, NTFS values taking precedence.
#[must_use]
pub fn entry_times(extra: &[u8]) -> EntryTimes {
    ntfs_times(extra).or(extended_times(extra))
}

fn parse_ntfs(body: &[u8]) -> Option<EntryTimes> {
    // 4 reserved bytes, then tagged attributes.
    let mut attributes = fields(body.get(4..)?);
    let (_, times) = attributes.find(|(tag, data)| {
        *tag == NTFS_TIMES_ATTRIBUTE && data.len() >= NTFS_TIMES_SIZE
    })?;
    Some(EntryTimes {
        modified: filetime(read_u64(times, 0)?),
        accessed: filetime(read_u64(times, 8)?),
        created: filetime(read_u64(times, 16)?),
    })
}

fn parse_extended(body: &[u8]) -> Option<EntryTimes> {
    let (&flags, mut rest) = body.split_first()?;
    let mut next_time = |flag: u8| -> Option<DateTime<Utc>> {
        if flags & flag == 0 || rest.len() < 4 {
            return None;
        }
        let seconds = i32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        rest = &rest[4..];
        DateTime::from_timestamp(i64::from(seconds), 0)
    };
    let modified = next_time(FLAG_MODIFIED);
    let accessed = next_time(FLAG_ACCESSED);
    let created = next_time(FLAG_CREATED);
    Some(EntryTimes {
        modified,
        accessed,
        created,
    })
}

/// Zero means "not set" in NTFS fields.
fn filetime(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let since_epoch = i128::from(ticks) - FILETIME_UNIX_OFFSET;
    let seconds = i64::try_from(since_epoch.div_euclid(FILETIME_TICKS_PER_SECOND)).ok()?;
    let nanos = u32::try_from(since_epoch.rem_euclid(FILETIME_TICKS_PER_SECOND) * 100).ok()?;
    DateTime::from_timestamp(seconds, nanos)
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u64(bytes: &[u8], at: usize) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(raw))
}

/// Encoders used by fixtures that need hand-built extra data.
pub mod encode {
    use chrono::{DateTime, Utc};

    use super::{
        EXTENDED_TIMESTAMP_TAG, FILETIME_TICKS_PER_SECOND, FILETIME_UNIX_OFFSET,
        FLAG_ACCESSED, FLAG_CREATED, FLAG_MODIFIED, NTFS_TAG, NTFS_TIMES_ATTRIBUTE,
    };

    /// An extended timestamp field holding whichever times are given.
    #[must_use]
    pub fn extended_timestamp(
        modified: Option<DateTime<Utc>>,
        accessed: Option<DateTime<Utc>>,
        created: Option<DateTime<Utc>>,
    ) -> Vec<u8> {
        let mut flags = 0u8;
        let mut body = Vec::new();
        for (flag, time) in [
            (FLAG_MODIFIED, modified),
            (FLAG_ACCESSED, accessed),
            (FLAG_CREATED, created),
        ] {
            if let Some(time) = time {
                flags |= flag;
                let seconds = i32::try_from(time.timestamp()).unwrap_or(i32::MAX);
                body.extend_from_slice(&seconds.to_le_bytes());
            }
        }
        body.insert(0, flags);
        field(EXTENDED_TIMESTAMP_TAG, &body)
    }

    /// An NTFS field; absent times are written as zero.
    #[must_use]
    pub fn ntfs(
        modified: Option<DateTime<Utc>>,
        accessed: Option<DateTime<Utc>>,
        created: Option<DateTime<Utc>>,
    ) -> Vec<u8> {
        let mut times = Vec::with_capacity(24);
        for time in [modified, accessed, created] {
            times.extend_from_slice(&time.map_or(0, to_filetime).to_le_bytes());
        }
        let mut body = vec![0u8; 4];
        body.extend_from_slice(&field(NTFS_TIMES_ATTRIBUTE, &times));
        field(NTFS_TAG, &body)
    }

    fn to_filetime(time: DateTime<Utc>) -> u64 {
        let ticks = i128::from(time.timestamp()) * FILETIME_TICKS_PER_SECOND
            + i128::from(time.timestamp_subsec_nanos() / 100)
            + FILETIME_UNIX_OFFSET;
        u64::try_from(ticks).unwrap_or(0)
    }

    fn field(id: u16, body: &[u8]) -> Vec<u8> {
        let size = u16::try_from(body.len()).unwrap_or(u16::MAX);
        let mut out = Vec::with_capacity(body.len() + 4);
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(body);
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn extended_timestamp_with_all_times() {
        let block = encode::extended_timestamp(
            Some(at(2020, 1, 2)),
            Some(at(2021, 3, 4)),
            Some(at(2007, 2, 16)),
        );
        let times = extended_times(&block);
        assert_eq!(times.modified, Some(at(2020, 1, 2)));
        assert_eq!(times.accessed, Some(at(2021, 3, 4)));
        assert_eq!(times.created, Some(at(2007, 2, 16)));
    }

    #[test]
    fn extended_timestamp_central_copy_keeps_only_mtime() {
        // Flags announce all three times but the central copy holds one.
        let mut block = vec![0x55, 0x54, 5, 0, FLAG_MODIFIED | FLAG_ACCESSED | FLAG_CREATED];
        let seconds = i32::try_from(at(2020, 1, 2).timestamp()).unwrap();
        block.extend_from_slice(&seconds.to_le_bytes());

        let times = extended_times(&block);
        assert_eq!(times.modified, Some(at(2020, 1, 2)));
        assert_eq!(times.created, None);
    }

    #[test]
    fn ntfs_round_trips_creation_time() {
        let block = encode::ntfs(Some(at(2019, 5, 6)), None, Some(at(2007, 2, 16)));
        let times = ntfs_times(&block);
        assert_eq!(times.created, Some(at(2007, 2, 16)));
        assert_eq!(times.modified, Some(at(2019, 5, 6)));
        assert_eq!(times.accessed, None);
    }

    #[test]
    fn ntfs_wins_over_extended_timestamp() {
        let mut block = encode::extended_timestamp(None, None, Some(at(2001, 1, 1)));
        block.extend(encode::ntfs(None, None, Some(at(2002, 2, 2))));
        assert_eq!(entry_times(&block).created, Some(at(2002, 2, 2)));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut block = vec![0xfe, 0xca, 0, 0]; // jar marker, empty body
        block.extend(encode::extended_timestamp(None, None, Some(at(2007, 2, 16))));
        assert_eq!(entry_times(&block).created, Some(at(2007, 2, 16)));
    }

    #[test]
    fn truncated_field_yields_nothing() {
        let mut block = encode::ntfs(None, None, Some(at(2007, 2, 16)));
        block.truncate(block.len() - 3);
        assert!(entry_times(&block).is_empty());
        assert!(entry_times(&[]).is_empty());
    }

    #[test]
    fn filetime_before_unix_epoch() {
        // 1969-12-31T23:59:59Z
        let ticks = u64::try_from(FILETIME_UNIX_OFFSET - FILETIME_TICKS_PER_SECOND).unwrap();
        assert_eq!(filetime(ticks).map(|t| t.timestamp()), Some(-1));
    }

    proptest! {
        #[test]
        fn arbitrary_blocks_never_panic(block in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = entry_times(&block);
            prop_assert!(fields(&block).count() <= block.len() / 4);
        }
    }
}
