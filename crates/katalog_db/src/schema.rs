//! On-disk layout of the catalogue.
//!
//! Two root buckets hold everything:
//!
//! - `catalogue-stats` - database identity, schema version, running totals
//!   and timestamps, one key each.
//! - `catalogue-volumes` - one key per volume (UUID string, CBOR
//!   [`VolumeRecord`]) plus one nested bucket per volume, named by the same
//!   UUID, with a CBOR [`FileEntry`] per catalogued path.
//!
//! Counters use the store's fixed-width u64 codec; timestamps are RFC 3339
//! text so the file stays inspectable with generic tooling.

use chrono::{DateTime, SecondsFormat, Utc};
use katalog_index::{EntryKind, Volume};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Root bucket holding database metadata and counters.
pub const BUCKET_STATS: &str = "catalogue-stats";

/// Root bucket holding volume records and their file entries.
pub const BUCKET_VOLUMES: &str = "catalogue-volumes";

/// Random identity assigned when the catalogue is initialised.
pub const KEY_DATABASE_ID: &str = "catalogue-id";

/// Schema version, two bytes: major then minor.
pub const KEY_VERSION: &str = "database-version";

/// Number of catalogued volumes.
pub const KEY_TOTAL_VOLUMES: &str = "total-volumes";

/// Number of catalogued directories across all volumes.
pub const KEY_TOTAL_DIRECTORIES: &str = "total-directories";

/// Number of catalogued files across all volumes.
pub const KEY_TOTAL_FILES: &str = "total-files";

/// When the catalogue was initialised, RFC 3339.
pub const KEY_CREATED: &str = "created";

/// When the catalogue last changed, RFC 3339.
pub const KEY_LAST_SAVED: &str = "last-saved";

/// Schema version stamped into new catalogues.
pub const CURRENT_VERSION: Version = Version { major: 1, minor: 0 };

/// Catalogue schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Incremented on incompatible layout changes.
    pub major: u8,
    /// Incremented on additive changes.
    pub minor: u8,
}

impl Version {
    /// Encodes the version as two bytes.
    pub fn encode(self) -> [u8; 2] {
        [self.major, self.minor]
    }

    /// Decodes a version from its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] when the value is not exactly two bytes.
    pub fn decode(bytes: &[u8]) -> DbResult<Self> {
        match bytes {
            [major, minor] => Ok(Self {
                major: *major,
                minor: *minor,
            }),
            _ => Err(DbError::corrupt(format!(
                "version must be 2 bytes, got {}",
                bytes.len()
            ))),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Aggregate catalogue state, assembled by `Database::stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Database identity.
    pub id: Uuid,
    /// Schema version of the open catalogue.
    pub version: Version,
    /// Number of catalogued volumes.
    pub volumes: u64,
    /// Number of catalogued directories.
    pub directories: u64,
    /// Number of catalogued files.
    pub files: u64,
    /// When the catalogue was initialised.
    pub created: DateTime<Utc>,
    /// When the catalogue last changed.
    pub last_saved: DateTime<Utc>,
}

/// Per-volume record stored under its UUID in [`BUCKET_VOLUMES`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// The volume as probed at indexing time.
    pub volume: Volume,
    /// Files catalogued on this volume.
    pub files: u64,
    /// Directories catalogued on this volume.
    pub directories: u64,
    /// When the volume was last indexed.
    pub catalogued: DateTime<Utc>,
}

/// One catalogued filesystem entry, keyed by its volume-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the indexing root.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes. Zero for directories.
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

/// Serialises a record to CBOR bytes.
///
/// # Errors
///
/// Returns [`DbError::Corrupt`] when serialisation fails, which for these
/// in-memory types indicates a bug rather than bad input.
pub fn encode_record<T: Serialize>(record: &T) -> DbResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf)
        .map_err(|err| DbError::corrupt(format!("cbor encode: {err}")))?;
    Ok(buf)
}

/// Deserialises a record from CBOR bytes.
///
/// # Errors
///
/// Returns [`DbError::Corrupt`] when the bytes are not valid CBOR for `T`.
pub fn decode_record<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> DbResult<T> {
    ciborium::from_reader(bytes).map_err(|err| DbError::corrupt(format!("cbor decode: {err}")))
}

/// Encodes a timestamp as RFC 3339 text bytes.
pub fn encode_time(time: DateTime<Utc>) -> Vec<u8> {
    time.to_rfc3339_opts(SecondsFormat::Micros, true).into_bytes()
}

/// Decodes an RFC 3339 timestamp from stored bytes.
///
/// # Errors
///
/// Returns [`DbError::Corrupt`] when the bytes are not UTF-8 RFC 3339 text.
pub fn decode_time(bytes: &[u8]) -> DbResult<DateTime<Utc>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DbError::corrupt("timestamp is not valid UTF-8"))?;
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|err| DbError::corrupt(format!("timestamp {text:?}: {err}")))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Decodes a UUID from its stored 16-byte form.
///
/// # Errors
///
/// Returns [`DbError::Corrupt`] when the value is not exactly 16 bytes.
pub fn decode_uuid(bytes: &[u8]) -> DbResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|_| {
        DbError::corrupt(format!("uuid must be 16 bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_round_trips_through_two_bytes() {
        let encoded = CURRENT_VERSION.encode();
        assert_eq!(Version::decode(&encoded).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn version_rejects_wrong_length() {
        assert!(matches!(
            Version::decode(&[1]),
            Err(DbError::Corrupt { .. })
        ));
        assert!(matches!(
            Version::decode(&[1, 0, 0]),
            Err(DbError::Corrupt { .. })
        ));
    }

    #[test]
    fn file_entry_round_trips_through_cbor() {
        let entry = FileEntry {
            path: "photos/2024/img_0001.jpg".to_owned(),
            kind: EntryKind::File,
            size: 4_194_304,
            modified: Some(Utc::now()),
        };
        let bytes = encode_record(&entry).unwrap();
        let decoded: FileEntry = decode_record(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn decode_record_rejects_garbage() {
        let result: DbResult<FileEntry> = decode_record(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(DbError::Corrupt { .. })));
    }

    #[test]
    fn time_round_trips_through_rfc3339() {
        let now = Utc::now();
        let decoded = decode_time(&encode_time(now)).unwrap();
        assert!((decoded - now).num_microseconds().unwrap_or(i64::MAX).abs() < 2);
    }

    #[test]
    fn decode_time_rejects_non_rfc3339_text() {
        assert!(matches!(
            decode_time(b"yesterday"),
            Err(DbError::Corrupt { .. })
        ));
    }

    #[test]
    fn decode_uuid_rejects_short_input() {
        assert!(matches!(
            decode_uuid(&[0; 4]),
            Err(DbError::Corrupt { .. })
        ));
    }
}
