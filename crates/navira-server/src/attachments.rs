//! Flat-file persistence for incident attachments.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use navira_core::{AttachmentError, ConnectionId};

use crate::config::AttachmentNaming;

/// Which attachment of an incident a file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    Image(usize),
    Voice,
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(idx) => write!(f, "image {idx}"),
            Self::Voice => f.write_str("voice"),
        }
    }
}

/// Writes decoded attachments into one output directory.
#[derive(Clone, Debug)]
pub struct AttachmentStore {
    dir: PathBuf,
    naming: AttachmentNaming,
}

impl AttachmentStore {
    /// Create the output directory if missing and return a store rooted there.
    pub fn init(dir: impl Into<PathBuf>, naming: AttachmentNaming) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, naming })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an attachment of an incident with this timestamp is written to.
    pub fn path_for(&self, timestamp: &str, conn: &ConnectionId, attachment: Attachment) -> PathBuf {
        let ts = sanitize_timestamp(timestamp);
        let stem = match self.naming {
            AttachmentNaming::Timestamp => format!("incident_{ts}"),
            AttachmentNaming::TimestampAndConnection => format!("incident_{ts}_{}", conn.short()),
        };
        let name = match attachment {
            Attachment::Image(idx) => format!("{stem}_{idx}.jpg"),
            Attachment::Voice => format!("{stem}_voice.ogg"),
        };
        self.dir.join(name)
    }

    /// Decode a base64 payload and write it. Returns the written path.
    pub async fn save(
        &self,
        timestamp: &str,
        conn: &ConnectionId,
        attachment: Attachment,
        payload: &str,
    ) -> Result<PathBuf, AttachmentError> {
        let bytes = decode_attachment(payload)?;
        let path = self.path_for(timestamp, conn, attachment);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| AttachmentError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Replace every character that is not safe in a single file-name component.
///
/// ISO-8601 timestamps pass through unchanged; separators and anything
/// else become `_`.
pub fn sanitize_timestamp(timestamp: &str) -> String {
    timestamp
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Decode standard base64, tolerating surrounding whitespace and a
/// `data:<mime>;base64,` prefix.
pub fn decode_attachment(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = payload.trim();
    let body = payload
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map_or(payload, |(_, data)| data);
    STANDARD.decode(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(naming: AttachmentNaming) -> (TempDir, AttachmentStore) {
        let tmp = TempDir::new().unwrap();
        let store = AttachmentStore::init(tmp.path().join("reports"), naming).unwrap();
        (tmp, store)
    }

    #[test]
    fn init_creates_directory_idempotently() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("reports");
        AttachmentStore::init(&dir, AttachmentNaming::Timestamp).unwrap();
        assert!(dir.is_dir());
        AttachmentStore::init(&dir, AttachmentNaming::Timestamp).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn init_fails_when_path_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("reports");
        std::fs::write(&file, b"x").unwrap();
        assert!(AttachmentStore::init(&file, AttachmentNaming::Timestamp).is_err());
    }

    #[test]
    fn iso_timestamp_is_unchanged() {
        assert_eq!(
            sanitize_timestamp("2025-09-12T08:40:00.123+05:30"),
            "2025-09-12T08:40:00.123+05:30"
        );
    }

    #[test]
    fn path_traversal_is_neutralized() {
        let ts = sanitize_timestamp("../../etc/passwd");
        assert!(!ts.contains('/'));
        assert_eq!(ts, ".._.._etc_passwd");

        let (_tmp, store) = store(AttachmentNaming::Timestamp);
        let path = store.path_for("../../x", &ConnectionId::new(), Attachment::Image(0));
        assert_eq!(path.parent(), Some(store.dir()));
    }

    #[test]
    fn backslashes_and_spaces_are_replaced() {
        assert_eq!(sanitize_timestamp("a\\b c"), "a_b_c");
    }

    #[test]
    fn file_names_follow_timestamp_scheme() {
        let (_tmp, store) = store(AttachmentNaming::Timestamp);
        let conn = ConnectionId::new();
        let ts = "2025-01-01T00:00:00Z";
        assert_eq!(
            store.path_for(ts, &conn, Attachment::Image(3)),
            store.dir().join("incident_2025-01-01T00:00:00Z_3.jpg")
        );
        assert_eq!(
            store.path_for(ts, &conn, Attachment::Voice),
            store.dir().join("incident_2025-01-01T00:00:00Z_voice.ogg")
        );
    }

    #[test]
    fn connection_naming_inserts_connection() {
        let (_tmp, store) = store(AttachmentNaming::TimestampAndConnection);
        let conn = ConnectionId::from_raw("conn_0190f1b2-7c3a-7def-8abc-0123456789ab");
        assert_eq!(
            store.path_for("t1", &conn, Attachment::Image(0)),
            store.dir().join("incident_t1_0123456789ab_0.jpg")
        );
        assert_eq!(
            store.path_for("t1", &conn, Attachment::Voice),
            store.dir().join("incident_t1_0123456789ab_voice.ogg")
        );
    }

    #[test]
    fn decode_plain_and_data_url() {
        assert_eq!(decode_attachment("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_attachment("  aGVsbG8=\n").unwrap(), b"hello");
        assert_eq!(
            decode_attachment("data:image/jpeg;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_attachment("not base64!!").is_err());
    }

    #[tokio::test]
    async fn save_writes_decoded_bytes() {
        let (_tmp, store) = store(AttachmentNaming::Timestamp);
        let conn = ConnectionId::new();
        let payload = STANDARD.encode([0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);

        let path = store
            .save("ts", &conn, Attachment::Image(0), &payload)
            .await
            .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(STANDARD.encode(&written), payload);
    }

    #[tokio::test]
    async fn save_reports_decode_error_without_writing() {
        let (_tmp, store) = store(AttachmentNaming::Timestamp);
        let conn = ConnectionId::new();

        let err = store
            .save("ts", &conn, Attachment::Image(1), "%%%")
            .await
            .unwrap_err();

        assert_eq!(err.error_kind(), "decode");
        assert!(!store.path_for("ts", &conn, Attachment::Image(1)).exists());
    }

    #[tokio::test]
    async fn save_reports_write_error() {
        let (_tmp, store) = store(AttachmentNaming::Timestamp);
        std::fs::remove_dir(store.dir()).unwrap();

        let err = store
            .save("ts", &ConnectionId::new(), Attachment::Voice, "aGk=")
            .await
            .unwrap_err();

        assert_eq!(err.error_kind(), "write");
    }
}
