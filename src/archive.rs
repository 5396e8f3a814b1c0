//! Gzip compressed JSON-lines archives, one file per time bucket.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::Error;

pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Append one message to the bucket for the current time.
    pub fn append(&self, message: &Value) -> Result<PathBuf, Error> {
        self.append_at(message, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Each call writes a complete gzip member so a file is readable even if
    /// the process dies between messages.
    pub fn append_at(&self, message: &Value, unix_secs: i64) -> Result<PathBuf, Error> {
        let path = self.dir.join(format!("{}.jsonl.gz", bucket_name(unix_secs)));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, message)?;
        encoder.write_all(b"\n")?;
        encoder.finish()?;

        debug!(path = %path.display(), "archived message");
        Ok(path)
    }
}

/// First seven digits of the unix time, so a new file starts roughly every 1000 seconds.
pub fn bucket_name(unix_secs: i64) -> String {
    unix_secs.to_string().chars().take(7).collect()
}

/// Read every message from an archive file. Lines that are not JSON are skipped.
pub fn read_archive(path: &Path) -> Result<Vec<Value>, Error> {
    let reader = BufReader::new(MultiGzDecoder::new(BufReader::new(File::open(path)?)));

    let mut messages = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(path = %path.display(), line = number + 1, "skipping bad line: {}", e),
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn buckets_by_leading_digits() {
        assert_eq!(bucket_name(1571234567), "1571234");
        assert_eq!(bucket_name(1571234999), "1571234");
        assert_eq!(bucket_name(1571235000), "1571235");
    }

    #[test]
    fn appended_messages_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path().join("json")).unwrap();

        let first = archive.append_at(&json!({"id": 1, "text": "one"}), 1571234567).unwrap();
        let second = archive.append_at(&json!({"id": 2, "text": "two"}), 1571234600).unwrap();
        let other = archive.append_at(&json!({"id": 3, "text": "three"}), 1571235001).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.ends_with("1571234.jsonl.gz"));

        let messages = read_archive(&first).unwrap();
        assert_eq!(messages, vec![json!({"id": 1, "text": "one"}), json!({"id": 2, "text": "two"})]);
        assert_eq!(read_archive(&other).unwrap().len(), 1);
    }
}
