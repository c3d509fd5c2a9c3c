//! Versioned whole-structure records.
//!
//! Catalog and default paths are persisted as
//! `{ "format": <kind>, "version": <n>, "data": ... }`. Reads check both
//! header fields before touching `data`, so schema drift fails loudly.

use crate::error::{Result, SeekError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize)]
struct RecordOut<'a, T> {
    format: &'a str,
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct RecordIn {
    format: String,
    version: u32,
    data: serde_json::Value,
}

/// Write the record to `path`, replacing any previous file.
/// The bytes go to a sibling temp file first and are renamed into place.
pub fn write_record<T: Serialize>(path: &Path, kind: &str, version: u32, data: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let bytes = serde_json::to_vec(&RecordOut { format: kind, version, data })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a record. `Ok(None)` when the file does not exist.
pub fn read_record<T: DeserializeOwned>(path: &Path, kind: &str, version: u32) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SeekError::Io(e)),
    };

    let record: RecordIn = serde_json::from_slice(&bytes)?;
    if record.format != kind {
        return Err(SeekError::InvalidArgument(format!(
            "{} holds a '{}' record, expected '{}'",
            path.display(),
            record.format,
            kind
        )));
    }
    if record.version != version {
        return Err(SeekError::SchemaVersion {
            kind: kind.to_string(),
            found: record.version,
            expected: version,
        });
    }

    Ok(Some(serde_json::from_value(record.data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let got: Option<BTreeMap<String, String>> =
            read_record(&dir.path().join("absent.json"), "thing", 1).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_version_drift_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thing.json");
        let data: BTreeMap<String, String> = BTreeMap::new();
        write_record(&path, "thing", 2, &data).unwrap();

        let result: Result<Option<BTreeMap<String, String>>> = read_record(&path, "thing", 1);
        match result {
            Err(SeekError::SchemaVersion { found, expected, .. }) => {
                assert_eq!(found, 2);
                assert_eq!(expected, 1);
            }
            other => panic!("expected SchemaVersion, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_wrong_kind_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thing.json");
        write_record(&path, "catalog", 1, &BTreeMap::<String, String>::new()).unwrap();

        let result: Result<Option<BTreeMap<String, String>>> = read_record(&path, "default_paths", 1);
        assert!(matches!(result, Err(SeekError::InvalidArgument(_))));
    }

    #[test]
    fn test_legacy_blob_without_header_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thing.json");
        std::fs::write(&path, r#"{"desktop": "/home/me/Desktop"}"#).unwrap();

        let result: Result<Option<BTreeMap<String, String>>> = read_record(&path, "default_paths", 1);
        assert!(matches!(result, Err(SeekError::Serialization(_))));
    }
}
