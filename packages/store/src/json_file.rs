//! Reading and atomically replacing JSON documents.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::StoreError;
use crate::paths::ensure_dir;

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads and deserializes `path`. A missing file is `Ok(None)`.
///
/// # Errors
///
/// Returns [`StoreError`] if the file exists but cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `value` as pretty JSON to `path`, replacing any existing file.
///
/// The document goes to a sibling temp file which is synced and renamed
/// over `path`, so a failed write leaves the previous version intact.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or any filesystem step fails.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        ensure_dir(parent).map_err(|e| io_error(parent, e))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = write_and_rename(&tmp, path, &body) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }

    log::debug!("Wrote {} ({} bytes)", path.display(), body.len() + 1);
    Ok(())
}

fn write_and_rename(tmp: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp)?;
    file.write_all(body)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    std::fs::rename(tmp, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "document".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "accessmap_json_file_{name}_{}",
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = temp_dir("missing");
        let value: Option<Vec<u32>> = read_json(&dir.join("nope.json")).unwrap();
        assert!(value.is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn write_replaces_and_leaves_no_temp_files() {
        let dir = temp_dir("replace");
        let path = dir.join("nested").join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), 1);
        write_json_atomic(&path, &doc).unwrap();
        doc.insert("b".to_string(), 2);
        write_json_atomic(&path, &doc).unwrap();

        let read: BTreeMap<String, i32> = read_json(&path).unwrap().unwrap();
        assert_eq!(read, doc);

        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = temp_dir("malformed");
        let path = dir.join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json::<Vec<u32>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        std::fs::remove_dir_all(dir).ok();
    }
}
