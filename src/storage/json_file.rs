//! JSON file helpers shared by the storage modules.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{StorageError, StorageResult};

/// Reads and parses a whole JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let bytes = fs::read(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces `path` with the JSON encoding of `value`.
///
/// The data goes to a sibling `.tmp` file first and is renamed over the
/// target, so readers see either the old file or the complete new one.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    let result = write_to(&tmp, value, pretty)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_to<T: Serialize + ?Sized>(tmp: &Path, value: &T, pretty: bool) -> StorageResult<()> {
    let file = fs::File::create(tmp).map_err(|e| StorageError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);
    let encoded = if pretty {
        serde_json::to_writer_pretty(&mut writer, value)
    } else {
        serde_json::to_writer(&mut writer, value)
    };
    encoded.map_err(|source| StorageError::Serialize {
        path: tmp.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| StorageError::io(tmp, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
