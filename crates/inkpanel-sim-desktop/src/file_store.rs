//! JSON-file key-value store standing in for NVS.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use inkpanel_core::{KeyValueStore, StoreError};

/// Entries live in memory; `commit()` rewrites the whole file.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| StoreError::Read {
                key: path.display().to_string(),
                reason: err.to_string(),
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "{}: {}",
                    path.display(),
                    err
                )))
            }
        };
        log::info!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }
}

impl KeyValueStore for FileStore {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn erase(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| StoreError::Commit(err.to_string()))?;
        fs::write(&self.path, bytes).map_err(|err| StoreError::Commit(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nvs.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set_string("jsons", r#"{"reminders":[]}"#).unwrap();
        store.set_string("scratch", "x").unwrap();
        store.commit().unwrap();
        store.erase("scratch").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_string("jsons").unwrap().as_deref(),
            Some(r#"{"reminders":[]}"#)
        );
        assert!(reopened.contains("scratch").unwrap());
    }

    #[test]
    fn corrupt_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nvs.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Read { .. })
        ));
    }
}
