//! File-backed key-value store.
//!
//! Each key is one file inside the store directory. Writes go through
//! [`AtomicTextFile`], so a crash never leaves a half-written value.

use roomcraft_core::store::{CREDENTIAL_KEY, KeyValueStore};
use roomcraft_core::{Result, RoomcraftError};
use std::path::{Path, PathBuf};

use super::AtomicTextFile;

/// [`KeyValueStore`] persisting every key as a file under one directory.
///
/// # Security Note
///
/// The credential slot is written with mode 600 on Unix. The value itself is
/// stored as plaintext.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicTextFile> {
        validate_key(key)?;
        let file = AtomicTextFile::new(self.dir.join(key));
        Ok(if key == CREDENTIAL_KEY {
            file.with_mode(0o600)
        } else {
            file
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.file_for(key)?.load()?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.file_for(key)?.save(value)?;
        tracing::debug!(key, dir = %self.dir.display(), "Wrote store value");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        Ok(self.file_for(key)?.remove()?)
    }
}

/// Keys become file names, so they must be plain names.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RoomcraftError::config(format!("invalid store key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcraft_core::store::SAVED_SELECTION_KEY;
    use roomcraft_core::{DesignStore, SelectedItem};
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let store = FileKeyValueStore::new(temp_dir.path().join("store"));
        store.set(SAVED_SELECTION_KEY, "[]").unwrap();
        store.set(CREDENTIAL_KEY, "abc").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::new(temp_dir.path().join("store"));
        assert_eq!(reopened.get(SAVED_SELECTION_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_key_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        assert_eq!(store.get("absent").unwrap(), None);
        store.delete("absent").unwrap();

        store.set("present", "1").unwrap();
        store.delete("present").unwrap();
        assert_eq!(store.get("present").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden", "a b"] {
            assert!(store.set(key, "x").is_err(), "key {key:?} should be rejected");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_credential_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());
        store.set(CREDENTIAL_KEY, "secret").unwrap();

        let mode = std::fs::metadata(temp_dir.path().join(CREDENTIAL_KEY))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_design_store_over_files() {
        let temp_dir = TempDir::new().unwrap();
        let items = vec![SelectedItem::new("bookshelf", "Bookshelf", "right corner")];

        DesignStore::new(FileKeyValueStore::new(temp_dir.path())).save_selection(&items);

        let store = DesignStore::new(FileKeyValueStore::new(temp_dir.path()));
        assert_eq!(store.load_selection(), Some(items));
    }
}
