//! Persistent design store.
//!
//! Two independent slots on top of a [`KeyValueStore`]:
//!
//! - `savedSelection`: the last explicitly saved selection, as a JSON array
//!   of `{id, name, prompt}`
//! - `credential`: the provider credential, as a plain string
//!
//! Persistence is a convenience. Unreadable or corrupt values read as
//! absent, and failed writes are logged and swallowed; nothing here is
//! allowed to block the workflow.

use super::KeyValueStore;
use crate::credential::Credential;
use crate::design::SelectedItem;
use crate::error::Result;

/// Key of the saved selection slot.
pub const SAVED_SELECTION_KEY: &str = "savedSelection";
/// Key of the credential slot.
pub const CREDENTIAL_KEY: &str = "credential";

/// Saved-design and credential slots over an injected key-value store.
#[derive(Debug, Clone)]
pub struct DesignStore<S> {
    store: S,
}

impl<S: KeyValueStore> DesignStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Overwrites the saved selection with `items`.
    ///
    /// Returns whether the value reached the backing store.
    pub fn save_selection(&self, items: &[SelectedItem]) -> bool {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize saved selection: {}", e);
                return false;
            }
        };

        match self.store.set(SAVED_SELECTION_KEY, &json) {
            Ok(()) => {
                tracing::info!(items = items.len(), "Saved design selection");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to persist saved selection: {}", e);
                false
            }
        }
    }

    /// Returns the last saved selection, or `None` if nothing usable is stored.
    pub fn load_selection(&self) -> Option<Vec<SelectedItem>> {
        let raw = self.read(SAVED_SELECTION_KEY)?;
        match serde_json::from_str::<Vec<SelectedItem>>(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!("Ignoring corrupt saved selection: {}", e);
                None
            }
        }
    }

    pub fn has_saved_selection(&self) -> bool {
        self.read(SAVED_SELECTION_KEY).is_some()
    }

    pub fn clear_saved_selection(&self) {
        if let Err(e) = self.store.delete(SAVED_SELECTION_KEY) {
            tracing::warn!("Failed to clear saved selection: {}", e);
        }
    }

    /// Stores the credential, trimmed. Blank values are rejected.
    pub fn save_credential(&self, value: &str) -> Result<()> {
        let credential = Credential::new(value)?;
        if let Err(e) = self.store.set(CREDENTIAL_KEY, credential.expose()) {
            tracing::warn!("Failed to persist credential: {}", e);
        } else {
            tracing::info!("Stored provider credential");
        }
        Ok(())
    }

    /// The stored credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.read(CREDENTIAL_KEY).and_then(|raw| Credential::new(raw).ok())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Failed to read stored value: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoomcraftError;
    use crate::store::MemoryKeyValueStore;
    use std::sync::Arc;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(RoomcraftError::io("disk on fire"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(RoomcraftError::io("disk on fire"))
        }

        fn delete(&self, _key: &str) -> Result<()> {
            Err(RoomcraftError::io("disk on fire"))
        }
    }

    fn items() -> Vec<SelectedItem> {
        vec![
            SelectedItem::new("sofa", "Sofa", "left wall"),
            SelectedItem::new("tv", "Television", "opposite the sofa"),
        ]
    }

    #[test]
    fn test_selection_round_trip() {
        let store = DesignStore::new(MemoryKeyValueStore::new());
        assert!(store.load_selection().is_none());
        assert!(!store.has_saved_selection());

        assert!(store.save_selection(&items()));
        assert!(store.has_saved_selection());
        assert_eq!(store.load_selection(), Some(items()));
    }

    #[test]
    fn test_save_overwrites_without_merge() {
        let store = DesignStore::new(MemoryKeyValueStore::new());
        store.save_selection(&items());
        store.save_selection(&[SelectedItem::new("bed", "Bed", "center")]);

        let loaded = store.load_selection().unwrap();
        assert_eq!(loaded, vec![SelectedItem::new("bed", "Bed", "center")]);
    }

    #[test]
    fn test_stored_format() {
        let backing = Arc::new(MemoryKeyValueStore::new());
        let store = DesignStore::new(backing.clone());
        store.save_selection(&[SelectedItem::new("rug", "Rug", "under the bed")]);

        assert_eq!(
            backing.get(SAVED_SELECTION_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"rug","name":"Rug","prompt":"under the bed"}]"#)
        );
    }

    #[test]
    fn test_corrupt_selection_reads_as_absent() {
        let backing = Arc::new(MemoryKeyValueStore::new());
        backing.set(SAVED_SELECTION_KEY, "{not json").unwrap();

        let store = DesignStore::new(backing);
        assert!(store.load_selection().is_none());
    }

    #[test]
    fn test_clear_saved_selection() {
        let store = DesignStore::new(MemoryKeyValueStore::new());
        store.save_selection(&items());
        store.clear_saved_selection();
        assert!(!store.has_saved_selection());
    }

    #[test]
    fn test_credential_slot() {
        let store = DesignStore::new(MemoryKeyValueStore::new());
        assert!(!store.has_credential());

        assert!(matches!(store.save_credential("  "), Err(RoomcraftError::EmptyCredential)));
        assert!(!store.has_credential());

        store.save_credential(" key-1 ").unwrap();
        store.save_credential("key-2").unwrap();
        assert_eq!(store.credential().unwrap().expose(), "key-2");
    }

    #[test]
    fn test_slots_are_independent() {
        let store = DesignStore::new(MemoryKeyValueStore::new());
        store.save_credential("key").unwrap();
        assert!(!store.has_saved_selection());

        store.save_selection(&items());
        store.clear_saved_selection();
        assert!(store.has_credential());
    }

    #[test]
    fn test_backing_failures_are_absorbed() {
        let store = DesignStore::new(BrokenStore);
        assert!(!store.save_selection(&items()));
        assert!(store.load_selection().is_none());
        assert!(!store.has_saved_selection());
        store.clear_saved_selection();

        assert!(store.save_credential("key").is_ok());
        assert!(!store.has_credential());
    }
}
