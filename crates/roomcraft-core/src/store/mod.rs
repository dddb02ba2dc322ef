//! Key-value persistence capability and the design store built on it.

mod design_store;
mod memory;

pub use design_store::{CREDENTIAL_KEY, DesignStore, SAVED_SELECTION_KEY};
pub use memory::MemoryKeyValueStore;

use crate::error::Result;

/// Durable string key-value storage scoped to one installation.
///
/// Implementations must survive process restarts to be useful in
/// production; [`MemoryKeyValueStore`] is the in-process stand-in.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
