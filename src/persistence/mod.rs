//! Durable key-value slot used by duration mode.
//!
//! The countdown only ever stores one value here (the resolved
//! `TargetInstant`), but the slot is modelled as a small injected
//! interface so tests can substitute [`MemoryStore`] and assert on the
//! exact read/write/clear sequence.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreOp};

use crate::error::PersistenceError;

/// A durable client-local key-value slot.
///
/// Writers use read-if-absent-then-write; there is no compare-and-swap, so
/// two first loads racing on an empty slot may both write.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes `key`. Clearing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be written.
    fn clear(&self, key: &str) -> Result<(), PersistenceError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).write(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).clear(key)
    }
}
