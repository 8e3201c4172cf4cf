//! In-memory slot store with an operation log.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::error::PersistenceError;

use super::KeyValueStore;

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// `read(key)`
    Read(String),
    /// `write(key, value)`
    Write(String, String),
    /// `clear(key)`
    Clear(String),
}

/// A process-local [`KeyValueStore`].
///
/// Wrap it in an `Arc` to share one slot between several countdown
/// instances, the way tabs share browser storage. Every call is appended to
/// an operation log, and the store can be switched into an unavailable
/// state to exercise the in-memory fallback.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
    ops: Mutex<Vec<StoreOp>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose every call fails.
    #[must_use]
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unavailable(true);
        store
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the calls made so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Returns the stored value without recording a read.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn record(&self, op: StoreOp) -> Result<(), PersistenceError> {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.record(StoreOp::Read(key.to_string()))?;
        Ok(self.peek(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.record(StoreOp::Write(key.to_string(), value.to_string()))?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        self.record(StoreOp::Clear(key.to_string()))?;
        self.values.remove(key);
        Ok(())
    }
}
