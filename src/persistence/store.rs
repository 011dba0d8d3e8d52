//! Storage capability behind the persistence layer
//!
//! The game never talks to LocalStorage directly; it goes through
//! `SaveStore` so native builds and tests run against `MemoryStore`, and a
//! browser session without usable storage degrades to memory-only play
//! instead of failing.

use std::fmt;

#[cfg(target_arch = "wasm32")]
use crate::persistence::SAVE_KEY;

/// A failed storage write. The session keeps running in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreError;

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage write failed")
    }
}

impl std::error::Error for StoreError {}

/// Narrow interface over the persisted save slot
pub trait SaveStore {
    fn read(&self) -> Option<String>;
    fn write(&mut self, json: &str) -> Result<(), StoreError>;
    fn clear(&mut self);
}

impl SaveStore for Box<dyn SaveStore> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        (**self).write(json)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

/// In-memory slot: native builds, tests, and the storage-less fallback
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self) -> Option<String> {
        self.record.clone()
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        self.record = Some(json.to_string());
        Ok(())
    }

    fn clear(&mut self) {
        self.record = None;
    }
}

/// Browser LocalStorage slot (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    /// None when LocalStorage is unavailable (e.g. blocked by the browser);
    /// the caller falls back to `MemoryStore`.
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()?;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStore {
    fn read(&self) -> Option<String> {
        self.storage.get_item(SAVE_KEY).ok().flatten()
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        self.storage.set_item(SAVE_KEY, json).map_err(|_| StoreError)
    }

    fn clear(&mut self) {
        let _ = self.storage.remove_item(SAVE_KEY);
    }
}
