//! In-memory store.
use crate::KeyValueStore;
use core::convert::Infallible;
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    vec::Vec,
};

/// A [KeyValueStore] that keeps everything in memory.
///
/// Contents are lost with the process. Mostly useful in tests and for nodes that do not
/// want the base fee to outlive a restart.
#[derive(Debug, Default)]
pub struct InMemoryKv {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKv {
    type Error = Infallible;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
