//! In-Memory Key-Value Store Adapter
//!
//! Keeps every record in a process-local map. Used for development, tests
//! and the `memory` storage backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, StoreError, StoreKey};

#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    read_only: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every call fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes writes to one key fail with `Unavailable`; reads still work.
    pub fn set_read_only(&self, key: &StoreKey, read_only: bool) {
        let mut keys = self.read_only.lock().unwrap_or_else(|p| p.into_inner());
        if read_only {
            keys.insert(key.to_string());
        } else {
            keys.remove(&key.to_string());
        }
    }

    /// Stores a raw value, bypassing any typing. Lets tests plant corrupt data.
    pub async fn put_raw(&self, key: &StoreKey, value: Value) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".into()));
        }
        Ok(())
    }

    fn check_writable(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.check_available()?;
        let keys = self.read_only.lock().unwrap_or_else(|p| p.into_inner());
        if keys.contains(&key.to_string()) {
            return Err(StoreError::Unavailable(format!("{} is read-only", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Value>, StoreError> {
        self.check_available()?;
        Ok(self.entries.read().await.get(&key.to_string()).cloned())
    }

    async fn set(&self, key: &StoreKey, value: Value) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries.write().await.remove(&key.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
