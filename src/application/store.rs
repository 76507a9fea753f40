//! Typed access to the key-value store.
//!
//! Two read flavours:
//!
//! - [`TypedStore::load_or_default`] never fails. Missing, unreachable or
//!   corrupt records read as the default and a warning is logged.
//! - [`TypedStore::load_for_update`] is used before a write. An unreachable
//!   store is an error so a default never overwrites real data. A corrupt
//!   record still reads as the default and is replaced by the write.
//!
//! Writes always propagate failures as `StorageUnavailable`.
//!
//! Read-modify-write cycles go through [`TypedStore::update`] or hold the
//! guard from [`TypedStore::lock`], which serialises writers per key across
//! every clone of the store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::DomainError;
use crate::ports::{KeyValueStore, StoreError, StoreKey};

type KeyLocks = HashMap<StoreKey, Arc<Mutex<()>>>;

#[derive(Clone)]
pub struct TypedStore {
    inner: Arc<dyn KeyValueStore>,
    locks: Arc<StdMutex<KeyLocks>>,
}

impl TypedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Exclusive access to `key` until the guard drops. Not reentrant.
    pub async fn lock(&self, key: &StoreKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Idle slots are only referenced by the map.
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Locked read-modify-write. Nothing is written when `change` fails.
    pub async fn update<T, R, F>(&self, key: &StoreKey, change: F) -> Result<R, DomainError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R, DomainError>,
    {
        let _guard = self.lock(key).await;
        let mut value: T = self.load_for_update(key).await?.unwrap_or_default();
        let result = change(&mut value)?;
        self.save(key, &value).await?;
        Ok(result)
    }

    /// Best-effort read. `None` when missing or unreadable.
    pub async fn load<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<T> {
        match self.inner.get(key).await {
            Ok(Some(value)) => decode(key, value),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "store read failed, using default");
                None
            }
        }
    }

    pub async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &StoreKey) -> T {
        self.load(key).await.unwrap_or_default()
    }

    /// Read ahead of a write.
    pub async fn load_for_update<T: DeserializeOwned>(
        &self,
        key: &StoreKey,
    ) -> Result<Option<T>, DomainError> {
        match self.inner.get(key).await {
            Ok(Some(value)) => Ok(decode(key, value)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_error(key, e)),
        }
    }

    pub async fn save<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<(), DomainError> {
        let json = serde_json::to_value(value).map_err(|e| {
            DomainError::storage(format!("Cannot serialize value for {}: {}", key, e))
        })?;
        self.inner
            .set(key, json)
            .await
            .map_err(|e| storage_error(key, e))
    }

    pub async fn remove(&self, key: &StoreKey) -> Result<(), DomainError> {
        self.inner
            .remove(key)
            .await
            .map_err(|e| storage_error(key, e))
    }
}

fn decode<T: DeserializeOwned>(key: &StoreKey, value: serde_json::Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "corrupt record ignored");
            None
        }
    }
}

fn storage_error(key: &StoreKey, err: StoreError) -> DomainError {
    tracing::error!(key = %key, error = %err, "store operation failed");
    DomainError::storage(err.to_string()).with_detail("key", key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::foundation::{ErrorCode, UserId};
    use crate::domain::quiz::QuotaUsage;
    use serde_json::json;

    fn setup() -> (InMemoryKeyValueStore, TypedStore) {
        let raw = InMemoryKeyValueStore::new();
        let typed = TypedStore::new(Arc::new(raw.clone()));
        (raw, typed)
    }

    fn key() -> StoreKey {
        StoreKey::quota(&UserId::new("ana@example.com").unwrap())
    }

    #[tokio::test]
    async fn save_then_load() {
        let (_, store) = setup();
        let mut usage = QuotaUsage::default();
        usage.increment();
        store.save(&key(), &usage).await.unwrap();

        let loaded: QuotaUsage = store.load_or_default(&key()).await;
        assert_eq!(loaded.answered, 1);
    }

    #[tokio::test]
    async fn corrupt_record_reads_as_default() {
        let (raw, store) = setup();
        raw.put_raw(&key(), json!("not a quota")).await;

        let loaded: QuotaUsage = store.load_or_default(&key()).await;
        assert_eq!(loaded, QuotaUsage::default());
        let for_update: Option<QuotaUsage> = store.load_for_update(&key()).await.unwrap();
        assert!(for_update.is_none());
    }

    #[tokio::test]
    async fn unavailable_store_degrades_reads_but_fails_writes() {
        let (raw, store) = setup();
        raw.set_unavailable(true);

        let loaded: QuotaUsage = store.load_or_default(&key()).await;
        assert_eq!(loaded.answered, 0);

        let err = store
            .load_for_update::<QuotaUsage>(&key())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);

        let err = store.save(&key(), &QuotaUsage::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let (raw, store) = setup();
        let err = store
            .update(&key(), |usage: &mut QuotaUsage| {
                usage.increment();
                Err::<(), _>(DomainError::storage("refused"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert_eq!(raw.write_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_updates_on_one_key_are_serialised() {
        let (_, store) = setup();
        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(&key(), |usage: &mut QuotaUsage| {
                            usage.increment();
                            Ok(())
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let usage: QuotaUsage = store.load_or_default(&key()).await;
        assert_eq!(usage.answered, 50);
    }

    #[tokio::test]
    async fn lock_slots_are_released_after_use() {
        let (_, store) = setup();
        drop(store.lock(&key()).await);
        let other = StoreKey::favorites(&UserId::new("bia@example.com").unwrap());
        let _held = store.lock(&other).await;
        assert_eq!(store.locks.lock().unwrap().len(), 1);
    }
}
