use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use anyhow::Result;
use crate::storage::area::{LocalStore, StorageArea};

/// In-memory local storage (no persistence). Used when no durable store is configured
/// or the durable one cannot be opened.
#[derive(Default)]
pub struct InMemoryLocalStore {
    areas: Mutex<HashMap<String, Arc<dyn StorageArea>>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infallible form of [`LocalStore::area`].
    pub fn area_for(&self, scope: &str) -> Arc<dyn StorageArea> {
        let mut guard = self.areas.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(InMemoryLocalArea::default()) as Arc<dyn StorageArea>)
            .clone()
    }
}

impl LocalStore for InMemoryLocalStore {
    fn area(&self, scope: &str) -> Result<Arc<dyn StorageArea>> {
        Ok(self.area_for(scope))
    }
}

#[derive(Default)]
struct InMemoryLocalArea {
    map: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalArea {
    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageArea for InMemoryLocalArea {
    fn try_get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.map().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.map().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.map().len()
    }

    fn keys(&self) -> Vec<String> {
        let mut v: Vec<String> = self.map().keys().cloned().collect();
        v.sort_unstable();
        v
    }
}
