use anyhow::Result;
use std::sync::Arc;

/// Object-safe key/value storage area (DOM's Storage).
pub trait StorageArea: Send + Sync {
    /// Retrieves the value associated with the given key.
    ///
    /// `Ok(None)` means the key is absent; a backend that cannot answer returns `Err`.
    fn try_get_item(&self, key: &str) -> Result<Option<String>>;

    /// Retrieves the value associated with the given key, or `None` if not found or unreadable.
    fn get_item(&self, key: &str) -> Option<String> {
        self.try_get_item(key).ok().flatten()
    }

    /// Sets the value for the given key, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the item with the given key.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Clears all items in the storage area.
    fn clear(&self) -> Result<()>;

    /// Returns the number of items in the storage area.
    fn len(&self) -> usize;

    /// Returns true when the area holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a vector of all keys in the storage area.
    fn keys(&self) -> Vec<String>;
}

/// Store for localStorage-like areas (one per scope).
pub trait LocalStore: Send + Sync {
    /// Retrieves the storage area for the given scope.
    fn area(&self, scope: &str) -> Result<Arc<dyn StorageArea>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryLocalStore;

    fn set(area: &Arc<dyn StorageArea>, k: &str, v: &str) {
        area.set_item(k, v).unwrap();
    }

    #[test]
    fn storagearea_basic_contract() {
        let store = InMemoryLocalStore::new();
        let area = store.area("https://example.com").unwrap();

        // starts empty
        assert!(area.is_empty());
        assert!(area.get_item("missing").is_none());
        assert!(matches!(area.try_get_item("missing"), Ok(None)));

        set(&area, "a", "1");
        set(&area, "b", "2");
        assert_eq!(area.len(), 2);
        assert_eq!(area.keys(), vec!["a".to_string(), "b".to_string()]);

        // overwrite keeps len()
        set(&area, "a", "ONE");
        assert_eq!(area.len(), 2);
        assert_eq!(area.get_item("a").as_deref(), Some("ONE"));

        area.remove_item("b").unwrap();
        assert_eq!(area.len(), 1);
        assert!(area.get_item("b").is_none());

        // removing a missing key is not an error
        area.remove_item("b").unwrap();

        area.clear().unwrap();
        assert!(area.is_empty());
    }
}
