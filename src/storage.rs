//! Durable client-side storage.
//!
//! This module defines the key/value storage the tracker keeps its anonymous
//! identity and last session snapshot in. It mirrors the DOM's `localStorage`:
//! string keys, string values, one isolated area per storage scope.
//!
//! # Concepts
//!
//! - A [`StorageArea`] is a single key/value namespace with `get_item`,
//!   `set_item`, `remove_item` and `clear`.
//! - A [`LocalStore`] mints areas per *scope* (for example the origin of the
//!   analytics service). The same scope always yields the same logical area,
//!   different scopes never see each other's keys.
//!
//! # Choosing a backend
//!
//! - For persistent storage, use [`SqliteLocalStore`] (feature `sqlite_store`).
//! - For tests, ephemeral runs, or when the database cannot be opened, use
//!   [`InMemoryLocalStore`].
//!
//! # Example
//!
//! ```no_run
//! use session_tracker::storage::{InMemoryLocalStore, LocalStore};
//!
//! let store = InMemoryLocalStore::new();
//! let area = store.area("http://localhost:3000").unwrap();
//! area.set_item("greeting", "hello").unwrap();
//! assert_eq!(area.get_item("greeting").as_deref(), Some("hello"));
//! ```

/// Storage area module, defining the key/value storage interface.
pub mod area;

/// Local storage backends.
pub mod local {
    /// In-memory local storage implementation.
    pub mod in_memory;
    /// SQLite-backed local storage implementation.
    #[cfg(feature = "sqlite_store")]
    pub mod sqlite_store;
}

pub use area::{LocalStore, StorageArea};
pub use local::in_memory::InMemoryLocalStore;
#[cfg(feature = "sqlite_store")]
pub use local::sqlite_store::SqliteLocalStore;
