use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension};

use crate::storage::area::{LocalStore, StorageArea};

/// SQLite-based local storage implementation
pub struct SqliteLocalStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteLocalStore {
    /// Creates (or opens) a SQLite local store at the specified database file path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE |
                    OpenFlags::SQLITE_OPEN_CREATE |
                    OpenFlags::SQLITE_OPEN_URI
            )
            .with_init(|c| {
                c.busy_timeout(Duration::from_millis(500))?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS local_storage (
                        scope TEXT NOT NULL,
                        key TEXT NOT NULL,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
                        PRIMARY KEY(scope, key)
                    );"
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        Ok(Self { pool })
    }
}

impl LocalStore for SqliteLocalStore {
    fn area(&self, scope: &str) -> Result<Arc<dyn StorageArea>> {
        Ok(Arc::new(SqliteLocalArea {
            pool: self.pool.clone(),
            scope: scope.to_string(),
        }))
    }
}

struct SqliteLocalArea {
    pool: Pool<SqliteConnectionManager>,
    scope: String,
}

impl SqliteLocalArea {
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn count(&self) -> Result<usize> {
        let n: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM local_storage WHERE scope=?1",
            params![self.scope],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n)?)
    }

    fn key_list(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM local_storage WHERE scope=?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![self.scope], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl StorageArea for SqliteLocalArea {
    fn try_get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM local_storage WHERE scope=?1 AND key=?2",
                params![self.scope, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO local_storage(scope,key,value) VALUES (?1,?2,?3)
             ON CONFLICT(scope,key) DO UPDATE
             SET value=excluded.value, updated_at=strftime('%s','now')",
            params![self.scope, key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.conn()?.execute(
            "DELETE FROM local_storage WHERE scope=?1 AND key=?2",
            params![self.scope, key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM local_storage WHERE scope=?1", params![self.scope])?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.count().unwrap_or_else(|e| {
            log::warn!("storage[{}]: cannot count items: {}", self.scope, e);
            0
        })
    }

    fn keys(&self) -> Vec<String> {
        self.key_list().unwrap_or_else(|e| {
            log::warn!("storage[{}]: cannot list keys: {}", self.scope, e);
            Vec::new()
        })
    }
}
