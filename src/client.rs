//! Session/event tracking client.
//!
//! [`TrackerClient`] wraps a [`Transport`] with identity management, a durable
//! snapshot of the last created session and the `latestReport` cache. It is
//! built explicitly with an injected transport and [`StorageArea`], so two
//! clients never share state unless they share a storage area.
//!
//! # Example
//!
//! ```no_run
//! use session_tracker::{ClientConfig, TrackerClient};
//!
//! # async fn run() -> Result<(), session_tracker::TrackerError> {
//! let client = TrackerClient::connect(&ClientConfig::from_env()?)?;
//!
//! let session = client.create_session_for_current_user(None).await?;
//! client.log_event_for_session(&session.id, "click", None, None).await?;
//!
//! let report = client.get_latest_report().await?;
//! println!("{} sessions", report.data.total_sessions);
//! # Ok(()) }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::{CacheState, QueryCache};
use crate::config::ClientConfig;
use crate::errors::TrackerError;
use crate::model::{AnonymousId, Event, JsonObject, ReportRecord, Session};
use crate::net::{HttpTransport, Transport};
use crate::storage::{InMemoryLocalStore, LocalStore, StorageArea};

/// Storage key holding the anonymous id.
pub const ANON_KEY: &str = "ia_anonymous_id";
/// Storage key holding the serialized last created session.
pub const SESSION_CACHE_KEY: &str = "ia_session_json";
/// Cache key of the report entry.
pub const REPORT_CACHE_KEY: &str = "latestReport";

pub struct TrackerClient<T = HttpTransport> {
    transport: T,
    storage: Arc<dyn StorageArea>,
    report: QueryCache<ReportRecord>,
    /// Identity minted while storage refused reads or writes
    fallback_id: Mutex<Option<AnonymousId>>,
}

impl TrackerClient<HttpTransport> {
    /// Builds an HTTP client and opens the storage named by `config`.
    ///
    /// A durable store that cannot be opened is replaced by in-memory storage.
    pub fn connect(config: &ClientConfig) -> Result<Self, TrackerError> {
        let transport = HttpTransport::new(config)?;
        let storage = open_storage(config);
        Ok(Self::new(transport, storage))
    }
}

fn open_storage(config: &ClientConfig) -> Arc<dyn StorageArea> {
    let scope = config.origin();

    #[cfg(feature = "sqlite_store")]
    {
        if let Some(path) = &config.storage_path {
            match crate::storage::SqliteLocalStore::new(path).and_then(|store| store.area(&scope)) {
                Ok(area) => return area,
                Err(e) => log::warn!(
                    "cannot open storage at {}: {}; continuing without persistence",
                    path.display(),
                    e
                ),
            }
        }
    }

    #[cfg(not(feature = "sqlite_store"))]
    {
        if let Some(path) = &config.storage_path {
            log::warn!(
                "durable storage at {} requested but the sqlite_store feature is disabled",
                path.display()
            );
        }
    }

    InMemoryLocalStore::new().area_for(&scope)
}

impl<T: Transport> TrackerClient<T> {
    pub fn new(transport: T, storage: Arc<dyn StorageArea>) -> Self {
        Self {
            transport,
            storage,
            report: QueryCache::new(REPORT_CACHE_KEY),
            fallback_id: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn storage(&self) -> &Arc<dyn StorageArea> {
        &self.storage
    }

    /// Returns the persisted anonymous id, minting and persisting one if none exists.
    ///
    /// An existing id is never overwritten. When the storage cannot be read, or refuses
    /// the write, the id lives in this client only so repeated calls still agree. An
    /// unreadable storage is never written to.
    pub fn get_or_create_anonymous_id(&self) -> AnonymousId {
        let stored = match self.storage.try_get_item(ANON_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("cannot read anonymous id: {}; using an in-memory id", e);
                return self.fallback_anonymous_id();
            }
        };
        if let Some(id) = stored.filter(|v| !v.is_empty()) {
            return AnonymousId::from(id);
        }

        let mut fallback = self.fallback_id.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = fallback.as_ref() {
            return id.clone();
        }

        let id = AnonymousId::generate();
        match self.storage.set_item(ANON_KEY, id.as_str()) {
            Ok(()) => log::info!("created anonymous id {}", id),
            Err(e) => {
                log::warn!("cannot persist anonymous id: {}; keeping it in memory", e);
                *fallback = Some(id.clone());
            }
        }
        id
    }

    fn fallback_anonymous_id(&self) -> AnonymousId {
        self.fallback_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(AnonymousId::generate)
            .clone()
    }

    /// Creates a session for the current visitor and caches it.
    ///
    /// On success the session snapshot is written to storage and the report is
    /// marked stale. Transport failures are returned unchanged and leave both
    /// the snapshot and the report cache alone.
    pub async fn create_session_for_current_user(
        &self,
        metadata: Option<&JsonObject>,
    ) -> Result<Session, TrackerError> {
        let anonymous_id = self.get_or_create_anonymous_id();
        let session = self.transport.create_session(&anonymous_id, metadata).await?;
        log::info!("created session {} for {}", session.id, anonymous_id);

        self.store_session(&session);
        self.report.invalidate();
        Ok(session)
    }

    fn store_session(&self, session: &Session) {
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("cannot serialize session {}: {}", session.id, e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(SESSION_CACHE_KEY, &raw) {
            log::warn!("cannot persist session {}: {}", session.id, e);
        }
    }

    /// Logs one event and marks the report stale on success.
    pub async fn log_event_for_session(
        &self,
        session_id: &str,
        event_type: &str,
        metadata: Option<&JsonObject>,
        data: Option<&JsonObject>,
    ) -> Result<Event, TrackerError> {
        let event = self
            .transport
            .log_event(session_id, event_type, metadata, data)
            .await?;
        log::debug!("logged {} event {} in session {}", event.event_type, event.id, session_id);

        self.report.invalidate();
        Ok(event)
    }

    /// Returns the cached report if fresh, otherwise fetches and caches it.
    pub async fn get_latest_report(&self) -> Result<ReportRecord, TrackerError> {
        self.report
            .get_or_fetch(|| self.transport.fetch_report())
            .await
    }

    /// Marks the report stale without fetching.
    pub fn invalidate_report(&self) {
        self.report.invalidate();
    }

    pub fn report_state(&self) -> CacheState {
        self.report.state()
    }

    /// Last fetched report, even when stale.
    pub fn peek_report(&self) -> Option<ReportRecord> {
        self.report.peek()
    }

    /// Reads the session snapshot, surfacing malformed JSON as [`TrackerError::CorruptCache`].
    pub fn read_cached_session(&self) -> Result<Option<Session>, TrackerError> {
        let Some(raw) = self.storage.get_item(SESSION_CACHE_KEY) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| TrackerError::CorruptCache(e.to_string()))
    }

    /// Reads the session snapshot. A missing or malformed snapshot is reported as `None`.
    pub fn get_cached_session(&self) -> Option<Session> {
        match self.read_cached_session() {
            Ok(session) => session,
            Err(e) => {
                log::debug!("ignoring cached session: {}", e);
                None
            }
        }
    }

    /// Removes the anonymous id and the session snapshot, as clearing browser storage would.
    pub fn forget_identity(&self) {
        for key in [ANON_KEY, SESSION_CACHE_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                log::warn!("cannot remove {} from storage: {}", key, e);
            }
        }
        *self.fallback_id.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
