//! Single-entry query cache with explicit invalidation.
//!
//! A [`QueryCache`] holds at most one value and moves between three states:
//!
//! | from   | event          | to     |
//! |--------|----------------|--------|
//! | absent | fetch success  | fresh  |
//! | fresh  | invalidate     | stale  |
//! | stale  | fetch success  | fresh  |
//! | any    | fetch failure  | (unchanged) |
//!
//! Invalidation never fetches. Any number of invalidations before the next
//! [`QueryCache::get_or_fetch`] collapse into a single fetch. Fetches are
//! single-flighted: a caller that waited behind an in-flight fetch reuses its
//! result if that result landed fresh.
//!
//! A value whose fetch overlapped an invalidation is handed to its caller but
//! stored as stale, so the next read goes back to the network.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Observable state of a [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Absent,
    Fresh,
    Stale,
}

#[derive(Debug)]
struct Entry<V> {
    value: Option<V>,
    stale: bool,
    /// Bumped on every invalidation
    generation: u64,
}

#[derive(Debug)]
pub struct QueryCache<V> {
    key: &'static str,
    entry: Mutex<Entry<V>>,
    gate: tokio::sync::Mutex<()>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            entry: Mutex::new(Entry { value: None, stale: false, generation: 0 }),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    fn entry(&self) -> MutexGuard<'_, Entry<V>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CacheState {
        let entry = self.entry();
        match (&entry.value, entry.stale) {
            (None, _) => CacheState::Absent,
            (Some(_), false) => CacheState::Fresh,
            (Some(_), true) => CacheState::Stale,
        }
    }

    /// Last stored value, fresh or stale.
    pub fn peek(&self) -> Option<V> {
        self.entry().value.clone()
    }

    fn fresh(&self) -> Option<V> {
        let entry = self.entry();
        if entry.stale {
            return None;
        }
        entry.value.clone()
    }

    /// Marks the entry stale. Idempotent; an absent entry stays absent.
    pub fn invalidate(&self) {
        let mut entry = self.entry();
        entry.generation += 1;
        if entry.value.is_some() && !entry.stale {
            log::debug!("cache[{}]: fresh -> stale", self.key);
        }
        entry.stale = true;
    }

    /// Returns the fresh value, or runs `fetch` and stores its result.
    ///
    /// Fetch errors are returned as-is and leave the entry untouched.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.fresh() {
            return Ok(v);
        }

        let _gate = self.gate.lock().await;

        // Someone else may have refreshed the entry while we waited
        if let Some(v) = self.fresh() {
            return Ok(v);
        }

        let started_at = self.entry().generation;
        log::debug!("cache[{}]: fetching", self.key);
        let value = fetch().await?;

        let mut entry = self.entry();
        entry.value = Some(value.clone());
        entry.stale = entry.generation != started_at;
        if entry.stale {
            log::debug!("cache[{}]: invalidated during fetch, stored as stale", self.key);
        } else {
            log::debug!("cache[{}]: stored fresh", self.key);
        }
        Ok(value)
    }
}
