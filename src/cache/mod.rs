//! # Cache Module
//!
//! Memoization layer for expensive metadata lookups.
//!
//! External platform queries (searches, playlist listings) are slow and
//! rate-limited, and many guilds tend to ask for the same things at the same
//! time. [`MetadataCache`] keeps resolved results in a TTL store and
//! collapses concurrent identical lookups into a single in-flight
//! computation.
//!
//! ## Guarantees
//!
//! - **TTL storage**: entries expire after their time-to-live and are
//!   recomputed lazily on the next access.
//! - **Single-flight**: for a given key, at most one computation runs at a
//!   time; concurrent callers wait and receive the stored result instead of
//!   issuing redundant external calls.
//! - **No error caching**: a failed computation is not stored, the next
//!   caller retries it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chorus::cache::MetadataCache;
//! use std::time::Duration;
//!
//! # async fn example() -> chorus::error::Result<()> {
//! let cache: MetadataCache<Vec<String>> = MetadataCache::new();
//!
//! let results = cache
//!     .wrap("search:queen", Duration::from_secs(3600), || async {
//!         // expensive platform lookup
//!         Ok(vec!["Bohemian Rhapsody".to_string()])
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod ttl_cache;

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub use ttl_cache::{CacheMetrics, TtlCache};

use crate::error::Result;

/// Memoizing wrapper around expensive lookups.
///
/// Values are stored per string key with a TTL; concurrent [`wrap`] calls
/// for the same key are serialized through a per-key gate so the underlying
/// computation runs at most once while its result is fresh.
///
/// [`wrap`]: MetadataCache::wrap
pub struct MetadataCache<V: Clone + Send + Sync + 'static> {
    store: TtlCache<String, V>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl<V: Clone + Send + Sync + 'static> MetadataCache<V> {
    pub fn new() -> Self {
        Self {
            store: TtlCache::new(),
            in_flight: DashMap::new(),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` exactly once
    /// (even under concurrent identical requests), stores its result with
    /// `ttl` and fans it out to all waiters.
    pub async fn wrap<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.store.get(&key.to_string()) {
            return Ok(value);
        }

        let gate = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        // Otro caller pudo completar el cómputo mientras esperábamos el gate.
        if let Some(value) = self.store.get(&key.to_string()) {
            return Ok(value);
        }

        debug!("💾 Cache miss, computando: {}", key);
        match compute().await {
            Ok(value) => {
                self.store
                    .insert_with_ttl(key.to_string(), value.clone(), Some(ttl));
                self.in_flight.remove(key);
                Ok(value)
            }
            Err(e) => {
                self.in_flight.remove(key);
                Err(e)
            }
        }
    }

    /// Direct read, no computation.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.store.get(&key.to_string())
    }

    /// Maintenance pass over expired entries.
    pub fn cleanup_expired(&self) -> usize {
        self.store.cleanup_expired()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.store.metrics()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for MetadataCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
