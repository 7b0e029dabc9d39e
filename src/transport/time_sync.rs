//! Server clock synchronisation.
//!
//! Signatures embed a unix timestamp that the API rejects when it drifts
//! from server time. The offset between local and server clocks is measured
//! against `GET /json/time` and cached per base URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::http::HttpTransport;
use crate::core::{AmegoError, ServerTime};

/// How long a measured offset stays valid.
pub const DEFAULT_OFFSET_TTL: Duration = Duration::from_secs(5 * 60);

pub const TIME_ENDPOINT: &str = "/json/time";

#[derive(Debug, Clone, Copy)]
struct CachedOffset {
    offset: i64,
    synced_at: Instant,
}

/// Shared cache of clock offsets keyed by base URL.
///
/// Clones share the same entries. [`ClockOffsetCache::shared`] returns the
/// process-wide instance every client uses unless given its own.
#[derive(Debug, Clone)]
pub struct ClockOffsetCache {
    entries: Arc<Mutex<HashMap<String, CachedOffset>>>,
    ttl: Duration,
}

impl Default for ClockOffsetCache {
    fn default() -> Self {
        Self::new(DEFAULT_OFFSET_TTL)
    }
}

impl ClockOffsetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// The process-wide cache.
    pub fn shared() -> Self {
        static SHARED: OnceLock<ClockOffsetCache> = OnceLock::new();
        SHARED.get_or_init(ClockOffsetCache::default).clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedOffset>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached offset for `key` if it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<i64> {
        self.lock()
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.synced_at) < self.ttl)
            .map(|entry| entry.offset)
    }

    pub fn insert(&self, key: impl Into<String>, offset: i64) {
        self.lock().insert(
            key.into(),
            CachedOffset {
                offset,
                synced_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }
}

/// Local unix time in whole seconds.
pub fn local_unix_time() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Produces signing timestamps aligned with the server clock.
#[derive(Debug, Clone)]
pub struct ClockSync {
    transport: HttpTransport,
    cache: ClockOffsetCache,
}

impl ClockSync {
    pub fn new(transport: HttpTransport, cache: ClockOffsetCache) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &ClockOffsetCache {
        &self.cache
    }

    fn key(&self) -> &str {
        self.transport.base_url()
    }

    /// Unix seconds to sign with. `skip_sync` uses the local clock as is.
    pub async fn current_timestamp(&self, skip_sync: bool) -> Result<i64, AmegoError> {
        if skip_sync {
            return Ok(local_unix_time());
        }

        let offset = match self.cache.get(self.key()) {
            Some(offset) => offset,
            None => self.sync().await?,
        };
        Ok(local_unix_time() + offset)
    }

    /// Drop the cached offset and measure it again.
    pub async fn force_resync(&self) -> Result<i64, AmegoError> {
        self.cache.clear(self.key());
        self.sync().await
    }

    async fn sync(&self) -> Result<i64, AmegoError> {
        let offset = measure_offset(&self.transport).await?.0;
        self.cache.insert(self.key(), offset);
        debug!(base_url = %self.key(), offset, "Clock offset synced");
        Ok(offset)
    }
}

/// Fetch the server time.
pub async fn fetch_server_time(transport: &HttpTransport) -> Result<ServerTime, AmegoError> {
    let (_, body) = transport.get_json(TIME_ENDPOINT).await?;
    serde_json::from_value(body)
        .map_err(|e| AmegoError::InvalidResponse(format!("server time: {e}")))
}

/// Measure `server - midpoint(local_before, local_after)` in seconds,
/// without touching any cache.
pub async fn measure_offset(transport: &HttpTransport) -> Result<(i64, ServerTime), AmegoError> {
    let before = local_unix_time();
    let server = fetch_server_time(transport).await?;
    let after = local_unix_time();
    Ok((server.timestamp - (before + after).div_euclid(2), server))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ClockOffsetCache::new(Duration::from_secs(300));
        cache.insert("https://invoice-api.amego.tw", 7);

        let now = Instant::now();
        assert_eq!(cache.get_at("https://invoice-api.amego.tw", now), Some(7));
        assert_eq!(
            cache.get_at("https://invoice-api.amego.tw", now + Duration::from_secs(301)),
            None
        );
    }

    #[test]
    fn keys_are_independent() {
        let cache = ClockOffsetCache::default();
        cache.insert("http://a", 1);
        cache.insert("http://b", -2);
        cache.clear("http://a");
        assert_eq!(cache.get("http://a"), None);
        assert_eq!(cache.get("http://b"), Some(-2));
        cache.clear_all();
        assert_eq!(cache.get("http://b"), None);
    }

    #[test]
    fn clones_share_entries() {
        let cache = ClockOffsetCache::default();
        let other = cache.clone();
        cache.insert("http://a", 3);
        assert_eq!(other.get("http://a"), Some(3));
    }

    #[test]
    fn shared_cache_is_process_wide() {
        ClockOffsetCache::shared().insert("http://shared-cache-test", 11);
        assert_eq!(ClockOffsetCache::shared().get("http://shared-cache-test"), Some(11));
        ClockOffsetCache::shared().clear("http://shared-cache-test");
    }
}
