use moka::future::Cache;
use std::time::Duration;
use tokio::time::Instant;

use crate::utils::Coordinates;

/// Forecast payloads go stale quickly upstream.
pub const FORECAST_TTL: Duration = Duration::from_secs(15 * 60);
/// Place names barely change.
pub const LOCATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

/// Key-to-value store with lazy expiry.
///
/// An entry is served only while `now - stored_at < ttl`. Expired entries stay
/// in the store until the next `put` for the same key replaces them; there is no
/// capacity bound, so a long-running process keeps one slot per key it has seen.
#[derive(Clone)]
pub struct TtlCache<V> {
    entries: Cache<String, CacheEntry<V>>,
    ttl: Duration,
    name: &'static str,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().build(),
            ttl,
            name,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        match self.entries.get(key).await {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                tracing::debug!(cache = self.name, key, "Cache hit");
                Some(entry.value)
            }
            Some(_) => {
                tracing::debug!(cache = self.name, key, "Cache entry expired");
                None
            }
            None => {
                tracing::debug!(cache = self.name, key, "Cache miss");
                None
            }
        }
    }

    /// Store `value`, superseding whatever the key held before.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        self.entries.insert(key.into(), entry).await;
    }

    /// Number of slots held, fresh or expired.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

/// Derive `"<kind>-<lat>-<lon>[-<extra>]"` with coordinates rounded to two decimals.
///
/// Two decimals is roughly 1.1 km, so nearby requests share a slot.
pub fn cache_key(kind: &str, coords: Coordinates, extra: Option<&str>) -> String {
    // `+ 0.0` folds -0.0 into 0.0 so both land in one slot.
    let mut key = format!(
        "{}-{:.2}-{:.2}",
        kind,
        coords.latitude + 0.0,
        coords.longitude + 0.0
    );
    if let Some(extra) = extra {
        key.push('-');
        key.push_str(extra);
    }
    key
}

pub fn forecast_key(coords: Coordinates) -> String {
    cache_key("weather", coords, None)
}

pub fn geocode_key(coords: Coordinates, language: &str) -> String {
    cache_key("geocode", coords, Some(language))
}
