use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::QueryKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    /// Age in whole seconds. Clock skew reads as zero.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.cached_at).num_seconds().max(0)
    }

    /// Stale once strictly older than `stale_after`. A zero `stale_after`
    /// makes every entry stale.
    pub fn is_stale(&self, stale_after: Duration) -> bool {
        if stale_after.is_zero() {
            return true;
        }
        let age = (Utc::now() - self.cached_at).to_std().unwrap_or(Duration::ZERO);
        age > stale_after
    }
}

/// In-memory store of successful read results.
///
/// Values are kept as JSON so one cache can hold every response type.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CachedData<serde_json::Value>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<CachedData<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let cached = entries.get(key)?;
        match serde_json::from_value(cached.data.clone()) {
            Ok(data) => Some(CachedData {
                data,
                cached_at: cached.cached_at,
            }),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Cached value younger than `stale_after`, if any.
    pub fn fresh<T: DeserializeOwned>(&self, key: &QueryKey, stale_after: Duration) -> Option<T> {
        self.get(key)
            .filter(|cached: &CachedData<T>| !cached.is_stale(stale_after))
            .map(|cached| {
                debug!(key = %key, age_secs = cached.age_secs(), "Cache hit");
                cached.data
            })
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => {
                let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                entries.insert(key, CachedData::new(value));
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to cache query result"),
        }
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "Evicted cached query");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_cached_data_age_secs() {
        let mut cached = CachedData::new(1);
        cached.cached_at = Utc::now() - ChronoDuration::seconds(90);
        assert!(cached.age_secs() >= 90);
        cached.cached_at = Utc::now() + ChronoDuration::minutes(5);
        assert_eq!(cached.age_secs(), 0);
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale(Duration::from_secs(60)));
        assert!(fresh.is_stale(Duration::ZERO));

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - ChronoDuration::seconds(61);
        assert!(old.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_insert_get_remove() {
        let cache = QueryCache::new();
        let key = QueryKey::interview("int_1");
        cache.insert(key.clone(), &vec!["a".to_string()]);

        let cached: CachedData<Vec<String>> = cache.get(&key).unwrap();
        assert_eq!(cached.data, vec!["a".to_string()]);
        assert!(cache.get::<u32>(&key).is_none());

        assert!(cache.remove(&key));
        assert!(!cache.remove(&key));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fresh_respects_stale_time() {
        let cache = QueryCache::new();
        let key = QueryKey::interviews();
        cache.insert(key.clone(), &3u32);
        assert_eq!(cache.fresh::<u32>(&key, Duration::from_secs(60)), Some(3));
        assert_eq!(cache.fresh::<u32>(&key, Duration::ZERO), None);
    }
}
