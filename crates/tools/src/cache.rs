//! Read-through availability cache
//!
//! Time-selection re-checks availability on every attempt; this cache keeps
//! those re-checks from hammering the directory (and, eventually, a live
//! scheduling backend) while a caller deliberates. Entries expire on a short
//! TTL so a conflict discovered elsewhere shows up within seconds.

use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use frontdesk_directory::Directory;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CachedTimes {
    times: Vec<NaiveTime>,
    fetched_at: Instant,
}

pub struct AvailabilityCache {
    directory: Arc<Directory>,
    ttl: Duration,
    entries: DashMap<(String, NaiveDate), CachedTimes>,
}

impl AvailabilityCache {
    pub fn new(directory: Arc<Directory>, ttl: Duration) -> Self {
        Self {
            directory,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Slot times for a provider-day, from cache when fresh
    pub fn times_for(&self, provider_id: &str, date: NaiveDate) -> Vec<NaiveTime> {
        let key = (provider_id.to_string(), date);

        if let Some(entry) = self.entries.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                return entry.times.clone();
            }
        }

        let times = self.directory.available_times(provider_id, date);
        tracing::debug!(
            provider_id = %provider_id,
            date = %date,
            count = times.len(),
            "availability cache refresh"
        );
        self.entries.insert(
            key,
            CachedTimes {
                times: times.clone(),
                fetched_at: Instant::now(),
            },
        );
        times
    }

    /// Drop a cached provider-day, forcing a refetch on next read. Called
    /// after a booking lands on that day.
    pub fn invalidate(&self, provider_id: &str, date: NaiveDate) {
        self.entries.remove(&(provider_id.to_string(), date));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_directory::SlotRules;

    fn cache(ttl: Duration) -> AvailabilityCache {
        let directory = Arc::new(Directory::with_defaults(SlotRules::default()));
        AvailabilityCache::new(directory, ttl)
    }

    #[test]
    fn test_read_through() {
        let cache = cache(Duration::from_secs(30));
        // A Tuesday; Dr. Patel works 09:00-17:00.
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();

        let first = cache.times_for("dr-patel", date);
        assert!(!first.is_empty());
        let second = cache.times_for("dr-patel", date);
        assert_eq!(first, second);
    }

    #[test]
    fn test_expired_entry_refetches() {
        let cache = cache(Duration::from_secs(0));
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();

        // TTL zero means every read goes to the directory; still consistent.
        let first = cache.times_for("dr-patel", date);
        let second = cache.times_for("dr-patel", date);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalidate() {
        let cache = cache(Duration::from_secs(30));
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();

        cache.times_for("dr-patel", date);
        cache.invalidate("dr-patel", date);
        assert!(!cache.entries.contains_key(&("dr-patel".to_string(), date)));
    }

    #[test]
    fn test_unknown_provider_is_empty() {
        let cache = cache(Duration::from_secs(30));
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert!(cache.times_for("dr-nobody", date).is_empty());
    }
}
