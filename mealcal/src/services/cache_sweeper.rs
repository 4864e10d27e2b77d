use tracing::debug;

use super::CalendarService;

/// Periodically drops cache entries that have gone unused for longer than
/// the retention window.
#[derive(Clone)]
pub struct CacheSweeper {
    calendar: CalendarService,
    interval_secs: u64,
}

impl CacheSweeper {
    pub fn new(calendar: CalendarService, interval_secs: u64) -> Self {
        Self {
            calendar,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Run a single sweep. Returns the number of entries evicted.
    pub fn run_once(&self) -> usize {
        let evicted = self.calendar.evict_expired();
        if evicted > 0 {
            debug!(
                evicted,
                remaining = self.calendar.cached_entries(),
                "evicted expired cache entries"
            );
        }
        evicted
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, StoreConfig};
    use crate::db::{Database, LibSqlBackend};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sweep_evicts_after_retention() {
        let store_config = StoreConfig::in_memory();
        let db = Database::new(&store_config).await.unwrap();
        let store = Arc::new(LibSqlBackend::new(db, &store_config));
        let calendar = CalendarService::new(store, &CacheConfig::default());
        let sweeper = CacheSweeper::new(calendar.clone(), 60);

        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        calendar.load_period(date).await.unwrap();
        assert_eq!(calendar.cached_entries(), 2);

        tokio::time::pause();
        tokio::time::advance(Duration::from_secs(1799)).await;
        assert_eq!(sweeper.run_once(), 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(sweeper.run_once(), 2);
        assert_eq!(calendar.cached_entries(), 0);
    }
}
