#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use mealcal::config::{CacheConfig, StoreConfig};
use mealcal::db::{Database, LibSqlBackend, StoreBackend};
use mealcal::services::CalendarService;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Store config pointing at a fresh libSQL file inside `dir`.
pub fn file_store_config(dir: &TempDir) -> StoreConfig {
    let path = dir.path().join("meals.db");
    StoreConfig {
        url: format!("file:{}", path.to_str().unwrap()),
        access_key: None,
        request_timeout_secs: 10,
        provision_schema: true,
    }
}

pub async fn open_store(config: &StoreConfig) -> Arc<dyn StoreBackend> {
    let db = Database::new(config)
        .await
        .expect("Failed to open store");
    Arc::new(LibSqlBackend::new(db, config))
}

pub fn calendar(store: Arc<dyn StoreBackend>) -> CalendarService {
    let cache = CacheConfig {
        retry_base_ms: 10,
        ..CacheConfig::default()
    };
    CalendarService::new(store, &cache)
}
