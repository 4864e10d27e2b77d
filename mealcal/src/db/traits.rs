use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Lookup, Meal, MealKey, UpsertMeal, UpsertWeeklyMemo, WeeklyMemo};

// ---------------------------------------------------------------------------
// Collection stores
// ---------------------------------------------------------------------------

/// Range reads, point reads and natural-key upserts for meal records.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Meals with `start <= date <= end`, ordered by date then slot.
    async fn list_meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Meal>>;
    async fn get_meal(&self, key: MealKey) -> Result<Lookup<Meal>>;
    async fn upsert_meal(&self, meal: &UpsertMeal) -> Result<Meal>;
    /// Returns whether a record was removed.
    async fn delete_meal(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait WeeklyMemoStore: Send + Sync {
    async fn get_weekly_memo(&self, week_start: NaiveDate) -> Result<Lookup<WeeklyMemo>>;
    async fn list_weekly_memos(&self, week_starts: &[NaiveDate]) -> Result<Vec<WeeklyMemo>>;
    async fn upsert_weekly_memo(&self, memo: &UpsertWeeklyMemo) -> Result<WeeklyMemo>;
    async fn delete_weekly_memo(&self, id: &str) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// The remote store: both collections plus lifecycle operations.
#[async_trait]
pub trait StoreBackend: MealStore + WeeklyMemoStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<()>;
}

/// Local key-value persistence for client preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_preference(&self, key: &str) -> Result<Option<String>>;
    async fn set_preference(&self, key: &str, value: &str) -> Result<()>;
}
