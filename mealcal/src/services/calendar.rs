use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cache::{
    with_retries, QueryCache, QueryKey, RetryFailure, RetryPolicy, MEALS_NAMESPACE,
    WEEKLY_MEMOS_NAMESPACE,
};
use crate::config::CacheConfig;
use crate::db::StoreBackend;
use crate::error::{MealError, Result};
use crate::models::{Lookup, Meal, UpsertMeal, UpsertWeeklyMemo, WeeklyMemo};
use crate::period::{self, Period};
use crate::view::PeriodView;

/// Cached reads and retried writes against the meal store.
///
/// Reads go through a [`QueryCache`] per collection. Every successful write
/// invalidates the whole namespace of the collection it touched, so the
/// next read of any range or week list goes back to the store.
#[derive(Clone)]
pub struct CalendarService {
    store: Arc<dyn StoreBackend>,
    meals: QueryCache<Vec<Meal>>,
    weekly_memos: QueryCache<Vec<WeeklyMemo>>,
    write_retry: RetryPolicy,
}

impl CalendarService {
    pub fn new(store: Arc<dyn StoreBackend>, config: &CacheConfig) -> Self {
        Self {
            store,
            meals: QueryCache::new(config),
            weekly_memos: QueryCache::new(config),
            write_retry: RetryPolicy::new(config.write_retries, config.retry_base()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StoreBackend> {
        &self.store
    }

    /// Meals dated `start..=end`, ordered by date then slot.
    pub async fn meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Meal>> {
        if start > end {
            return Err(MealError::Validation(format!(
                "range start {start} is after end {end}"
            )));
        }

        let store = Arc::clone(&self.store);
        self.meals
            .get_or_fetch(QueryKey::meals_in_range(start, end), move || {
                let store = Arc::clone(&store);
                async move { store.list_meals_in_range(start, end).await }
            })
            .await
    }

    /// Weekly memos for the given week starts, keyed by week start. Weeks
    /// without a memo are simply missing from the map.
    pub async fn weekly_memos(
        &self,
        week_starts: &[NaiveDate],
    ) -> Result<BTreeMap<NaiveDate, WeeklyMemo>> {
        let mut weeks = week_starts.to_vec();
        weeks.sort();
        weeks.dedup();
        if weeks.is_empty() {
            return Ok(BTreeMap::new());
        }

        let store = Arc::clone(&self.store);
        let key = QueryKey::weekly_memos(&weeks);
        let memos = self
            .weekly_memos
            .get_or_fetch(key, move || {
                let store = Arc::clone(&store);
                let weeks = weeks.clone();
                async move { store.list_weekly_memos(&weeks).await }
            })
            .await?;

        Ok(memos
            .into_iter()
            .map(|memo| (memo.week_start_date, memo))
            .collect())
    }

    pub async fn get_weekly_memo(&self, week_start: NaiveDate) -> Result<Lookup<WeeklyMemo>> {
        let mut memos = self.weekly_memos(&[week_start]).await?;
        Ok(memos.remove(&week_start).into())
    }

    /// Load everything shown for the period containing `date`. The two
    /// collections are read concurrently; if either fails the whole load
    /// fails.
    pub async fn load_period(&self, date: NaiveDate) -> Result<PeriodView> {
        let period = period::period_containing(date);
        self.load(period).await
    }

    pub async fn load(&self, period: Period) -> Result<PeriodView> {
        let week_starts = period.week_starts();
        let (meals, weekly_memos) = tokio::try_join!(
            self.meals_in_range(period.start_date, period.end_date),
            self.weekly_memos(&week_starts),
        )?;

        debug!(
            start = %period.start_date,
            meals = meals.len(),
            weekly_memos = weekly_memos.len(),
            "period loaded"
        );
        Ok(PeriodView::new(period, meals, weekly_memos.into_values()))
    }

    /// Create or update the memo for `(date, slot)`.
    pub async fn save_meal(&self, request: UpsertMeal) -> Result<Meal> {
        require_memo(&request.memo)?;

        let meal = with_retries(&self.write_retry, "upsert_meal", || {
            self.store.upsert_meal(&request)
        })
        .await
        .map_err(|failure| write_error(failure, WriteKind::Save("meal")))?;

        self.meals.invalidate_namespace(MEALS_NAMESPACE);
        info!(id = %meal.id, date = %meal.date, slot = %meal.slot, "meal saved");
        Ok(meal)
    }

    /// Delete a meal by id. Deleting an id that does not exist succeeds.
    pub async fn delete_meal(&self, id: &str) -> Result<()> {
        let removed = with_retries(&self.write_retry, "delete_meal", || {
            self.store.delete_meal(id)
        })
        .await
        .map_err(|failure| write_error(failure, WriteKind::Delete("meal")))?;

        self.meals.invalidate_namespace(MEALS_NAMESPACE);
        if removed {
            info!(id, "meal deleted");
        } else {
            debug!(id, "meal already absent");
        }
        Ok(())
    }

    pub async fn save_weekly_memo(&self, request: UpsertWeeklyMemo) -> Result<WeeklyMemo> {
        if !period::is_monday(request.week_start_date) {
            return Err(MealError::Validation(format!(
                "week start {} is not a Monday",
                request.week_start_date
            )));
        }
        require_memo(&request.memo)?;

        let memo = with_retries(&self.write_retry, "upsert_weekly_memo", || {
            self.store.upsert_weekly_memo(&request)
        })
        .await
        .map_err(|failure| write_error(failure, WriteKind::Save("weekly memo")))?;

        self.weekly_memos.invalidate_namespace(WEEKLY_MEMOS_NAMESPACE);
        info!(id = %memo.id, week = %memo.week_start_date, "weekly memo saved");
        Ok(memo)
    }

    pub async fn delete_weekly_memo(&self, id: &str) -> Result<()> {
        let removed = with_retries(&self.write_retry, "delete_weekly_memo", || {
            self.store.delete_weekly_memo(id)
        })
        .await
        .map_err(|failure| write_error(failure, WriteKind::Delete("weekly memo")))?;

        self.weekly_memos.invalidate_namespace(WEEKLY_MEMOS_NAMESPACE);
        if removed {
            info!(id, "weekly memo deleted");
        } else {
            debug!(id, "weekly memo already absent");
        }
        Ok(())
    }

    /// Drop cache entries past their retention window.
    pub fn evict_expired(&self) -> usize {
        self.meals.evict_expired() + self.weekly_memos.evict_expired()
    }

    pub fn cached_entries(&self) -> usize {
        self.meals.len() + self.weekly_memos.len()
    }
}

fn require_memo(memo: &str) -> Result<()> {
    if memo.trim().is_empty() {
        return Err(MealError::Validation("memo must not be empty".to_string()));
    }
    Ok(())
}

enum WriteKind {
    Save(&'static str),
    Delete(&'static str),
}

/// Configuration and validation problems pass through unchanged; anything
/// else is wrapped so the caller sees which mutation failed.
fn write_error(failure: RetryFailure, kind: WriteKind) -> MealError {
    let RetryFailure { attempts, error } = failure;
    if error.is_configuration()
        || matches!(error, MealError::Validation(_) | MealError::Conflict(_))
    {
        return error;
    }

    tracing::error!(attempts, error = %error, "store write failed");
    let source = Box::new(error);
    match kind {
        WriteKind::Save(what) => MealError::SaveFailed { what, source },
        WriteKind::Delete(what) => MealError::DeleteFailed { what, source },
    }
}
