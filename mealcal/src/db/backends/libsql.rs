use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::StoreConfig;
use crate::db::connection::Database;
use crate::db::repository::{MealRepository, PreferenceRepository, WeeklyMemoRepository};
use crate::db::schema;
use crate::db::traits::{MealStore, PreferenceStore, StoreBackend, WeeklyMemoStore};
use crate::error::{MealError, Result};
use crate::models::{Lookup, Meal, MealKey, UpsertMeal, UpsertWeeklyMemo, WeeklyMemo};

pub struct LibSqlBackend {
    db: Database,
    request_timeout: Duration,
}

impl LibSqlBackend {
    pub fn new(db: Database, config: &StoreConfig) -> Self {
        Self {
            db,
            request_timeout: config.request_timeout(),
        }
    }

    /// Run one store request under the per-request timeout and map raw
    /// libSQL failures onto the store error taxonomy.
    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tracing::debug!(op, "store request");
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result.map_err(MealError::classify),
            Err(_) => {
                let timeout_secs = self.request_timeout.as_secs();
                tracing::warn!(op, timeout_secs, "store request timed out");
                Err(MealError::Timeout(timeout_secs))
            }
        }
    }
}

/// A read against a collection that was never provisioned has nothing to
/// return; only writes treat the missing table as an error.
fn soft_read<T>(result: Result<T>, empty: impl FnOnce() -> T) -> Result<T> {
    match result {
        Err(MealError::MissingCollection(table)) => {
            tracing::warn!(table = %table, "collection not provisioned, treating read as empty");
            Ok(empty())
        }
        other => other,
    }
}

#[async_trait]
impl MealStore for LibSqlBackend {
    async fn list_meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Meal>> {
        let result = self
            .run("list_meals_in_range", async {
                let conn = self.db.connect()?;
                MealRepository::list_in_range(&conn, start, end).await
            })
            .await;
        soft_read(result, Vec::new)
    }

    async fn get_meal(&self, key: MealKey) -> Result<Lookup<Meal>> {
        let result = self
            .run("get_meal", async {
                let conn = self.db.connect()?;
                MealRepository::get_by_key(&conn, key).await.map(Lookup::from)
            })
            .await;
        soft_read(result, || Lookup::Absent)
    }

    async fn upsert_meal(&self, meal: &UpsertMeal) -> Result<Meal> {
        self.run("upsert_meal", async {
            let conn = self.db.connect()?;
            MealRepository::upsert(&conn, meal).await
        })
        .await
    }

    async fn delete_meal(&self, id: &str) -> Result<bool> {
        self.run("delete_meal", async {
            let conn = self.db.connect()?;
            MealRepository::delete(&conn, id).await
        })
        .await
    }
}

#[async_trait]
impl WeeklyMemoStore for LibSqlBackend {
    async fn get_weekly_memo(&self, week_start: NaiveDate) -> Result<Lookup<WeeklyMemo>> {
        let result = self
            .run("get_weekly_memo", async {
                let conn = self.db.connect()?;
                WeeklyMemoRepository::get_by_week_start(&conn, week_start)
                    .await
                    .map(Lookup::from)
            })
            .await;
        soft_read(result, || Lookup::Absent)
    }

    async fn list_weekly_memos(&self, week_starts: &[NaiveDate]) -> Result<Vec<WeeklyMemo>> {
        let result = self
            .run("list_weekly_memos", async {
                let conn = self.db.connect()?;
                WeeklyMemoRepository::list_by_week_starts(&conn, week_starts).await
            })
            .await;
        soft_read(result, Vec::new)
    }

    async fn upsert_weekly_memo(&self, memo: &UpsertWeeklyMemo) -> Result<WeeklyMemo> {
        self.run("upsert_weekly_memo", async {
            let conn = self.db.connect()?;
            WeeklyMemoRepository::upsert(&conn, memo).await
        })
        .await
    }

    async fn delete_weekly_memo(&self, id: &str) -> Result<bool> {
        self.run("delete_weekly_memo", async {
            let conn = self.db.connect()?;
            WeeklyMemoRepository::delete(&conn, id).await
        })
        .await
    }
}

#[async_trait]
impl StoreBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }

    async fn ping(&self) -> Result<()> {
        self.run("ping", async {
            let conn = self.db.connect()?;
            let mut rows = conn.query("SELECT 1", ()).await?;
            rows.next().await?;
            Ok(())
        })
        .await
    }
}

/// Preferences kept in a local libSQL file, independent of the remote store.
pub struct LibSqlPreferences {
    db: Database,
}

impl LibSqlPreferences {
    pub async fn open(url: &str) -> Result<Self> {
        let db = Database::open_local(url).await?;
        let conn = db.connect()?;
        schema::create_preferences_table(&conn).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl PreferenceStore for LibSqlPreferences {
    async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.connect()?;
        PreferenceRepository::get(&conn, key).await
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connect()?;
        PreferenceRepository::set(&conn, key, value).await
    }
}
