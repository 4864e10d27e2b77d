use chrono::{DateTime, NaiveDate, Utc};
use libsql::{params, Connection, Row};
use nanoid::nanoid;

use crate::error::{MealError, Result};
use crate::models::{Meal, MealKey, Slot, UpsertMeal};

const MEAL_COLUMNS: &str = "id, date, meal_type, memo, created_at, updated_at";

/// Slot enumeration order, kept in step with `Slot::ordinal`.
const SLOT_ORDER: &str = "CASE meal_type \
     WHEN 'breakfast' THEN 0 \
     WHEN 'lunch' THEN 1 \
     WHEN 'dinner' THEN 2 \
     ELSE 3 END";

pub struct MealRepository;

impl MealRepository {
    pub async fn list_in_range(
        conn: &Connection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Meal>> {
        let sql = format!(
            "SELECT {MEAL_COLUMNS} FROM meals \
             WHERE date >= ?1 AND date <= ?2 \
             ORDER BY date ASC, {SLOT_ORDER} ASC"
        );
        let mut rows = conn
            .query(&sql, params![start.to_string(), end.to_string()])
            .await?;

        let mut meals = Vec::new();
        while let Some(row) = rows.next().await? {
            meals.push(Self::row_to_meal(&row)?);
        }
        Ok(meals)
    }

    pub async fn get_by_key(conn: &Connection, key: MealKey) -> Result<Option<Meal>> {
        let sql = format!("SELECT {MEAL_COLUMNS} FROM meals WHERE date = ?1 AND meal_type = ?2");
        let mut rows = conn
            .query(&sql, params![key.date.to_string(), key.slot.as_str()])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_meal(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Insert a meal, or replace the memo of the one already stored under
    /// the same `(date, slot)`. The stored id and `created_at` survive.
    pub async fn upsert(conn: &Connection, meal: &UpsertMeal) -> Result<Meal> {
        let id = meal.id.clone().unwrap_or_else(|| nanoid!());
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO meals (id, date, meal_type, memo, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(date, meal_type) DO UPDATE SET
                memo = excluded.memo,
                updated_at = excluded.updated_at
            RETURNING {MEAL_COLUMNS}
            "#
        );

        let mut rows = conn
            .query(
                &sql,
                params![
                    id,
                    meal.date.to_string(),
                    meal.slot.as_str(),
                    meal.memo.clone(),
                    now,
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_meal(&row),
            None => Err(MealError::Internal(format!(
                "Upsert of meal {} returned no row",
                meal.key().date
            ))),
        }
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])
            .await?;

        Ok(rows_affected > 0)
    }

    fn row_to_meal(row: &Row) -> Result<Meal> {
        let date: String = row.get(1)?;
        let slot: String = row.get(2)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        Ok(Meal {
            id: row.get(0)?,
            date: parse_date(&date)?,
            slot: slot.parse::<Slot>().map_err(MealError::Internal)?,
            memo: row.get(3)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| MealError::Internal(format!("Invalid stored date '{value}': {e}")))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MealError::Internal(format!("Invalid stored timestamp '{value}': {e}")))
}
