use chrono::{NaiveDate, Utc};
use libsql::{params, Connection, Row};
use nanoid::nanoid;

use super::meals::{parse_date, parse_timestamp};
use crate::error::{MealError, Result};
use crate::models::{UpsertWeeklyMemo, WeeklyMemo};

const MEMO_COLUMNS: &str = "id, week_start_date, memo, created_at, updated_at";

pub struct WeeklyMemoRepository;

impl WeeklyMemoRepository {
    pub async fn get_by_week_start(
        conn: &Connection,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyMemo>> {
        let sql = format!("SELECT {MEMO_COLUMNS} FROM weekly_memos WHERE week_start_date = ?1");
        let mut rows = conn.query(&sql, params![week_start.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_memo(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_by_week_starts(
        conn: &Connection,
        week_starts: &[NaiveDate],
    ) -> Result<Vec<WeeklyMemo>> {
        if week_starts.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=week_starts.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {MEMO_COLUMNS} FROM weekly_memos \
             WHERE week_start_date IN ({placeholders}) \
             ORDER BY week_start_date ASC"
        );
        let params: Vec<libsql::Value> = week_starts
            .iter()
            .map(|d| libsql::Value::from(d.to_string()))
            .collect();

        let mut rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next().await? {
            memos.push(Self::row_to_memo(&row)?);
        }
        Ok(memos)
    }

    pub async fn upsert(conn: &Connection, memo: &UpsertWeeklyMemo) -> Result<WeeklyMemo> {
        let id = memo.id.clone().unwrap_or_else(|| nanoid!());
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO weekly_memos (id, week_start_date, memo, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(week_start_date) DO UPDATE SET
                memo = excluded.memo,
                updated_at = excluded.updated_at
            RETURNING {MEMO_COLUMNS}
            "#
        );

        let mut rows = conn
            .query(
                &sql,
                params![id, memo.week_start_date.to_string(), memo.memo.clone(), now],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_memo(&row),
            None => Err(MealError::Internal(format!(
                "Upsert of weekly memo {} returned no row",
                memo.week_start_date
            ))),
        }
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute("DELETE FROM weekly_memos WHERE id = ?1", params![id])
            .await?;

        Ok(rows_affected > 0)
    }

    fn row_to_memo(row: &Row) -> Result<WeeklyMemo> {
        let week_start: String = row.get(1)?;
        let created_at: String = row.get(3)?;
        let updated_at: String = row.get(4)?;

        Ok(WeeklyMemo {
            id: row.get(0)?,
            week_start_date: parse_date(&week_start)?,
            memo: row.get(2)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}
