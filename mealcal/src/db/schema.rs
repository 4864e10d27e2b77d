use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    create_meals_table(conn).await?;
    create_weekly_memos_table(conn).await?;
    Ok(())
}

pub(crate) async fn create_meals_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One memo per date per meal slot
        CREATE TABLE IF NOT EXISTS meals (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            meal_type TEXT NOT NULL CHECK (meal_type IN ('breakfast', 'lunch', 'dinner', 'other')),
            memo TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (date, meal_type)
        );

        CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date);
        "#,
    )
    .await?;
    Ok(())
}

pub(crate) async fn create_weekly_memos_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS weekly_memos (
            id TEXT PRIMARY KEY,
            week_start_date TEXT NOT NULL UNIQUE,
            memo TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .await?;
    Ok(())
}

pub(crate) async fn create_preferences_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .await?;
    Ok(())
}
