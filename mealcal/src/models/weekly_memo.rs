use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMemo {
    pub id: String,
    /// Monday of the week this memo belongs to. Natural key.
    pub week_start_date: NaiveDate,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-update request keyed on `week_start_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWeeklyMemo {
    pub week_start_date: NaiveDate,
    pub memo: String,
    pub id: Option<String>,
}

impl UpsertWeeklyMemo {
    pub fn new(week_start_date: NaiveDate, memo: impl Into<String>) -> Self {
        Self {
            week_start_date,
            memo: memo.into(),
            id: None,
        }
    }
}
