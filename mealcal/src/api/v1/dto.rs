//! v1 request and response bodies.
//!
//! Records themselves ([`Meal`], [`WeeklyMemo`], [`PeriodView`]) go out as
//! they are; this module holds the request shapes and the few responses that
//! have no domain type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{MealError, Result};
use crate::models::{Slot, Theme, UpsertMeal, UpsertWeeklyMemo};
use crate::period::{self, Period};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `PUT /api/v1/meals`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMealRequest {
    pub date: NaiveDate,
    pub slot: Slot,
    #[validate(length(min = 1, message = "memo must not be empty"))]
    pub memo: String,
    /// Id to use if the upsert inserts a new record.
    pub id: Option<String>,
}

impl From<UpsertMealRequest> for UpsertMeal {
    fn from(req: UpsertMealRequest) -> Self {
        Self {
            date: req.date,
            slot: req.slot,
            memo: req.memo,
            id: req.id,
        }
    }
}

/// Body of `PUT /api/v1/weekly-memos`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWeeklyMemoRequest {
    pub week_start_date: NaiveDate,
    #[validate(length(min = 1, message = "memo must not be empty"))]
    pub memo: String,
    pub id: Option<String>,
}

impl From<UpsertWeeklyMemoRequest> for UpsertWeeklyMemo {
    fn from(req: UpsertWeeklyMemoRequest) -> Self {
        Self {
            week_start_date: req.week_start_date,
            memo: req.memo,
            id: req.id,
        }
    }
}

/// Query of `GET /api/v1/meals?start=YYYY-MM-DD&end=YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct MealRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Upper bound on `week` parameters in one weekly memo query.
pub const MAX_WEEKS_PER_QUERY: usize = 53;

/// Query of `GET /api/v1/weekly-memos?week=…&week=…`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyMemosQuery {
    #[serde(default)]
    pub week: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: Theme,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Bounds of a period plus where the navigation buttons lead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub week_starts: [NaiveDate; 2],
    pub previous_start: NaiveDate,
    pub next_start: NaiveDate,
    pub is_current: bool,
}

impl PeriodResponse {
    pub fn new(p: Period, today: NaiveDate) -> Self {
        Self {
            start_date: p.start_date,
            end_date: p.end_date,
            week_starts: p.week_starts(),
            previous_start: period::previous_period_start(p.start_date),
            next_start: period::next_period_start(p.start_date),
            is_current: p.contains(today),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run `validator` rules and fold the failures into one validation error.
pub fn validate<T: Validate>(req: &T) -> Result<()> {
    req.validate()
        .map_err(|e| MealError::Validation(e.to_string()))
}

/// Parse a `YYYY-MM-DD` path segment.
pub fn parse_date_param(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| MealError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}
