//! v1 weekly memo handlers.

use axum::extract::{Path, State};
use axum_extra::extract::{Query, QueryRejection};

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{
    parse_date_param, validate, DeletedResponse, UpsertWeeklyMemoRequest, WeeklyMemosQuery,
    MAX_WEEKS_PER_QUERY,
};
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::error::MealError;
use crate::models::{Lookup, WeeklyMemo};

/// `GET /api/v1/weekly-memos?week=YYYY-MM-DD&week=…`
pub async fn list_weekly_memos(
    State(state): State<AppState>,
    query: Result<Query<WeeklyMemosQuery>, QueryRejection>,
) -> ApiResponse<Vec<WeeklyMemo>> {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return MealError::from(rejection).into(),
    };
    if query.week.is_empty() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "At least one `week` parameter is required",
        );
    }
    if query.week.len() > MAX_WEEKS_PER_QUERY {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            format!("At most {MAX_WEEKS_PER_QUERY} `week` parameters are allowed"),
        );
    }

    match state.calendar.weekly_memos(&query.week).await {
        Ok(memos) => ApiResponse::success(memos.into_values().collect()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/weekly-memos/{weekStart}`
///
/// A week without a memo is a successful `absent` lookup, not a 404.
pub async fn get_weekly_memo(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResponse<Lookup<WeeklyMemo>> {
    let week_start = match parse_date_param(&raw) {
        Ok(date) => date,
        Err(e) => return e.into(),
    };

    match state.calendar.get_weekly_memo(week_start).await {
        Ok(lookup) => ApiResponse::success(lookup),
        Err(e) => e.into(),
    }
}

/// `PUT /api/v1/weekly-memos`
pub async fn upsert_weekly_memo(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpsertWeeklyMemoRequest>,
) -> ApiResponse<WeeklyMemo> {
    if let Err(e) = validate(&req) {
        return e.into();
    }

    match state.calendar.save_weekly_memo(req.into()).await {
        Ok(memo) => ApiResponse::success(memo),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/weekly-memos/{id}`
pub async fn delete_weekly_memo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<DeletedResponse> {
    match state.calendar.delete_weekly_memo(&id).await {
        Ok(()) => ApiResponse::success(DeletedResponse { id, deleted: true }),
        Err(e) => e.into(),
    }
}
