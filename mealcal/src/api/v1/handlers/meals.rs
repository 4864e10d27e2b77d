//! v1 meal handlers.

use axum::extract::{Path, State};
use axum_extra::extract::{Query, QueryRejection};

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{validate, DeletedResponse, MealRangeQuery, UpsertMealRequest};
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::MealError;
use crate::models::Meal;

/// `GET /api/v1/meals?start=YYYY-MM-DD&end=YYYY-MM-DD`
pub async fn list_meals(
    State(state): State<AppState>,
    query: Result<Query<MealRangeQuery>, QueryRejection>,
) -> ApiResponse<Vec<Meal>> {
    let Query(range) = match query {
        Ok(q) => q,
        Err(rejection) => return MealError::from(rejection).into(),
    };

    match state.calendar.meals_in_range(range.start, range.end).await {
        Ok(meals) => ApiResponse::success(meals),
        Err(e) => e.into(),
    }
}

/// `PUT /api/v1/meals`
///
/// Creates the memo for `(date, slot)` or replaces the existing one.
pub async fn upsert_meal(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpsertMealRequest>,
) -> ApiResponse<Meal> {
    if let Err(e) = validate(&req) {
        return e.into();
    }

    match state.calendar.save_meal(req.into()).await {
        Ok(meal) => ApiResponse::success(meal),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/meals/{id}`
///
/// Succeeds whether or not the meal still exists.
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<DeletedResponse> {
    match state.calendar.delete_meal(&id).await {
        Ok(()) => ApiResponse::success(DeletedResponse { id, deleted: true }),
        Err(e) => e.into(),
    }
}
