use axum::extract::{Path, State};

use crate::api::v1::dto::parse_date_param;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::view::PeriodView;

/// `GET /api/v1/calendar/{date}`
///
/// Meals and weekly memos of the whole period containing `date`. Either
/// both collections load or the request fails.
pub async fn get_calendar(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResponse<PeriodView> {
    let date = match parse_date_param(&raw) {
        Ok(date) => date,
        Err(e) => return e.into(),
    };

    match state.calendar.load_period(date).await {
        Ok(view) => ApiResponse::success(view),
        Err(e) => e.into(),
    }
}
