//! v1 period handlers. Pure calculation, no store access.

use axum::extract::Path;
use chrono::Local;

use crate::api::v1::dto::{parse_date_param, PeriodResponse};
use crate::api::v1::response::ApiResponse;
use crate::period;

/// `GET /api/v1/periods/current`
pub async fn current_period() -> ApiResponse<PeriodResponse> {
    let today = Local::now().date_naive();
    ApiResponse::success(PeriodResponse::new(period::current_period(today), today))
}

/// `GET /api/v1/periods/{date}`
pub async fn period_for_date(Path(raw): Path<String>) -> ApiResponse<PeriodResponse> {
    let date = match parse_date_param(&raw) {
        Ok(date) => date,
        Err(e) => return e.into(),
    };
    let today = Local::now().date_naive();
    ApiResponse::success(PeriodResponse::new(period::period_containing(date), today))
}
