use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::ThemeBody;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;

/// `GET /api/v1/preferences/theme`
pub async fn get_theme(State(state): State<AppState>) -> ApiResponse<ThemeBody> {
    match state.preferences.theme().await {
        Ok(theme) => ApiResponse::success(ThemeBody { theme }),
        Err(e) => e.into(),
    }
}

/// `PUT /api/v1/preferences/theme`
pub async fn set_theme(
    State(state): State<AppState>,
    AppJson(body): AppJson<ThemeBody>,
) -> ApiResponse<ThemeBody> {
    match state.preferences.set_theme(body.theme).await {
        Ok(theme) => ApiResponse::success(ThemeBody { theme }),
        Err(e) => e.into(),
    }
}
