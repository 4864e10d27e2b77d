use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub store: StoreStatus,
    pub cached_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub status: String,
    pub remote: bool,
}

/// `GET /api/v1/health`
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let store_status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            "error"
        }
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreStatus {
            status: store_status.to_string(),
            remote: state.config.store.is_remote(),
        },
        cached_entries: state.calendar.cached_entries(),
    })
}
