//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "data": { ... },                                      // present on success
//!   "error": { "code": "not_found", "message": "..." }    // present on error
//! }
//! ```
//!
//! Store failures never leak internal details; they are logged and reported
//! with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::MealError;

/// Machine-readable error code, serialized as snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request or failed validation. HTTP 400.
    InvalidRequest,
    /// HTTP 404.
    NotFound,
    /// The write collides with an existing record. HTTP 409.
    Conflict,
    /// The store could not be reached after retrying. HTTP 503.
    Unavailable,
    /// HTTP 500. Details are only logged.
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Safe to show to end users.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize v1 response");
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<MealError> for ApiResponse<T> {
    fn from(err: MealError) -> Self {
        match err {
            MealError::NotFound(ref msg) => ApiResponse::error(ErrorCode::NotFound, msg.clone()),

            MealError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            MealError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            MealError::Conflict(_) => ApiResponse::error(
                ErrorCode::Conflict,
                "The record conflicts with an existing one",
            ),

            MealError::DataUnavailable { attempts, ref source } => {
                tracing::error!(attempts, error = %source, "Read failed after retries");
                ApiResponse::error(
                    ErrorCode::Unavailable,
                    "Calendar data is temporarily unavailable",
                )
            }

            MealError::SaveFailed { what, ref source } => {
                tracing::error!(what, error = %source, "Save failed");
                ApiResponse::error(ErrorCode::Unavailable, format!("Failed to save {what}"))
            }

            MealError::DeleteFailed { what, ref source } => {
                tracing::error!(what, error = %source, "Delete failed");
                ApiResponse::error(ErrorCode::Unavailable, format!("Failed to delete {what}"))
            }

            MealError::Timeout(_) => {
                ApiResponse::error(ErrorCode::Unavailable, "The store did not respond in time")
            }

            MealError::MissingCollection(ref table) => {
                tracing::error!(table = %table, "Write against an unprovisioned collection");
                ApiResponse::error(
                    ErrorCode::InternalError,
                    format!(
                        "{} are not provisioned in the store",
                        collection_label(table)
                    ),
                )
            }

            ref internal @ (MealError::Config(_)
            | MealError::Database(_)
            | MealError::Io(_)
            | MealError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

fn collection_label(table: &str) -> &'static str {
    match table {
        "meals" => "Meals",
        "weekly_memos" => "Weekly memos",
        _ => "Calendar collections",
    }
}

/// Lets extractors reject with a [`MealError`] and still answer with the
/// envelope.
impl IntoResponse for MealError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn success_response_serializes_without_error() {
        let resp = ApiResponse::success("hello");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_response_serializes_without_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::NotFound, "gone");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "gone");
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::Unavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_maps_to_invalid_request() {
        let resp: ApiResponse<()> = MealError::Validation("memo must not be empty".into()).into();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "memo must not be empty");
    }

    #[test]
    fn exhausted_reads_map_to_unavailable() {
        let resp: ApiResponse<()> = MealError::DataUnavailable {
            attempts: 4,
            source: Arc::new(MealError::Timeout(10)),
        }
        .into();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn save_failure_names_the_record_but_not_the_cause() {
        let resp: ApiResponse<()> = MealError::SaveFailed {
            what: "meal",
            source: Box::new(MealError::Internal("socket reset by peer".into())),
        }
        .into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::Unavailable);
        assert_eq!(err.message, "Failed to save meal");
    }

    #[test]
    fn missing_collection_is_described() {
        let resp: ApiResponse<()> = MealError::MissingCollection("weekly_memos".into()).into();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Weekly memos are not provisioned in the store");
    }

    #[test]
    fn configuration_errors_do_not_leak() {
        let resp: ApiResponse<()> = MealError::Config("MEALCAL_STORE_KEY=secret".into()).into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }
}
