use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum_extra::extract::QueryRejection;

use crate::error::MealError;

/// JSON body extractor that rejects with the v1 error envelope instead of
/// axum's plain-text responses.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(MealError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for MealError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

impl From<QueryRejection> for MealError {
    fn from(rejection: QueryRejection) -> Self {
        MealError::Validation(format!("Invalid query string: {rejection}"))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> MealError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                MealError::Validation(format!("Missing required field: {field}"))
            } else {
                MealError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            MealError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            MealError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            MealError::Internal("Failed to read request body".to_string())
        }
        _ => MealError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_missing_field_name() {
        let msg = "Failed to deserialize the JSON body: missing field `memo` at line 1";
        assert_eq!(extract_missing_field(msg), Some("memo"));
        assert_eq!(extract_missing_field("expected a string"), None);
    }
}
