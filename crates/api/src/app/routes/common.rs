use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;

use crate::app::errors;
use crate::app::services::ServiceResult;

/// Map a service result to `status` + JSON body, or to the error response.
pub fn respond<T>(
    status: StatusCode,
    result: ServiceResult<T>,
    to_json: impl FnOnce(&T) -> Value,
) -> axum::response::Response {
    match result {
        Ok(value) => (status, Json(to_json(&value))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
