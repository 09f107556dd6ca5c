pub mod allocate;
pub mod occupancy;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use quarters_alloc::AllocationRejection;

/// Operator identity recorded on created allocations. Authentication is the
/// surrounding application's job; we only echo what the proxy forwards.
pub fn operator_from(headers: &HeaderMap) -> String {
    headers
        .get("x-operator")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("api")
        .to_string()
}

/// Map a manual-path rejection onto a status code and a machine-checkable
/// body. Age-gap rejections carry the computed range and the limit.
pub fn rejection_response(rejection: &AllocationRejection) -> Response {
    let status = match rejection {
        AllocationRejection::RegistrantNotFound(_)
        | AllocationRejection::RoomNotFound(_)
        | AllocationRejection::NotAllocated(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::CONFLICT,
    };

    let mut body = json!({
        "code": rejection.code(),
        "error": rejection.to_string(),
    });
    if let AllocationRejection::AgeGapExceeded {
        resulting_range,
        limit,
    } = rejection
    {
        body["resulting_range"] = (*resulting_range).into();
        body["limit"] = (*limit).into();
    }

    (status, Json(body)).into_response()
}

pub fn internal_error(err: anyhow::Error) -> Response {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal error"})),
    )
        .into_response()
}
