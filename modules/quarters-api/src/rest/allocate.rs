//! Allocation request boundaries: grouped batch, random batch, manual
//! single-pair, and unassignment.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use quarters_alloc::{BatchError, ManualError};

use crate::AppState;

use super::{internal_error, operator_from, rejection_response};

#[derive(Deserialize)]
pub struct GroupedRequest {
    pub age_range_years: i32,
}

#[derive(Deserialize)]
pub struct ManualRequest {
    pub registrant_id: Uuid,
    pub room_id: Uuid,
}

pub async fn grouped(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GroupedRequest>,
) -> impl IntoResponse {
    let operator = operator_from(&headers);
    let max_age_gap = match state.settings.max_age_gap().await {
        Ok(limit) => limit,
        Err(e) => return internal_error(e),
    };

    match state
        .engine
        .allocate_grouped(body.age_range_years, max_age_gap, &operator)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(BatchError::InvalidAgeRange) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "invalid_age_range",
                "error": "age_range_years must be a positive integer",
            })),
        )
            .into_response(),
        Err(BatchError::Store(e)) => internal_error(e),
    }
}

pub async fn random(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let operator = operator_from(&headers);

    match state.engine.allocate_random(&operator).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn manual(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ManualRequest>,
) -> impl IntoResponse {
    let operator = operator_from(&headers);
    let max_age_gap = match state.settings.max_age_gap().await {
        Ok(limit) => limit,
        Err(e) => return internal_error(e),
    };

    match state
        .engine
        .allocate_manual(body.registrant_id, body.room_id, max_age_gap, &operator)
        .await
    {
        Ok(allocation) => (StatusCode::CREATED, Json(allocation)).into_response(),
        Err(ManualError::Rejected(rejection)) => rejection_response(&rejection),
        Err(ManualError::Store(e)) => internal_error(e),
    }
}

pub async fn unassign(
    State(state): State<Arc<AppState>>,
    Path(registrant_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.engine.unassign(registrant_id).await {
        Ok(allocation) => (StatusCode::OK, Json(allocation)).into_response(),
        Err(ManualError::Rejected(rejection)) => rejection_response(&rejection),
        Err(ManualError::Store(e)) => internal_error(e),
    }
}
