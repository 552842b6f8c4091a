//! Prediction handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;
use uqa_core::{PredictionRequest, PredictionResponse, Result, UqaError};

/// Answer a multiple-choice question with supporting sources
#[utoipa::path(
    post,
    path = "/api/request",
    tag = "prediction",
    request_body = PredictionRequest,
    responses(
        (status = 200, description = "Prediction assembled", body = PredictionResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 500, description = "Internal error", body = crate::error::ApiError)
    )
)]
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> std::result::Result<Json<PredictionResponse>, AppError> {
    let Json(request) = payload?;

    match process(&state, &request).await {
        Ok(response) => Ok(Json(response)),
        Err(UqaError::ValidationError(msg)) => {
            report(
                &state,
                format!("Validation error for request {}: {msg}", request.id),
            )
            .await;
            Err(AppError::BadRequest(msg))
        }
        Err(e) => {
            report(
                &state,
                format!("Internal error processing request {}: {e}", request.id),
            )
            .await;
            Err(AppError::Internal(e.to_string()))
        }
    }
}

async fn process(state: &AppState, request: &PredictionRequest) -> Result<PredictionResponse> {
    state
        .event_log
        .info(&format!(
            "Processing prediction request with id: {}",
            request.id
        ))
        .await?;

    let response = state.pipeline.predict(request).await?;

    state
        .event_log
        .info(&format!("Successfully processed request {}", request.id))
        .await?;

    Ok(response)
}

/// Log a failure, falling back to tracing if the event log itself fails
async fn report(state: &AppState, message: String) {
    if let Err(e) = state.event_log.error(&message).await {
        tracing::error!(log_error = %e, "{message}");
    }
}
