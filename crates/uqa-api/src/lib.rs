//! UQA API - HTTP server
//!
//! Exposes the prediction pipeline over HTTP:
//! - `POST /api/request` answers a multiple-choice question
//! - `GET /health` liveness probe
//! - `GET /api-docs/openapi.json` OpenAPI document
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::predict::predict_handler,
        handlers::health::health_check
    ),
    components(schemas(
        uqa_core::PredictionRequest,
        uqa_core::PredictionResponse,
        error::ApiError,
        handlers::health::HealthResponse
    )),
    tags(
        (name = "prediction", description = "Multiple-choice question answering"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the application router
///
/// The request logging middleware wraps every route.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", routes::api_routes())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_log_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
