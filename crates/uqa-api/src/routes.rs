//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::predict;
use crate::state::AppState;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Create `/api` routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/request", post(predict::predict_handler))
}
