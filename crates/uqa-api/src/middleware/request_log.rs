//! Request/response logging middleware
//!
//! Wraps every route. Logs method, URL and body on the way in, and
//! status, body and elapsed time on the way out. Bodies are buffered so
//! they can be logged and then handed on unchanged. Requests rejected
//! here (oversized or unreadable body) are logged the same way.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request logging middleware
pub async fn request_log_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let url = request_url(&request);
    let limit = state.max_body_size();

    if let Some(len) = declared_length(&request).filter(|len| *len > limit) {
        let body = format!("<omitted, {len} bytes>");
        if let Err(response) = log_incoming(&state, &method, &url, &body).await {
            return response;
        }
        let rejected =
            AppError::PayloadTooLarge(format!("Request body exceeds {limit} bytes")).into_response();
        return log_completed(&state, &method, &url, rejected, start).await;
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(response) = log_incoming(&state, &method, &url, "<unreadable>").await {
                return response;
            }
            let rejected = AppError::BadRequest(format!("Failed to read request body: {e}"))
                .into_response();
            return log_completed(&state, &method, &url, rejected, start).await;
        }
    };

    if let Err(response) =
        log_incoming(&state, &method, &url, &String::from_utf8_lossy(&body)).await
    {
        return response;
    }

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;
    log_completed(&state, &method, &url, response, start).await
}

async fn log_incoming(
    state: &AppState,
    method: &Method,
    url: &str,
    body: &str,
) -> Result<(), Response> {
    state
        .event_log
        .info(&format_incoming(method, url, body))
        .await
        .map_err(|e| AppError::from(e).into_response())
}

async fn log_completed(
    state: &AppState,
    method: &Method,
    url: &str,
    response: Response,
    start: Instant,
) -> Response {
    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::Internal(format!("Failed to read response body: {e}"))
                .into_response()
        }
    };

    let message = format_completed(method, url, parts.status, &body, start.elapsed());
    if let Err(e) = state.event_log.info(&message).await {
        return AppError::from(e).into_response();
    }

    Response::from_parts(parts, Body::from(body))
}

fn declared_length(request: &Request) -> Option<usize> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Absolute request URL
///
/// Origin-form targets are joined with the `Host` header. The server
/// does not terminate TLS, so the scheme is always `http`. Without a
/// `Host` header the bare target is used.
fn request_url(request: &Request) -> String {
    let uri = request.uri();
    if uri.scheme().is_some() {
        return uri.to_string();
    }

    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    match request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
    {
        Some(host) => format!("http://{host}{target}"),
        None => target.to_string(),
    }
}

fn format_incoming(method: &Method, url: &str, body: &str) -> String {
    format!("Incoming request: {method} {url}\nRequest body: {body}")
}

fn format_completed(
    method: &Method,
    url: &str,
    status: StatusCode,
    body: &Bytes,
    elapsed: Duration,
) -> String {
    format!(
        "Request completed: {method} {url}\nStatus: {}\nResponse body: {}\nDuration: {:.3}s",
        status.as_u16(),
        String::from_utf8_lossy(body),
        elapsed.as_secs_f64()
    )
}
