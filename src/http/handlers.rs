//! Probe route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Serialize)]
pub struct Healthy {
    pub status: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: String,
}

pub async fn live(State(state): State<AppState>) -> Response {
    probe("live", &state)
}

/// Same verdict as `/live`.
pub async fn read(State(state): State<AppState>) -> Response {
    probe("read", &state)
}

fn probe(route: &'static str, state: &AppState) -> Response {
    let status = state.supervisor.status();
    metrics::record_probe(route, status.code.as_u16());

    match status.error {
        None => (status.code, Json(Healthy { status: true })).into_response(),
        Some(e) => {
            tracing::debug!(route, error = %e, "Probe answered unhealthy");
            (status.code, Json(ErrorBody { error: e.to_string() })).into_response()
        }
    }
}

pub async fn welcome(State(state): State<AppState>) -> Json<Welcome> {
    Json(Welcome {
        message: format!("Welcome to {}", state.app_name),
    })
}

pub async fn not_found(State(state): State<AppState>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("{}: route not found", state.app_name),
        }),
    )
}
