use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let settings = state.settings();
    Json(RootResponse {
        message: settings.api().project_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_prefix: settings.api().api_v1_str.clone(),
        storage_backend: state.store().backend().as_str().to_string(),
    })
}

pub(crate) async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();
    let backend = state.store().backend().as_str().to_string();

    match state.store().ping().await {
        Ok(()) => {
            components.insert(backend, "healthy".to_string());
        }
        Err(err) => {
            tracing::warn!(error = %err, "Storage health check failed");
            components.insert(backend, "unhealthy".to_string());
            status = "unhealthy".to_string();
        }
    }

    let renderer = if state.renderer().is_some() { "configured" } else { "disabled" };
    components.insert("renderer".to_string(), renderer.to_string());

    let code =
        if status == "healthy" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(HealthResponse { service: "academy-notes".to_string(), status, components }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
