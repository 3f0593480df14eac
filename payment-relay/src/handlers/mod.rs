//! HTTP handlers for payment-relay.

pub mod callback;
pub mod order;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub const ROOT_MESSAGE: &str = "SSLCommerz backend with deep link redirect is working!";

pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": state.config.service_name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
