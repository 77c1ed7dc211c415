// ABOUTME: Liveness endpoint for deployment probes
// ABOUTME: Answers with a static status body and no dependencies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Health routes

use crate::routes::AppState;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Health sub-router
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
