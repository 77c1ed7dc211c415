// ABOUTME: Identity-provider user lookup routes passing through the admin client
// ABOUTME: Serves realm users and single-user lookups for the showcase frontend
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Identity-provider user routes
//!
//! Pass-throughs over the provider's admin API. Provider failures surface
//! as 502-class upstream errors, distinct from authentication failures.

use crate::errors::{AppError, AppResult};
use crate::keycloak::{KeycloakClient, KeycloakUser};
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

fn provider(state: &AppState) -> AppResult<Arc<KeycloakClient>> {
    state
        .keycloak
        .clone()
        .ok_or_else(|| AppError::config("Identity provider is not configured"))
}

async fn list_keycloak_users(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<KeycloakUser>>> {
    Ok(Json(provider(&state)?.list_users().await?))
}

async fn get_keycloak_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<KeycloakUser>> {
    Ok(Json(provider(&state)?.get_user(&user_id).await?))
}

/// Identity-provider user sub-router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/keycloak-users", get(list_keycloak_users))
        .route("/keycloak-users/:user_id", get(get_keycloak_user))
}
