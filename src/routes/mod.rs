// ABOUTME: HTTP route assembly and shared application state
// ABOUTME: Declares the per-operation role allow-lists and merges sub-routers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! HTTP routes
//!
//! Thin handlers delegating to service layers and stores. Each protected
//! operation declares its role allow-list here and passes it to the
//! [`AccessGuard`](crate::guard::AccessGuard); handlers never inspect
//! claims themselves.

pub mod auth;
pub mod feedback;
pub mod health;
pub mod projects;
pub mod users;

use crate::constants::role_names;
use crate::guard::AccessGuard;
use crate::keycloak::KeycloakClient;
use crate::store::{FeedbackStore, ProjectStore};
use axum::Router;
use std::sync::Arc;

/// Operations any signed-in account may call
pub const USER_OR_ADMIN: &[&str] = &[role_names::USER, role_names::ADMIN];

/// Administrative operations
pub const ADMIN_ONLY: &[&str] = &[role_names::ADMIN];

/// Authenticated principal required, any role accepted
pub const ANY_AUTHENTICATED: &[&str] = &[];

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Request authorization strategy, fixed at startup
    pub guard: AccessGuard,
    /// Signup/login/refresh business logic
    pub auth_service: auth::AuthService,
    /// Project documents
    pub projects: Arc<dyn ProjectStore>,
    /// Feedback documents
    pub feedback: Arc<dyn FeedbackStore>,
    /// Identity-provider admin client, when one is configured
    pub keycloak: Option<Arc<KeycloakClient>>,
}

/// Assemble the full API router over the given state
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(projects::router())
        .merge(feedback::router())
        .merge(users::router())
        .with_state(state)
}
