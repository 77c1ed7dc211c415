// ABOUTME: Feedback route handlers for creating, ranking, and deleting entries
// ABOUTME: Creation requires any authenticated principal; curation is admin-only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Feedback routes
//!
//! Feedback hangs off a project. Listing is public; creating an entry
//! requires authentication but no particular role (the author recorded on
//! the entry is the token subject); ranking and deletion are admin-only.

use crate::errors::{AppError, AppResult};
use crate::models::Feedback;
use crate::routes::{AppState, ADMIN_ONLY, ANY_AUTHENTICATED};
use crate::store::{FeedbackStore, ProjectStore};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

/// Feedback creation request; the author comes from the token subject
#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub content: String,
}

/// Rank mutation request
#[derive(Debug, Deserialize)]
pub struct SetRankRequest {
    pub rank: i32,
}

async fn list_feedback(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(state.feedback.list_for_project(project_id).await?))
}

async fn create_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateFeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let principal = state.guard.authorize(&headers, ANY_AUTHENTICATED).await?;

    if state.projects.get(project_id).await?.is_none() {
        return Err(AppError::not_found("Project"));
    }

    let feedback = state
        .feedback
        .create(Feedback::new(
            project_id,
            principal.subject,
            request.content,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(feedback)))
}

async fn delete_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((_project_id, feedback_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.guard.authorize(&headers, ADMIN_ONLY).await?;

    if state.feedback.delete(feedback_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Feedback"))
    }
}

async fn rank_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((_project_id, feedback_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetRankRequest>,
) -> AppResult<Json<Feedback>> {
    state.guard.authorize(&headers, ADMIN_ONLY).await?;

    state
        .feedback
        .set_rank(feedback_id, request.rank)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Feedback"))
}

/// Feedback sub-router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/feedback",
            get(list_feedback).post(create_feedback),
        )
        .route(
            "/projects/:project_id/feedback/:feedback_id",
            axum::routing::delete(delete_feedback),
        )
        .route(
            "/projects/:project_id/feedback/:feedback_id/rank",
            put(rank_feedback),
        )
}
