// ABOUTME: Project CRUD route handlers with listing, search, and featured flag
// ABOUTME: Reads are public; mutations sit behind the user/admin allow-lists
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Project routes
//!
//! Listing, lookup, and search are public. Create/update/delete require
//! any signed-in role; the featured flag is admin-only.

use crate::errors::{AppError, AppResult};
use crate::models::{Project, ProjectUpdate};
use crate::routes::{AppState, ADMIN_ONLY, USER_OR_ADMIN};
use crate::store::{ProjectFilter, ProjectStore, SortDirection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub name: Option<String>,
    pub visibility: Option<bool>,
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    10
}

/// One listing page plus pagination metadata
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Project creation request
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub visibility: Option<bool>,
}

/// Search query parameter
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Featured-flag mutation request
#[derive(Debug, Deserialize)]
pub struct SetFeaturedRequest {
    pub featured: bool,
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<Json<ProjectListResponse>> {
    let filter = ProjectFilter {
        name: query.name,
        visibility: query.visibility,
        sort_field: query.sort_field,
        sort_direction: query.sort_direction,
        page: query.page,
        page_size: query.page_size,
    };
    let (projects, total) = state.projects.list(&filter).await?;

    Ok(Json(ProjectListResponse {
        projects,
        total,
        page: filter.page,
        page_size: filter.page_size,
    }))
}

async fn search_projects(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.search(&query.query).await?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    state
        .projects
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Project"))
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let principal = state.guard.authorize(&headers, USER_OR_ADMIN).await?;

    let mut project = Project::new(request.name, request.description, request.image);
    if let Some(visibility) = request.visibility {
        project.visibility = visibility;
    }
    let created = state.projects.create(project).await?;

    tracing::info!(
        "project {} created by {}",
        created.id,
        principal.subject
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(update): Json<ProjectUpdate>,
) -> AppResult<Json<Project>> {
    state.guard.authorize(&headers, USER_OR_ADMIN).await?;

    state
        .projects
        .update(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Project"))
}

async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.guard.authorize(&headers, USER_OR_ADMIN).await?;

    if state.projects.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Project"))
    }
}

async fn set_featured(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<SetFeaturedRequest>,
) -> AppResult<Json<Project>> {
    state.guard.authorize(&headers, ADMIN_ONLY).await?;

    state
        .projects
        .set_featured(id, request.featured)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Project"))
}

/// Project sub-router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/search", get(search_projects))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/:id/featured", put(set_featured))
}
