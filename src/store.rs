// ABOUTME: Narrow persistence contracts for accounts, projects, and feedback
// ABOUTME: Includes in-memory implementations backing tests and dev deployments
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Persistence contracts
//!
//! The document store is an external collaborator; the application consumes
//! it through these narrow traits (simple filter/sort/paginate queries, no
//! transactions). The in-memory implementations keep the server runnable
//! and the end-to-end tests honest without a database.

use crate::constants::limits;
use crate::errors::AppResult;
use crate::models::{Admin, Feedback, Project, ProjectUpdate, User};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Project listing query surface
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive substring match on the project name
    pub name: Option<String>,
    /// Exact visibility match
    pub visibility: Option<bool>,
    /// Sort field: `name`, `created_at`, or `updated_at`
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

/// Credential records for signup and login flows
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn find_admin_by_username(&self, username: &str) -> AppResult<Option<Admin>>;
    async fn create_admin(&self, admin: Admin) -> AppResult<Admin>;
}

/// Project documents with the observed filter/sort/paginate queries
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// List projects matching the filter; returns the page and the total
    /// count across all pages
    async fn list(&self, filter: &ProjectFilter) -> AppResult<(Vec<Project>, u64)>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Project>>;
    async fn create(&self, project: Project) -> AppResult<Project>;
    async fn update(&self, id: Uuid, update: &ProjectUpdate) -> AppResult<Option<Project>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    /// Search name and description of visible projects
    async fn search(&self, query: &str) -> AppResult<Vec<Project>>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Option<Project>>;
}

/// Per-project feedback entries
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn create(&self, feedback: Feedback) -> AppResult<Feedback>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn set_rank(&self, id: Uuid, rank: i32) -> AppResult<Option<Feedback>>;
    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Feedback>>;
}

/// In-memory account store
#[derive(Default)]
pub struct InMemoryAccountStore {
    users: RwLock<HashMap<Uuid, User>>,
    admins: RwLock<HashMap<Uuid, Admin>>,
}

impl InMemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_admin_by_username(&self, username: &str) -> AppResult<Option<Admin>> {
        let admins = self.admins.read().await;
        Ok(admins
            .values()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn create_admin(&self, admin: Admin) -> AppResult<Admin> {
        let mut admins = self.admins.write().await;
        admins.insert(admin.id, admin.clone());
        Ok(admin)
    }
}

/// In-memory project store
#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<Uuid, Project>>,
}

impl InMemoryProjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sort_projects(projects: &mut [Project], filter: &ProjectFilter) {
        let field = filter.sort_field.as_deref().unwrap_or("created_at");
        projects.sort_by(|a, b| {
            let ordering = match field {
                "name" => a.name.cmp(&b.name),
                "updated_at" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            match filter.sort_direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn list(&self, filter: &ProjectFilter) -> AppResult<(Vec<Project>, u64)> {
        let projects = self.projects.read().await;

        let name_needle = filter.name.as_deref().map(str::to_lowercase);
        let mut matched: Vec<Project> = projects
            .values()
            .filter(|project| {
                name_needle
                    .as_deref()
                    .is_none_or(|needle| project.name.to_lowercase().contains(needle))
            })
            .filter(|project| {
                filter
                    .visibility
                    .is_none_or(|visibility| project.visibility == visibility)
            })
            .cloned()
            .collect();

        let total = matched.len() as u64;
        Self::sort_projects(&mut matched, filter);

        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, limits::MAX_PAGE_SIZE);
        let skip = usize::try_from((page - 1) * page_size).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);

        Ok((matched.into_iter().skip(skip).take(take).collect(), total))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.get(&id).cloned())
    }

    async fn create(&self, project: Project) -> AppResult<Project> {
        let mut projects = self.projects.write().await;
        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, id: Uuid, update: &ProjectUpdate) -> AppResult<Option<Project>> {
        let mut projects = self.projects.write().await;
        Ok(projects.get_mut(&id).map(|project| {
            update.apply_to(project);
            project.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut projects = self.projects.write().await;
        Ok(projects.remove(&id).is_some())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Project>> {
        let projects = self.projects.read().await;
        let needle = query.to_lowercase();
        Ok(projects
            .values()
            .filter(|project| project.visibility)
            .filter(|project| {
                project.name.to_lowercase().contains(&needle)
                    || project.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Option<Project>> {
        let mut projects = self.projects.write().await;
        Ok(projects.get_mut(&id).map(|project| {
            project.featured = featured;
            project.updated_at = chrono::Utc::now();
            project.clone()
        }))
    }
}

/// In-memory feedback store
#[derive(Default)]
pub struct InMemoryFeedbackStore {
    entries: RwLock<HashMap<Uuid, Feedback>>,
}

impl InMemoryFeedbackStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn create(&self, feedback: Feedback) -> AppResult<Feedback> {
        let mut entries = self.entries.write().await;
        entries.insert(feedback.id, feedback.clone());
        Ok(feedback)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&id).is_some())
    }

    async fn set_rank(&self, id: Uuid, rank: i32) -> AppResult<Option<Feedback>> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&id).map(|feedback| {
            feedback.rank = Some(rank);
            feedback.clone()
        }))
    }

    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Feedback>> {
        let entries = self.entries.read().await;
        let mut matched: Vec<Feedback> = entries
            .values()
            .filter(|feedback| feedback.project_id == project_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, visibility: bool) -> Project {
        let mut project = Project::new(
            name.to_owned(),
            format!("{name} description"),
            "https://img.example.com/p.png".to_owned(),
        );
        project.visibility = visibility;
        project
    }

    #[tokio::test]
    async fn test_list_filters_by_name_and_visibility() {
        let store = InMemoryProjectStore::new();
        store.create(project("Portfolio Site", true)).await.unwrap();
        store.create(project("Hidden Lab", false)).await.unwrap();
        store.create(project("Photo Portfolio", true)).await.unwrap();

        let filter = ProjectFilter {
            name: Some("portfolio".to_owned()),
            visibility: Some(true),
            page: 1,
            page_size: 10,
            ..ProjectFilter::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 2);
        assert!(page.iter().all(|p| p.visibility));
    }

    #[tokio::test]
    async fn test_list_paginates_with_stable_sort() {
        let store = InMemoryProjectStore::new();
        for name in ["alpha", "bravo", "charlie"] {
            store.create(project(name, true)).await.unwrap();
        }

        let filter = ProjectFilter {
            sort_field: Some("name".to_owned()),
            page: 2,
            page_size: 2,
            ..ProjectFilter::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "charlie");
    }

    #[tokio::test]
    async fn test_search_skips_hidden_projects() {
        let store = InMemoryProjectStore::new();
        store.create(project("Visible", true)).await.unwrap();
        store.create(project("Secret Visible", false)).await.unwrap();

        let results = store.search("visible").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Visible");
    }

    #[tokio::test]
    async fn test_feedback_rank_update() {
        let store = InMemoryFeedbackStore::new();
        let feedback = store
            .create(Feedback::new(
                Uuid::new_v4(),
                "tharindus".to_owned(),
                "Great work".to_owned(),
            ))
            .await
            .unwrap();

        let ranked = store.set_rank(feedback.id, 1).await.unwrap().unwrap();
        assert_eq!(ranked.rank, Some(1));
        assert!(store.set_rank(Uuid::new_v4(), 1).await.unwrap().is_none());
    }
}
