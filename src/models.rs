// ABOUTME: Common data models for accounts, projects, and feedback documents
// ABOUTME: Serde-serializable types shared by stores, services, and route handlers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Domain models
//!
//! Documents as they live in the store: user and admin credential records,
//! showcase projects, and per-project feedback. Password hashes are the
//! only credential material ever stored; plaintext never reaches these
//! types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account identified by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user `ID`
    pub id: Uuid,
    /// Display name
    pub fullname: String,
    /// Unique login identity
    pub email: String,
    /// bcrypt hash of the password; never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record with a fresh id
    #[must_use]
    pub fn new(fullname: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            fullname,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// An administrative account identified by username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    /// Unique admin `ID`
    pub id: Uuid,
    /// Unique login identity
    pub username: String,
    /// bcrypt hash of the password; never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl Admin {
    /// Create a new admin record with a fresh id
    #[must_use]
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
        }
    }
}

/// A showcase project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project `ID`
    pub id: Uuid,
    /// Project name
    pub name: String,
    /// Longer description shown on the detail page
    pub description: String,
    /// Image URL
    pub image: String,
    /// Whether the project is publicly listed
    pub visibility: bool,
    /// Whether the project is pinned to the featured section
    pub featured: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new visible, non-featured project
    #[must_use]
    pub fn new(name: String, description: String, image: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            image,
            visibility: true,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial project mutation; unset fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub visibility: Option<bool>,
    pub featured: Option<bool>,
}

impl ProjectUpdate {
    /// Apply the set fields to a project, bumping `updated_at`
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            project.description.clone_from(description);
        }
        if let Some(image) = &self.image {
            project.image.clone_from(image);
        }
        if let Some(visibility) = self.visibility {
            project.visibility = visibility;
        }
        if let Some(featured) = self.featured {
            project.featured = featured;
        }
        project.updated_at = Utc::now();
    }
}

/// Feedback left on a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Unique feedback `ID`
    pub id: Uuid,
    /// Project the feedback belongs to
    pub project_id: Uuid,
    /// Author identity
    pub username: String,
    /// Feedback body
    pub content: String,
    /// Optional curator ranking
    pub rank: Option<i32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Create a new unranked feedback entry
    #[must_use]
    pub fn new(project_id: Uuid, username: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            username,
            content,
            rank: None,
            created_at: Utc::now(),
        }
    }
}
