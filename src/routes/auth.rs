// ABOUTME: Authentication route handlers for signup, login, refresh, and admin login
// ABOUTME: Thin wrappers over AuthService which owns credential checks and token issuance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Authentication routes
//!
//! User signup and login, admin login, and token refresh. All handlers are
//! thin wrappers delegating to [`AuthService`]. Failed logins answer with
//! one uniform message regardless of which factor failed.

use crate::auth::AuthManager;
use crate::constants::{error_messages, limits, role_names};
use crate::crypto::password::{hash_password_blocking, verify_password_blocking};
use crate::errors::{AppError, AppResult};
use crate::guard::Principal;
use crate::models::{Admin, User};
use crate::routes::{AppState, ANY_AUTHENTICATED};
use crate::store::AccountStore;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// User registration response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: String,
    pub message: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin login request
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Issued token pair
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Authenticated-identity response for the `/auth/me` probe
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub roles: Vec<String>,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        let mut roles: Vec<String> = principal.roles.into_iter().collect();
        roles.sort();
        Self {
            subject: principal.subject,
            roles,
        }
    }
}

/// Authentication service for business logic
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    auth_manager: Arc<AuthManager>,
    bcrypt_cost: u32,
}

impl AuthService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        auth_manager: Arc<AuthManager>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            accounts,
            auth_manager,
            bcrypt_cost,
        }
    }

    /// Handle user registration
    ///
    /// # Errors
    /// Returns an error if validation fails, the email is taken, or the
    /// store operation fails
    pub async fn signup(&self, request: SignupRequest) -> AppResult<SignupResponse> {
        tracing::info!("user registration attempt for email: {}", request.email);

        if !Self::is_valid_email(&request.email) {
            return Err(AppError::invalid_input(
                error_messages::INVALID_EMAIL_FORMAT,
            ));
        }
        if !Self::is_valid_password(&request.password) {
            return Err(AppError::invalid_input(error_messages::PASSWORD_TOO_WEAK));
        }

        if self
            .accounts
            .find_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists(
                error_messages::USER_ALREADY_EXISTS,
            ));
        }

        let password_hash = hash_password_blocking(request.password, self.bcrypt_cost).await?;
        let user = self
            .accounts
            .create_user(User::new(request.fullname, request.email, password_hash))
            .await?;

        tracing::info!("user registered successfully: {} ({})", user.email, user.id);

        Ok(SignupResponse {
            user_id: user.id.to_string(),
            message: "User created successfully".to_owned(),
        })
    }

    /// Handle user login
    ///
    /// # Errors
    /// Returns `AuthInvalid` on unknown email or wrong password, with one
    /// uniform message for both
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenResponse> {
        tracing::info!("user login attempt for email: {}", request.email);

        let Some(user) = self.accounts.find_user_by_email(&request.email).await? else {
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        };

        let is_valid =
            verify_password_blocking(request.password, user.password_hash.clone()).await?;
        if !is_valid {
            tracing::warn!("invalid password for user: {}", request.email);
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        }

        tracing::info!("user logged in successfully: {} ({})", user.email, user.id);
        self.issue_pair(&user.email, role_names::USER)
    }

    /// Handle admin login
    ///
    /// # Errors
    /// Returns `AuthInvalid` on unknown username or wrong password
    pub async fn admin_login(&self, request: AdminLoginRequest) -> AppResult<TokenResponse> {
        tracing::info!("admin login attempt for username: {}", request.username);

        let Some(admin) = self
            .accounts
            .find_admin_by_username(&request.username)
            .await?
        else {
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        };

        let is_valid =
            verify_password_blocking(request.password, admin.password_hash.clone()).await?;
        if !is_valid {
            tracing::warn!("invalid password for admin: {}", request.username);
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        }

        tracing::info!("admin logged in successfully: {}", admin.username);
        self.issue_pair(&admin.username, role_names::ADMIN)
    }

    /// Exchange a valid refresh token for a fresh token pair
    ///
    /// # Errors
    /// Returns `AuthInvalid` if the refresh token fails verification
    pub async fn refresh(&self, request: RefreshRequest) -> AppResult<TokenResponse> {
        let claims = self
            .auth_manager
            .decode_token(&request.refresh_token)
            .map_err(|e| {
                tracing::warn!("refresh token rejected: {e}");
                AppError::auth_invalid(error_messages::INVALID_TOKEN)
            })?;

        tracing::info!("token refreshed for subject: {}", claims.sub);
        self.issue_pair(&claims.sub, &claims.role)
    }

    /// Seed an admin account if the username is not already taken.
    ///
    /// Used by the server binary when bootstrap credentials are provided.
    ///
    /// # Errors
    /// Returns an error if hashing or the store operation fails
    pub async fn seed_admin(&self, username: &str, password: &str) -> AppResult<()> {
        if self
            .accounts
            .find_admin_by_username(username)
            .await?
            .is_some()
        {
            tracing::debug!("bootstrap admin {username} already exists");
            return Ok(());
        }

        let password_hash = hash_password_blocking(password.to_owned(), self.bcrypt_cost).await?;
        self.accounts
            .create_admin(Admin::new(username.to_owned(), password_hash))
            .await?;
        tracing::info!("bootstrap admin {username} created");
        Ok(())
    }

    fn issue_pair(&self, subject: &str, role: &str) -> AppResult<TokenResponse> {
        Ok(TokenResponse {
            access_token: self.auth_manager.issue_access_token(subject, role)?,
            refresh_token: self.auth_manager.issue_refresh_token(subject, role)?,
            token_type: "bearer".to_owned(),
        })
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        email[at_pos + 1..].contains('.')
    }

    /// Validate password strength
    #[must_use]
    pub const fn is_valid_password(password: &str) -> bool {
        password.len() >= limits::MIN_PASSWORD_LENGTH
    }
}

async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let response = state.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.auth_service.login(request).await?))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.auth_service.admin_login(request).await?))
}

async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.auth_service.refresh(request).await?))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<MeResponse>> {
    let principal = state.guard.authorize(&headers, ANY_AUTHENTICATED).await?;
    Ok(Json(principal.into()))
}

/// Authentication sub-router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(AuthService::is_valid_email("a@b.com"));
        assert!(AuthService::is_valid_email("tharindus@example.com"));
        assert!(!AuthService::is_valid_email("a@b"));
        assert!(!AuthService::is_valid_email("@b.com"));
        assert!(!AuthService::is_valid_email("ab.com"));
        assert!(!AuthService::is_valid_email("a@"));
    }

    #[test]
    fn test_password_validation() {
        assert!(AuthService::is_valid_password("longenough1"));
        assert!(!AuthService::is_valid_password("short"));
    }
}
