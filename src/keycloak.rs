// ABOUTME: Identity-provider admin API client for service tokens and user lookups
// ABOUTME: Wraps the token endpoint and the admin users endpoints with bounded timeouts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Identity-provider admin client
//!
//! Server-to-server calls against the provider's admin API: a
//! client-credentials service token, realm user listing, and single-user
//! lookup. These calls share the HTTP stack with key fetching but are not
//! part of token verification; their failures surface as upstream
//! communication errors (502-class), never as authentication failures.
//!
//! The `*_safely` variants degrade to defaults instead of erroring, for
//! callers that decorate responses with provider data on a best-effort
//! basis.

use crate::config::environment::KeycloakConfig;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const SERVICE_NAME: &str = "Keycloak";

/// User record as served by the provider's admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakUser {
    /// Provider-side account id
    #[serde(default)]
    pub id: Option<String>,
    /// Login name
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl KeycloakUser {
    /// Placeholder user returned by the safe lookup when the provider is
    /// unreachable or the account is unknown
    #[must_use]
    pub fn placeholder(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            enabled: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
}

/// Admin API client over the configured realm
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: reqwest::Client,
}

impl KeycloakClient {
    /// Create a client with a bounded request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: KeycloakConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(limits::UPSTREAM_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Obtain a service token via the client-credentials grant
    ///
    /// # Errors
    ///
    /// Returns an upstream communication error if the provider is
    /// unreachable, rejects the client credentials, or returns no token.
    pub async fn service_token(&self) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.config.token_url())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("token endpoint returned {status}"),
            ));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        body.access_token.ok_or_else(|| {
            AppError::external_service(SERVICE_NAME, "empty token received from provider")
        })
    }

    /// List all users in the configured realm
    ///
    /// # Errors
    ///
    /// Returns an upstream communication error on network failure or a
    /// non-success admin API response.
    pub async fn list_users(&self) -> AppResult<Vec<KeycloakUser>> {
        let token = self.service_token().await?;
        let response = self
            .http_client
            .get(self.config.admin_users_url())
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("admin users endpoint returned {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))
    }

    /// Fetch a single user by provider-side id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown ids, otherwise an upstream
    /// communication error on network failure or a non-success response.
    pub async fn get_user(&self, user_id: &str) -> AppResult<KeycloakUser> {
        let token = self.service_token().await?;
        let response = self
            .http_client
            .get(format!("{}/{user_id}", self.config.admin_users_url()))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("admin user endpoint returned {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))
    }

    /// List realm users, degrading to an empty list on any failure
    pub async fn list_users_safely(&self) -> Vec<KeycloakUser> {
        match self.list_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!("failed to list users from identity provider: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch a user by id, degrading to a placeholder on any failure
    pub async fn get_user_safely(&self, user_id: &str, default_username: &str) -> KeycloakUser {
        match self.get_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!("failed to fetch user {user_id} from identity provider: {e}");
                KeycloakUser::placeholder(default_username)
            }
        }
    }
}
