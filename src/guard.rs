// ABOUTME: Request authentication guard enforcing per-operation role allow-lists
// ABOUTME: Extracts bearer tokens, verifies them, and intersects roles with the allow-list
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Access Guard
//!
//! Per-request, terminal-outcome authorization. A protected operation
//! declares a role allow-list (possibly empty) and receives a
//! [`Principal`] on success; on failure the operation never executes and
//! the caller returns the typed error.
//!
//! The guard is a strategy selected once at construction:
//! [`RealAuthenticator`] runs the production path (extract → scheme check →
//! decode → role check); [`BypassAuthenticator`] exists so protected routes
//! are exercisable without a live identity provider and synthesizes a
//! permissive principal. The bypass is the only intentional fail-open path
//! and is off by default.
//!
//! Decode failures all surface to clients as "invalid or expired token";
//! the specific cause (signature vs expiry vs key id) goes to the warn log
//! only.

use crate::auth::{ClaimSet, TokenVerifier};
use crate::constants::{error_messages, DEFAULT_BYPASS_ROLES};
use crate::errors::{AppError, AppResult};
use crate::roles::RoleResolver;
use async_trait::async_trait;
use http::{header, HeaderMap};
use std::collections::HashSet;
use std::sync::Arc;

/// Normalized authenticated context handed to protected operations
#[derive(Debug, Clone)]
pub struct Principal {
    /// Identity the presented token was issued to
    pub subject: String,
    /// Normalized role set granted by the token
    pub roles: HashSet<String>,
}

impl Principal {
    /// Check a single role
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Per-request authorization capability; implementations are terminal
/// decision functions with no retries and no cross-request state
#[async_trait]
pub trait RequestAuthenticator: Send + Sync {
    /// Authorize a request against an operation's role allow-list.
    ///
    /// An empty allow-list means "authenticated principal required, any
    /// role accepted".
    async fn authorize(&self, headers: &HeaderMap, allowed_roles: &[&str])
        -> AppResult<Principal>;
}

/// Production authenticator: bearer extraction, token verification, and
/// role intersection
pub struct RealAuthenticator {
    verifiers: Vec<Arc<dyn TokenVerifier>>,
    resolver: RoleResolver,
}

impl RealAuthenticator {
    /// Create an authenticator over one or more token verifiers.
    ///
    /// Verifiers are tried in order; the first successful decode wins. A
    /// deployment accepting only locally-issued tokens passes one verifier,
    /// one trusting the identity provider as well passes both.
    #[must_use]
    pub fn new(verifiers: Vec<Arc<dyn TokenVerifier>>, resolver: RoleResolver) -> Self {
        Self {
            verifiers,
            resolver,
        }
    }

    async fn decode_with_any(&self, token: &str) -> AppResult<ClaimSet> {
        let mut last_failure = None;
        for verifier in &self.verifiers {
            match verifier.verify(token).await {
                Ok(claims) => return Ok(claims),
                Err(e) => last_failure = Some(e),
            }
        }

        match last_failure {
            Some(e) => {
                tracing::warn!("token verification failed: {e}");
                Err(AppError::auth_invalid(error_messages::INVALID_TOKEN))
            }
            None => {
                tracing::error!("access guard configured with no token verifiers");
                Err(AppError::auth_invalid(error_messages::INVALID_TOKEN))
            }
        }
    }
}

#[async_trait]
impl RequestAuthenticator for RealAuthenticator {
    async fn authorize(
        &self,
        headers: &HeaderMap,
        allowed_roles: &[&str],
    ) -> AppResult<Principal> {
        let Some(auth_header) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        else {
            tracing::warn!("authentication failed: missing authorization header");
            return Err(AppError::auth_required());
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            tracing::warn!("authentication failed: authorization scheme is not Bearer");
            return Err(AppError::auth_invalid(error_messages::INVALID_SCHEME));
        };

        let claims = self.decode_with_any(token).await?;
        let roles = self.resolver.resolve(&claims);

        if !allowed_roles.is_empty() && !allowed_roles.iter().any(|role| roles.contains(*role)) {
            tracing::warn!(
                subject = claims.subject(),
                "authorization denied: token roles do not intersect the allow-list"
            );
            return Err(AppError::permission_denied(
                error_messages::PERMISSION_DENIED,
            ));
        }

        tracing::debug!(subject = claims.subject(), "request authorized");
        Ok(Principal {
            subject: claims.subject().to_owned(),
            roles,
        })
    }
}

/// Test/dev authenticator that accepts every request.
///
/// Grants the operation's own allow-list (so any declared role check
/// passes), or a fixed default role set when the operation declares none.
pub struct BypassAuthenticator;

#[async_trait]
impl RequestAuthenticator for BypassAuthenticator {
    async fn authorize(
        &self,
        _headers: &HeaderMap,
        allowed_roles: &[&str],
    ) -> AppResult<Principal> {
        let granted: &[&str] = if allowed_roles.is_empty() {
            DEFAULT_BYPASS_ROLES
        } else {
            allowed_roles
        };

        Ok(Principal {
            subject: "auth-disabled".to_owned(),
            roles: granted.iter().map(|role| (*role).to_owned()).collect(),
        })
    }
}

/// Handle shared with route handlers; the strategy behind it is fixed at
/// construction time
#[derive(Clone)]
pub struct AccessGuard {
    authenticator: Arc<dyn RequestAuthenticator>,
}

impl AccessGuard {
    /// Guard running the production verification path
    #[must_use]
    pub fn real(verifiers: Vec<Arc<dyn TokenVerifier>>, resolver: RoleResolver) -> Self {
        Self {
            authenticator: Arc::new(RealAuthenticator::new(verifiers, resolver)),
        }
    }

    /// Guard accepting every request (DISABLE_AUTH deployments only)
    #[must_use]
    pub fn bypass() -> Self {
        Self {
            authenticator: Arc::new(BypassAuthenticator),
        }
    }

    /// Authorize a request against an operation's allow-list
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no credential is presented,
    /// `AuthInvalid` for scheme or token failures, and `PermissionDenied`
    /// when the token's roles do not intersect a non-empty allow-list.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        allowed_roles: &[&str],
    ) -> AppResult<Principal> {
        self.authenticator.authorize(headers, allowed_roles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthManager;
    use crate::errors::ErrorCode;
    use axum::http::HeaderValue;
    use jsonwebtoken::Algorithm;

    fn guard_with_manager(manager: AuthManager) -> AccessGuard {
        AccessGuard::real(
            vec![Arc::new(manager) as Arc<dyn TokenVerifier>],
            RoleResolver::new("portfolio-backend"),
        )
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn test_manager() -> AuthManager {
        AuthManager::new(b"guard-test-secret", Algorithm::HS256, 60, 7)
    }

    #[tokio::test]
    async fn test_missing_header_is_auth_required() {
        let guard = guard_with_manager(test_manager());
        let err = guard.authorize(&HeaderMap::new(), &[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_rejected() {
        let guard = guard_with_manager(test_manager());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );

        let err = guard.authorize(&headers, &[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }

    #[tokio::test]
    async fn test_allow_list_intersection() {
        let manager = test_manager();
        let token = manager.issue_access_token("a@b.com", "user").unwrap();
        let guard = guard_with_manager(test_manager());

        let err = guard
            .authorize(&bearer_headers(&token), &["admin"])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let principal = guard
            .authorize(&bearer_headers(&token), &["user", "admin"])
            .await
            .unwrap();
        assert_eq!(principal.subject, "a@b.com");
        assert!(principal.has_role("user"));
    }

    #[tokio::test]
    async fn test_empty_allow_list_accepts_any_decoded_token() {
        let manager = test_manager();
        let token = manager.issue_access_token("a@b.com", "viewer").unwrap();
        let guard = guard_with_manager(test_manager());

        let principal = guard.authorize(&bearer_headers(&token), &[]).await.unwrap();
        assert!(principal.has_role("viewer"));
    }

    #[tokio::test]
    async fn test_bypass_satisfies_declared_allow_list_without_credentials() {
        let guard = AccessGuard::bypass();

        let principal = guard
            .authorize(&HeaderMap::new(), &["admin"])
            .await
            .unwrap();
        assert!(principal.has_role("admin"));

        let principal = guard.authorize(&HeaderMap::new(), &[]).await.unwrap();
        assert!(principal.has_role("user"));
    }
}
