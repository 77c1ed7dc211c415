// ABOUTME: JWT token codec for local issuance and external identity-provider verification
// ABOUTME: Handles HS256 access/refresh tokens and RS256 tokens with rotating key ids
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Token Codec
//!
//! Two independent codecs behind one [`TokenVerifier`] capability:
//!
//! - the **local** codec ([`AuthManager`]) signs `{sub, role, iat, exp}`
//!   with a shared secret; access and refresh tokens differ only in the
//!   caller-chosen lifetime
//! - the **external** codec ([`ExternalVerifier`]) validates RS256 tokens
//!   minted by the identity provider, resolving the signing key by `kid`
//!   through the [`JwksProvider`](crate::jwks::JwksProvider) and checking
//!   audience and issuer; it never issues tokens
//!
//! Every decode failure is a typed [`JwtValidationError`]; no signature
//! library or JSON error crosses this boundary, and nothing fails open.

use crate::config::environment::{AuthConfig, KeycloakConfig};
use crate::errors::{AppError, AppResult};
use crate::jwks::JwksProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token signature, audience, issuer, or key id is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired { expired_at } => {
                write!(
                    f,
                    "token expired at {}",
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => write!(f, "token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "token is malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// Convert JWT library errors to typed validation errors
fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
            reason: "signature verification failed".into(),
        },
        ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
            reason: "audience mismatch".into(),
        },
        ErrorKind::InvalidIssuer => JwtValidationError::TokenInvalid {
            reason: "issuer mismatch".into(),
        },
        ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
            details: "token format is invalid".into(),
        },
        ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
            details: format!("token contains invalid base64: {base64_err}"),
        },
        ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
            details: format!("token contains invalid JSON: {json_err}"),
        },
        ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
            details: format!("token contains invalid UTF-8: {utf8_err}"),
        },
        _ => JwtValidationError::TokenInvalid {
            reason: format!("token validation failed: {e}"),
        },
    }
}

/// Reject a claim set whose expiry is in the past.
///
/// Expiry is checked here rather than by the signature library so expired
/// and otherwise-invalid tokens produce distinct log lines while sharing
/// one client-visible failure. No leeway is granted.
fn check_expiry(exp: i64) -> Result<(), JwtValidationError> {
    let now = Utc::now();
    if now.timestamp() > exp {
        let expired_at = DateTime::from_timestamp(exp, 0).unwrap_or_else(Utc::now);
        tracing::warn!(
            "token expired at {} (now {})",
            expired_at.to_rfc3339(),
            now.to_rfc3339()
        );
        return Err(JwtValidationError::TokenExpired { expired_at });
    }
    Ok(())
}

/// Claims carried by locally-issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClaims {
    /// Account identity (email for users, username for admins)
    pub sub: String,
    /// Single role granted at issuance
    pub role: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Per-client role grants inside an external token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientAccess {
    /// Roles granted for one client
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims carried by identity-provider tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalClaims {
    /// Provider-side account id
    pub sub: String,
    /// Account email, when released by the provider
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Login name
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Client-id to role-grant mapping
    #[serde(default)]
    pub resource_access: HashMap<String, ClientAccess>,
    /// Token issuer
    pub iss: String,
    /// Intended audience
    pub aud: String,
    /// Expiration timestamp
    pub exp: i64,
}

/// Validated claim set, tagged by issuer kind.
///
/// Call sites never branch on claim shape; role extraction goes through
/// [`RoleResolver`](crate::roles::RoleResolver).
#[derive(Debug, Clone)]
pub enum ClaimSet {
    /// Claims from a locally-issued token
    Local(LocalClaims),
    /// Claims from an identity-provider token
    External(ExternalClaims),
}

impl ClaimSet {
    /// The authenticated identity the token was issued to
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::Local(claims) => &claims.sub,
            Self::External(claims) => &claims.sub,
        }
    }

    /// Expiration timestamp
    #[must_use]
    pub const fn expires_at(&self) -> i64 {
        match self {
            Self::Local(claims) => claims.exp,
            Self::External(claims) => claims.exp,
        }
    }
}

/// Decode capability shared by both codecs; the access guard depends on
/// this trait, not on a concrete codec
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return its claim set
    async fn verify(&self, token: &str) -> Result<ClaimSet, JwtValidationError>;
}

/// Authentication manager for locally-issued `JWT` tokens
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthManager {
    /// Create a manager over a shared symmetric secret.
    ///
    /// The algorithm must be an HMAC variant; asymmetric algorithms cannot
    /// sign with a shared secret.
    #[must_use]
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        access_token_expire_minutes: i64,
        refresh_token_expire_days: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            access_ttl: Duration::minutes(access_token_expire_minutes),
            refresh_ttl: Duration::days(refresh_token_expire_days),
        }
    }

    /// Create a manager from the environment-sourced auth configuration
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            config.access_token_expire_minutes,
            config.refresh_token_expire_days,
        )
    }

    /// Sign `{subject, role, expiry = now + ttl}` with the shared secret
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails (e.g. the configured
    /// algorithm cannot sign with a symmetric secret).
    pub fn issue_token(&self, subject: &str, role: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = LocalClaims {
            sub: subject.to_owned(),
            role: role.to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token encoding failed: {e}")))
    }

    /// Issue a short-lived access token
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails
    pub fn issue_access_token(&self, subject: &str, role: &str) -> AppResult<String> {
        self.issue_token(subject, role, self.access_ttl)
    }

    /// Issue a long-lived refresh token; same encoding, longer lifetime
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails
    pub fn issue_refresh_token(&self, subject: &str, role: &str) -> AppResult<String> {
        self.issue_token(subject, role, self.refresh_ttl)
    }

    /// Verify signature and expiry of a locally-issued token
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the signature fails, the payload
    /// is malformed, or the token has expired.
    pub fn decode_token(&self, token: &str) -> Result<LocalClaims, JwtValidationError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data = decode::<LocalClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| convert_jwt_error(&e))?;

        check_expiry(token_data.claims.exp)?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenVerifier for AuthManager {
    async fn verify(&self, token: &str) -> Result<ClaimSet, JwtValidationError> {
        self.decode_token(token).map(ClaimSet::Local)
    }
}

/// Verifier for tokens issued by the external identity provider
pub struct ExternalVerifier {
    jwks: Arc<JwksProvider>,
    audience: String,
    issuer: String,
}

impl ExternalVerifier {
    /// Create a verifier checking tokens against the given audience and issuer
    #[must_use]
    pub fn new(jwks: Arc<JwksProvider>, audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            jwks,
            audience: audience.into(),
            issuer: issuer.into(),
        }
    }

    /// Create a verifier from the identity-provider configuration
    #[must_use]
    pub fn from_config(jwks: Arc<JwksProvider>, config: &KeycloakConfig) -> Self {
        Self::new(jwks, config.client_id.clone(), config.issuer())
    }

    /// Verify an externally-issued RS256 token.
    ///
    /// Resolves the signing key by the `kid` in the unverified header, then
    /// checks signature, audience, issuer, and expiry.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the header is malformed or
    /// missing `kid`, the key id cannot be resolved (including when no key
    /// material is available at all), or any verification step fails.
    pub async fn decode(&self, token: &str) -> Result<ExternalClaims, JwtValidationError> {
        let header = decode_header(token).map_err(|e| JwtValidationError::TokenMalformed {
            details: format!("failed to decode token header: {e}"),
        })?;

        let kid = header.kid.ok_or_else(|| JwtValidationError::TokenMalformed {
            details: "token header missing kid (key ID)".to_owned(),
        })?;

        let jwk = self
            .jwks
            .find_key(&kid)
            .await
            .ok_or_else(|| JwtValidationError::TokenInvalid {
                reason: format!("key not found in key set: {kid}"),
            })?;

        let decoding_key = jwk
            .decoding_key()
            .map_err(|e| JwtValidationError::TokenInvalid {
                reason: e.to_string(),
            })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<ExternalClaims>(token, &decoding_key, &validation)
            .map_err(|e| convert_jwt_error(&e))?;

        check_expiry(token_data.claims.exp)?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenVerifier for ExternalVerifier {
    async fn verify(&self, token: &str) -> Result<ClaimSet, JwtValidationError> {
        self.decode(token).await.map(ClaimSet::External)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> AuthManager {
        AuthManager::new(b"unit-test-secret", Algorithm::HS256, 60, 7)
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let manager = test_manager();
        let token = manager.issue_access_token("a@b.com", "user").unwrap();

        let claims = manager.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_already_expired_token_is_invalid() {
        let manager = test_manager();
        let token = manager
            .issue_token("a@b.com", "user", Duration::seconds(-1))
            .unwrap();

        match manager.decode_token(&token) {
            Err(JwtValidationError::TokenExpired { .. }) => {}
            other => panic!("expected TokenExpired, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let manager = test_manager();
        let other = AuthManager::new(b"a-different-secret", Algorithm::HS256, 60, 7);
        let token = manager.issue_access_token("a@b.com", "user").unwrap();

        assert!(other.decode_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let manager = test_manager();
        match manager.decode_token("not-a-jwt") {
            Err(JwtValidationError::TokenMalformed { .. } | JwtValidationError::TokenInvalid { .. }) => {}
            other => panic!("expected malformed/invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let manager = test_manager();
        let access = manager.issue_access_token("a@b.com", "user").unwrap();
        let refresh = manager.issue_refresh_token("a@b.com", "user").unwrap();

        let access_exp = manager.decode_token(&access).unwrap().exp;
        let refresh_exp = manager.decode_token(&refresh).unwrap().exp;
        assert!(refresh_exp > access_exp);
    }
}
