// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, auth toggles, and identity-provider wiring
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-based configuration management for production deployment

use crate::constants::limits;
use anyhow::{Context, Result};
use std::env;
use tracing::warn;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Local token signing configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for the symmetric local codec
    pub jwt_secret: String,
    /// Local signing algorithm (HS256 unless overridden)
    pub jwt_algorithm: jsonwebtoken::Algorithm,
    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_expire_days: i64,
    /// Authentication bypass flag. The only intentional fail-open path;
    /// must stay off in any environment serving real credentials.
    pub disable_auth: bool,
    /// bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
}

/// External identity-provider configuration
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Provider base URL, without trailing slash
    pub base_url: String,
    /// Realm name
    pub realm: String,
    /// Confidential client id; doubles as the expected token audience
    pub client_id: String,
    /// Confidential client secret for the client-credentials grant
    pub client_secret: String,
    /// Verification-key cache lifetime in seconds
    pub jwks_cache_ttl_seconds: u64,
}

impl KeycloakConfig {
    /// Expected token issuer: `{base_url}/realms/{realm}`
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("{}/realms/{}", self.base_url, self.realm)
    }

    /// Public verification-key endpoint
    #[must_use]
    pub fn certs_url(&self) -> String {
        format!("{}/protocol/openid-connect/certs", self.issuer())
    }

    /// Token endpoint for the client-credentials grant
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.issuer())
    }

    /// Admin API user collection endpoint
    #[must_use]
    pub fn admin_users_url(&self) -> String {
        format!("{}/admin/realms/{}/users", self.base_url, self.realm)
    }
}

/// Bootstrap admin credentials seeded at startup when present
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Local token signing configuration
    pub auth: AuthConfig,
    /// Identity-provider configuration, when one is wired in
    pub keycloak: Option<KeycloakConfig>,
    /// Admin account to seed at startup
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET_KEY` is unset or empty
    /// - A numeric variable fails to parse
    /// - `KEYCLOAK_URL` is set without `REALM` or `CLIENT_ID`
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET_KEY")
            .context("JWT_SECRET_KEY environment variable is required")?;
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET_KEY must not be empty");
        }

        // The local codec signs with a shared secret; only HMAC variants apply.
        let jwt_algorithm = match env_or("JWT_ALGORITHM", "HS256").to_uppercase().as_str() {
            "HS256" => jsonwebtoken::Algorithm::HS256,
            "HS384" => jsonwebtoken::Algorithm::HS384,
            "HS512" => jsonwebtoken::Algorithm::HS512,
            other => anyhow::bail!(
                "JWT_ALGORITHM {other:?} is not a supported symmetric signing algorithm"
            ),
        };

        let disable_auth = parse_bool(&env_or("DISABLE_AUTH", "false"));
        if disable_auth {
            warn!("DISABLE_AUTH is set: all protected routes accept unauthenticated requests");
        }

        let auth = AuthConfig {
            jwt_secret,
            jwt_algorithm,
            access_token_expire_minutes: parse_var(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                limits::ACCESS_TOKEN_EXPIRE_MINUTES,
            )?,
            refresh_token_expire_days: parse_var(
                "REFRESH_TOKEN_EXPIRE_DAYS",
                limits::REFRESH_TOKEN_EXPIRE_DAYS,
            )?,
            disable_auth,
            bcrypt_cost: parse_var("BCRYPT_COST", i64::from(bcrypt::DEFAULT_COST))?
                .try_into()
                .context("BCRYPT_COST out of range")?,
        };

        let keycloak = match env::var("KEYCLOAK_URL") {
            Ok(base_url) if !base_url.is_empty() => {
                url::Url::parse(&base_url).context("KEYCLOAK_URL is not a valid URL")?;
                Some(KeycloakConfig {
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    realm: env::var("REALM")
                        .context("REALM is required when KEYCLOAK_URL is set")?,
                    client_id: env::var("CLIENT_ID")
                        .context("CLIENT_ID is required when KEYCLOAK_URL is set")?,
                    client_secret: env_or("CLIENT_SECRET", ""),
                    jwks_cache_ttl_seconds: parse_var(
                        "JWKS_CACHE_TTL_SECONDS",
                        i64::try_from(limits::JWKS_CACHE_TTL_SECONDS).unwrap_or(600),
                    )?
                    .try_into()
                    .context("JWKS_CACHE_TTL_SECONDS out of range")?,
                })
            }
            _ => None,
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_USERNAME"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { username, password })
            }
            _ => None,
        };

        Ok(Self {
            http_port: parse_var("HTTP_PORT", 8081)?
                .try_into()
                .context("HTTP_PORT out of range")?,
            log_level: LogLevel::from_str_or_default(&env_or("LOG_LEVEL", "info")),
            auth,
            keycloak,
            bootstrap_admin,
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var(key: &str, default: i64) -> Result<i64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "JWT_SECRET_KEY",
            "JWT_ALGORITHM",
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            "REFRESH_TOKEN_EXPIRE_DAYS",
            "DISABLE_AUTH",
            "BCRYPT_COST",
            "KEYCLOAK_URL",
            "REALM",
            "CLIENT_ID",
            "CLIENT_SECRET",
            "JWKS_CACHE_TTL_SECONDS",
            "HTTP_PORT",
            "LOG_LEVEL",
            "BOOTSTRAP_ADMIN_USERNAME",
            "BOOTSTRAP_ADMIN_PASSWORD",
            "CORS_ORIGINS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_with_secret_only() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", "test-secret");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8081);
        assert_eq!(config.auth.access_token_expire_minutes, 60);
        assert_eq!(config.auth.refresh_token_expire_days, 7);
        assert_eq!(config.auth.jwt_algorithm, jsonwebtoken::Algorithm::HS256);
        assert!(!config.auth.disable_auth);
        assert!(config.keycloak.is_none());
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_an_error() {
        clear_env();
        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_keycloak_section_requires_realm_and_client() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", "test-secret");
        env::set_var("KEYCLOAK_URL", "https://id.example.com/");

        assert!(ServerConfig::from_env().is_err());

        env::set_var("REALM", "portfolio");
        env::set_var("CLIENT_ID", "portfolio-backend");
        let config = ServerConfig::from_env().unwrap();
        let keycloak = config.keycloak.unwrap();
        assert_eq!(keycloak.issuer(), "https://id.example.com/realms/portfolio");
        assert_eq!(
            keycloak.certs_url(),
            "https://id.example.com/realms/portfolio/protocol/openid-connect/certs"
        );
        assert_eq!(keycloak.jwks_cache_ttl_seconds, 600);
    }

    #[test]
    #[serial]
    fn test_disable_auth_parsing() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", "test-secret");
        env::set_var("DISABLE_AUTH", "TRUE");

        let config = ServerConfig::from_env().unwrap();
        assert!(config.auth.disable_auth);
    }
}
