// ABOUTME: Application-wide constants for token lifetimes, roles, and limits
// ABOUTME: Centralizes magic values so configuration defaults live in one place
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Application constants
//!
//! Named values shared across modules. Anything operators may want to tune
//! has a corresponding environment variable in [`crate::config::environment`];
//! the values here are the defaults.

/// Token lifetime and cache limits
pub mod limits {
    /// Access token lifetime in minutes
    pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60;

    /// Refresh token lifetime in days
    pub const REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

    /// Verification-key cache lifetime in seconds
    pub const JWKS_CACHE_TTL_SECONDS: u64 = 600;

    /// Bounded timeout for identity-provider HTTP calls, in seconds
    pub const UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

    /// Minimum accepted password length at signup
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Largest page size the project listing will serve
    pub const MAX_PAGE_SIZE: u64 = 100;
}

/// Role names used in allow-lists and token claims
pub mod role_names {
    /// Regular authenticated account
    pub const USER: &str = "user";

    /// Administrative account
    pub const ADMIN: &str = "admin";
}

/// Role set granted by the bypass authenticator when an operation declares
/// no allow-list of its own
pub const DEFAULT_BYPASS_ROLES: &[&str] = &[role_names::USER, role_names::ADMIN];

/// User-facing error messages
pub mod error_messages {
    /// Uniform credential failure message; does not reveal which factor failed
    pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

    /// Uniform token failure message; does not reveal which check failed
    pub const INVALID_TOKEN: &str = "Invalid or expired token";

    pub const AUTH_REQUIRED: &str = "Authentication required";
    pub const INVALID_SCHEME: &str = "Invalid authentication scheme";
    pub const PERMISSION_DENIED: &str = "You don't have permission to access this resource";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email address format";
    pub const PASSWORD_TOO_WEAK: &str = "Password must be at least 8 characters";
    pub const USER_ALREADY_EXISTS: &str = "User with this email already exists";
}
