// ABOUTME: Main library entry point for the portfolio showcase API
// ABOUTME: Provides REST endpoints for projects, feedback, and role-based authentication
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Portfolio API
//!
//! Backend for a portfolio/projects showcase: CRUD over projects and
//! feedback, user and admin account management, and a bearer-token
//! authentication layer that understands both locally-issued tokens and
//! tokens minted by an external Keycloak-style identity provider.
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Auth**: token issuance and verification (HS256 local, RS256 external)
//! - **Jwks**: cached verification-key material with rotation tolerance
//! - **Guard**: per-request role-based access control
//! - **Stores**: narrow persistence contracts over a document store
//! - **Routes**: thin HTTP handlers delegating to service layers
//!
//! ## Example
//!
//! ```rust,no_run
//! use portfolio_api::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("portfolio-api configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Token codec: local HS256 issuance/decoding and external RS256 verification
pub mod auth;

/// Configuration management sourced from the environment
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Password hashing utilities
pub mod crypto;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Access guard enforcing per-operation role allow-lists
pub mod guard;

/// Verification-key material fetching and caching
pub mod jwks;

/// Identity-provider admin API client
pub mod keycloak;

/// Production logging and structured output
pub mod logging;

/// Common data models for accounts, projects, and feedback
pub mod models;

/// Claim-set to role-set normalization
pub mod roles;

/// `HTTP` routes for accounts, projects, and feedback
pub mod routes;

/// Narrow persistence contracts and in-memory backends
pub mod store;
