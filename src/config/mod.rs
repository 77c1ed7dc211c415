// ABOUTME: Configuration module grouping environment-sourced settings
// ABOUTME: Re-exports the server configuration types for convenient access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Configuration management

pub mod environment;

pub use environment::{AuthConfig, KeycloakConfig, LogLevel, ServerConfig};
