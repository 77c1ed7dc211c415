// ABOUTME: Maps decoded token claims to a normalized set of role strings
// ABOUTME: Understands both local single-role claims and provider resource_access grants
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Role Resolver
//!
//! Locally-issued tokens carry one `role` string; identity-provider tokens
//! carry `resource_access.{client_id}.roles`. The resolver normalizes both
//! shapes to a flat role set so the access guard compares sets, never claim
//! layouts. A missing `resource_access` path at any level resolves to the
//! empty set.

use crate::auth::ClaimSet;
use std::collections::HashSet;

/// Normalizes a [`ClaimSet`] to the roles it grants
#[derive(Debug, Clone)]
pub struct RoleResolver {
    /// Client id whose `resource_access` entry carries this service's roles
    client_id: String,
}

impl RoleResolver {
    /// Create a resolver reading grants for the given client id
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    /// Extract the granted role set from a claim set
    #[must_use]
    pub fn resolve(&self, claims: &ClaimSet) -> HashSet<String> {
        match claims {
            ClaimSet::Local(local) => std::iter::once(local.role.clone()).collect(),
            ClaimSet::External(external) => external
                .resource_access
                .get(&self.client_id)
                .map(|access| access.roles.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}
