// ABOUTME: Server binary wiring configuration, stores, auth, and the HTTP router
// ABOUTME: Seeds the bootstrap admin and serves the API with graceful shutdown
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Portfolio API server entry point

use anyhow::Result;
use axum::http::HeaderValue;
use portfolio_api::auth::{AuthManager, ExternalVerifier, TokenVerifier};
use portfolio_api::config::environment::ServerConfig;
use portfolio_api::guard::AccessGuard;
use portfolio_api::jwks::JwksProvider;
use portfolio_api::keycloak::KeycloakClient;
use portfolio_api::roles::RoleResolver;
use portfolio_api::routes::{self, AppState};
use portfolio_api::store::{InMemoryAccountStore, InMemoryFeedbackStore, InMemoryProjectStore};
use portfolio_api::logging;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Hard ceiling on request handling time
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;
    logging::init_from_level(config.log_level)?;
    tracing::info!("starting portfolio-api on port {}", config.http_port);

    let accounts = Arc::new(InMemoryAccountStore::new());
    let projects = Arc::new(InMemoryProjectStore::new());
    let feedback = Arc::new(InMemoryFeedbackStore::new());

    let auth_manager = Arc::new(AuthManager::from_config(&config.auth));

    let mut verifiers: Vec<Arc<dyn TokenVerifier>> = Vec::new();
    verifiers.push(auth_manager.clone());

    let mut keycloak_client = None;
    let mut client_id = String::new();
    if let Some(keycloak) = &config.keycloak {
        let jwks = Arc::new(JwksProvider::from_config(keycloak)?);
        verifiers.push(Arc::new(ExternalVerifier::from_config(jwks, keycloak)));
        keycloak_client = Some(Arc::new(KeycloakClient::new(keycloak.clone())?));
        client_id.clone_from(&keycloak.client_id);
        tracing::info!("external identity provider enabled: {}", keycloak.issuer());
    }

    let guard = if config.auth.disable_auth {
        tracing::warn!(
            "authentication bypass enabled; all protected routes accept unauthenticated requests"
        );
        AccessGuard::bypass()
    } else {
        AccessGuard::real(verifiers, RoleResolver::new(client_id))
    };

    let auth_service = routes::auth::AuthService::new(
        accounts.clone(),
        auth_manager,
        config.auth.bcrypt_cost,
    );

    if let Some(bootstrap) = &config.bootstrap_admin {
        auth_service
            .seed_admin(&bootstrap.username, &bootstrap.password)
            .await?;
    }

    let state = AppState {
        guard,
        auth_service,
        projects,
        feedback,
        keycloak: keycloak_client,
    };

    let app = routes::api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
        .layer(cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}
