// ABOUTME: Shared helpers for integration tests
// ABOUTME: Builds test auth managers, guards, stores, and signed RS256 tokens
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use portfolio_api::auth::{AuthManager, ExternalClaims, TokenVerifier};
use portfolio_api::guard::AccessGuard;
use portfolio_api::jwks::{Jwk, JwksProvider, KeyFetchError, KeyFetcher};
use portfolio_api::roles::RoleResolver;
use portfolio_api::routes::auth::AuthService;
use portfolio_api::routes::AppState;
use portfolio_api::store::{InMemoryAccountStore, InMemoryFeedbackStore, InMemoryProjectStore};
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// bcrypt minimum cost; production uses the default cost, tests stay fast
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_CLIENT_ID: &str = "portfolio-backend";
pub const TEST_ISSUER: &str = "https://id.example.com/realms/portfolio";

/// Local codec over a fixed test secret
pub fn test_auth_manager() -> AuthManager {
    AuthManager::new(b"integration-test-secret", Algorithm::HS256, 60, 7)
}

/// Guard running the real path over the local codec only
pub fn local_guard() -> AccessGuard {
    AccessGuard::real(
        vec![Arc::new(test_auth_manager()) as Arc<dyn TokenVerifier>],
        RoleResolver::new(TEST_CLIENT_ID),
    )
}

/// Full application state over in-memory stores and the local codec
pub fn test_state() -> AppState {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let auth_manager = Arc::new(test_auth_manager());

    AppState {
        guard: AccessGuard::real(
            vec![auth_manager.clone() as Arc<dyn TokenVerifier>],
            RoleResolver::new(TEST_CLIENT_ID),
        ),
        auth_service: AuthService::new(accounts, auth_manager, TEST_BCRYPT_COST),
        projects: Arc::new(InMemoryProjectStore::new()),
        feedback: Arc::new(InMemoryFeedbackStore::new()),
        keycloak: None,
    }
}

/// Generate a fresh RSA keypair for RS256 test tokens.
///
/// 2048 bits keeps test execution fast; production providers publish
/// larger keys but the verification path is identical.
pub fn generate_rsa_key() -> (RsaPrivateKey, RsaPublicKey) {
    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation failed");
    let public_key = RsaPublicKey::from(&private_key);
    (private_key, public_key)
}

/// Publish a public key the way the provider's certs endpoint does
pub fn jwk_for(kid: &str, public_key: &RsaPublicKey) -> Jwk {
    Jwk {
        kid: kid.to_owned(),
        kty: "RSA".to_owned(),
        key_use: Some("sig".to_owned()),
        alg: Some("RS256".to_owned()),
        n: Some(URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be())),
        e: Some(URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be())),
    }
}

/// Sign external claims with the given key under the given kid
pub fn sign_external_token(
    private_key: &RsaPrivateKey,
    kid: &str,
    claims: &ExternalClaims,
) -> String {
    let pem = private_key
        .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
        .expect("private key PEM export failed");
    let encoding_key =
        EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key construction failed");

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_owned());

    encode(&header, claims, &encoding_key).expect("RS256 signing failed")
}

/// External claims granting the given roles for the test client
pub fn external_claims(subject: &str, roles: &[&str], exp: i64) -> ExternalClaims {
    let mut resource_access = std::collections::HashMap::new();
    resource_access.insert(
        TEST_CLIENT_ID.to_owned(),
        portfolio_api::auth::ClientAccess {
            roles: roles.iter().map(|role| (*role).to_owned()).collect(),
        },
    );

    ExternalClaims {
        sub: subject.to_owned(),
        email: Some(format!("{subject}@example.com")),
        name: None,
        preferred_username: Some(subject.to_owned()),
        resource_access,
        iss: TEST_ISSUER.to_owned(),
        aud: TEST_CLIENT_ID.to_owned(),
        exp,
    }
}

/// Unix timestamp one hour from now
pub fn in_one_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

/// Key fetcher serving a mutable in-memory key set and counting fetches
pub struct FakeKeyFetcher {
    keys: Mutex<Vec<Jwk>>,
    calls: AtomicUsize,
}

impl FakeKeyFetcher {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self {
            keys: Mutex::new(keys),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the served key set, simulating provider-side rotation
    pub fn rotate_to(&self, keys: Vec<Jwk>) {
        *self.keys.lock().expect("fetcher lock poisoned") = keys;
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyFetcher for FakeKeyFetcher {
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, KeyFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().expect("fetcher lock poisoned").clone())
    }
}

/// Key fetcher that always fails, simulating an unreachable provider
pub struct UnreachableKeyFetcher;

#[async_trait]
impl KeyFetcher for UnreachableKeyFetcher {
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, KeyFetchError> {
        Err(KeyFetchError::Request("connection refused".to_owned()))
    }
}

/// Provider over a fake fetcher with a long TTL
pub fn provider_with(fetcher: Arc<FakeKeyFetcher>) -> JwksProvider {
    JwksProvider::new(fetcher, Duration::from_secs(600))
}
