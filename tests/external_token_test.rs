// ABOUTME: Tests RS256 verification against rotating provider keys
// ABOUTME: Covers kid resolution, forced refresh, cache TTL, and audience/issuer checks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use portfolio_api::auth::{ExternalVerifier, JwtValidationError};
use portfolio_api::jwks::JwksProvider;
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{
    external_claims, generate_rsa_key, in_one_hour, jwk_for, provider_with, sign_external_token,
    FakeKeyFetcher, UnreachableKeyFetcher, TEST_CLIENT_ID, TEST_ISSUER,
};

fn verifier_over(provider: JwksProvider) -> ExternalVerifier {
    ExternalVerifier::new(Arc::new(provider), TEST_CLIENT_ID, TEST_ISSUER)
}

#[tokio::test]
async fn test_valid_external_token_decodes() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    let claims = external_claims("7b6f", &["user", "admin"], in_one_hour());
    let token = sign_external_token(&private_key, "kid-1", &claims);

    let decoded = verifier.decode(&token).await.unwrap();
    assert_eq!(decoded.sub, "7b6f");
    assert_eq!(
        decoded.resource_access[TEST_CLIENT_ID].roles,
        vec!["user", "admin"]
    );
}

#[tokio::test]
async fn test_key_rotation_triggers_exactly_one_forced_refresh() {
    let (_old_key, old_public) = generate_rsa_key();
    let (new_key, new_public) = generate_rsa_key();

    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-old", &old_public)]));
    let provider = Arc::new(provider_with(fetcher.clone()));
    let verifier = ExternalVerifier::new(provider.clone(), TEST_CLIENT_ID, TEST_ISSUER);

    // Warm the cache with the pre-rotation set.
    assert_eq!(provider.get_keys().await.len(), 1);
    assert_eq!(fetcher.fetch_count(), 1);

    // Provider rotates: the certs endpoint now serves both kids, but the
    // cached (unexpired) set still only knows the old one.
    fetcher.rotate_to(vec![
        jwk_for("kid-old", &old_public),
        jwk_for("kid-new", &new_public),
    ]);

    let token = sign_external_token(
        &new_key,
        "kid-new",
        &external_claims("7b6f", &["user"], in_one_hour()),
    );

    let decoded = verifier.decode(&token).await.unwrap();
    assert_eq!(decoded.sub, "7b6f");
    // The kid miss forced exactly one refresh on top of the warmup fetch.
    assert_eq!(fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn test_cache_ttl_bounds_fetch_count() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let provider = JwksProvider::new(fetcher.clone(), Duration::from_millis(80));
    let verifier = ExternalVerifier::new(Arc::new(provider), TEST_CLIENT_ID, TEST_ISSUER);

    let token = sign_external_token(
        &private_key,
        "kid-1",
        &external_claims("7b6f", &["user"], in_one_hour()),
    );

    // Two decodes inside the TTL window share one fetch.
    verifier.decode(&token).await.unwrap();
    verifier.decode(&token).await.unwrap();
    assert_eq!(fetcher.fetch_count(), 1);

    // After expiry the next decode re-fetches exactly once.
    tokio::time::sleep(Duration::from_millis(120)).await;
    verifier.decode(&token).await.unwrap();
    assert_eq!(fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn test_unknown_kid_fails_after_refresh() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    let token = sign_external_token(
        &private_key,
        "kid-unknown",
        &external_claims("7b6f", &["user"], in_one_hour()),
    );

    match verifier.decode(&token).await {
        Err(JwtValidationError::TokenInvalid { .. }) => {}
        other => panic!("expected TokenInvalid for unknown kid, got {other:?}"),
    }
}

#[tokio::test]
async fn test_audience_mismatch_is_invalid() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    let mut claims = external_claims("7b6f", &["user"], in_one_hour());
    claims.aud = "some-other-client".to_owned();
    let token = sign_external_token(&private_key, "kid-1", &claims);

    assert!(verifier.decode(&token).await.is_err());
}

#[tokio::test]
async fn test_issuer_mismatch_is_invalid() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    let mut claims = external_claims("7b6f", &["user"], in_one_hour());
    claims.iss = "https://rogue.example.com/realms/portfolio".to_owned();
    let token = sign_external_token(&private_key, "kid-1", &claims);

    assert!(verifier.decode(&token).await.is_err());
}

#[tokio::test]
async fn test_expired_external_token_is_invalid() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    let claims = external_claims("7b6f", &["user"], chrono::Utc::now().timestamp() - 60);
    let token = sign_external_token(&private_key, "kid-1", &claims);

    match verifier.decode(&token).await {
        Err(JwtValidationError::TokenExpired { .. }) => {}
        other => panic!("expected TokenExpired, got {other:?}"),
    }
}

#[tokio::test]
async fn test_signature_from_wrong_key_is_invalid() {
    let (_trusted_key, trusted_public) = generate_rsa_key();
    let (rogue_key, _rogue_public) = generate_rsa_key();

    // The provider serves the trusted key under the kid the rogue token names.
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &trusted_public)]));
    let verifier = verifier_over(provider_with(fetcher));

    let token = sign_external_token(
        &rogue_key,
        "kid-1",
        &external_claims("7b6f", &["admin"], in_one_hour()),
    );

    match verifier.decode(&token).await {
        Err(JwtValidationError::TokenInvalid { .. }) => {}
        other => panic!("expected TokenInvalid for wrong signing key, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_provider_fails_closed() {
    let provider = JwksProvider::new(Arc::new(UnreachableKeyFetcher), Duration::from_secs(600));
    let verifier = ExternalVerifier::new(Arc::new(provider), TEST_CLIENT_ID, TEST_ISSUER);

    // Any structurally valid token must be rejected when no key material
    // is available; key unavailability never becomes a success path.
    let (private_key, _public_key) = generate_rsa_key();
    let token = sign_external_token(
        &private_key,
        "kid-1",
        &external_claims("7b6f", &["admin"], in_one_hour()),
    );

    assert!(verifier.decode(&token).await.is_err());
}

#[tokio::test]
async fn test_missing_kid_is_malformed() {
    let (private_key, public_key) = generate_rsa_key();
    let fetcher = Arc::new(FakeKeyFetcher::new(vec![jwk_for("kid-1", &public_key)]));
    let verifier = verifier_over(provider_with(fetcher));

    // Sign without a kid header.
    let pem = rsa::pkcs8::EncodePrivateKey::to_pkcs8_pem(&private_key, rsa::pkcs8::LineEnding::LF)
        .unwrap();
    let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    let token = jsonwebtoken::encode(
        &header,
        &external_claims("7b6f", &["user"], in_one_hour()),
        &encoding_key,
    )
    .unwrap();

    match verifier.decode(&token).await {
        Err(JwtValidationError::TokenMalformed { .. }) => {}
        other => panic!("expected TokenMalformed for missing kid, got {other:?}"),
    }
}
