// ABOUTME: Tests the credential hasher round-trip and failure behavior
// ABOUTME: Validates salting, mismatch rejection, and malformed-hash tolerance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use portfolio_api::crypto::password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};

mod common;

use common::TEST_BCRYPT_COST;

#[test]
fn test_hash_round_trip() {
    let hash = hash_password("longenough1", TEST_BCRYPT_COST).unwrap();

    assert_ne!(hash, "longenough1", "hash must not equal the plaintext");
    assert!(verify_password("longenough1", &hash));
    assert!(!verify_password("longenough2", &hash));
}

#[test]
fn test_distinct_passwords_never_cross_verify() {
    let first = hash_password("correct horse", TEST_BCRYPT_COST).unwrap();
    let second = hash_password("battery staple", TEST_BCRYPT_COST).unwrap();

    assert!(!verify_password("correct horse", &second));
    assert!(!verify_password("battery staple", &first));
}

#[test]
fn test_rehash_uses_a_fresh_salt() {
    let first = hash_password("longenough1", TEST_BCRYPT_COST).unwrap();
    let second = hash_password("longenough1", TEST_BCRYPT_COST).unwrap();

    assert_ne!(first, second, "bcrypt must salt each hash independently");
    assert!(verify_password("longenough1", &first));
    assert!(verify_password("longenough1", &second));
}

#[test]
fn test_malformed_hash_verifies_as_non_match() {
    assert!(!verify_password("longenough1", "garbage"));
    assert!(!verify_password("longenough1", ""));
    assert!(!verify_password("longenough1", "$2b$truncated"));
}

#[tokio::test]
async fn test_blocking_wrappers_round_trip() {
    let hash = hash_password_blocking("longenough1".to_owned(), TEST_BCRYPT_COST)
        .await
        .unwrap();

    assert!(
        verify_password_blocking("longenough1".to_owned(), hash.clone())
            .await
            .unwrap()
    );
    assert!(
        !verify_password_blocking("wrong".to_owned(), hash)
            .await
            .unwrap()
    );
}
