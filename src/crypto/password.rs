// ABOUTME: One-way password hashing and verification built on bcrypt
// ABOUTME: Malformed stored hashes verify as non-matches instead of erroring
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Password hashing
//!
//! bcrypt with a tunable work factor. Hashing is salted, so two hashes of
//! the same password differ; verification is deterministic. The plaintext
//! never crosses this boundary in either direction.

use crate::errors::{AppError, AppResult};

/// Hash a plaintext password with the given bcrypt cost.
///
/// Output is non-deterministic (fresh salt per call) but always verifies
/// against the plaintext it was produced from.
///
/// # Errors
///
/// Returns an error if the cost is outside bcrypt's supported range or the
/// hashing primitive fails.
pub fn hash_password(plain: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(plain, cost)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed or truncated stored hash is treated as a non-match; this
/// function never errors.
#[must_use]
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

/// Verify a password on a blocking worker thread.
///
/// bcrypt is CPU-bound by design; async callers use this to keep the
/// hashing cost off the request executor.
///
/// # Errors
///
/// Returns an error if the worker task is cancelled or panics.
pub async fn verify_password_blocking(plain: String, hashed: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hashed))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
}

/// Hash a password on a blocking worker thread.
///
/// # Errors
///
/// Returns an error if hashing fails or the worker task is cancelled.
pub async fn hash_password_blocking(plain: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
}
