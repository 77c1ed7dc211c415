// ABOUTME: Cryptographic utilities for credential handling
// ABOUTME: Groups password hashing behind a small, misuse-resistant surface
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Credential cryptography

pub mod password;
