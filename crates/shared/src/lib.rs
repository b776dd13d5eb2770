//! Shared utilities and common types for the campus events backend.
//!
//! This crate provides functionality used across all other crates:
//! - JWT issuing and validation
//! - Password hashing with Argon2id
//! - SHA-256 helpers for session hashing and upload signatures
//! - Common validation logic and offset pagination

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
