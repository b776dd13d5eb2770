//! Hashing helpers for session tokens and signed upload requests.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signs a set of request parameters with an API secret.
///
/// Parameters are sorted by name, joined as `key=value` pairs separated by
/// `&`, the secret is appended, and the result is hashed with SHA-256. Empty
/// values are skipped. This is the signing scheme image hosts such as
/// Cloudinary expect for authenticated uploads.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    sha256_hex(&format!("{}{}", to_sign, api_secret))
}
