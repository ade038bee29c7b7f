//! One-way password digest.

use sha2::{Digest, Sha256};

/// Hash a plaintext password using SHA-256, returning lowercase hex.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password) == password_hash
}
