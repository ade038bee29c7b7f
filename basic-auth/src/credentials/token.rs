//! Basic-Auth token codec.
//!
//! A token is the string `username:password_hash`. Tokens supplied by callers
//! carry the plaintext password in the second component and must go through
//! [`prepare_token`] before they are stored; stored tokens are parsed with
//! [`Credentials::from_token`], which takes the second component as-is.

use std::fmt;
use std::str::FromStr;

use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::{hash_password, verify_password};

/// Separator between the username and password components.
pub const TOKEN_SEPARATOR: char = ':';

const GENERATED_USERNAME_LEN: usize = 16;
const GENERATED_PASSWORD_LEN: usize = 32;

/// Token codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token: expected `username:password`")]
    Malformed,
}

/// A username paired with the hash of its password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
}

impl Credentials {
    /// Build credentials from a plaintext password.
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_hash: hash_password(password),
        }
    }

    /// Parse a stored token. The second component is taken as a final hash.
    pub fn from_token(token: &str) -> Result<Self, TokenError> {
        match split_token(token) {
            Some((username, password_hash)) => Ok(Self {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            None => Err(TokenError::Malformed),
        }
    }

    /// Generate random credentials.
    ///
    /// Both components are alphanumeric, so they never contain the separator.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let username = Alphanumeric.sample_string(&mut rng, GENERATED_USERNAME_LEN);
        let password = Alphanumeric.sample_string(&mut rng, GENERATED_PASSWORD_LEN);
        Self::new(username, &password)
    }

    /// Whether the plaintext password matches the stored hash.
    pub fn password_match(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// The `username:password_hash` token.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.username, TOKEN_SEPARATOR, self.password_hash)
    }
}

impl FromStr for Credentials {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

/// Replace the plaintext password of a `username:password` token with its hash.
///
/// Tokens without a separator or with an empty component are returned unchanged
/// and rejected later by [`Credentials::from_token`]. An already hashed token is
/// hashed again, so callers must only pass tokens carrying a plaintext password.
pub fn prepare_token(token: &str) -> String {
    match split_token(token) {
        Some((username, password)) => {
            format!("{}{}{}", username, TOKEN_SEPARATOR, hash_password(password))
        }
        None => token.to_string(),
    }
}

/// Turn caller input into stored-form credentials, generating them when absent.
pub fn resolve_credentials(token: Option<&str>) -> Result<Credentials, TokenError> {
    match token {
        Some(token) if !token.is_empty() => Credentials::from_token(&prepare_token(token)),
        _ => Ok(Credentials::generate()),
    }
}

fn split_token(token: &str) -> Option<(&str, &str)> {
    let (username, password) = token.split_once(TOKEN_SEPARATOR)?;
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some((username, password))
}
