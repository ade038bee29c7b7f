//! Credential database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::collection::{CredentialRecord, CredentialSummary};
use crate::credentials::{Credentials, verify_password};

/// Credential database model.
/// One row per user; `username` is unique across the table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CredentialDbModel {
    /// External user identifier (primary key)
    pub user_id: String,
    /// Login name embedded in the token
    pub username: String,
    /// SHA-256 hex digest of the password
    pub password_hash: String,
    /// Unix epoch milliseconds (UTC) when the row was created.
    pub created_at: i64,
    /// Unix epoch milliseconds (UTC) when the row was last updated.
    pub updated_at: i64,
}

impl CredentialDbModel {
    pub fn new(user_id: impl Into<String>, credentials: &Credentials, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            username: credentials.username.clone(),
            password_hash: credentials.password_hash.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
        }
    }

    /// Whether the plaintext password matches the stored hash.
    pub fn password_match(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    pub fn to_record(&self) -> CredentialRecord {
        CredentialRecord {
            user: self.user_id.clone(),
            token: self.credentials().token(),
        }
    }

    pub fn to_summary(&self) -> CredentialSummary {
        CredentialSummary {
            user: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Privileged API credential database model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiCredentialDbModel {
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl ApiCredentialDbModel {
    /// Whether the plaintext password matches the stored hash.
    pub fn password_match(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}
